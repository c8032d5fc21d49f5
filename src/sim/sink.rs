//! Append-only JSONL sink for emitted telemetry events.
//!
//! One sink instance is the exclusive writer for one run. Each record is a
//! single JSON line carrying the event plus a monotonically increasing
//! sequence number. Write failures are dropped silently - the in-memory
//! event log owned by the run stays authoritative.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::events::Event;

/// Wraps an [`Event`] with its append sequence number.
#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    /// Zero-based, monotonically increasing sequence counter
    sequence: u64,
    /// The wrapped event (flattened into the same JSON object)
    #[serde(flatten)]
    event: &'a Event,
}

/// Thread-safe, buffered JSONL event writer.
pub struct EventSink {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl EventSink {
    /// Creates a sink over an arbitrary writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
            path: None,
        }
    }

    /// Creates a sink that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates the per-run log file `{scenario_id}_{start_unix}.jsonl`
    /// inside `dir`.
    ///
    /// The file is created with `create_new`, so two runs that collide on
    /// scenario id and start second fail fast instead of interleaving.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created or the log
    /// file already exists.
    pub fn for_run(
        dir: &Path,
        scenario_id: &str,
        started_at: DateTime<Utc>,
    ) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{scenario_id}_{}.jsonl", started_at.timestamp()));
        let file = std::fs::File::create_new(&path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(Box::new(file))),
            sequence: AtomicU64::new(0),
            path: Some(path),
        })
    }

    /// Appends an event as one JSON line and flushes.
    ///
    /// Failures are dropped silently; the sink must never crash the run.
    pub fn append(&self, event: &Event) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let record = EventRecord { sequence, event };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&record) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Number of events appended so far.
    #[must_use]
    pub fn appended(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Path of the backing log file, if file-backed.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
