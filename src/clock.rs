//! Elapsed-time sources for run timing.
//!
//! Detection and recovery signals are scored by seconds elapsed since the
//! run started. The clock is injected rather than read inline so tests can
//! supply exact elapsed values.

use std::sync::Mutex;
use std::time::Instant;

/// A source of monotonic elapsed seconds since run start.
pub trait RunClock: Send + Sync {
    /// Returns seconds elapsed since the clock was created.
    fn elapsed_secs(&self) -> f64;
}

/// Wall-clock backed monotonic clock.
#[derive(Debug)]
pub struct MonotonicClock {
    started: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose zero point is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RunClock for MonotonicClock {
    fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock for deterministic tests and simulated elapsed
/// time. Starts at zero.
#[derive(Debug, Default)]
pub struct ManualClock {
    elapsed: Mutex<f64>,
}

impl ManualClock {
    /// Creates a manual clock at zero elapsed seconds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the elapsed time to an absolute value in seconds.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set(&self, secs: f64) {
        *self.elapsed.lock().expect("manual clock lock poisoned") = secs;
    }

    /// Advances the elapsed time by `secs`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn advance(&self, secs: f64) {
        *self.elapsed.lock().expect("manual clock lock poisoned") += secs;
    }
}

impl RunClock for ManualClock {
    fn elapsed_secs(&self) -> f64 {
        *self.elapsed.lock().expect("manual clock lock poisoned")
    }
}
