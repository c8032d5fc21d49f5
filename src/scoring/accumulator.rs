//! Run-scoped scoring accumulator.
//!
//! The accumulator is the write side of the scoring engine: analyst
//! actions are recorded against an injectable monotonic clock, and
//! [`ScoringAccumulator::snapshot`] freezes the state for the pure
//! calculator. Detection and recovery keep only the earliest timing.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::RunClock;

use super::difficulty::Difficulty;

/// One recorded analyst action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Action category, e.g. "isolate", "block"
    pub action_type: String,
    /// Free-text description
    pub description: String,
    /// Attack stage number the action was taken in, 0 if unknown
    pub stage: u32,
    /// Seconds since run start when the action was recorded
    pub elapsed_secs: f64,
}

/// Frozen view of a run's recorded actions, consumed by the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: String,
    pub scenario_id: String,
    pub difficulty: Difficulty,
    pub started_at: DateTime<Utc>,
    /// Seconds to first detection, `None` if never detected
    pub detection_secs: Option<f64>,
    pub contained_before_lateral: bool,
    pub actions: Vec<ActionRecord>,
    pub policies_followed: u32,
    pub policies_total: u32,
    pub mitre_identified: BTreeSet<String>,
    pub mitre_universe: BTreeSet<String>,
    pub evidence_count: u32,
    pub escalated: bool,
    /// Seconds to recovery, `None` if never marked recovered
    pub recovery_secs: Option<f64>,
}

/// Accumulates scoring-relevant actions over one run.
pub struct ScoringAccumulator {
    clock: Arc<dyn RunClock>,
    snapshot: RunSnapshot,
}

impl std::fmt::Debug for ScoringAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringAccumulator")
            .field("run_id", &self.snapshot.run_id)
            .field("scenario_id", &self.snapshot.scenario_id)
            .field("actions", &self.snapshot.actions.len())
            .finish_non_exhaustive()
    }
}

impl ScoringAccumulator {
    /// Creates an accumulator for one run. The clock's zero is the run
    /// start; all elapsed readings come from it, never from wall time.
    #[must_use]
    pub fn new(
        scenario_id: impl Into<String>,
        difficulty: Difficulty,
        clock: Arc<dyn RunClock>,
    ) -> Self {
        Self {
            clock,
            snapshot: RunSnapshot {
                run_id: format!("run_{}", uuid::Uuid::new_v4()),
                scenario_id: scenario_id.into(),
                difficulty,
                started_at: Utc::now(),
                detection_secs: None,
                contained_before_lateral: false,
                actions: Vec::new(),
                policies_followed: 0,
                policies_total: 0,
                mitre_identified: BTreeSet::new(),
                mitre_universe: BTreeSet::new(),
                evidence_count: 0,
                escalated: false,
                recovery_secs: None,
            },
        }
    }

    /// Records first detection. Later calls keep the earliest timing.
    pub fn detect_threat(&mut self) {
        if self.snapshot.detection_secs.is_none() {
            self.snapshot.detection_secs = Some(self.clock.elapsed_secs());
        }
    }

    /// Marks containment before the attack reached lateral movement.
    pub fn contain_before_lateral(&mut self) {
        self.snapshot.contained_before_lateral = true;
    }

    /// Records one analyst action for the efficiency dimension.
    pub fn log_action(&mut self, action_type: &str, description: &str, stage: u32) {
        self.snapshot.actions.push(ActionRecord {
            action_type: action_type.to_string(),
            description: description.to_string(),
            stage,
            elapsed_secs: self.clock.elapsed_secs(),
        });
    }

    /// Records one policy check and whether it was followed.
    pub fn follow_policy(&mut self, _policy_id: &str, followed: bool) {
        self.snapshot.policies_total += 1;
        if followed {
            self.snapshot.policies_followed += 1;
        }
    }

    /// Marks a MITRE technique as identified by the analyst.
    pub fn identify_mitre(&mut self, technique_id: &str) {
        self.snapshot.mitre_identified.insert(technique_id.to_string());
    }

    /// Sets the coverage universe, normally the scenario's technique set.
    pub fn set_mitre_universe<I, S>(&mut self, techniques: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.snapshot.mitre_universe = techniques.into_iter().map(Into::into).collect();
    }

    /// Counts one forensic preservation action.
    pub fn preserve_evidence(&mut self) {
        self.snapshot.evidence_count += 1;
    }

    /// Marks escalation to management.
    pub fn escalate(&mut self) {
        self.snapshot.escalated = true;
    }

    /// Records recovery. Later calls keep the earliest timing.
    pub fn mark_recovered(&mut self) {
        if self.snapshot.recovery_secs.is_none() {
            self.snapshot.recovery_secs = Some(self.clock.elapsed_secs());
        }
    }

    /// Run id for this accumulator.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.snapshot.run_id
    }

    /// Freezes the current state for the calculator.
    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        self.snapshot.clone()
    }
}
