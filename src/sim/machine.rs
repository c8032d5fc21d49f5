//! Attack progression state machine.
//!
//! Owns one [`SimulationRun`] for its lifetime: walks the fixed stage
//! progression, generates the per-stage telemetry batch, stamps and
//! appends every event to the run's immutable log, hands each event to
//! the append-only sink, and paces emission for human-readable replay.
//!
//! Blue-team decision outcomes are recorded for reporting and scoring
//! only; they never alter progression or timing.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use rand::{SeedableRng, TryRngCore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SimulationError;

use super::decision::{DecisionGate, DecisionOutcome};
use super::events::{Event, EventGenerator};
use super::sink::EventSink;
use super::state::{AttackState, PROGRESSION};

/// Pacing mode for event emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Demo pacing: `uniform(0.3s, 0.8s) / speed` between events,
    /// `uniform(1.0s, 2.0s) / speed` between stages.
    #[default]
    Realtime,
    /// No delays. For tests and non-interactive contexts; pacing carries
    /// no correctness obligation.
    Disabled,
}

/// One playthrough of a scenario. Created by the state machine, discarded
/// when the run ends or is abandoned.
#[derive(Debug)]
pub struct SimulationRun {
    /// Unique id for this playthrough
    pub run_id: String,
    /// Scenario being replayed
    pub scenario_id: String,
    /// Pacing speed multiplier (1.0 = real pacing, higher = faster)
    pub speed: f64,
    /// Whether blue-team decision gating is enabled
    pub blue_team: bool,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Current attack state
    pub current_state: AttackState,
    /// Append-only event log; append order is the authoritative chronology
    pub event_log: Vec<Event>,
}

/// Drives the attack through the fixed stage progression.
pub struct AttackStateMachine {
    run: SimulationRun,
    generator: EventGenerator,
    sink: EventSink,
    gate: Option<DecisionGate>,
    pacing: Pacing,
    cancel: CancellationToken,
    pace_rng: StdRng,
    next_stage: usize,
    decisions: Vec<DecisionOutcome>,
}

impl std::fmt::Debug for AttackStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttackStateMachine")
            .field("scenario_id", &self.run.scenario_id)
            .field("current_state", &self.run.current_state)
            .field("events", &self.run.event_log.len())
            .finish_non_exhaustive()
    }
}

impl AttackStateMachine {
    /// Creates a machine for `scenario_id` in the `Dormant` state, with a
    /// discarding sink, no decision gate, and realtime pacing.
    ///
    /// A non-finite or non-positive `speed` is replaced with `1.0`.
    #[must_use]
    pub fn new(scenario_id: impl Into<String>, speed: f64) -> Self {
        let speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            warn!(speed, "invalid speed multiplier, using 1.0");
            1.0
        };
        let mut seed_rng = rand::rngs::OsRng;
        let seed = seed_rng.try_next_u64().unwrap_or(0);
        Self {
            run: SimulationRun {
                run_id: uuid::Uuid::new_v4().to_string(),
                scenario_id: scenario_id.into(),
                speed,
                blue_team: false,
                started_at: Utc::now(),
                current_state: AttackState::Dormant,
                event_log: Vec::new(),
            },
            generator: EventGenerator::from_seed(seed),
            sink: EventSink::noop(),
            gate: None,
            pacing: Pacing::default(),
            cancel: CancellationToken::new(),
            pace_rng: StdRng::seed_from_u64(seed),
            next_stage: 0,
            decisions: Vec::new(),
        }
    }

    /// Seeds the event generator and pacing jitter for deterministic runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.generator = EventGenerator::from_seed(seed);
        self.pace_rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Attaches the append-only event sink for this run.
    #[must_use]
    pub fn with_sink(mut self, sink: EventSink) -> Self {
        self.sink = sink;
        self
    }

    /// Enables blue-team mode with the given decision gate.
    #[must_use]
    pub fn with_gate(mut self, gate: DecisionGate) -> Self {
        self.run.blue_team = true;
        self.gate = Some(gate);
        self
    }

    /// Sets the pacing mode.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Token that aborts the run during a pacing sleep when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current attack state.
    #[must_use]
    pub const fn current_state(&self) -> AttackState {
        self.run.current_state
    }

    /// Events emitted so far, in append (chronological) order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.run.event_log
    }

    /// Blue-team decision outcomes recorded so far.
    #[must_use]
    pub fn decisions(&self) -> &[DecisionOutcome] {
        &self.decisions
    }

    /// Borrow of the owned run.
    #[must_use]
    pub const fn run(&self) -> &SimulationRun {
        &self.run
    }

    /// Consumes the machine, yielding the finished run.
    #[must_use]
    pub fn into_run(self) -> SimulationRun {
        self.run
    }

    /// Moves to the next entry in the fixed progression.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::ProgressionExhausted`] if called after
    /// the terminal state was reached. That is a caller bug: stop calling
    /// after `Impact`.
    pub fn advance(&mut self) -> Result<AttackState, SimulationError> {
        let Some(&state) = PROGRESSION.get(self.next_stage) else {
            return Err(SimulationError::ProgressionExhausted);
        };
        self.next_stage += 1;
        self.run.current_state = state;
        Ok(state)
    }

    /// Runs the full attack progression.
    ///
    /// Visits `InitialAccess` through `Impact` in order. For each stage:
    /// emits the stage's event batch (stamped, appended to the log, and
    /// handed to the sink), paces between events, and - when blue-team
    /// mode is on - presents the decision gate. The gate outcome only
    /// affects reporting; the attack always advances.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Interrupted`] if the cancellation token
    /// fires during a pacing sleep.
    pub async fn run_full_progression(&mut self) -> Result<(), SimulationError> {
        info!(
            scenario = %self.run.scenario_id,
            run_id = %self.run.run_id,
            speed = self.run.speed,
            blue_team = self.run.blue_team,
            "starting attack simulation"
        );

        for _ in 0..PROGRESSION.len() {
            let state = self.advance()?;
            debug!(state = %state, "entering attack stage");

            let batch = self.generator.batch(state);
            for draft in batch {
                let event = draft.stamp(&self.run.scenario_id, state, Utc::now());
                debug!(
                    event_id = event.event_id,
                    source = %event.source,
                    description = %event.description,
                    "event emitted"
                );
                self.sink.append(&event);
                self.run.event_log.push(event);

                let jitter = self.pace_rng.random_range(0.3..=0.8);
                self.pace(jitter).await?;
            }

            if self.run.blue_team {
                if let Some(gate) = self.gate.as_mut() {
                    let outcome = gate.challenge(state);
                    debug!(state = %state, correct = outcome.correct, "decision recorded");
                    self.decisions.push(outcome);
                }
            }

            // No gap after the terminal stage; the run ends with the
            // last event, not a dangling sleep
            if !state.is_terminal() {
                let stage_gap = self.pace_rng.random_range(1.0..=2.0);
                self.pace(stage_gap).await?;
            }
        }

        info!(
            events = self.run.event_log.len(),
            "simulation complete - attack succeeded"
        );
        Ok(())
    }

    /// Sleeps `base_secs / speed`, or not at all when pacing is disabled.
    /// Cancellation aborts the sleep with an error instead of hanging.
    async fn pace(&self, base_secs: f64) -> Result<(), SimulationError> {
        if self.pacing == Pacing::Disabled {
            return Ok(());
        }
        let delay = std::time::Duration::from_secs_f64(base_secs / self.run.speed);
        tokio::select! {
            () = self.cancel.cancelled() => Err(SimulationError::Interrupted),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::decision::ScriptedChoices;

    fn fast_machine() -> AttackStateMachine {
        AttackStateMachine::new("ransomware_attack", 1.0)
            .with_seed(42)
            .with_pacing(Pacing::Disabled)
    }

    #[test]
    fn test_starts_dormant() {
        let machine = fast_machine();
        assert_eq!(machine.current_state(), AttackState::Dormant);
        assert!(machine.events().is_empty());
    }

    #[test]
    fn test_advance_walks_fixed_progression() {
        let mut machine = fast_machine();
        let mut visited = Vec::new();
        while let Ok(state) = machine.advance() {
            visited.push(state);
        }
        assert_eq!(visited, PROGRESSION);
    }

    #[test]
    fn test_advance_past_terminal_errors() {
        let mut machine = fast_machine();
        for _ in 0..PROGRESSION.len() {
            machine.advance().unwrap();
        }
        assert!(matches!(
            machine.advance(),
            Err(SimulationError::ProgressionExhausted)
        ));
        // State is unchanged by the failed call
        assert_eq!(machine.current_state(), AttackState::Impact);
    }

    #[tokio::test]
    async fn test_full_progression_emits_seventeen_events() {
        let mut machine = fast_machine();
        machine.run_full_progression().await.unwrap();
        assert_eq!(machine.events().len(), 17);
        assert_eq!(machine.current_state(), AttackState::Impact);
    }

    #[tokio::test]
    async fn test_events_ordered_by_stage() {
        let mut machine = fast_machine();
        machine.run_full_progression().await.unwrap();

        let states: Vec<AttackState> = machine.events().iter().map(|e| e.state).collect();
        let mut expected = Vec::new();
        for (state, count) in PROGRESSION.iter().zip([3, 3, 3, 3, 5]) {
            expected.extend(std::iter::repeat_n(*state, count));
        }
        assert_eq!(states, expected, "stages must never interleave or revisit");
    }

    #[tokio::test]
    async fn test_run_after_completion_errors() {
        let mut machine = fast_machine();
        machine.run_full_progression().await.unwrap();
        assert!(matches!(
            machine.run_full_progression().await,
            Err(SimulationError::ProgressionExhausted)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_realtime_pacing_completes_under_paused_clock() {
        let mut machine = AttackStateMachine::new("ransomware_attack", 1.0).with_seed(42);
        machine.run_full_progression().await.unwrap();
        assert_eq!(machine.events().len(), 17);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_pacing_gap_after_terminal_stage() {
        let mut machine = AttackStateMachine::new("ransomware_attack", 1.0).with_seed(42);
        let start = tokio::time::Instant::now();
        machine.run_full_progression().await.unwrap();
        let elapsed = start.elapsed().as_secs_f64();

        // Replay the pacing draws: one jitter per event, one gap per
        // stage boundary, nothing after Impact
        let mut rng = StdRng::seed_from_u64(42);
        let mut expected = 0.0_f64;
        for (i, count) in [3, 3, 3, 3, 5].into_iter().enumerate() {
            for _ in 0..count {
                expected += rng.random_range(0.3..=0.8);
            }
            if i < 4 {
                expected += rng.random_range(1.0..=2.0);
            }
        }
        assert!(
            (elapsed - expected).abs() < 1e-6,
            "expected {expected}s of pacing, observed {elapsed}s"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_run() {
        let mut machine = AttackStateMachine::new("ransomware_attack", 1.0).with_seed(42);
        machine.cancel_token().cancel();
        let result = machine.run_full_progression().await;
        assert!(matches!(result, Err(SimulationError::Interrupted)));
        // Aborted early: the log never reaches the full 17 events
        assert!(machine.events().len() < 17);
    }

    #[tokio::test]
    async fn test_gate_outcomes_do_not_alter_progression() {
        // All answers wrong (unmapped token); attack still runs to Impact
        let gate = DecisionGate::new(
            Box::new(ScriptedChoices::new(vec!["x"; 5])),
            Box::new(std::io::sink()),
            7,
        );
        let mut machine = fast_machine().with_gate(gate);
        machine.run_full_progression().await.unwrap();

        assert_eq!(machine.current_state(), AttackState::Impact);
        assert_eq!(machine.decisions().len(), 5);
        assert!(machine.decisions().iter().all(|d| !d.correct));
        assert_eq!(machine.events().len(), 17);
    }

    #[test]
    fn test_invalid_speed_falls_back_to_one() {
        let machine = AttackStateMachine::new("s", 0.0);
        assert!((machine.run().speed - 1.0).abs() < f64::EPSILON);
        let machine = AttackStateMachine::new("s", f64::NAN);
        assert!((machine.run().speed - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_into_run_preserves_log() {
        let mut machine = fast_machine();
        machine.run_full_progression().await.unwrap();
        let run = machine.into_run();
        assert_eq!(run.event_log.len(), 17);
        assert_eq!(run.scenario_id, "ransomware_attack");
        assert!(!run.run_id.is_empty());
    }
}
