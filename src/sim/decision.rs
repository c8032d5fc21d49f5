//! Blue-team decision gate.
//!
//! When blue-team mode is on, each attack stage with a mapped canonical
//! response pauses the run on a four-option multiple-choice challenge:
//! one correct action and three fixed distractors, shuffled. Exactly one
//! input token is read per challenge. A failed read (closed stream,
//! interrupt) is deliberately scored as correct - the gate must never
//! crash a run, and the safe default is to not punish the analyst for an
//! input-layer failure.

use std::io::{BufRead, Write};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{SeedableRng, TryRngCore};

use super::state::AttackState;

/// Source of analyst choice tokens. Injectable so tests can script input.
pub trait ChoiceSource: Send + Sync {
    /// Reads one choice token.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the underlying stream is closed or
    /// interrupted; the gate recovers from this locally.
    fn read_choice(&mut self) -> std::io::Result<String>;
}

/// Reads choice tokens from stdin, one line per challenge.
#[derive(Debug, Default)]
pub struct StdinChoice;

impl ChoiceSource for StdinChoice {
    fn read_choice(&mut self) -> std::io::Result<String> {
        let mut line = String::new();
        let n = std::io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "input stream closed",
            ));
        }
        Ok(line.trim().to_string())
    }
}

/// Scripted choice tokens for tests and non-interactive runs.
#[derive(Debug, Default)]
pub struct ScriptedChoices {
    tokens: std::collections::VecDeque<String>,
}

impl ScriptedChoices {
    /// Creates a source yielding `tokens` in order, then EOF errors.
    #[must_use]
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

impl ChoiceSource for ScriptedChoices {
    fn read_choice(&mut self) -> std::io::Result<String> {
        self.tokens.pop_front().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "script exhausted")
        })
    }
}

/// Outcome of one gated challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionOutcome {
    /// Stage the challenge was presented for
    pub state: AttackState,
    /// Option key the analyst selected, if a token was read and mapped
    pub selected: Option<String>,
    /// Whether the canonical correct response was chosen
    pub correct: bool,
}

/// Canonical correct response for a stage: `(label, key)`.
///
/// Stages without a mapping (`Dormant`, `Contained`) make the gate a
/// no-op.
#[must_use]
pub const fn canonical_response(state: AttackState) -> Option<(&'static str, &'static str)> {
    match state {
        AttackState::InitialAccess => Some(("Block the external IP and force MFA reset", "block-ip")),
        AttackState::Persistence => Some((
            "Delete the scheduled task and revoke the new account",
            "delete-task",
        )),
        AttackState::LateralMovement => {
            Some(("Isolate the source host from the network", "isolate-host"))
        }
        AttackState::Exfiltration => Some((
            "Block outbound traffic to the destination IP",
            "block-egress",
        )),
        AttackState::Impact => Some((
            "Activate incident response plan and restore from backup",
            "ir-plan",
        )),
        AttackState::Dormant | AttackState::Contained => None,
    }
}

/// Fixed distractor options shared by every challenge: `(label, key)`.
const DISTRACTORS: [(&str, &str); 3] = [
    ("Investigate further (collect more logs)", "investigate"),
    ("Notify management only", "notify"),
    ("Reboot the affected host", "reboot"),
];

/// Interactive decision gate.
pub struct DecisionGate {
    source: Box<dyn ChoiceSource>,
    prompt: Box<dyn Write + Send + Sync>,
    rng: StdRng,
}

impl std::fmt::Debug for DecisionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionGate").finish_non_exhaustive()
    }
}

impl DecisionGate {
    /// Creates a gate reading from stdin and prompting on stderr.
    #[must_use]
    pub fn interactive() -> Self {
        let mut seed_rng = rand::rngs::OsRng;
        Self::new(
            Box::new(StdinChoice),
            Box::new(std::io::stderr()),
            seed_rng.try_next_u64().unwrap_or(0),
        )
    }

    /// Creates a gate with injected choice source, prompt writer, and
    /// shuffle seed.
    #[must_use]
    pub fn new(
        source: Box<dyn ChoiceSource>,
        prompt: Box<dyn Write + Send + Sync>,
        seed: u64,
    ) -> Self {
        Self {
            source,
            prompt,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Presents the challenge for `state` and reads one choice.
    ///
    /// Stages with no canonical response succeed trivially. An input read
    /// failure yields `correct = true` (documented default-safe fallback)
    /// rather than an error.
    pub fn challenge(&mut self, state: AttackState) -> DecisionOutcome {
        let Some((correct_label, correct_key)) = canonical_response(state) else {
            return DecisionOutcome {
                state,
                selected: None,
                correct: true,
            };
        };

        let mut options: Vec<(&str, &str)> = vec![(correct_label, correct_key)];
        options.extend_from_slice(&DISTRACTORS);
        options.shuffle(&mut self.rng);

        let _ = writeln!(self.prompt, "\nBLUE TEAM DECISION - {}", state.label());
        let _ = writeln!(
            self.prompt,
            "What is the correct response to this attack stage?"
        );
        for (i, (label, _)) in options.iter().enumerate() {
            let _ = writeln!(self.prompt, "  [{}] {label}", i + 1);
        }
        let _ = write!(self.prompt, "Your choice: ");
        let _ = self.prompt.flush();

        let token = match self.source.read_choice() {
            Ok(token) => token,
            Err(_) => {
                // Closed stream or interrupt: succeed trivially, never crash the run
                return DecisionOutcome {
                    state,
                    selected: None,
                    correct: true,
                };
            }
        };

        let selected = token
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=options.len()).contains(n))
            .map(|n| options[n - 1].1.to_string());
        let correct = selected.as_deref() == Some(correct_key);

        if correct {
            let _ = writeln!(self.prompt, "CORRECT - response recorded.\n");
        } else {
            let _ = writeln!(
                self.prompt,
                "WRONG - the attacker advances unchecked.\nCorrect answer: {correct_label}\n"
            );
        }

        DecisionOutcome {
            state,
            selected,
            correct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_with(tokens: Vec<String>, seed: u64) -> DecisionGate {
        DecisionGate::new(
            Box::new(ScriptedChoices::new(tokens)),
            Box::new(std::io::sink()),
            seed,
        )
    }

    /// Finds the presented position of the correct option for a seed by
    /// replaying the shuffle.
    fn correct_position(state: AttackState, seed: u64) -> usize {
        let (correct_label, correct_key) = canonical_response(state).unwrap();
        let mut options: Vec<(&str, &str)> = vec![(correct_label, correct_key)];
        options.extend_from_slice(&DISTRACTORS);
        let mut rng = StdRng::seed_from_u64(seed);
        options.shuffle(&mut rng);
        options.iter().position(|(_, k)| *k == correct_key).unwrap() + 1
    }

    #[test]
    fn test_correct_choice_is_correct() {
        let pos = correct_position(AttackState::LateralMovement, 5);
        let mut gate = gate_with(vec![pos.to_string()], 5);
        let outcome = gate.challenge(AttackState::LateralMovement);
        assert!(outcome.correct);
        assert_eq!(outcome.selected.as_deref(), Some("isolate-host"));
    }

    #[test]
    fn test_wrong_choice_is_incorrect() {
        let pos = correct_position(AttackState::Exfiltration, 5);
        let wrong = if pos == 1 { 2 } else { 1 };
        let mut gate = gate_with(vec![wrong.to_string()], 5);
        let outcome = gate.challenge(AttackState::Exfiltration);
        assert!(!outcome.correct);
        assert!(outcome.selected.is_some());
        assert_ne!(outcome.selected.as_deref(), Some("block-egress"));
    }

    #[test]
    fn test_unmapped_token_is_incorrect() {
        let mut gate = gate_with(vec!["banana".to_string()], 1);
        let outcome = gate.challenge(AttackState::Persistence);
        assert!(!outcome.correct);
        assert_eq!(outcome.selected, None);
    }

    #[test]
    fn test_out_of_range_number_is_incorrect() {
        let mut gate = gate_with(vec!["9".to_string()], 1);
        let outcome = gate.challenge(AttackState::Persistence);
        assert!(!outcome.correct);
        assert_eq!(outcome.selected, None);
    }

    #[test]
    fn test_read_failure_defaults_to_correct() {
        let mut gate = gate_with(vec![], 1);
        let outcome = gate.challenge(AttackState::Impact);
        assert!(outcome.correct, "closed input must not fail the challenge");
        assert_eq!(outcome.selected, None);
    }

    #[test]
    fn test_states_without_mapping_are_noops() {
        // No token consumed for unmapped states
        let mut gate = gate_with(vec!["1".to_string()], 1);
        let dormant = gate.challenge(AttackState::Dormant);
        assert!(dormant.correct);
        assert_eq!(dormant.selected, None);
        let contained = gate.challenge(AttackState::Contained);
        assert!(contained.correct);
        // Token still available for the first mapped stage
        let outcome = gate.challenge(AttackState::InitialAccess);
        assert!(
            outcome.selected.is_some(),
            "mapped stage should consume the scripted token"
        );
    }

    #[test]
    fn test_every_progression_state_has_canonical_response() {
        for state in crate::sim::state::PROGRESSION {
            assert!(canonical_response(state).is_some(), "{state} unmapped");
        }
    }

    #[test]
    fn test_shuffle_is_seed_deterministic() {
        assert_eq!(
            correct_position(AttackState::Impact, 77),
            correct_position(AttackState::Impact, 77)
        );
    }
}
