//! `breachsim` — cyber-attack training simulator.
//!
//! Replays a fictional breach through a fixed attack progression,
//! emitting synthetic SIEM-style telemetry, optionally challenging the
//! analyst with blue-team decisions, and scoring the response across
//! eight dimensions.
//!
//! The library is usable without the CLI: drive an
//! [`sim::AttackStateMachine`] for the attack side and a
//! [`scoring::ScoringAccumulator`] plus [`scoring::ScoreCard`] for the
//! scoring side.

pub mod cli;
pub mod clock;
pub mod error;
pub mod observability;
pub mod scenario;
pub mod scoring;
pub mod sim;

pub use error::{BreachSimError, Result};
