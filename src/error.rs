//! Error types for `breachsim`.
//!
//! Aggregates per-domain error enums into a single top-level error with
//! a Unix exit-code mapping for the CLI.

use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `breachsim` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Content error (unknown scenario, invalid scenario data)
    pub const CONTENT_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Simulation error (progression exhausted, run interrupted)
    pub const SIMULATION_ERROR: i32 = 5;

    /// Usage error (invalid arguments)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `breachsim` operations.
#[derive(Debug, Error)]
pub enum BreachSimError {
    /// Scenario content loading or validation error
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Attack state machine error
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Scorecard persistence error
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BreachSimError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Content(_) | Self::Yaml(_) => ExitCode::CONTENT_ERROR,
            Self::Simulation(SimulationError::Interrupted) => ExitCode::INTERRUPTED,
            Self::Simulation(_) => ExitCode::SIMULATION_ERROR,
            Self::Persistence(_) | Self::Json(_) => ExitCode::ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Content Errors
// ============================================================================

/// Scenario content errors. Fatal for the run: a run must not start
/// against a scenario that failed to load or validate.
#[derive(Debug, Error)]
pub enum ContentError {
    /// No scenario with the requested id exists
    #[error("scenario not found: {id}")]
    ScenarioNotFound {
        /// The requested scenario id
        id: String,
    },

    /// Scenario has no stages
    #[error("scenario '{id}' has an empty stage list")]
    EmptyStages {
        /// The offending scenario id
        id: String,
    },

    /// Scenario file could not be parsed
    #[error("failed to parse scenario file {path}: {message}")]
    ParseError {
        /// Path to the scenario file
        path: String,
        /// Error message from the parser
        message: String,
    },
}

// ============================================================================
// Simulation Errors
// ============================================================================

/// Attack state machine errors.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// `advance()` was called after the terminal state was reached.
    /// This is a caller bug and must be reported, not swallowed.
    #[error("attack progression exhausted: already at terminal state")]
    ProgressionExhausted,

    /// The run was cancelled during a pacing sleep
    #[error("simulation run interrupted")]
    Interrupted,
}

// ============================================================================
// Persistence Errors
// ============================================================================

/// Scorecard storage errors. Recovered at the call site: a computed
/// scorecard is always returned to the caller even when saving fails.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Underlying storage I/O failed
    #[error("score store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be serialized or deserialized
    #[error("score store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type alias for `breachsim` operations.
pub type Result<T> = std::result::Result<T, BreachSimError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONTENT_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::SIMULATION_ERROR, 5);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_content_error_exit_code() {
        let err: BreachSimError = ContentError::ScenarioNotFound {
            id: "nope".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONTENT_ERROR);
    }

    #[test]
    fn test_progression_exhausted_exit_code() {
        let err: BreachSimError = SimulationError::ProgressionExhausted.into();
        assert_eq!(err.exit_code(), ExitCode::SIMULATION_ERROR);
    }

    #[test]
    fn test_interrupted_exit_code() {
        let err: BreachSimError = SimulationError::Interrupted.into();
        assert_eq!(err.exit_code(), ExitCode::INTERRUPTED);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: BreachSimError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_empty_stages_display() {
        let err = ContentError::EmptyStages {
            id: "ransomware_attack".to_string(),
        };
        assert!(err.to_string().contains("ransomware_attack"));
        assert!(err.to_string().contains("empty stage list"));
    }

    #[test]
    fn test_persistence_error_is_not_fatal_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BreachSimError = PersistenceError::from(io_err).into();
        assert_eq!(err.exit_code(), ExitCode::ERROR);
    }
}
