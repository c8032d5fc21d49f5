//! Logging initialization.
//!
//! Structured logging via `tracing`, written to stderr so scorecards and
//! decision prompts on stdout stay clean. `BREACHSIM_LOG_LEVEL` overrides
//! the `-v` verbosity mapping when set; `--quiet` drops everything below
//! errors regardless.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON for machine consumption.
    Json,
}

/// Resolves the `-v` count and `--quiet` to a tracing directive.
/// `--quiet` pins the filter to errors; otherwise 0 warn, 1 info,
/// 2 debug, 3+ trace.
#[must_use]
pub const fn effective_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initializes the global tracing subscriber.
///
/// `BREACHSIM_LOG_LEVEL` takes precedence over `verbosity` when set,
/// but `--quiet` beats both. Uses `try_init()` so repeated calls
/// (tests) are harmless.
pub fn init_logging(format: LogFormat, verbosity: u8, quiet: bool, color: ColorChoice) {
    let filter = if quiet {
        EnvFilter::new(effective_directive(verbosity, true))
    } else {
        EnvFilter::try_from_env("BREACHSIM_LOG_LEVEL")
            .unwrap_or_else(|_| EnvFilter::new(effective_directive(verbosity, false)))
    };

    // Module targets are noise below debug
    let show_target = verbosity >= 2 && !quiet;

    let use_ansi = match color {
        ColorChoice::Auto => {
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    match format {
        LogFormat::Human => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(use_ansi)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_human() {
        assert_eq!(LogFormat::default(), LogFormat::Human);
    }

    #[test]
    fn test_verbosity_mapping_saturates() {
        assert_eq!(effective_directive(0, false), "warn");
        assert_eq!(effective_directive(1, false), "info");
        assert_eq!(effective_directive(2, false), "debug");
        assert_eq!(effective_directive(3, false), "trace");
        assert_eq!(effective_directive(200, false), "trace");
    }

    #[test]
    fn test_quiet_beats_verbosity() {
        assert_eq!(effective_directive(0, true), "error");
        assert_eq!(effective_directive(3, true), "error");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(LogFormat::Human, 0, false, ColorChoice::Auto);
        init_logging(LogFormat::Json, 3, true, ColorChoice::Never);
    }
}
