//! CLI argument definitions.
//!
//! All Clap derive structs for `breachsim` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::scoring::Difficulty;

// ============================================================================
// Root CLI
// ============================================================================

/// Cyber-attack training simulator with blue-team scoring.
#[derive(Parser, Debug)]
#[command(name = "breachsim", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as newline-delimited JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "BREACHSIM_COLOR")]
    pub color: ColorChoice,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an attack simulation.
    Run(RunArgs),

    /// List available scenarios.
    Scenarios(ScenariosArgs),

    /// Show the leaderboard of saved runs.
    Leaderboard(LeaderboardArgs),
}

/// Arguments for `breachsim run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario id to run (see `breachsim scenarios`).
    pub scenario: String,

    /// Pacing speed multiplier (2.0 = twice as fast).
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Enable blue-team decision challenges at each attack stage.
    #[arg(long)]
    pub blue_team: bool,

    /// Difficulty preset (scales XP earned). Defaults to the scenario's
    /// own difficulty rating.
    #[arg(long, value_enum)]
    pub difficulty: Option<Difficulty>,

    /// Seed for deterministic event generation.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for per-run JSONL event logs.
    #[arg(long, env = "BREACHSIM_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Scorecard store file.
    #[arg(
        long,
        env = "BREACHSIM_SCORES",
        default_value = ".scores/breachsim.json"
    )]
    pub scores: PathBuf,

    /// Compute the scorecard but do not save it.
    #[arg(long)]
    pub no_save: bool,

    /// Disable pacing delays (events emit back to back).
    #[arg(long)]
    pub no_pacing: bool,

    /// Load scenarios from a directory instead of the built-in library.
    #[arg(long, env = "BREACHSIM_CONTENT_DIR")]
    pub content_dir: Option<PathBuf>,
}

/// Arguments for `breachsim scenarios`.
#[derive(Args, Debug)]
pub struct ScenariosArgs {
    /// Filter by severity tag (low, medium, high, critical).
    #[arg(long)]
    pub severity: Option<String>,

    /// Filter by category tag.
    #[arg(long)]
    pub category: Option<String>,

    /// Load scenarios from a directory instead of the built-in library.
    #[arg(long, env = "BREACHSIM_CONTENT_DIR")]
    pub content_dir: Option<PathBuf>,
}

/// Arguments for `breachsim leaderboard`.
#[derive(Args, Debug)]
pub struct LeaderboardArgs {
    /// Restrict to one scenario id.
    #[arg(long)]
    pub scenario: Option<String>,

    /// Number of entries to show.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Scorecard store file.
    #[arg(
        long,
        env = "BREACHSIM_SCORES",
        default_value = ".scores/breachsim.json"
    )]
    pub scores: PathBuf,
}

// ============================================================================
// Value Enums
// ============================================================================

/// Color output control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["breachsim", "run", "ransomware_attack"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.scenario, "ransomware_attack");
        assert!((args.speed - 1.0).abs() < f64::EPSILON);
        assert!(!args.blue_team);
        // No preset on the command line: the run derives one from the
        // scenario's own rating
        assert_eq!(args.difficulty, None);
        assert_eq!(args.seed, None);
        assert!(!args.no_pacing);
    }

    #[test]
    fn test_run_full_flags() {
        let cli = Cli::try_parse_from([
            "breachsim",
            "run",
            "phishing_lateral_movement",
            "--speed",
            "4.0",
            "--blue-team",
            "--difficulty",
            "expert",
            "--seed",
            "42",
            "--no-pacing",
            "--log-dir",
            "/tmp/logs",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.blue_team);
        assert_eq!(args.difficulty, Some(Difficulty::Expert));
        assert_eq!(args.seed, Some(42));
        assert!(args.no_pacing);
        assert_eq!(args.log_dir.unwrap(), PathBuf::from("/tmp/logs"));
    }

    #[test]
    fn test_run_requires_scenario() {
        assert!(Cli::try_parse_from(["breachsim", "run"]).is_err());
    }

    #[test]
    fn test_verbose_count() {
        let cli = Cli::try_parse_from(["breachsim", "-vvv", "scenarios"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_leaderboard_defaults() {
        let cli = Cli::try_parse_from(["breachsim", "leaderboard"]).unwrap();
        let Commands::Leaderboard(args) = cli.command else {
            panic!("expected leaderboard command");
        };
        assert_eq!(args.limit, 10);
        assert!(args.scenario.is_none());
    }
}
