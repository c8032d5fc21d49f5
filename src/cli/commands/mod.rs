//! Subcommand implementations and dispatch.

pub mod leaderboard;
pub mod run;
pub mod scenarios;

use crate::cli::args::{Cli, Commands};
use crate::error::Result;

/// Routes a parsed CLI invocation to its command handler.
///
/// # Errors
///
/// Propagates the command's error for exit-code mapping in `main`.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Scenarios(args) => scenarios::execute(&args),
        Commands::Leaderboard(args) => leaderboard::execute(&args),
    }
}
