//! `breachsim` — cyber-attack training simulator CLI.

use clap::Parser;

use breachsim::cli::args::Cli;
use breachsim::cli::commands;
use breachsim::error::ExitCode;
use breachsim::observability::{LogFormat, init_logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Human
    };
    init_logging(format, cli.verbose, cli.quiet, cli.color);

    match commands::dispatch(cli).await {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
