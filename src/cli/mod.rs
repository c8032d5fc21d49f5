//! Command-line interface: argument parsing and subcommand dispatch.

pub mod args;
pub mod commands;

pub use args::Cli;
