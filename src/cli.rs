// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `osa-controller`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "osa-controller",
    version,
    about = "Run the C/C++ static analysis pipeline as a dependency-ordered set of tasks.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `osa.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "osa.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `OSA_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Override `[run].max_threads` (0 = number of CPU cores).
    #[arg(long, value_name = "N")]
    pub max_threads: Option<usize>,

    /// Override `[run].fault_tolerant`.
    #[arg(long, value_name = "BOOL")]
    pub fault_tolerant: Option<bool>,

    /// Override `[project].current_date` (name of the timestamped result dir).
    #[arg(long, value_name = "DATE")]
    pub current_date: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
