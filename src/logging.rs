// src/logging.rs

//! Controller diagnostics on STDERR.
//!
//! The filter is chosen in this order:
//! 1. `--log-level` on the command line applies to every target;
//! 2. `OSA_LOG`, an `EnvFilter` directive string such as
//!    `info,osa_controller::exec=debug`;
//! 3. `info`.
//!
//! Output of the external tools never goes through `tracing`; it is appended
//! to the per-task log files in the run's log directory. Worker threads are
//! named `<task>-T<i>`, so their lines can be matched to those files.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "OSA_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(directive(level)),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
