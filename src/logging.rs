//! Process-wide log setup.
//!
//! Log lines carry a timestamp, the level, the thread name, and the fields of
//! the enclosing span. Workers run inside a `worker` span holding the process
//! id and partition name, so every line they emit can be traced back to its
//! partition.
//!
//! ```text
//! 2026-10-18T09:12:44.120Z  INFO drugbatch-worker-2 worker{pid=4121 worker=worker2}: dispatching batch size=20 first="阿司匹林" last="布洛芬"
//! ```

use crate::config::LoggingSettings;
use anyhow::{Context, Result, anyhow};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber described by `settings`.
///
/// `RUST_LOG` takes precedence over `settings.level`. The log file is opened
/// in append mode so repeated runs accumulate into one file.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_lowercase()));

    if settings.file.trim().is_empty() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_thread_names(true)
                    .with_target(false),
            )
            .try_init()
            .map_err(|e| anyhow!("logging already initialized: {e}"))?;
        return Ok(());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.file)
        .with_context(|| format!("open log file {}", settings.file))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_thread_names(true)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| anyhow!("logging already initialized: {e}"))?;

    Ok(())
}
