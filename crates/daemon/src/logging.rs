// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon log file: plain-text markers plus the tracing subscriber

use std::io::Write;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::lifecycle::LifecycleError;

/// Opens every daemon run in the log, ahead of any tracing output.
/// Full line: "--- twd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- twd: starting (pid: ";

pub fn write_startup_marker(log_path: &Path) -> Result<(), LifecycleError> {
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let line = format!("{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id());
    append_line(log_path, &line)?;
    Ok(())
}

/// Written directly: the non-blocking writer may not flush before exit
pub fn write_startup_error(log_path: &Path, error: &LifecycleError) {
    let _ = append_line(log_path, &format!("ERROR Failed to start daemon: {}", error));
}

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
/// Keep the guard alive until exit or buffered lines are lost.
pub fn init(log_path: &Path) -> Result<WorkerGuard, LifecycleError> {
    let dir = log_path.parent().ok_or(LifecycleError::NoStateDir)?;
    let file = log_path.file_name().ok_or(LifecycleError::NoStateDir)?;
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();

    Ok(guard)
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{}", line)
}
