// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tripwire Daemon (twd)
//!
//! Hosts the watch engine for one project and serves the management socket
//! until SIGTERM, SIGINT or a `Shutdown` request.
//!
//! Usage: `twd [project-dir]` (defaults to the current directory)

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lifecycle;
mod logging;
mod protocol;
mod server;

use std::path::PathBuf;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::lifecycle::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let project_root = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => std::env::current_dir()?,
    };
    let config = Config::for_project(&project_root)?;

    logging::write_startup_marker(&config.log_path)?;
    let _log_guard = logging::init(&config.log_path)?;

    info!(project = %config.project_root.display(), "Starting twd");

    let mut daemon = match lifecycle::startup(&config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            logging::write_startup_error(&config.log_path, &e);
            error!("Failed to start daemon: {}", e);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %config.socket_path.display(), "Daemon ready");
    // Parent processes (e.g. systemd) wait for this line
    println!("READY");

    loop {
        tokio::select! {
            result = daemon.listener.accept() => match result {
                Ok((stream, _)) => {
                    if let Err(e) = server::handle_connection(&mut daemon, stream).await {
                        error!("Connection error: {}", e);
                    }
                    if daemon.shutdown_requested {
                        info!("Shutdown requested, shutting down...");
                        break;
                    }
                }
                Err(e) => error!("Accept error: {}", e),
            },
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    let (delivered, failed) = daemon.delivery_counts();
    info!(delivered, failed, "Notifications this session");

    daemon.shutdown().await?;
    info!("Daemon stopped");
    Ok(())
}
