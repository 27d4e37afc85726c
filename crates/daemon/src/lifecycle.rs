// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start and stop the daemon: state layout, single-instance lock, engine
//! assembly and the management socket.

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use tokio::net::UnixListener;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};
use tw_adapters::LogNotifier;
use tw_core::{ConfigError, Domain, EngineConfig, SystemClock, UuidIdGen};
use tw_engine::{DomainRegistry, DomainStrategy, EngineDeps, EngineHandle, WatchEngine};
use tw_storage::{DeliveryStatus, StoreError, WalWatchStore};

/// Engine with the daemon's concrete clock and id generator
pub type DaemonEngine = WatchEngine<SystemClock, UuidIdGen>;

/// Project configuration file, read from the project root
pub const CONFIG_FILE: &str = "tripwire.toml";

/// Where one project's daemon keeps its files.
///
/// Everything except `config_path` lives under
/// `<state>/projects/<hash>/`, so two checkouts never share a lock or a log.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_root: PathBuf,
    /// `tripwire.toml` in the project root (optional)
    pub config_path: PathBuf,
    /// Management socket, bound while the daemon runs
    pub socket_path: PathBuf,
    /// Holds the pid; locked exclusively while the daemon runs
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
    /// Watch write-ahead log
    pub wal_path: PathBuf,
}

impl Config {
    pub fn for_project(project_root: &Path) -> Result<Self, LifecycleError> {
        let root = project_root
            .canonicalize()
            .map_err(|e| LifecycleError::ProjectNotFound(project_root.to_path_buf(), e))?;
        Ok(Self::in_state_dir(root, &state_dir()?))
    }

    /// Layout for an already-canonical project root under `state_dir`
    pub fn in_state_dir(project_root: PathBuf, state_dir: &Path) -> Self {
        let dir = state_dir.join("projects").join(project_hash(&project_root));
        Self {
            config_path: project_root.join(CONFIG_FILE),
            project_root,
            socket_path: dir.join("daemon.sock"),
            lock_path: dir.join("daemon.pid"),
            version_path: dir.join("daemon.version"),
            log_path: dir.join("daemon.log"),
            wal_path: dir.join("wal").join("watches.wal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Project not found at {0}: {1}")]
    ProjectNotFound(PathBuf, std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Another twd already holds the lock")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive lock on the pid file plus the version marker next to it.
/// The OS lock goes away with the file handle.
struct PidLock {
    _file: File,
    pid_path: PathBuf,
    version_path: PathBuf,
}

impl PidLock {
    fn acquire(config: &Config) -> Result<Self, LifecycleError> {
        // Opened without truncation: a losing daemon must not wipe the winner's pid
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&config.lock_path)?;
        file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

        Ok(Self {
            _file: file,
            pid_path: config.lock_path.clone(),
            version_path: config.version_path.clone(),
        })
    }

    fn release(self) {
        remove_if_present(&self.version_path, "version file");
        remove_if_present(&self.pid_path, "pid file");
    }
}

/// A running daemon
pub struct Daemon {
    pub config: Config,
    pub engine: DaemonEngine,
    pub listener: UnixListener,
    handle: EngineHandle,
    lock: PidLock,
    pub start_time: Instant,
    /// Set by a `Shutdown` request; the main loop exits once it is seen
    pub shutdown_requested: bool,
}

impl Daemon {
    /// Delivered and failed notifications still in the delivery log
    pub fn delivery_counts(&self) -> (usize, usize) {
        let records = self.engine.deliveries().recent(usize::MAX);
        records
            .iter()
            .fold((0, 0), |(ok, bad), record| match record.outcome {
                DeliveryStatus::Delivered => (ok + 1, bad),
                DeliveryStatus::Failed { .. } => (ok, bad + 1),
            })
    }

    /// Stop accepting requests, stop tickers and maintenance (in-flight
    /// ticks finish), then release the lock.
    pub async fn shutdown(self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");
        drop(self.listener);
        remove_if_present(&self.config.socket_path, "socket");
        self.handle.shutdown().await;
        self.lock.release();
        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "Daemon shutdown complete"
        );
        Ok(())
    }
}

/// Start the daemon. Must be called from within a tokio runtime.
///
/// On failure, files this attempt created are removed again, unless the
/// failure was losing the lock: those files belong to the running daemon.
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    if let Some(dir) = config.lock_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let lock = PidLock::acquire(config)?;

    let (engine, listener) = match build_engine(config).and_then(|e| Ok((e, bind(config)?))) {
        Ok(built) => built,
        Err(e) => {
            lock.release();
            return Err(e);
        }
    };

    let handle = engine.start();
    info!(
        project = %config.project_root.display(),
        socket = %config.socket_path.display(),
        "Daemon started"
    );
    Ok(Daemon {
        config: config.clone(),
        engine,
        listener,
        handle,
        lock,
        start_time: Instant::now(),
        shutdown_requested: false,
    })
}

/// Bound last, once everything else is known to be valid. The lock is held,
/// so a socket file already present is left over from a crashed run.
fn bind(config: &Config) -> Result<UnixListener, LifecycleError> {
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))
}

fn build_engine(config: &Config) -> Result<DaemonEngine, LifecycleError> {
    // Settings first so a bad file fails before the log is touched
    let settings = EngineConfig::load(&config.config_path)?;
    settings.validate()?;

    let store = WalWatchStore::open(&config.wal_path)?;
    store.compact()?;

    let mut registry = DomainRegistry::new();
    registry.register(Domain::reminder(), DomainStrategy::reminder(SystemClock));

    Ok(WatchEngine::new(
        settings,
        registry,
        EngineDeps {
            store: Arc::new(store),
            notifier: Arc::new(LogNotifier),
            clock: SystemClock,
            id_gen: UuidIdGen,
        },
    ))
}

fn remove_if_present(path: &Path, what: &str) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed {}", what),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", what, e),
    }
}

/// `$XDG_STATE_HOME/tripwire`, else `~/.local/state/tripwire`
fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Some(xdg) = std::env::var_os("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("tripwire"));
    }
    let home = std::env::var_os("HOME").ok_or(LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/tripwire"))
}

/// First 8 bytes of the SHA-256 of the project path, as hex
fn project_hash(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    digest[..8].iter().fold(String::with_capacity(16), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
