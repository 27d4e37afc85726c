// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable storage
//!
//! One JSON object per line: `{"seq": 3, "op": {"type": "deactivate", ...}}`.
//! Every append ends with a newline, so trailing bytes without one are a
//! write torn by a crash; replay ignores them and `open` truncates them.

use crate::operation::WatchOp;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write-ahead log for durable operation storage
pub struct Wal {
    path: PathBuf,
    file: File,
    sequence: u64,
}

/// Length of the newline-terminated prefix
fn complete_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |i| i + 1)
}

fn read_complete(path: &Path) -> Result<String, WalError> {
    let mut bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => return Err(e.into()),
    };
    let complete = complete_len(&bytes);
    if complete < bytes.len() {
        tracing::warn!(
            path = %path.display(),
            bytes = bytes.len() - complete,
            "ignoring torn WAL tail"
        );
        bytes.truncate(complete);
    }
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

impl Wal {
    /// Open or create a WAL at the given path
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let contents = read_complete(path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;
        if file.metadata()?.len() > contents.len() as u64 {
            file.set_len(contents.len() as u64)?;
        }

        // Count existing entries to set sequence number
        let sequence = contents.lines().filter(|l| !l.trim().is_empty()).count() as u64;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sequence,
        })
    }

    /// Append an operation to the log
    pub fn append(&mut self, op: &WatchOp) -> Result<u64, WalError> {
        let entry = WalEntry {
            seq: self.sequence + 1,
            op: op.clone(),
        };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        self.sequence += 1;
        Ok(self.sequence)
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay all operations from the log
    pub fn replay(path: &Path) -> Result<Vec<WatchOp>, WalError> {
        let contents = read_complete(path)?;
        let mut ops = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: WalEntry = serde_json::from_str(line)?;
            ops.push(entry.op);
        }
        Ok(ops)
    }

    /// Atomically replace the log at `path` with `ops`, then reopen it
    pub fn rewrite(path: &Path, ops: &[WatchOp]) -> Result<Self, WalError> {
        let tmp = path.with_extension("wal.tmp");
        {
            let mut file = File::create(&tmp)?;
            for (i, op) in ops.iter().enumerate() {
                let entry = WalEntry {
                    seq: i as u64 + 1,
                    op: op.clone(),
                };
                writeln!(file, "{}", serde_json::to_string(&entry)?)?;
            }
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Self::open(path)
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct WalEntry {
    seq: u64,
    op: WatchOp,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
