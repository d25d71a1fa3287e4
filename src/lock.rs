//! Cross-process lock held by mutating commands.
//!
//! The lock is an advisory `flock` on `<state path>.lock`. The file also
//! records who holds it so a second invocation can say why it is busy.
//! The OS drops the flock when the process exits, so a crash never leaves
//! a stale lock behind.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub command: String,
    pub started_at: DateTime<Utc>,
}

impl LockHolder {
    fn current(command: &str) -> Self {
        Self {
            pid: std::process::id(),
            command: command.to_string(),
            started_at: Utc::now(),
        }
    }

    fn summary(&self) -> String {
        format!(
            "pid {} running `tuffix {}` since {}",
            self.pid,
            self.command,
            self.started_at.format("%H:%M:%S")
        )
    }
}

/// Exclusive lock on the state file, released on drop.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

/// `/var/lib/tuffix/state.json` -> `/var/lib/tuffix/state.json.lock`
pub fn lock_path_for(state_path: &Path) -> PathBuf {
    let mut name = state_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

impl StateLock {
    /// Take the lock without waiting; a held lock is [`Error::Busy`].
    pub fn acquire(state_path: &Path, command: &str) -> Result<Self> {
        let path = lock_path_for(state_path);
        let io_err = |e| Error::io(format!("could not open lock file {}", path.display()), e);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;

        if file.try_lock_exclusive().is_err() {
            let holder = read_holder(&mut file).map(|h| h.summary());
            return Err(Error::Busy { path, holder });
        }

        let holder = LockHolder::current(command);
        let record = serde_json::to_string(&holder).unwrap_or_default();
        let write = |file: &mut File| -> std::io::Result<()> {
            file.set_len(0)?;
            file.rewind()?;
            file.write_all(record.as_bytes())
        };
        write(&mut file).map_err(io_err)?;

        log::debug!("Acquired {}", path.display());
        Ok(Self { file, path })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        let _ = FileExt::unlock(&self.file);
        log::debug!("Released {}", self.path.display());
    }
}

fn read_holder(file: &mut File) -> Option<LockHolder> {
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    serde_json::from_str(&content).ok()
}
