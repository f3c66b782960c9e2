//! One process per session: advisory locking on the session's lock file.
//!
//! A run holds an exclusive non-blocking `flock(2)` on `<sessionId>.lock`
//! next to the state file for as long as it owns the session. The claim is
//! tied to the open descriptor, so the kernel releases it the moment the
//! process exits or the guard is dropped — a crashed run never wedges its
//! session, while a live concurrent run is refused up front with a pointer
//! to whoever holds it.

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::SessionStore;
use crate::validate::validate_session_id;

/// What the holding process recorded about itself; read back to build
/// contention errors.
#[derive(Debug, Serialize, Deserialize)]
struct LockHolder {
    pid: u32,
    acquired_at: DateTime<Utc>,
    reason: String,
}

/// Exclusive claim on one session, held for the life of a run.
///
/// Dropping the guard closes the descriptor and the flock goes with it;
/// there is no unlock call, and the lock file itself is never removed
/// (unlinking would let a concurrent acquirer lock a fresh inode while an
/// older claim is still live on the orphaned one).
#[derive(Debug)]
pub struct SessionLock {
    path: PathBuf,
    _file: File,
}

impl SessionLock {
    /// Claim `session_id` for this process, without blocking.
    ///
    /// On success the lock file carries this process's holder record. On
    /// contention the error names the holding pid and its reason.
    pub fn acquire(store: &SessionStore, session_id: &str, reason: &str) -> Result<Self> {
        validate_session_id(session_id)?;

        let path = store.lock_path(session_id);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create sessions dir: {}", dir.display()))?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        if !try_exclusive_flock(&file)? {
            bail!(describe_holder(session_id, &path));
        }

        record_holder(&mut file, reason)
            .with_context(|| format!("Failed to write lock holder record: {}", path.display()))?;
        debug!(session_id, reason, "session claimed");

        Ok(Self { path, _file: file })
    }

    pub fn lock_path(&self) -> &Path {
        &self.path
    }
}

/// Attempt an exclusive non-blocking flock. `Ok(false)` means another
/// process already holds the session.
fn try_exclusive_flock(file: &File) -> Result<bool> {
    // SAFETY: thin syscall wrapper; the descriptor stays open in `file`
    // for the duration of the call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }
    let errno = std::io::Error::last_os_error();
    if errno.raw_os_error() == Some(libc::EWOULDBLOCK) {
        return Ok(false);
    }
    Err(errno).context("flock on session lock file failed")
}

/// Replace the lock file's content with this process's holder record.
fn record_holder(file: &mut File, reason: &str) -> Result<()> {
    let holder = LockHolder {
        pid: std::process::id(),
        acquired_at: Utc::now(),
        reason: reason.to_string(),
    };
    file.set_len(0)?;
    file.rewind()?;
    serde_json::to_writer(&mut *file, &holder)?;
    file.flush()?;
    Ok(())
}

/// Best-effort description of whoever holds the session right now. An
/// unreadable or garbled record still yields a usable message.
fn describe_holder(session_id: &str, path: &Path) -> String {
    let holder = fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str::<LockHolder>(&text).ok());
    match holder {
        Some(h) => format!(
            "session {session_id} is already in use by process {} (since {}, reason: {})",
            h.pid, h.acquired_at, h.reason
        ),
        None => format!("session {session_id} is already in use (holder unknown)"),
    }
}
