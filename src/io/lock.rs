//! Cross-process write lock for a workspace.
//!
//! Write commands hold an exclusive `flock` on `.cubby/.lock` for as long as
//! they run, so two `cubby` processes never interleave read-modify-write
//! cycles on `projects.json` and `items.json`. Reads take no lock.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

pub const LOCK_FILE: &str = ".lock";

/// How long write commands wait for another process by default
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

const RETRY_EVERY: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("could not lock {path}: {source}")]
    Flock { path: PathBuf, source: io::Error },
    #[error("workspace is busy: another cubby process held {path} for over {waited:?}")]
    Busy { path: PathBuf, waited: Duration },
}

/// An exclusive lock on one workspace's store, released on drop.
///
/// The lock file stays on disk after release; only the flock comes and goes.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
    acquired: Instant,
}

impl StoreLock {
    /// Lock the store under `cubby_dir`, retrying until `wait` has passed.
    pub fn acquire(cubby_dir: &Path, wait: Duration) -> Result<Self, LockError> {
        let path = cubby_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let start = Instant::now();
        while !try_exclusive(&file).map_err(|source| LockError::Flock {
            path: path.clone(),
            source,
        })? {
            if start.elapsed() >= wait {
                tracing::warn!(path = %path.display(), "gave up waiting for store lock");
                return Err(LockError::Busy { path, waited: wait });
            }
            thread::sleep(RETRY_EVERY);
        }
        tracing::debug!(path = %path.display(), waited = ?start.elapsed(), "store lock taken");
        Ok(StoreLock {
            file,
            path,
            acquired: Instant::now(),
        })
    }

    pub fn acquire_default(cubby_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(cubby_dir, DEFAULT_WAIT)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        unlock(&self.file);
        tracing::debug!(held = ?self.acquired.elapsed(), "store lock released");
    }
}

/// `Ok(false)` when another process holds the lock.
#[cfg(unix)]
fn try_exclusive(file: &File) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(err)
    }
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::unix::io::AsRawFd;
    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
fn try_exclusive(_file: &File) -> io::Result<bool> {
    Ok(true)
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_is_reusable_after_drop() {
        let tmp = TempDir::new().unwrap();
        let lock = StoreLock::acquire_default(tmp.path()).unwrap();
        assert_eq!(lock.path(), tmp.path().join(LOCK_FILE));
        drop(lock);
        assert!(tmp.path().join(LOCK_FILE).is_file());
        assert!(StoreLock::acquire(tmp.path(), Duration::ZERO).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn second_writer_reports_busy() {
        let tmp = TempDir::new().unwrap();
        let _held = StoreLock::acquire_default(tmp.path()).unwrap();
        let second = StoreLock::acquire(tmp.path(), Duration::from_millis(50));
        match second {
            Err(LockError::Busy { waited, .. }) => assert_eq!(waited, Duration::from_millis(50)),
            other => panic!("expected Busy, got {other:?}"),
        }
    }

    #[test]
    fn missing_directory_is_an_open_error() {
        let tmp = TempDir::new().unwrap();
        let err = StoreLock::acquire_default(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, LockError::Open { .. }));
    }
}
