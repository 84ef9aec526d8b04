//! File-based locking to prevent concurrent instances.
//!
//! Two daemons sharing one working directory would race on cache files and
//! the merged target, so each instance takes an advisory lock inside its
//! working directory before touching anything.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

const LOCK_FILE_NAME: &str = "oustdom.lock";

/// Holds an exclusive lock on a working directory.
/// The lock is automatically released when the guard is dropped.
pub struct LockGuard {
    _file: File,
}

impl LockGuard {
    /// Attempt to acquire an exclusive lock inside `dir`.
    /// Returns an error if another instance already holds it.
    ///
    /// Opened create+read+write without truncate so there is no window
    /// between file creation and lock acquisition.
    pub fn acquire(dir: &Path) -> Result<Self> {
        let lock_path = dir.join(LOCK_FILE_NAME);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

        file.try_lock_exclusive().map_err(|_| {
            anyhow::anyhow!(
                "another oustdom instance is already running in {}.\n\
                 Stop it, or point OUSTDOM_TEMP_DIR at a different directory.",
                dir.display()
            )
        })?;

        Ok(Self { _file: file })
    }
}

// Lock is automatically released when file is closed (on drop)

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_acquire_and_release() {
        let dir = TempDir::new().unwrap();

        let guard = LockGuard::acquire(dir.path()).unwrap();
        assert!(LockGuard::acquire(dir.path()).is_err());

        drop(guard);
        assert!(LockGuard::acquire(dir.path()).is_ok());
    }

    #[test]
    fn test_lock_different_dirs_are_independent() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();

        let _guard_a = LockGuard::acquire(dir_a.path()).unwrap();
        assert!(LockGuard::acquire(dir_b.path()).is_ok());
    }

    #[test]
    fn test_lock_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(LockGuard::acquire(&missing).is_err());
    }
}
