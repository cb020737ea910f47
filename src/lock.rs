//! Advisory run lock guaranteeing at most one concurrent invocation.
//!
//! Acquisition is an atomic check-and-create of the lock file; holding is
//! tied to the guard's lifetime, not to a recorded PID. A crash can leave the
//! file behind, in which case the operator removes it after confirming no run
//! is active.

use std::error::Error;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Guard for the run lock; releases the lock when dropped.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

/// Failures acquiring the run lock.
#[derive(Debug)]
pub enum LockError {
    /// Another invocation holds the lock.
    Held {
        /// Lock file location.
        path: PathBuf,
    },
    /// The lock file could not be created.
    Io {
        /// Lock file location.
        path: PathBuf,
        /// Underlying filesystem error.
        source: std::io::Error,
    },
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Held { path } => write!(
                f,
                "another run holds the lock at {} (remove it if no run is active)",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "failed to create lock {}: {source}", path.display())
            }
        }
    }
}

impl Error for LockError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Held { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl RunLock {
    /// Acquires the lock at `path`, failing immediately if it is held.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self, LockError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| LockError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
        }

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Acquisition timestamp is diagnostic only; liveness is never
                // inferred from the file contents.
                let _ = writeln!(file, "acquired {}", chrono::Local::now().to_rfc3339());
                Ok(Self { path })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(LockError::Held { path })
            }
            Err(source) => Err(LockError::Io { path, source }),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
