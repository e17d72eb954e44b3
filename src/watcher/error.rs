//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur while installing or running a watch.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// The directory a watch would attach to does not exist.
    #[error("Watch target missing: {0}")]
    MissingTarget(PathBuf),

    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
