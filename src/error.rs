//! Error types for the sync engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while mirroring and syncing a remote tree.
///
/// Almost every variant is scoped to a single file or node. Callers log it and
/// move on; only listener setup and configuration errors are fatal.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote node could not be materialized (bad name, failed mkdir, failed write).
    #[error("Failed to materialize {path}: {reason}")]
    TreeWalk { path: String, reason: String },

    /// The bundler did not produce a usable artifact.
    #[error("Bundle failed: {0}")]
    Bundle(String),

    /// The duplex channel is gone or refused a message.
    #[error("Channel error: {0}")]
    Channel(String),

    /// A watched path vanished between notification and read.
    #[error("Path vanished before it could be read: {0}")]
    FilesystemRace(PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem notification setup failed.
    #[error("Watch error: {0}")]
    Watch(String),

    /// A channel payload could not be encoded or decoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}
