//! Daemon error types.

use orbis_store::StoreError;
use orbis_sync::SyncError;
use thiserror::Error;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Refresh pipeline error
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Schema migration failed at startup
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or socket error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
