//! Snapshot error types.

use thiserror::Error;

/// Errors that can occur while exporting a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Serialization to JSON failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
}
