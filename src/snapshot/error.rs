//! Snapshot error types.

use thiserror::Error;

/// Errors that can occur when unpacking a snapshot
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// The snapshot holds a different payload type than requested
    #[error("Snapshot payload is {found}, expected {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}
