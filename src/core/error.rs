//! State machine runtime errors.

use super::state::StateIndex;
use thiserror::Error;

/// Errors returned by [`StateMachine`](super::StateMachine) operations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("state index {index} out of range (machine has {len} states)")]
    IndexOutOfRange { index: StateIndex, len: usize },

    #[error("state machine has been shut down")]
    Stopped,

    #[error("state machine has not been initialized")]
    NotInitialized,
}
