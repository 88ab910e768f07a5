//! State machine manager errors.

use crate::core::{MachineError, StateIndex};
use thiserror::Error;

/// Errors returned by [`StateMachineManager`](super::StateMachineManager).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("no default state machine registered")]
    NoDefaultMachine,

    #[error("a swapped game is already running")]
    AlreadySwapped,

    #[error("no swapped game is running")]
    NotSwapped,

    #[error("resume index {index} out of range (default machine has {len} states)")]
    InvalidResumeIndex { index: StateIndex, len: usize },

    #[error(transparent)]
    Machine(#[from] MachineError),
}
