//! Build errors for state machines.

use crate::core::{StateId, StateIndex};
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("No states defined. Add at least one state before .build()")]
    NoStates,

    #[error("Transition references unknown state index {index} ({count} states defined)")]
    UnknownState { index: StateIndex, count: usize },

    #[error("State id {0} is used by more than one state")]
    DuplicateStateId(StateId),
}
