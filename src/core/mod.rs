//! Core state machine engine.
//!
//! This module contains the leaf engine every app on the device is built
//! from:
//! - the `State` lifecycle trait
//! - `Guard`/`Flag` predicates and `StateTransition`s
//! - the `StateMachine` that mounts, ticks and transitions states
//! - bounded transition history
//!
//! Everything here is single-threaded and run-to-completion: one `tick`
//! does a bounded amount of work and never blocks.

mod error;
mod guard;
mod history;
mod machine;
mod state;
mod transition;

pub(crate) use machine::StateSlot;

pub use error::MachineError;
pub use guard::{Flag, Guard};
pub use history::{
    StateHistory, TransitionCause, TransitionRecord, DEFAULT_HISTORY_CAPACITY,
};
pub use machine::{AppId, StateMachine};
pub use state::{State, StateId, StateIndex};
pub use transition::StateTransition;
