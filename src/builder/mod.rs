//! Builder API for state machine construction.
//!
//! States are added in order (the first one is initial) and transitions
//! are attached by index. `build` validates the wiring before handing
//! back a [`StateMachine`](crate::core::StateMachine).

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
