//! State transitions: a guard plus the index of the state it leads to.

use super::guard::{Flag, Guard};
use super::state::StateIndex;

/// A (guard, target) pair attached to a state.
///
/// Immutable once built. Insertion order on the owning state defines
/// priority: the first transition whose guard passes wins the tick.
#[derive(Debug)]
pub struct StateTransition {
    guard: Guard,
    target: StateIndex,
}

impl StateTransition {
    pub fn new(guard: Guard, target: StateIndex) -> Self {
        Self { guard, target }
    }

    /// Transition that fires while `flag` is raised.
    pub fn on_flag(flag: &Flag, target: StateIndex) -> Self {
        Self::new(Guard::from_flag(flag), target)
    }

    pub fn is_condition_met(&self) -> bool {
        self.guard.check()
    }

    pub fn target(&self) -> StateIndex {
        self.target
    }
}

/// First transition in `transitions` whose guard passes.
///
/// Later guards are not evaluated once one passes. Returns the
/// transition's position and its target.
pub(crate) fn first_match(transitions: &[StateTransition]) -> Option<(usize, StateIndex)> {
    transitions
        .iter()
        .enumerate()
        .find(|(_, t)| t.is_condition_met())
        .map(|(position, t)| (position, t.target))
}
