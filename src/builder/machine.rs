//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::core::{
    AppId, State, StateHistory, StateIndex, StateMachine, StateSlot, StateTransition,
    DEFAULT_HISTORY_CAPACITY,
};
use std::collections::HashSet;

/// Builder that assembles states and their transitions.
///
/// States are addressed by the index returned from
/// [`add_state`](StateMachineBuilder::add_state); the first state added is
/// the initial one. Transitions are kept in the order they are added.
pub struct StateMachineBuilder<C> {
    app_id: AppId,
    states: Vec<Box<dyn State<C>>>,
    transitions: Vec<(StateIndex, StateTransition)>,
    history_capacity: usize,
}

impl<C> StateMachineBuilder<C> {
    /// Create a new builder for the app `app_id`.
    pub fn new(app_id: AppId) -> Self {
        Self {
            app_id,
            states: Vec::new(),
            transitions: Vec::new(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Add a state, returning its index.
    pub fn add_state<S>(&mut self, state: S) -> StateIndex
    where
        S: State<C> + 'static,
    {
        self.add_boxed_state(Box::new(state))
    }

    pub fn add_boxed_state(&mut self, state: Box<dyn State<C>>) -> StateIndex {
        self.states.push(state);
        self.states.len() - 1
    }

    /// Append a transition to the state at `from`.
    pub fn add_transition(&mut self, from: StateIndex, transition: StateTransition) {
        self.transitions.push((from, transition));
    }

    /// Number of transition records retained by the machine.
    pub fn history_capacity(&mut self, capacity: usize) -> &mut Self {
        self.history_capacity = capacity;
        self
    }

    /// Build the state machine.
    ///
    /// Fails if no state was added, a transition endpoint does not exist,
    /// or two states share an id.
    pub fn build(self) -> Result<StateMachine<C>, BuildError> {
        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }

        let mut seen = HashSet::new();
        for state in &self.states {
            if !seen.insert(state.state_id()) {
                return Err(BuildError::DuplicateStateId(state.state_id()));
            }
        }

        let count = self.states.len();
        let mut slots: Vec<StateSlot<C>> = self
            .states
            .into_iter()
            .map(|state| StateSlot {
                state,
                transitions: Vec::new(),
            })
            .collect();

        for (from, transition) in self.transitions {
            for index in [from, transition.target()] {
                if index >= count {
                    return Err(BuildError::UnknownState { index, count });
                }
            }
            slots[from].transitions.push(transition);
        }

        Ok(StateMachine::from_slots(
            self.app_id,
            slots,
            StateHistory::with_capacity(self.history_capacity),
        ))
    }
}
