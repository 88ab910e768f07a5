//! The state machine execution engine.

use super::error::MachineError;
use super::history::{StateHistory, TransitionCause, TransitionRecord};
use super::state::{State, StateId, StateIndex};
use super::transition::{first_match, StateTransition};
use crate::snapshot::Snapshot;
use chrono::Utc;
use tracing::{debug, warn};

/// Identifier of the app a machine implements (handshake, minigame, ...).
pub type AppId = u32;

pub(crate) struct StateSlot<C> {
    pub(crate) state: Box<dyn State<C>>,
    pub(crate) transitions: Vec<StateTransition>,
}

/// Owns an ordered set of states and drives the mounted one.
///
/// Index 0 is the initial state. Build one with
/// [`StateMachineBuilder`](crate::builder::StateMachineBuilder).
///
/// Each [`tick`](StateMachine::tick) runs the mounted state's
/// `on_state_loop`, then evaluates that state's transitions in insertion
/// order and fires the first one whose guard passes: dismount, reassign,
/// mount, all within the same tick. If nothing fires the state simply
/// stays mounted.
pub struct StateMachine<C> {
    app_id: AppId,
    slots: Vec<StateSlot<C>>,
    current: Option<StateIndex>,
    history: StateHistory,
    launched: bool,
    paused: bool,
    stopped: bool,
}

impl<C> StateMachine<C> {
    pub(crate) fn from_slots(app_id: AppId, slots: Vec<StateSlot<C>>, history: StateHistory) -> Self {
        Self {
            app_id,
            slots,
            current: None,
            history,
            launched: false,
            paused: false,
            stopped: false,
        }
    }

    /// Mount the initial state (index 0).
    ///
    /// Re-initializing a running machine dismounts the current state first.
    pub fn initialize(&mut self, ctx: &mut C) -> Result<(), MachineError> {
        if self.stopped {
            return Err(MachineError::Stopped);
        }
        if self.slots.is_empty() {
            return Err(MachineError::IndexOutOfRange { index: 0, len: 0 });
        }
        let cause = if self.current.is_some() {
            TransitionCause::Skip
        } else {
            TransitionCause::Initial
        };
        self.change_state(ctx, 0, cause);
        self.launched = true;
        self.paused = false;
        Ok(())
    }

    /// Advance the mounted state by one tick.
    ///
    /// Returns the index of the newly mounted state when a transition fired.
    pub fn tick(&mut self, ctx: &mut C) -> Option<StateIndex> {
        if self.stopped || self.paused {
            return None;
        }
        let index = self.current?;

        self.slots[index].state.on_state_loop(ctx);

        let (position, target) = first_match(&self.slots[index].transitions)?;
        self.change_state(ctx, target, TransitionCause::Guard(position));
        Some(target)
    }

    /// Force the state at `index` to be mounted, ignoring all guards.
    ///
    /// Always performs a full dismount/mount cycle, even when `index` is
    /// already current. Clears the paused flag.
    pub fn skip_to_state(&mut self, ctx: &mut C, index: StateIndex) -> Result<(), MachineError> {
        if self.stopped {
            return Err(MachineError::Stopped);
        }
        if index >= self.slots.len() {
            return Err(MachineError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            });
        }
        self.change_state(ctx, index, TransitionCause::Skip);
        self.launched = true;
        self.paused = false;
        Ok(())
    }

    /// Ask the mounted state for a snapshot and stop ticking.
    ///
    /// The state stays mounted; it is dismounted by the next
    /// `skip_to_state` or `shutdown`.
    pub fn pause(&mut self, ctx: &mut C) -> Result<Option<Snapshot>, MachineError> {
        if self.stopped {
            return Err(MachineError::Stopped);
        }
        let index = self.current.ok_or(MachineError::NotInitialized)?;
        let snapshot = self.slots[index].state.on_state_paused(ctx);
        self.paused = true;
        debug!(app = self.app_id, state = %self.slots[index].state.state_id(), "machine paused");
        Ok(snapshot)
    }

    /// Hand a snapshot to the mounted state and resume ticking.
    pub fn resume(&mut self, ctx: &mut C, snapshot: Option<Snapshot>) -> Result<(), MachineError> {
        if self.stopped {
            return Err(MachineError::Stopped);
        }
        let index = self.current.ok_or(MachineError::NotInitialized)?;
        self.slots[index].state.on_state_resumed(ctx, snapshot);
        self.paused = false;
        Ok(())
    }

    /// Dismount the current state and refuse further work.
    pub fn shutdown(&mut self, ctx: &mut C) {
        if self.stopped {
            return;
        }
        if let Some(index) = self.current.take() {
            self.slots[index].state.on_state_dismounted(ctx);
        }
        self.stopped = true;
        self.paused = false;
        debug!(app = self.app_id, "machine shut down");
    }

    fn change_state(&mut self, ctx: &mut C, target: StateIndex, cause: TransitionCause) {
        let from = self.current.map(|index| {
            let slot = &mut self.slots[index];
            slot.state.on_state_dismounted(ctx);
            slot.state.state_id()
        });

        self.current = Some(target);
        let to = self.slots[target].state.state_id();
        debug!(
            app = self.app_id,
            from = ?from,
            to = %to,
            state = self.slots[target].state.name(),
            cause = ?cause,
            "mounting state"
        );
        self.history.record(TransitionRecord {
            from,
            to,
            cause,
            timestamp: Utc::now(),
        });

        self.slots[target].state.on_state_mounted(ctx);
    }

    pub fn app_id(&self) -> AppId {
        self.app_id
    }

    pub fn current_index(&self) -> Option<StateIndex> {
        self.current
    }

    pub fn current_state(&self) -> Option<&dyn State<C>> {
        self.current.map(|index| self.slots[index].state.as_ref())
    }

    pub fn current_state_id(&self) -> Option<StateId> {
        self.current_state().map(|state| state.state_id())
    }

    /// True when the mounted state is terminal.
    pub fn is_finished(&self) -> bool {
        self.current_state().is_some_and(|state| state.is_terminal_state())
    }

    pub fn has_launched(&self) -> bool {
        self.launched
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn state(&self, index: StateIndex) -> Option<&dyn State<C>> {
        self.slots.get(index).map(|slot| slot.state.as_ref())
    }

    /// Outgoing transitions of the state at `index`, in priority order.
    pub fn transitions_of(&self, index: StateIndex) -> &[StateTransition] {
        self.slots
            .get(index)
            .map(|slot| slot.transitions.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_of(&self, id: StateId) -> Option<StateIndex> {
        self.slots.iter().position(|slot| slot.state.state_id() == id)
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }
}

impl<C> Drop for StateMachine<C> {
    fn drop(&mut self) {
        if let Some(index) = self.current {
            warn!(
                app = self.app_id,
                state = %self.slots[index].state.state_id(),
                "state machine dropped without shutdown; state left mounted"
            );
        }
    }
}
