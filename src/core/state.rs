//! The `State` lifecycle trait.
//!
//! A state is a unit of behaviour mounted by a [`StateMachine`](super::StateMachine).
//! While mounted it receives one `on_state_loop` call per cooperative tick;
//! mount and dismount always arrive in matching pairs.

use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identity of a state, unique within one state machine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct StateId(pub u32);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for StateId {
    fn from(id: u32) -> Self {
        StateId(id)
    }
}

/// Position of a state inside its machine's state map.
///
/// Independent of [`StateId`]; only `skip_to_state` and transition
/// targets address states by index.
pub type StateIndex = usize;

/// Lifecycle contract for every state.
///
/// `C` is the context handed to each hook, normally the device
/// capability surface. States never call each other; they expose their
/// transition conditions through [`Flag`](super::Flag)s read by guards.
///
/// # Example
///
/// ```rust
/// use quickdraw_core::core::{Flag, State, StateId};
///
/// struct Blink {
///     ticks: u32,
///     done: Flag,
/// }
///
/// impl State<Vec<&'static str>> for Blink {
///     fn state_id(&self) -> StateId {
///         StateId(1)
///     }
///
///     fn name(&self) -> &str {
///         "Blink"
///     }
///
///     fn on_state_loop(&mut self, log: &mut Vec<&'static str>) {
///         self.ticks += 1;
///         log.push("blink");
///         if self.ticks == 3 {
///             self.done.raise();
///         }
///     }
/// }
/// ```
pub trait State<C> {
    /// Identity of this state within its machine.
    fn state_id(&self) -> StateId;

    /// Human-readable name for logs and history.
    fn name(&self) -> &str;

    /// Called once each time the state becomes current.
    fn on_state_mounted(&mut self, _ctx: &mut C) {}

    /// Called once per tick while the state is current.
    ///
    /// Must return promptly: suspension only happens between ticks.
    fn on_state_loop(&mut self, _ctx: &mut C) {}

    /// Called once when the state stops being current.
    fn on_state_dismounted(&mut self, _ctx: &mut C) {}

    /// Capture private progress before the owning machine is paused.
    ///
    /// Default implementation keeps nothing.
    fn on_state_paused(&mut self, _ctx: &mut C) -> Option<Snapshot> {
        None
    }

    /// Restore progress captured by [`State::on_state_paused`].
    fn on_state_resumed(&mut self, _ctx: &mut C, _snapshot: Option<Snapshot>) {}

    /// Terminal states signal completion to an enclosing coordinator.
    fn is_terminal_state(&self) -> bool {
        false
    }
}
