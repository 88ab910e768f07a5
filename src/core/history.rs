//! State change history.
//!
//! Every mount performed by a state machine is recorded so that the
//! simulator and tests can inspect the path a machine took.

use super::state::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of records retained per machine.
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Why a state was mounted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    /// First mount after `initialize`.
    Initial,
    /// The guard at this position on the previous state passed.
    Guard(usize),
    /// Forced by `skip_to_state`.
    Skip,
}

/// Record of a single state change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The state being left, `None` on the initial mount.
    pub from: Option<StateId>,
    /// The state being mounted
    pub to: StateId,
    pub cause: TransitionCause,
    /// When the change occurred
    pub timestamp: DateTime<Utc>,
}

/// Bounded, ordered history of state changes.
///
/// Oldest records are discarded once `capacity` is reached.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use quickdraw_core::core::{StateHistory, StateId, TransitionCause, TransitionRecord};
///
/// let mut history = StateHistory::with_capacity(8);
/// history.record(TransitionRecord {
///     from: None,
///     to: StateId(0),
///     cause: TransitionCause::Initial,
///     timestamp: Utc::now(),
/// });
/// history.record(TransitionRecord {
///     from: Some(StateId(0)),
///     to: StateId(1),
///     cause: TransitionCause::Guard(0),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec![StateId(0), StateId(1)]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory {
    capacity: usize,
    records: VecDeque<TransitionRecord>,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl StateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Append a record, evicting the oldest one when full.
    pub fn record(&mut self, record: TransitionRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// States traversed, oldest first.
    ///
    /// Starts with the `from` of the oldest retained record (when it has
    /// one), followed by the `to` of every record.
    pub fn get_path(&self) -> Vec<StateId> {
        let mut path = Vec::with_capacity(self.records.len() + 1);
        if let Some(from) = self.records.front().and_then(|r| r.from) {
            path.push(from);
        }
        path.extend(self.records.iter().map(|r| r.to));
        path
    }

    /// Wall-clock time between the oldest and newest retained record.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.records.front()?, self.records.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
