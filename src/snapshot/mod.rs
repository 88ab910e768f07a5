//! Pause/resume snapshots.
//!
//! A paused state packs exactly the data it needs to continue into a
//! [`Snapshot`]; the pausing coordinator holds it while the state is
//! inactive and hands it back on resume. Snapshots are moved, never
//! cloned, so one can not outlive its pause/resume cycle.

use crate::core::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::{type_name, Any};
use std::fmt;
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Descriptive, serializable part of a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Unique snapshot identifier
    pub id: Uuid,

    /// State that produced the snapshot
    pub origin: StateId,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    /// Rust type name of the payload
    pub payload_type: String,
}

/// Opaque value object carrying a state's progress across a pause.
///
/// # Example
///
/// ```rust
/// use quickdraw_core::core::StateId;
/// use quickdraw_core::snapshot::Snapshot;
///
/// #[derive(Debug, PartialEq)]
/// struct Progress {
///     step: u8,
/// }
///
/// let snapshot = Snapshot::new(StateId(4), Progress { step: 2 });
/// assert_eq!(snapshot.origin(), StateId(4));
/// assert_eq!(snapshot.downcast_ref::<Progress>(), Some(&Progress { step: 2 }));
///
/// let progress: Progress = snapshot.into_inner().unwrap();
/// assert_eq!(progress.step, 2);
/// ```
pub struct Snapshot {
    id: Uuid,
    origin: StateId,
    taken_at: DateTime<Utc>,
    payload_type: &'static str,
    payload: Box<dyn Any>,
}

impl Snapshot {
    pub fn new<T: Any>(origin: StateId, payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            taken_at: Utc::now(),
            payload_type: type_name::<T>(),
            payload: Box::new(payload),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn origin(&self) -> StateId {
        self.origin
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// Take the payload out, consuming the snapshot.
    pub fn into_inner<T: Any>(self) -> Result<T, SnapshotError> {
        let found = self.payload_type;
        self.payload
            .downcast::<T>()
            .map(|payload| *payload)
            .map_err(|_| SnapshotError::TypeMismatch {
                expected: type_name::<T>(),
                found,
            })
    }

    pub fn metadata(&self) -> SnapshotMetadata {
        SnapshotMetadata {
            id: self.id,
            origin: self.origin,
            taken_at: self.taken_at,
            payload_type: self.payload_type.to_string(),
        }
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("payload_type", &self.payload_type)
            .finish()
    }
}
