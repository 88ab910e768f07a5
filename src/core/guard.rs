//! Guard predicates for controlling state transitions.
//!
//! Guards are boolean functions evaluated right after the mounted state's
//! `on_state_loop`, in the same tick. A state publishes its transition
//! conditions through [`Flag`]s; guards read them.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Shared boolean condition raised by a state and read by guards.
///
/// Clones share the same cell, so a state can keep one handle and give
/// another to the guard that watches it.
///
/// # Example
///
/// ```rust
/// use quickdraw_core::core::{Flag, Guard};
///
/// let ready = Flag::new();
/// let guard = Guard::from_flag(&ready);
///
/// assert!(!guard.check());
/// ready.raise();
/// assert!(guard.check());
/// ```
#[derive(Clone, Default)]
pub struct Flag(Rc<Cell<bool>>);

impl Flag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.set(true);
    }

    pub fn lower(&self) {
        self.0.set(false);
    }

    pub fn set(&self, value: bool) {
        self.0.set(value);
    }

    pub fn is_raised(&self) -> bool {
        self.0.get()
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Flag").field(&self.0.get()).finish()
    }
}

/// Predicate that determines if a transition can fire.
pub struct Guard {
    predicate: Box<dyn Fn() -> bool>,
}

impl Guard {
    /// Create a guard from a predicate closure.
    ///
    /// # Example
    ///
    /// ```rust
    /// use quickdraw_core::core::Guard;
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// let count = Rc::new(Cell::new(0));
    /// let watched = Rc::clone(&count);
    /// let guard = Guard::new(move || watched.get() >= 2);
    ///
    /// assert!(!guard.check());
    /// count.set(2);
    /// assert!(guard.check());
    /// ```
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Guard that passes while `flag` is raised.
    pub fn from_flag(flag: &Flag) -> Self {
        let flag = flag.clone();
        Guard::new(move || flag.is_raised())
    }

    /// Guard that always passes.
    pub fn always() -> Self {
        Guard::new(|| true)
    }

    /// Evaluate the predicate.
    pub fn check(&self) -> bool {
        (self.predicate)()
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard(..)")
    }
}
