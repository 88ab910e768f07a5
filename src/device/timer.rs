//! Polled timers and callback mailboxes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Deadline timer polled against the device clock.
///
/// Nothing fires asynchronously: `expired` compares the supplied `now`
/// with the deadline recorded by `set`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<u64>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)arm the timer to expire `duration_ms` after `now`.
    pub fn set(&mut self, now: u64, duration_ms: u64) {
        self.deadline = Some(now.saturating_add(duration_ms));
    }

    pub fn invalidate(&mut self) {
        self.deadline = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn expired(&self, now: u64) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn remaining(&self, now: u64) -> Option<u64> {
        self.deadline.map(|deadline| deadline.saturating_sub(now))
    }
}

/// Single-threaded FIFO shared between a callback and its owner.
///
/// Driver and packet callbacks only push here; the owning state drains
/// the queue on its next loop. This keeps callbacks from reaching back
/// into whatever invoked them.
#[derive(Debug)]
pub struct Mailbox<T> {
    queue: Rc<RefCell<VecDeque<T>>>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn push(&self, item: T) {
        self.queue.borrow_mut().push_back(item);
    }

    pub fn pop(&self) -> Option<T> {
        self.queue.borrow_mut().pop_front()
    }

    /// Take everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_expires_at_deadline() {
        let mut timer = Timer::new();
        assert!(!timer.expired(1_000));

        timer.set(100, 250);
        assert!(timer.is_running());
        assert!(!timer.expired(349));
        assert!(timer.expired(350));
        assert_eq!(timer.remaining(300), Some(50));

        timer.invalidate();
        assert!(!timer.expired(10_000));
        assert_eq!(timer.remaining(0), None);
    }

    #[test]
    fn mailbox_clones_share_queue() {
        let mailbox = Mailbox::new();
        let sender = mailbox.clone();
        sender.push(1);
        sender.push(2);

        assert_eq!(mailbox.len(), 2);
        assert_eq!(mailbox.pop(), Some(1));
        assert_eq!(mailbox.drain(), vec![2]);
        assert!(mailbox.is_empty());
    }
}
