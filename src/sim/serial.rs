//! Simulated serial jacks and the cable that joins them.

use crate::device::{encode_line, SerialDriver, LINE_END, LINE_START};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Default)]
struct JackInner {
    inbox: Vec<u8>,
    written: Vec<u8>,
    link: Option<Weak<RefCell<JackInner>>>,
}

/// One simulated serial jack. Clones share the same port.
#[derive(Clone, Debug, Default)]
pub struct SimJack {
    inner: Rc<RefCell<JackInner>>,
}

impl SimJack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes arrive as if sent from the far end.
    pub fn inject(&self, bytes: &[u8]) {
        self.inner.borrow_mut().inbox.extend_from_slice(bytes);
    }

    pub fn inject_line(&self, payload: &str) {
        self.inject(&encode_line(payload));
    }

    /// Payloads of every complete line this jack has written.
    pub fn written_lines(&self) -> Vec<String> {
        let inner = self.inner.borrow();
        let mut lines = Vec::new();
        let mut current: Option<Vec<u8>> = None;
        for &byte in &inner.written {
            match byte {
                LINE_START => current = Some(Vec::new()),
                LINE_END => {
                    if let Some(line) = current.take() {
                        lines.push(String::from_utf8_lossy(&line).into_owned());
                    }
                }
                _ => {
                    if let Some(line) = current.as_mut() {
                        line.push(byte);
                    }
                }
            }
        }
        lines
    }

    pub fn clear_written(&self) {
        self.inner.borrow_mut().written.clear();
    }

    pub fn is_plugged(&self) -> bool {
        self.inner
            .borrow()
            .link
            .as_ref()
            .is_some_and(|link| link.strong_count() > 0)
    }
}

impl SerialDriver for SimJack {
    fn write_bytes(&mut self, data: &[u8]) {
        let link = {
            let mut inner = self.inner.borrow_mut();
            inner.written.extend_from_slice(data);
            inner.link.as_ref().and_then(Weak::upgrade)
        };
        if let Some(peer) = link {
            peer.borrow_mut().inbox.extend_from_slice(data);
        }
    }

    fn read_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.inner.borrow_mut().inbox)
    }
}

/// Cable joining one device's OUTPUT jack to another's INPUT jack.
///
/// Stays plugged until [`unplug`](SerialCable::unplug) is called.
#[derive(Debug)]
pub struct SerialCable {
    output: SimJack,
    input: SimJack,
}

impl SerialCable {
    pub fn plug(output: &SimJack, input: &SimJack) -> Self {
        output.inner.borrow_mut().link = Some(Rc::downgrade(&input.inner));
        input.inner.borrow_mut().link = Some(Rc::downgrade(&output.inner));
        Self {
            output: output.clone(),
            input: input.clone(),
        }
    }

    /// Pull the cable. Bytes already delivered stay in the inboxes.
    pub fn unplug(&self) {
        self.output.inner.borrow_mut().link = None;
        self.input.inner.borrow_mut().link = None;
    }
}
