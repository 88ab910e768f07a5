//! HTTP client stand-in that records requests and connection churn.

use crate::device::{HttpClient, HttpRequest, TransportError};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct HttpState {
    connected: bool,
    refuse_connect: bool,
    connects: usize,
    disconnects: usize,
    queued: Vec<HttpRequest>,
}

/// In-memory WiFi/HTTP client. Clones share state, so a test keeps one
/// clone to inspect what the device did with the other.
#[derive(Clone, Debug, Default)]
pub struct SimHttpClient {
    state: Rc<RefCell<HttpState>>,
}

impl SimHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent connects fail, as if no access point were in range.
    pub fn refuse_connections(&self, refuse: bool) {
        self.state.borrow_mut().refuse_connect = refuse;
    }

    pub fn connect_count(&self) -> usize {
        self.state.borrow().connects
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.borrow().disconnects
    }

    pub fn queued_requests(&self) -> Vec<HttpRequest> {
        self.state.borrow().queued.clone()
    }
}

impl HttpClient for SimHttpClient {
    fn connect(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        state.connects += 1;
        if state.refuse_connect {
            return Err(TransportError::Unavailable("no access point in range".into()));
        }
        state.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.disconnects += 1;
        state.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    fn queue_request(&mut self, request: HttpRequest) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        if !state.connected {
            return Err(TransportError::NotReady);
        }
        state.queued.push(request);
        Ok(())
    }
}
