//! Shared-radio mode arbiter.
//!
//! The device has one radio that is either on the fixed peer channel
//! (`PeerComms`, the boot mode) or joined to an access point for HTTP
//! (`Wifi`). Never both: every switch disconnects the old transport
//! before connecting the new one, inside one call.

use super::drivers::{HttpClient, PeerComms, TransportError};
use super::jack::MacAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Fixed channel all devices use for peer traffic.
pub const PEER_CHANNEL: u8 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WirelessMode {
    PeerComms,
    Wifi,
}

/// Envelope discriminator routing a peer packet to its subsystem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PacketType {
    Handshake = 0,
    GameCommand = 1,
    Debug = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(body.into()),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WirelessError {
    #[error("WiFi is not connected")]
    WifiNotConnected,

    #[error("peer radio is not ready")]
    PeerCommsNotReady,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Receives `(sender, payload)` for one packet type.
pub type PacketHandler = Box<dyn FnMut(MacAddress, &[u8])>;

pub struct WirelessManager {
    peer: Box<dyn PeerComms>,
    http: Box<dyn HttpClient>,
    mode: WirelessMode,
    handlers: HashMap<PacketType, PacketHandler>,
}

impl WirelessManager {
    /// Boots in peer mode and tries to bring the peer link up.
    pub fn new(peer: Box<dyn PeerComms>, http: Box<dyn HttpClient>) -> Self {
        let mut manager = Self {
            peer,
            http,
            mode: WirelessMode::PeerComms,
            handlers: HashMap::new(),
        };
        if let Err(err) = manager.peer.connect(PEER_CHANNEL) {
            warn!(error = %err, "peer radio did not come up at boot");
        }
        manager
    }

    pub fn mode(&self) -> WirelessMode {
        self.mode
    }

    /// Switch to infrastructure WiFi.
    ///
    /// No-op when already in WiFi mode with the link up. If the link does
    /// not come up the mode still records WiFi and
    /// [`is_wifi_connected`](Self::is_wifi_connected) stays false.
    pub fn enable_wifi_mode(&mut self) {
        if self.mode == WirelessMode::Wifi && self.http.is_connected() {
            debug!("already in WiFi mode");
            return;
        }

        info!("switching to WiFi mode");
        self.peer.disconnect();
        if let Err(err) = self.http.connect() {
            warn!(error = %err, "WiFi did not come up");
        }
        self.mode = WirelessMode::Wifi;
    }

    /// Switch to the peer channel. Mirror of [`enable_wifi_mode`](Self::enable_wifi_mode).
    pub fn enable_peer_comms_mode(&mut self) {
        if self.mode == WirelessMode::PeerComms && self.peer.is_ready() {
            debug!("already in peer mode");
            return;
        }

        info!(channel = PEER_CHANNEL, "switching to peer mode");
        self.http.disconnect();
        if let Err(err) = self.peer.connect(PEER_CHANNEL) {
            warn!(error = %err, "peer radio did not come up");
        }
        self.mode = WirelessMode::PeerComms;
    }

    pub fn is_wifi_connected(&self) -> bool {
        self.mode == WirelessMode::Wifi && self.http.is_connected()
    }

    pub fn is_peer_comms_ready(&self) -> bool {
        self.mode == WirelessMode::PeerComms && self.peer.is_ready()
    }

    /// Queue an HTTP request, switching to WiFi first if needed.
    pub fn queue_http_request(&mut self, request: HttpRequest) -> Result<(), WirelessError> {
        if self.mode != WirelessMode::Wifi {
            info!("auto-switching to WiFi for HTTP request");
            self.enable_wifi_mode();
        }
        if !self.is_wifi_connected() {
            warn!(path = %request.path, "cannot queue HTTP request, WiFi not connected");
            return Err(WirelessError::WifiNotConnected);
        }
        self.http.queue_request(request)?;
        Ok(())
    }

    /// Send a typed packet to a peer, switching to peer mode first if needed.
    pub fn send_peer_data(
        &mut self,
        dst: MacAddress,
        packet_type: PacketType,
        payload: &[u8],
    ) -> Result<(), WirelessError> {
        if self.mode != WirelessMode::PeerComms {
            info!("auto-switching to peer mode for send");
            self.enable_peer_comms_mode();
        }
        if !self.is_peer_comms_ready() {
            return Err(WirelessError::PeerCommsNotReady);
        }
        self.peer.send(dst, packet_type, payload)?;
        Ok(())
    }

    /// Register the receive handler for `packet_type`, replacing any other.
    pub fn set_packet_handler(&mut self, packet_type: PacketType, handler: PacketHandler) {
        self.handlers.insert(packet_type, handler);
    }

    pub fn clear_packet_handler(&mut self, packet_type: PacketType) {
        self.handlers.remove(&packet_type);
    }

    pub fn has_packet_handler(&self, packet_type: PacketType) -> bool {
        self.handlers.contains_key(&packet_type)
    }

    /// Drain the peer radio and dispatch each packet to its handler.
    ///
    /// Nothing is read while in WiFi mode.
    pub fn pump(&mut self) {
        if self.mode != WirelessMode::PeerComms {
            return;
        }
        while let Some(packet) = self.peer.poll() {
            match self.handlers.get_mut(&packet.packet_type) {
                Some(handler) => handler(packet.sender, &packet.payload),
                None => trace!(
                    sender = %packet.sender,
                    packet_type = ?packet.packet_type,
                    "no handler, packet dropped"
                ),
            }
        }
    }

    pub fn mac_address(&self) -> MacAddress {
        self.peer.mac_address()
    }

    pub fn broadcast_address(&self) -> MacAddress {
        MacAddress::BROADCAST
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::PeerPacket;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        log: Vec<&'static str>,
        http_up: bool,
        peer_up: bool,
        http_fails: bool,
        inbox: VecDeque<PeerPacket>,
        sent: Vec<(MacAddress, PacketType, Vec<u8>)>,
    }

    type Shared = Rc<RefCell<Calls>>;

    struct FakePeer(Shared);
    struct FakeHttp(Shared);

    impl PeerComms for FakePeer {
        fn connect(&mut self, _channel: u8) -> Result<(), TransportError> {
            let mut calls = self.0.borrow_mut();
            calls.log.push("peer connect");
            calls.peer_up = true;
            Ok(())
        }

        fn disconnect(&mut self) {
            let mut calls = self.0.borrow_mut();
            calls.log.push("peer disconnect");
            calls.peer_up = false;
        }

        fn is_ready(&self) -> bool {
            self.0.borrow().peer_up
        }

        fn mac_address(&self) -> MacAddress {
            MacAddress([2, 0, 0, 0, 0, 1])
        }

        fn send(&mut self, dst: MacAddress, packet_type: PacketType, payload: &[u8]) -> Result<(), TransportError> {
            self.0.borrow_mut().sent.push((dst, packet_type, payload.to_vec()));
            Ok(())
        }

        fn poll(&mut self) -> Option<PeerPacket> {
            self.0.borrow_mut().inbox.pop_front()
        }
    }

    impl HttpClient for FakeHttp {
        fn connect(&mut self) -> Result<(), TransportError> {
            let mut calls = self.0.borrow_mut();
            calls.log.push("http connect");
            if calls.http_fails {
                return Err(TransportError::Unavailable("no access point".into()));
            }
            calls.http_up = true;
            Ok(())
        }

        fn disconnect(&mut self) {
            let mut calls = self.0.borrow_mut();
            calls.log.push("http disconnect");
            calls.http_up = false;
        }

        fn is_connected(&self) -> bool {
            self.0.borrow().http_up
        }

        fn queue_request(&mut self, _request: HttpRequest) -> Result<(), TransportError> {
            self.0.borrow_mut().log.push("http queue");
            Ok(())
        }
    }

    fn manager() -> (WirelessManager, Shared) {
        let calls = Shared::default();
        let manager = WirelessManager::new(
            Box::new(FakePeer(Rc::clone(&calls))),
            Box::new(FakeHttp(Rc::clone(&calls))),
        );
        calls.borrow_mut().log.clear();
        (manager, calls)
    }

    #[test]
    fn boots_in_peer_mode() {
        let (manager, _) = manager();
        assert_eq!(manager.mode(), WirelessMode::PeerComms);
        assert!(manager.is_peer_comms_ready());
        assert!(!manager.is_wifi_connected());
    }

    #[test]
    fn wifi_switch_disconnects_before_connecting_and_is_idempotent() {
        let (mut manager, calls) = manager();

        manager.enable_wifi_mode();
        manager.enable_wifi_mode();

        assert_eq!(calls.borrow().log, vec!["peer disconnect", "http connect"]);
        assert!(manager.is_wifi_connected());
        assert!(!manager.is_peer_comms_ready());
    }

    #[test]
    fn failed_wifi_records_attempted_mode() {
        let (mut manager, calls) = manager();
        calls.borrow_mut().http_fails = true;

        manager.enable_wifi_mode();

        assert_eq!(manager.mode(), WirelessMode::Wifi);
        assert!(!manager.is_wifi_connected());
        assert_eq!(
            manager.queue_http_request(HttpRequest::get("/api/match")),
            Err(WirelessError::WifiNotConnected)
        );
    }

    #[test]
    fn sends_auto_switch_modes() {
        let (mut manager, calls) = manager();

        manager.queue_http_request(HttpRequest::post("/api/match", "{}")).unwrap();
        manager
            .send_peer_data(MacAddress::BROADCAST, PacketType::GameCommand, &[1, 2])
            .unwrap();

        assert_eq!(
            calls.borrow().log,
            vec!["peer disconnect", "http connect", "http queue", "http disconnect", "peer connect"]
        );
        assert_eq!(calls.borrow().sent.len(), 1);
        assert_eq!(manager.mode(), WirelessMode::PeerComms);
    }

    #[test]
    fn pump_dispatches_by_packet_type() {
        let (mut manager, calls) = manager();
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);
        manager.set_packet_handler(
            PacketType::Handshake,
            Box::new(move |sender, payload| sink.borrow_mut().push((sender, payload.to_vec()))),
        );

        let sender = MacAddress([9; 6]);
        for packet_type in [PacketType::Debug, PacketType::Handshake] {
            calls.borrow_mut().inbox.push_back(PeerPacket {
                sender,
                packet_type,
                payload: vec![0, 1],
            });
        }
        manager.pump();

        assert_eq!(*received.borrow(), vec![(sender, vec![0, 1])]);
        assert!(calls.borrow().inbox.is_empty());

        manager.clear_packet_handler(PacketType::Handshake);
        assert!(!manager.has_packet_handler(PacketType::Handshake));
    }
}
