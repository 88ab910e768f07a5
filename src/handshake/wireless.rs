//! Handshake packet protocol over the peer radio.

use super::{HandshakeCommand, HandshakeError, HsCommand};
use crate::device::{Jack, MacAddress, PacketType, WirelessManager};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::{debug, warn};

/// On-air record. Always exactly [`HandshakePacket::WIRE_LEN`] bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakePacket {
    pub origin_port: u8,
    pub command: u8,
}

impl HandshakePacket {
    pub const WIRE_LEN: usize = 2;

    pub fn new(origin: Jack, command: HsCommand) -> Self {
        Self {
            origin_port: origin.as_u8(),
            command: command as u8,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, HandshakeError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, HandshakeError> {
        if data.len() != Self::WIRE_LEN {
            return Err(HandshakeError::MalformedPacket {
                len: data.len(),
                expected: Self::WIRE_LEN,
            });
        }
        Ok(bincode::deserialize(data)?)
    }
}

/// Receives commands routed to one local port.
pub type CommandCallback = Box<dyn FnMut(HandshakeCommand)>;

/// Shared between the coordinator, its port states and the radio handler.
pub type SharedHandshakeWireless = Rc<RefCell<HandshakeWirelessManager>>;

/// Per-port peer registry and command dispatch.
///
/// A cable only ever joins OUTPUT to INPUT, so a packet sent from the
/// peer's port `P` is handled by the local port `P.opposite()`.
#[derive(Default)]
pub struct HandshakeWirelessManager {
    callbacks: BTreeMap<Jack, CommandCallback>,
    peers: BTreeMap<Jack, MacAddress>,
}

impl HandshakeWirelessManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedHandshakeWireless {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn set_packet_received_callback(&mut self, jack: Jack, callback: CommandCallback) {
        self.callbacks.insert(jack, callback);
    }

    pub fn clear_callback(&mut self, jack: Jack) {
        self.callbacks.remove(&jack);
    }

    pub fn clear_callbacks(&mut self) {
        self.callbacks.clear();
    }

    pub fn has_callback(&self, jack: Jack) -> bool {
        self.callbacks.contains_key(&jack)
    }

    pub fn set_mac_peer(&mut self, mac: MacAddress, jack: Jack) {
        debug!(%jack, peer = %mac, "peer registered");
        self.peers.insert(jack, mac);
    }

    pub fn remove_mac_peer(&mut self, jack: Jack) {
        if let Some(mac) = self.peers.remove(&jack) {
            debug!(%jack, peer = %mac, "peer removed");
        }
    }

    pub fn mac_peer(&self, jack: Jack) -> Option<MacAddress> {
        self.peers.get(&jack).copied()
    }

    /// Send `command` from `jack` to that port's registered peer.
    pub fn send_packet(
        &self,
        wireless: &mut WirelessManager,
        command: HsCommand,
        jack: Jack,
    ) -> Result<(), HandshakeError> {
        let Some(peer) = self.mac_peer(jack) else {
            warn!(%jack, ?command, "no peer registered, cannot send");
            return Err(HandshakeError::NoRegisteredPeer(jack));
        };

        let payload = HandshakePacket::new(jack, command).encode()?;
        debug!(%jack, %peer, ?command, "sending handshake command");
        wireless.send_peer_data(peer, PacketType::Handshake, &payload)?;
        Ok(())
    }

    /// Decode a received packet and hand it to the routed port's callback.
    pub fn process_packet(
        &mut self,
        sender: MacAddress,
        data: &[u8],
    ) -> Result<HandshakeCommand, HandshakeError> {
        let packet = HandshakePacket::decode(data)?;
        let command = HsCommand::try_from(packet.command)?;
        let origin =
            Jack::from_u8(packet.origin_port).ok_or(HandshakeError::InvalidPort(packet.origin_port))?;

        let routed = HandshakeCommand {
            sender,
            command,
            jack: origin.opposite(),
        };
        debug!(%sender, ?command, jack = %routed.jack, "received handshake command");

        if let Some(callback) = self.callbacks.get_mut(&routed.jack) {
            callback(routed);
        }
        Ok(routed)
    }
}
