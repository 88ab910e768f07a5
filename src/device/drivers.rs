//! Hardware driver seams.
//!
//! Firmware implements these over the UARTs, the radio and the HTTP
//! stack; [`crate::sim`] implements them in memory.

use super::jack::MacAddress;
use super::wireless::{HttpRequest, PacketType};
use thiserror::Error;

/// Errors reported by a transport driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport not ready")]
    NotReady,

    #[error("transport unavailable: {0}")]
    Unavailable(String),

    #[error("peer {0} unreachable")]
    Unreachable(MacAddress),

    #[error("request queue full")]
    QueueFull,
}

/// Raw byte access to one serial jack. Must never block.
pub trait SerialDriver {
    fn write_bytes(&mut self, data: &[u8]);

    /// Everything received since the last call.
    fn read_bytes(&mut self) -> Vec<u8>;
}

/// A packet taken off the peer radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerPacket {
    pub sender: MacAddress,
    pub packet_type: PacketType,
    pub payload: Vec<u8>,
}

/// Peer-to-peer radio link (ESP-NOW on hardware).
pub trait PeerComms {
    /// Bring the link up on a fixed channel.
    fn connect(&mut self, channel: u8) -> Result<(), TransportError>;

    fn disconnect(&mut self);

    fn is_ready(&self) -> bool;

    fn mac_address(&self) -> MacAddress;

    fn send(
        &mut self,
        dst: MacAddress,
        packet_type: PacketType,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Next received packet, if any.
    fn poll(&mut self) -> Option<PeerPacket>;
}

/// Infrastructure WiFi plus HTTP request queue.
pub trait HttpClient {
    fn connect(&mut self) -> Result<(), TransportError>;

    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    fn queue_request(&mut self, request: HttpRequest) -> Result<(), TransportError>;
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}
