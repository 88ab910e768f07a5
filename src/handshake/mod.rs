//! Port pairing over serial discovery plus radio identity exchange.
//!
//! Each physical jack runs its own small handshake machine:
//!
//! | index | Primary role | Auxiliary role | reported status |
//! |-------|--------------|----------------|-----------------|
//! | 0     | `PrimaryIdle` listens for `smac` | `AuxiliaryIdle` announces `smac` | `Disconnected` |
//! | 1     | `PrimarySendId` sends `EXCHANGE_ID`, waits for reply | `AuxiliarySendId` replies | `Connecting` |
//! | 2     | `Connected` heartbeats | `Connected` heartbeats | `Connected` |
//!
//! A port whose peer-address set holds more than one address reports
//! `DaisyChained` whatever state is mounted.
//!
//! Radio packets are a two-byte `{origin_port, command}` record handled by
//! the [`HandshakeWirelessManager`]; the [`RemoteDeviceCoordinator`] owns
//! both port machines and the shared manager.

mod app;
mod coordinator;
mod error;
mod states;
mod wireless;

pub use app::{PeerEvent, PortHandshake, CONNECTED, IDLE, SEND_ID};
pub use coordinator::RemoteDeviceCoordinator;
pub use error::HandshakeError;
pub use states::{
    AuxiliaryIdle, AuxiliarySendId, Connected, HandshakeStateId, PrimaryIdle, PrimarySendId,
};
pub use wireless::{
    CommandCallback, HandshakePacket, HandshakeWirelessManager, SharedHandshakeWireless,
};

use crate::device::{Jack, MacAddress};
use serde::{Deserialize, Serialize};

/// Identifier of the handshake app.
pub const HANDSHAKE_APP_ID: crate::core::AppId = 1;

/// Commands carried in a handshake packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HsCommand {
    ExchangeId = 0,
    NotifyDisconnect = 1,
}

impl TryFrom<u8> for HsCommand {
    type Error = HandshakeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(HsCommand::ExchangeId),
            1 => Ok(HsCommand::NotifyDisconnect),
            other => Err(HandshakeError::InvalidCommand(other)),
        }
    }
}

/// A decoded packet, already routed to the local port that handles it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandshakeCommand {
    pub sender: MacAddress,
    pub command: HsCommand,
    pub jack: Jack,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortStatus {
    /// Idle, no session.
    Disconnected = 0,
    /// Identity exchange in progress.
    Connecting = 1,
    /// Session with exactly one peer.
    Connected = 2,
    /// Sessions with more than one peer.
    DaisyChained = 3,
}

/// Snapshot of one port for the rest of the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortState {
    pub port: Jack,
    pub status: PortStatus,
    pub peer_addresses: Vec<MacAddress>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_bytes_decode() {
        assert_eq!(HsCommand::try_from(0), Ok(HsCommand::ExchangeId));
        assert_eq!(HsCommand::try_from(1), Ok(HsCommand::NotifyDisconnect));
        assert_eq!(HsCommand::try_from(7), Err(HandshakeError::InvalidCommand(7)));
    }

    #[test]
    fn port_state_serializes_for_the_game() {
        let state = PortState {
            port: Jack::Input,
            status: PortStatus::DaisyChained,
            peer_addresses: vec![MacAddress([1, 2, 3, 4, 5, 6])],
        };

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["port"], "INPUT");
        assert_eq!(json["status"], "DAISY_CHAINED");
        assert_eq!(json["peer_addresses"][0], "01:02:03:04:05:06");

        let back: PortState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
