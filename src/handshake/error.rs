//! Handshake errors. All are recoverable; none aborts a tick.

use crate::builder::BuildError;
use crate::config::ConfigError;
use crate::core::MachineError;
use crate::device::{Jack, WirelessError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("handshake packet is {len} bytes, expected {expected}")]
    MalformedPacket { len: usize, expected: usize },

    #[error("invalid handshake command {0}")]
    InvalidCommand(u8),

    #[error("invalid origin port {0}")]
    InvalidPort(u8),

    #[error("no peer registered for {0} port")]
    NoRegisteredPeer(Jack),

    #[error("handshake packet codec: {0}")]
    Codec(#[from] bincode::Error),

    #[error(transparent)]
    Wireless(#[from] WirelessError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Machine(#[from] MachineError),
}

impl PartialEq for HandshakeError {
    fn eq(&self, other: &Self) -> bool {
        use HandshakeError::*;
        match (self, other) {
            (
                MalformedPacket { len: a, expected: b },
                MalformedPacket { len: c, expected: d },
            ) => a == c && b == d,
            (InvalidCommand(a), InvalidCommand(b)) => a == b,
            (InvalidPort(a), InvalidPort(b)) => a == b,
            (NoRegisteredPeer(a), NoRegisteredPeer(b)) => a == b,
            (Wireless(a), Wireless(b)) => a == b,
            (Machine(a), Machine(b)) => a == b,
            _ => false,
        }
    }
}
