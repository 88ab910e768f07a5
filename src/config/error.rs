//! Configuration errors.

use thiserror::Error;

/// A single rule a configuration broke.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigViolation {
    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },

    #[error("heartbeat timeout ({timeout_ms}ms) must exceed the emit interval ({emit_ms}ms)")]
    HeartbeatTimeoutTooShort { timeout_ms: u64, emit_ms: u64 },

    #[error("first heartbeat grace ({grace_ms}ms) must be at least the steady timeout ({timeout_ms}ms)")]
    GraceShorterThanTimeout { grace_ms: u64, timeout_ms: u64 },

    #[error("send-id timeout ({timeout_ms}ms) must be at least the MAC emit interval ({emit_ms}ms)")]
    SendIdTimeoutTooShort { timeout_ms: u64, emit_ms: u64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {} violation(s)", .0.len())]
    Invalid(Vec<ConfigViolation>),
}
