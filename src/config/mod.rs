//! Pairing protocol configuration.
//!
//! All timings of the port handshake live in [`HandshakeConfig`]. A
//! configuration is checked with [`HandshakeConfig::validate`], which
//! accumulates every broken rule instead of stopping at the first one.
//!
//! ```rust
//! use quickdraw_core::config::{DaisyChainResetPolicy, HandshakeConfig};
//!
//! let config = HandshakeConfig::from_json(r#"{ "daisy_chain_reset": "ClearOnUnpair" }"#).unwrap();
//! assert_eq!(config.daisy_chain_reset, DaisyChainResetPolicy::ClearOnUnpair);
//! assert_eq!(config.mac_emit_interval_ms, 250);
//! ```

mod error;

pub use error::{ConfigError, ConfigViolation};

use crate::device::Jack;
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Role a port plays while pairing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortRole {
    /// Listens for an address on serial, then initiates over the radio.
    Primary,
    /// Announces its address on serial, then answers over the radio.
    Auxiliary,
}

impl PortRole {
    pub fn other(self) -> Self {
        match self {
            PortRole::Primary => PortRole::Auxiliary,
            PortRole::Auxiliary => PortRole::Primary,
        }
    }
}

/// When a port's accumulated peer-address set is cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaisyChainResetPolicy {
    /// Every ended session on the port clears its set.
    #[default]
    ClearOnDisconnect,
    /// Only an explicit unpair or port reset clears the set.
    ClearOnUnpair,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Role of the OUTPUT jack; the INPUT jack takes the other one.
    pub output_role: PortRole,
    pub mac_emit_interval_ms: u64,
    pub heartbeat_emit_interval_ms: u64,
    /// Grace period before the first heartbeat must arrive.
    pub first_heartbeat_timeout_ms: u64,
    pub heartbeat_timeout_ms: u64,
    /// A port stuck in SendId this long is reset to Idle.
    pub send_id_timeout_ms: u64,
    pub daisy_chain_reset: DaisyChainResetPolicy,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            output_role: PortRole::Primary,
            mac_emit_interval_ms: 250,
            heartbeat_emit_interval_ms: 50,
            first_heartbeat_timeout_ms: 2000,
            heartbeat_timeout_ms: 500,
            send_id_timeout_ms: 3000,
            daisy_chain_reset: DaisyChainResetPolicy::ClearOnDisconnect,
        }
    }
}

type Check = Validation<(), NonEmptyVec<ConfigViolation>>;

fn require(ok: bool, violation: ConfigViolation) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(violation)
    }
}

impl HandshakeConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: HandshakeConfig = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn role_of(&self, jack: Jack) -> PortRole {
        match jack {
            Jack::Output => self.output_role,
            Jack::Input => self.output_role.other(),
        }
    }

    /// Check every rule, collecting all violations.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<ConfigViolation>> {
        let intervals = [
            ("mac_emit_interval_ms", self.mac_emit_interval_ms),
            ("heartbeat_emit_interval_ms", self.heartbeat_emit_interval_ms),
            ("first_heartbeat_timeout_ms", self.first_heartbeat_timeout_ms),
            ("heartbeat_timeout_ms", self.heartbeat_timeout_ms),
            ("send_id_timeout_ms", self.send_id_timeout_ms),
        ];

        let mut checks: Vec<Check> = intervals
            .into_iter()
            .map(|(field, value)| require(value > 0, ConfigViolation::ZeroInterval { field }))
            .collect();

        checks.push(require(
            self.heartbeat_timeout_ms > self.heartbeat_emit_interval_ms,
            ConfigViolation::HeartbeatTimeoutTooShort {
                timeout_ms: self.heartbeat_timeout_ms,
                emit_ms: self.heartbeat_emit_interval_ms,
            },
        ));
        checks.push(require(
            self.first_heartbeat_timeout_ms >= self.heartbeat_timeout_ms,
            ConfigViolation::GraceShorterThanTimeout {
                grace_ms: self.first_heartbeat_timeout_ms,
                timeout_ms: self.heartbeat_timeout_ms,
            },
        ));
        checks.push(require(
            self.send_id_timeout_ms >= self.mac_emit_interval_ms,
            ConfigViolation::SendIdTimeoutTooShort {
                timeout_ms: self.send_id_timeout_ms,
                emit_ms: self.mac_emit_interval_ms,
            },
        ));

        Validation::all_vec(checks).map(|_| ())
    }

    /// Consume the config, returning it only if every rule holds.
    pub fn validated(self) -> Result<Self, ConfigError> {
        match self.validate() {
            Validation::Success(()) => Ok(self),
            Validation::Failure(violations) => Err(ConfigError::Invalid(
                violations.iter().cloned().collect(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HandshakeConfig::default();
        assert!(config.validate().is_success());
        assert_eq!(config.role_of(Jack::Output), PortRole::Primary);
        assert_eq!(config.role_of(Jack::Input), PortRole::Auxiliary);
    }

    #[test]
    fn all_violations_are_reported() {
        let config = HandshakeConfig {
            mac_emit_interval_ms: 0,
            heartbeat_emit_interval_ms: 600,
            first_heartbeat_timeout_ms: 100,
            ..HandshakeConfig::default()
        };

        match config.validated() {
            Err(ConfigError::Invalid(violations)) => {
                assert_eq!(violations.len(), 3);
                assert!(violations.contains(&ConfigViolation::ZeroInterval {
                    field: "mac_emit_interval_ms"
                }));
                assert!(violations.contains(&ConfigViolation::HeartbeatTimeoutTooShort {
                    timeout_ms: 500,
                    emit_ms: 600
                }));
                assert!(violations.contains(&ConfigViolation::GraceShorterThanTimeout {
                    grace_ms: 100,
                    timeout_ms: 500
                }));
            }
            other => panic!("expected violations, got {other:?}"),
        }
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = HandshakeConfig::from_json(
            r#"{ "output_role": "Auxiliary", "heartbeat_timeout_ms": 800 }"#,
        )
        .unwrap();

        assert_eq!(config.output_role, PortRole::Auxiliary);
        assert_eq!(config.role_of(Jack::Input), PortRole::Primary);
        assert_eq!(config.heartbeat_timeout_ms, 800);
        assert_eq!(config.first_heartbeat_timeout_ms, 2000);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            HandshakeConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn invalid_json_config_is_rejected() {
        let result = HandshakeConfig::from_json(r#"{ "send_id_timeout_ms": 10 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(v)) if v.len() == 1));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = HandshakeConfig {
            daisy_chain_reset: DaisyChainResetPolicy::ClearOnUnpair,
            ..HandshakeConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(HandshakeConfig::from_json(&json).unwrap(), config);
    }
}
