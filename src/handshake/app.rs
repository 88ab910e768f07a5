//! The handshake app running on one port.

use super::states::{
    AuxiliaryIdle, AuxiliarySendId, Connected, HandshakeStateId, PrimaryIdle, PrimarySendId,
};
use super::{HandshakeError, SharedHandshakeWireless, HANDSHAKE_APP_ID};
use crate::builder::StateMachineBuilder;
use crate::config::{HandshakeConfig, PortRole};
use crate::core::{Flag, MachineError, StateIndex, StateMachine, StateTransition};
use crate::device::{Device, Jack, Mailbox, MacAddress, Timer};
use tracing::{info, warn};

/// Index of the idle state in both role layouts.
pub const IDLE: StateIndex = 0;
pub const SEND_ID: StateIndex = 1;
pub const CONNECTED: StateIndex = 2;

/// Session changes reported by a port to its coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerEvent {
    SessionEstablished(MacAddress),
    SessionEnded(MacAddress),
    /// Another device showed up on a port that already has a session.
    PeerSighted(MacAddress),
    /// A device other than the active peer announced it is leaving.
    PeerDeparted(MacAddress),
}

/// Handshake machine for one jack plus its send-id give-up timer.
///
/// A port that sits in SendId longer than the configured timeout is
/// forced back to Idle and forgets its peer.
pub struct PortHandshake<D> {
    jack: Jack,
    role: PortRole,
    machine: StateMachine<D>,
    hwm: SharedHandshakeWireless,
    events: Mailbox<PeerEvent>,
    send_id_timer: Timer,
    send_id_timeout_ms: u64,
}

impl<D: Device> PortHandshake<D> {
    pub fn new(
        jack: Jack,
        hwm: SharedHandshakeWireless,
        config: &HandshakeConfig,
    ) -> Result<Self, HandshakeError> {
        let role = config.role_of(jack);
        let events = Mailbox::new();
        let to_send_id = Flag::new();
        let to_connected = Flag::new();
        let to_idle = Flag::new();

        let mut builder = StateMachineBuilder::new(HANDSHAKE_APP_ID);
        let (idle, send_id, connected_id) = match role {
            PortRole::Primary => (
                builder.add_state(PrimaryIdle::new(jack, hwm.clone(), to_send_id.clone())),
                builder.add_state(PrimarySendId::new(jack, hwm.clone(), to_connected.clone())),
                HandshakeStateId::PrimaryConnected,
            ),
            PortRole::Auxiliary => (
                builder.add_state(AuxiliaryIdle::new(
                    jack,
                    hwm.clone(),
                    config,
                    to_send_id.clone(),
                )),
                builder.add_state(AuxiliarySendId::new(jack, hwm.clone(), to_connected.clone())),
                HandshakeStateId::AuxiliaryConnected,
            ),
        };
        let connected = builder.add_state(Connected::new(
            connected_id,
            jack,
            hwm.clone(),
            config,
            events.clone(),
            to_idle.clone(),
        ));

        builder.add_transition(idle, StateTransition::on_flag(&to_send_id, send_id));
        builder.add_transition(send_id, StateTransition::on_flag(&to_connected, connected));
        builder.add_transition(connected, StateTransition::on_flag(&to_idle, idle));

        Ok(Self {
            jack,
            role,
            machine: builder.build()?,
            hwm,
            events,
            send_id_timer: Timer::new(),
            send_id_timeout_ms: config.send_id_timeout_ms,
        })
    }

    pub fn initialize(&mut self, device: &mut D) -> Result<(), MachineError> {
        self.send_id_timer.invalidate();
        self.machine.initialize(device)
    }

    /// Tick the machine once, then run the send-id give-up timer.
    pub fn tick(&mut self, device: &mut D) {
        self.machine.tick(device);

        match self.machine.current_index() {
            Some(SEND_ID) => {
                let now = device.now_ms();
                if self.send_id_timer.expired(now) {
                    warn!(jack = %self.jack, "identity exchange timed out, resetting port");
                    if let Err(err) = self.reset(device) {
                        warn!(jack = %self.jack, error = %err, "port reset failed");
                    }
                } else if !self.send_id_timer.is_running() {
                    self.send_id_timer.set(now, self.send_id_timeout_ms);
                }
            }
            _ => self.send_id_timer.invalidate(),
        }
    }

    /// Force the port back to Idle and forget its peer.
    pub fn reset(&mut self, device: &mut D) -> Result<(), MachineError> {
        self.machine.skip_to_state(device, IDLE)?;
        self.hwm.borrow_mut().remove_mac_peer(self.jack);
        self.send_id_timer.invalidate();
        info!(jack = %self.jack, "port reset to idle");
        Ok(())
    }

    pub fn shutdown(&mut self, device: &mut D) {
        self.send_id_timer.invalidate();
        self.machine.shutdown(device);
    }

    /// Events raised since the last call, oldest first.
    pub fn drain_events(&self) -> Vec<PeerEvent> {
        self.events.drain()
    }

    pub fn jack(&self) -> Jack {
        self.jack
    }

    pub fn role(&self) -> PortRole {
        self.role
    }

    pub fn current_index(&self) -> Option<StateIndex> {
        self.machine.current_index()
    }

    pub fn machine(&self) -> &StateMachine<D> {
        &self.machine
    }
}
