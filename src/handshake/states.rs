//! Handshake states for both port roles.
//!
//! States never call each other. Each raises a [`Flag`] that the guard on
//! its outgoing transition reads, and every driver or radio callback a
//! state registers only pushes into a [`Mailbox`] that the state drains
//! on its next loop.

use super::app::PeerEvent;
use super::{HandshakeCommand, HsCommand, SharedHandshakeWireless};
use crate::config::HandshakeConfig;
use crate::core::{Flag, State, StateId};
use crate::device::{Device, Jack, Mailbox, MacAddress, SerialMessage, Timer};
use tracing::{debug, info, warn};

crate::state_ids! {
    pub enum HandshakeStateId {
        PrimaryIdle = 0,
        PrimarySendId = 1,
        PrimaryConnected = 2,
        AuxiliaryIdle = 3,
        AuxiliarySendId = 4,
        AuxiliaryConnected = 5,
    }
}

fn listen_serial<D: Device>(device: &mut D, jack: Jack, lines: &Mailbox<String>) {
    lines.clear();
    let sink = lines.clone();
    device
        .serial_manager()
        .set_line_callback(jack, Box::new(move |line| sink.push(line.to_string())));
}

fn listen_radio(hwm: &SharedHandshakeWireless, jack: Jack, commands: &Mailbox<HandshakeCommand>) {
    commands.clear();
    let sink = commands.clone();
    hwm.borrow_mut()
        .set_packet_received_callback(jack, Box::new(move |command| sink.push(command)));
}

/// Primary idle: wait for the peer to announce its address on serial.
pub struct PrimaryIdle {
    jack: Jack,
    hwm: SharedHandshakeWireless,
    lines: Mailbox<String>,
    address_learned: Flag,
}

impl PrimaryIdle {
    pub fn new(jack: Jack, hwm: SharedHandshakeWireless, address_learned: Flag) -> Self {
        Self {
            jack,
            hwm,
            lines: Mailbox::new(),
            address_learned,
        }
    }
}

impl<D: Device> State<D> for PrimaryIdle {
    fn state_id(&self) -> StateId {
        HandshakeStateId::PrimaryIdle.into()
    }

    fn name(&self) -> &str {
        HandshakeStateId::PrimaryIdle.name()
    }

    fn on_state_mounted(&mut self, device: &mut D) {
        listen_serial(device, self.jack, &self.lines);
    }

    fn on_state_loop(&mut self, _device: &mut D) {
        for line in self.lines.drain() {
            if let SerialMessage::MacAnnouncement(mac) = SerialMessage::parse(&line) {
                // Must be registered before anything is sent on this port.
                self.hwm.borrow_mut().set_mac_peer(mac, self.jack);
                self.address_learned.raise();
                break;
            }
        }
    }

    fn on_state_dismounted(&mut self, device: &mut D) {
        device.serial_manager().clear_callback(self.jack);
        self.lines.clear();
        self.address_learned.lower();
    }
}

/// Primary send-id: send `EXCHANGE_ID` to the learned peer and wait for
/// the reply.
pub struct PrimarySendId {
    jack: Jack,
    hwm: SharedHandshakeWireless,
    commands: Mailbox<HandshakeCommand>,
    sent: bool,
    reply_received: Flag,
}

impl PrimarySendId {
    pub fn new(jack: Jack, hwm: SharedHandshakeWireless, reply_received: Flag) -> Self {
        Self {
            jack,
            hwm,
            commands: Mailbox::new(),
            sent: false,
            reply_received,
        }
    }
}

impl<D: Device> State<D> for PrimarySendId {
    fn state_id(&self) -> StateId {
        HandshakeStateId::PrimarySendId.into()
    }

    fn name(&self) -> &str {
        HandshakeStateId::PrimarySendId.name()
    }

    fn on_state_mounted(&mut self, _device: &mut D) {
        self.sent = false;
        listen_radio(&self.hwm, self.jack, &self.commands);
    }

    fn on_state_loop(&mut self, device: &mut D) {
        if !self.sent {
            let result = self.hwm.borrow().send_packet(
                device.wireless_manager(),
                HsCommand::ExchangeId,
                self.jack,
            );
            match result {
                Ok(()) => self.sent = true,
                // Retried next tick.
                Err(err) => warn!(jack = %self.jack, error = %err, "EXCHANGE_ID send failed"),
            }
        }

        let peer = self.hwm.borrow().mac_peer(self.jack);
        let replied = self
            .commands
            .drain()
            .into_iter()
            .any(|cmd| cmd.command == HsCommand::ExchangeId && Some(cmd.sender) == peer);
        if self.sent && replied {
            self.reply_received.raise();
        }
    }

    fn on_state_dismounted(&mut self, _device: &mut D) {
        self.hwm.borrow_mut().clear_callback(self.jack);
        self.commands.clear();
        self.sent = false;
        self.reply_received.lower();
    }
}

/// Auxiliary idle: announce our address on serial and wait for the
/// peer's `EXCHANGE_ID` over the radio.
pub struct AuxiliaryIdle {
    jack: Jack,
    hwm: SharedHandshakeWireless,
    commands: Mailbox<HandshakeCommand>,
    emit_timer: Timer,
    emit_interval_ms: u64,
    exchange_received: Flag,
}

impl AuxiliaryIdle {
    pub fn new(
        jack: Jack,
        hwm: SharedHandshakeWireless,
        config: &HandshakeConfig,
        exchange_received: Flag,
    ) -> Self {
        Self {
            jack,
            hwm,
            commands: Mailbox::new(),
            emit_timer: Timer::new(),
            emit_interval_ms: config.mac_emit_interval_ms,
            exchange_received,
        }
    }
}

impl<D: Device> State<D> for AuxiliaryIdle {
    fn state_id(&self) -> StateId {
        HandshakeStateId::AuxiliaryIdle.into()
    }

    fn name(&self) -> &str {
        HandshakeStateId::AuxiliaryIdle.name()
    }

    fn on_state_mounted(&mut self, device: &mut D) {
        listen_radio(&self.hwm, self.jack, &self.commands);
        self.emit_timer.set(device.now_ms(), self.emit_interval_ms);
    }

    fn on_state_loop(&mut self, device: &mut D) {
        let now = device.now_ms();
        if self.emit_timer.expired(now) {
            let mac = device.wireless_manager().mac_address();
            device
                .serial_manager()
                .write_message(self.jack, &SerialMessage::MacAnnouncement(mac));
            self.emit_timer.set(now, self.emit_interval_ms);
        }

        for cmd in self.commands.drain() {
            if cmd.command == HsCommand::ExchangeId {
                self.hwm.borrow_mut().set_mac_peer(cmd.sender, self.jack);
                self.exchange_received.raise();
                break;
            }
        }
    }

    fn on_state_dismounted(&mut self, _device: &mut D) {
        self.emit_timer.invalidate();
        self.hwm.borrow_mut().clear_callback(self.jack);
        self.commands.clear();
        self.exchange_received.lower();
    }
}

/// Auxiliary send-id: acknowledge with our own `EXCHANGE_ID`.
pub struct AuxiliarySendId {
    jack: Jack,
    hwm: SharedHandshakeWireless,
    acknowledged: Flag,
}

impl AuxiliarySendId {
    pub fn new(jack: Jack, hwm: SharedHandshakeWireless, acknowledged: Flag) -> Self {
        Self {
            jack,
            hwm,
            acknowledged,
        }
    }
}

impl<D: Device> State<D> for AuxiliarySendId {
    fn state_id(&self) -> StateId {
        HandshakeStateId::AuxiliarySendId.into()
    }

    fn name(&self) -> &str {
        HandshakeStateId::AuxiliarySendId.name()
    }

    fn on_state_loop(&mut self, device: &mut D) {
        if self.acknowledged.is_raised() {
            return;
        }
        let result = self.hwm.borrow().send_packet(
            device.wireless_manager(),
            HsCommand::ExchangeId,
            self.jack,
        );
        match result {
            Ok(()) => self.acknowledged.raise(),
            Err(err) => warn!(jack = %self.jack, error = %err, "EXCHANGE_ID reply failed"),
        }
    }

    fn on_state_dismounted(&mut self, _device: &mut D) {
        self.acknowledged.lower();
    }
}

/// Live session on one port.
///
/// Emits `hb` on serial and expects the peer's `hb` back: the first one
/// within the grace period, then each within the steady timeout. A
/// missed heartbeat or a `NOTIFY_DISCONNECT` from the peer ends the
/// session; either way one best-effort `NOTIFY_DISCONNECT` goes out.
pub struct Connected {
    id: HandshakeStateId,
    jack: Jack,
    hwm: SharedHandshakeWireless,
    lines: Mailbox<String>,
    commands: Mailbox<HandshakeCommand>,
    events: Mailbox<PeerEvent>,
    emit_timer: Timer,
    monitor_timer: Timer,
    emit_interval_ms: u64,
    first_timeout_ms: u64,
    timeout_ms: u64,
    peer: Option<MacAddress>,
    session_over: Flag,
}

impl Connected {
    pub fn new(
        id: HandshakeStateId,
        jack: Jack,
        hwm: SharedHandshakeWireless,
        config: &HandshakeConfig,
        events: Mailbox<PeerEvent>,
        session_over: Flag,
    ) -> Self {
        Self {
            id,
            jack,
            hwm,
            lines: Mailbox::new(),
            commands: Mailbox::new(),
            events,
            emit_timer: Timer::new(),
            monitor_timer: Timer::new(),
            emit_interval_ms: config.heartbeat_emit_interval_ms,
            first_timeout_ms: config.first_heartbeat_timeout_ms,
            timeout_ms: config.heartbeat_timeout_ms,
            peer: None,
            session_over,
        }
    }

    fn handle_line(&mut self, line: &str, now: u64) {
        match SerialMessage::parse(line) {
            SerialMessage::Heartbeat => {
                self.monitor_timer.set(now, self.timeout_ms);
                debug!(jack = %self.jack, "heartbeat received, monitor restarted");
            }
            SerialMessage::MacAnnouncement(mac) if Some(mac) != self.peer => {
                self.events.push(PeerEvent::PeerSighted(mac));
            }
            _ => {}
        }
    }

    /// Returns true when the active peer asked to disconnect.
    fn handle_command(&mut self, cmd: HandshakeCommand) -> bool {
        let from_peer = Some(cmd.sender) == self.peer;
        match cmd.command {
            HsCommand::NotifyDisconnect if from_peer => true,
            HsCommand::NotifyDisconnect => {
                self.events.push(PeerEvent::PeerDeparted(cmd.sender));
                false
            }
            HsCommand::ExchangeId if !from_peer => {
                self.events.push(PeerEvent::PeerSighted(cmd.sender));
                false
            }
            HsCommand::ExchangeId => false,
        }
    }
}

impl<D: Device> State<D> for Connected {
    fn state_id(&self) -> StateId {
        self.id.into()
    }

    fn name(&self) -> &str {
        self.id.name()
    }

    fn on_state_mounted(&mut self, device: &mut D) {
        listen_serial(device, self.jack, &self.lines);
        listen_radio(&self.hwm, self.jack, &self.commands);

        let now = device.now_ms();
        self.emit_timer.set(now, self.emit_interval_ms);
        self.monitor_timer.set(now, self.first_timeout_ms);

        self.peer = self.hwm.borrow().mac_peer(self.jack);
        match self.peer {
            Some(peer) => {
                info!(jack = %self.jack, %peer, "session established");
                self.events.push(PeerEvent::SessionEstablished(peer));
            }
            None => {
                warn!(jack = %self.jack, "mounted without a registered peer, ending session");
                self.monitor_timer.invalidate();
                self.session_over.raise();
            }
        }
    }

    fn on_state_loop(&mut self, device: &mut D) {
        if self.session_over.is_raised() {
            return;
        }
        let now = device.now_ms();

        for line in self.lines.drain() {
            self.handle_line(&line, now);
        }
        let mut notified = false;
        for cmd in self.commands.drain() {
            notified |= self.handle_command(cmd);
        }

        let timed_out = self.monitor_timer.expired(now);
        if timed_out || notified {
            // Best effort: a failure here is expected when the peer is gone.
            if let Err(err) = self.hwm.borrow().send_packet(
                device.wireless_manager(),
                HsCommand::NotifyDisconnect,
                self.jack,
            ) {
                debug!(jack = %self.jack, error = %err, "NOTIFY_DISCONNECT not delivered");
            }
            self.monitor_timer.invalidate();
            self.session_over.raise();
            info!(jack = %self.jack, timed_out, notified, "session ending");
            return;
        }

        if self.emit_timer.expired(now) {
            device
                .serial_manager()
                .write_message(self.jack, &SerialMessage::Heartbeat);
            self.emit_timer.set(now, self.emit_interval_ms);
        }
    }

    fn on_state_dismounted(&mut self, device: &mut D) {
        device.serial_manager().clear_callback(self.jack);
        {
            let mut hwm = self.hwm.borrow_mut();
            hwm.clear_callback(self.jack);
            hwm.remove_mac_peer(self.jack);
        }
        self.emit_timer.invalidate();
        self.monitor_timer.invalidate();
        self.lines.clear();
        self.commands.clear();
        self.session_over.lower();

        if let Some(peer) = self.peer.take() {
            info!(jack = %self.jack, %peer, "session ended");
            self.events.push(PeerEvent::SessionEnded(peer));
        }
    }
}
