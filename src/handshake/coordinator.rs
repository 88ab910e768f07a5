//! Owns both port handshakes and the per-port peer-address sets.

use super::app::{PeerEvent, PortHandshake, CONNECTED, SEND_ID};
use super::{
    HandshakeError, HandshakeWirelessManager, HsCommand, PortState, PortStatus,
    SharedHandshakeWireless,
};
use crate::config::{DaisyChainResetPolicy, HandshakeConfig};
use crate::device::{Device, Jack, MacAddress, PacketType};
use std::collections::BTreeSet;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Drives pairing on both jacks.
///
/// Call [`sync`](Self::sync) once per device tick. It pumps the device
/// I/O, ticks the OUTPUT port then the INPUT port, and folds the ports'
/// session events into the peer-address sets that
/// [`port_status`](Self::port_status) reports from.
pub struct RemoteDeviceCoordinator<D> {
    config: HandshakeConfig,
    hwm: SharedHandshakeWireless,
    ports: [PortHandshake<D>; 2],
    peers: [BTreeSet<MacAddress>; 2],
    reported: [PortStatus; 2],
}

impl<D: Device> RemoteDeviceCoordinator<D> {
    /// Build both port machines. Fails on an invalid configuration.
    pub fn new(config: HandshakeConfig) -> Result<Self, HandshakeError> {
        let config = config.validated()?;
        let hwm = HandshakeWirelessManager::shared();
        let ports = [
            PortHandshake::new(Jack::Output, Rc::clone(&hwm), &config)?,
            PortHandshake::new(Jack::Input, Rc::clone(&hwm), &config)?,
        ];

        Ok(Self {
            config,
            hwm,
            ports,
            peers: Default::default(),
            reported: [PortStatus::Disconnected; 2],
        })
    }

    /// Route handshake packets to this coordinator and mount both ports.
    pub fn initialize(&mut self, device: &mut D) -> Result<(), HandshakeError> {
        let hwm = Rc::clone(&self.hwm);
        device.wireless_manager().set_packet_handler(
            PacketType::Handshake,
            Box::new(move |sender, payload| {
                if let Err(err) = hwm.borrow_mut().process_packet(sender, payload) {
                    warn!(%sender, error = %err, "handshake packet dropped");
                }
            }),
        );

        for port in &mut self.ports {
            port.initialize(device)?;
        }
        info!(
            output = ?self.ports[Jack::Output.slot()].role(),
            input = ?self.ports[Jack::Input.slot()].role(),
            "remote device coordinator initialized"
        );
        Ok(())
    }

    /// One cooperative tick: pump I/O, tick OUTPUT then INPUT, apply events.
    pub fn sync(&mut self, device: &mut D) {
        device.pump();

        for jack in Jack::ALL {
            self.ports[jack.slot()].tick(device);
            self.apply_events(jack);
        }
        self.report_changes();
    }

    fn apply_events(&mut self, jack: Jack) {
        for event in self.ports[jack.slot()].drain_events() {
            match event {
                PeerEvent::SessionEstablished(peer) => {
                    self.peers[jack.slot()].insert(peer);
                }
                PeerEvent::SessionEnded(peer) => match self.config.daisy_chain_reset {
                    DaisyChainResetPolicy::ClearOnDisconnect => self.peers[jack.slot()].clear(),
                    DaisyChainResetPolicy::ClearOnUnpair => {
                        debug!(%jack, %peer, "session ended, peer set kept");
                    }
                },
                PeerEvent::PeerSighted(peer) => {
                    if self.port_index(jack) == Some(CONNECTED) {
                        self.add_daisy_chained_peer(jack, peer);
                    }
                }
                PeerEvent::PeerDeparted(peer) => {
                    self.remove_daisy_chained_peer(jack, peer);
                }
            }
        }
    }

    fn report_changes(&mut self) {
        for jack in Jack::ALL {
            let status = self.port_status(jack);
            let previous = std::mem::replace(&mut self.reported[jack.slot()], status);
            if previous != status {
                info!(%jack, ?previous, ?status, "port status changed");
            }
        }
    }

    fn port_index(&self, jack: Jack) -> Option<usize> {
        self.ports[jack.slot()].current_index()
    }

    /// Pure: depends only on the mounted state and the peer-set size.
    pub fn port_status(&self, jack: Jack) -> PortStatus {
        if self.peers[jack.slot()].len() > 1 {
            return PortStatus::DaisyChained;
        }
        match self.port_index(jack) {
            Some(CONNECTED) => PortStatus::Connected,
            Some(SEND_ID) => PortStatus::Connecting,
            _ => PortStatus::Disconnected,
        }
    }

    pub fn port_state(&self, jack: Jack) -> PortState {
        PortState {
            port: jack,
            status: self.port_status(jack),
            peer_addresses: self.peers[jack.slot()].iter().copied().collect(),
        }
    }

    /// Record another peer on `jack`. Returns false if it was already known.
    pub fn add_daisy_chained_peer(&mut self, jack: Jack, peer: MacAddress) -> bool {
        let added = self.peers[jack.slot()].insert(peer);
        if added {
            info!(%jack, %peer, "daisy-chained peer added");
        }
        added
    }

    /// Forget a peer on `jack`. Returns false if it was not known.
    pub fn remove_daisy_chained_peer(&mut self, jack: Jack, peer: MacAddress) -> bool {
        let removed = self.peers[jack.slot()].remove(&peer);
        if removed {
            info!(%jack, %peer, "daisy-chained peer removed");
        }
        removed
    }

    /// Force `jack` back to Idle. The peer set follows the reset policy.
    pub fn reset_port(&mut self, device: &mut D, jack: Jack) -> Result<(), HandshakeError> {
        self.ports[jack.slot()].reset(device)?;
        self.apply_events(jack);
        if self.config.daisy_chain_reset == DaisyChainResetPolicy::ClearOnUnpair {
            self.peers[jack.slot()].clear();
        }
        self.report_changes();
        Ok(())
    }

    /// Tell the peer we are leaving, reset `jack` and forget all its peers.
    pub fn unpair(&mut self, device: &mut D, jack: Jack) -> Result<(), HandshakeError> {
        if self.hwm.borrow().mac_peer(jack).is_some() {
            let sent = self.hwm.borrow().send_packet(
                device.wireless_manager(),
                HsCommand::NotifyDisconnect,
                jack,
            );
            if let Err(err) = sent {
                debug!(%jack, error = %err, "unpair notify not delivered");
            }
        }
        self.ports[jack.slot()].reset(device)?;
        self.apply_events(jack);
        self.peers[jack.slot()].clear();
        self.report_changes();
        Ok(())
    }

    /// Dismount both ports and stop receiving handshake packets.
    pub fn shutdown(&mut self, device: &mut D) {
        for port in &mut self.ports {
            port.shutdown(device);
        }
        for jack in Jack::ALL {
            self.apply_events(jack);
        }
        self.hwm.borrow_mut().clear_callbacks();
        device
            .wireless_manager()
            .clear_packet_handler(PacketType::Handshake);
        info!("remote device coordinator shut down");
    }

    pub fn config(&self) -> &HandshakeConfig {
        &self.config
    }

    pub fn port(&self, jack: Jack) -> &PortHandshake<D> {
        &self.ports[jack.slot()]
    }

    /// Peer currently registered with the radio for `jack`.
    pub fn active_peer(&self, jack: Jack) -> Option<MacAddress> {
        self.hwm.borrow().mac_peer(jack)
    }
}
