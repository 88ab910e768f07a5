//! Simulated peer radio: a shared bus and the radios attached to it.

use crate::device::{MacAddress, PacketType, PeerComms, PeerPacket, TransportError};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;
use tracing::trace;

/// A packet some radio put on the bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentPacket {
    pub from: MacAddress,
    pub to: MacAddress,
    pub packet_type: PacketType,
    pub payload: Vec<u8>,
    pub delivered: bool,
}

#[derive(Debug, Default)]
struct BusInner {
    online: BTreeSet<MacAddress>,
    inboxes: HashMap<MacAddress, VecDeque<PeerPacket>>,
    log: Vec<SentPacket>,
}

impl BusInner {
    fn deliver(&mut self, from: MacAddress, to: MacAddress, packet_type: PacketType, payload: &[u8]) -> bool {
        let targets: Vec<MacAddress> = if to == MacAddress::BROADCAST {
            self.online.iter().copied().filter(|mac| *mac != from).collect()
        } else if self.online.contains(&to) {
            vec![to]
        } else {
            Vec::new()
        };

        for target in &targets {
            self.inboxes.entry(*target).or_default().push_back(PeerPacket {
                sender: from,
                packet_type,
                payload: payload.to_vec(),
            });
        }

        let delivered = !targets.is_empty();
        trace!(%from, %to, ?packet_type, delivered, "bus packet");
        self.log.push(SentPacket {
            from,
            to,
            packet_type,
            payload: payload.to_vec(),
            delivered,
        });
        delivered
    }
}

/// The air between simulated radios. Clones share the same bus.
#[derive(Clone, Debug, Default)]
pub struct PeerBus {
    inner: Rc<RefCell<BusInner>>,
}

impl PeerBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a packet on the air as if `from` had sent it.
    pub fn inject(&self, from: MacAddress, to: MacAddress, packet_type: PacketType, payload: &[u8]) -> bool {
        self.inner.borrow_mut().deliver(from, to, packet_type, payload)
    }

    /// Every packet sent on the bus, oldest first.
    pub fn log(&self) -> Vec<SentPacket> {
        self.inner.borrow().log.clone()
    }

    pub fn sent_by(&self, from: MacAddress) -> Vec<SentPacket> {
        self.inner
            .borrow()
            .log
            .iter()
            .filter(|packet| packet.from == from)
            .cloned()
            .collect()
    }

    pub fn clear_log(&self) {
        self.inner.borrow_mut().log.clear();
    }

    pub fn is_online(&self, mac: MacAddress) -> bool {
        self.inner.borrow().online.contains(&mac)
    }
}

/// Simulated peer radio attached to a [`PeerBus`].
pub struct SimPeerComms {
    mac: MacAddress,
    bus: PeerBus,
    ready: bool,
}

impl SimPeerComms {
    pub fn new(mac: MacAddress, bus: &PeerBus) -> Self {
        Self {
            mac,
            bus: bus.clone(),
            ready: false,
        }
    }
}

impl PeerComms for SimPeerComms {
    fn connect(&mut self, _channel: u8) -> Result<(), TransportError> {
        self.bus.inner.borrow_mut().online.insert(self.mac);
        self.ready = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut bus = self.bus.inner.borrow_mut();
        bus.online.remove(&self.mac);
        bus.inboxes.remove(&self.mac);
        self.ready = false;
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn mac_address(&self) -> MacAddress {
        self.mac
    }

    fn send(&mut self, dst: MacAddress, packet_type: PacketType, payload: &[u8]) -> Result<(), TransportError> {
        if !self.ready {
            return Err(TransportError::NotReady);
        }
        if self.bus.inner.borrow_mut().deliver(self.mac, dst, packet_type, payload) {
            Ok(())
        } else {
            Err(TransportError::Unreachable(dst))
        }
    }

    fn poll(&mut self) -> Option<PeerPacket> {
        if !self.ready {
            return None;
        }
        self.bus
            .inner
            .borrow_mut()
            .inboxes
            .get_mut(&self.mac)
            .and_then(VecDeque::pop_front)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: MacAddress = MacAddress([0xA; 6]);
    const B: MacAddress = MacAddress([0xB; 6]);
    const C: MacAddress = MacAddress([0xC; 6]);

    #[test]
    fn unicast_reaches_only_online_target() {
        let bus = PeerBus::new();
        let mut a = SimPeerComms::new(A, &bus);
        let mut b = SimPeerComms::new(B, &bus);
        a.connect(6).unwrap();
        b.connect(6).unwrap();

        a.send(B, PacketType::Handshake, &[0, 0]).unwrap();
        assert_eq!(
            a.send(C, PacketType::Handshake, &[0, 0]),
            Err(TransportError::Unreachable(C))
        );

        let packet = b.poll().unwrap();
        assert_eq!(packet.sender, A);
        assert!(b.poll().is_none());
        assert_eq!(bus.sent_by(A).len(), 2);
        assert!(!bus.log()[1].delivered);
    }

    #[test]
    fn broadcast_skips_sender_and_disconnected_radios() {
        let bus = PeerBus::new();
        let mut a = SimPeerComms::new(A, &bus);
        let mut b = SimPeerComms::new(B, &bus);
        let mut c = SimPeerComms::new(C, &bus);
        for radio in [&mut a, &mut b, &mut c] {
            radio.connect(6).unwrap();
        }
        c.disconnect();

        a.send(MacAddress::BROADCAST, PacketType::Debug, &[1]).unwrap();

        assert!(a.poll().is_none());
        assert!(b.poll().is_some());
        assert!(c.poll().is_none());
        assert!(!bus.is_online(C));
    }

    #[test]
    fn disconnected_radio_cannot_send() {
        let bus = PeerBus::new();
        let mut a = SimPeerComms::new(A, &bus);
        assert_eq!(a.send(B, PacketType::Debug, &[]), Err(TransportError::NotReady));
    }
}
