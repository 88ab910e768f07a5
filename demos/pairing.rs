//! Cable Pairing Between Two Devices
//!
//! This example plugs device A's OUTPUT jack into device B's INPUT jack
//! and runs both on simulated drivers until they pair, then pulls the
//! cable and watches the heartbeat monitor end the session.
//!
//! Key concepts:
//! - Serial address discovery followed by a radio identity exchange
//! - Heartbeat monitoring on a live session
//! - Port status derived from the peer-address set
//!
//! Run with: RUST_LOG=quickdraw_core=debug cargo run --example pairing

use quickdraw_core::config::HandshakeConfig;
use quickdraw_core::device::{Jack, MacAddress, Pdn};
use quickdraw_core::handshake::{HandshakeError, PortStatus, RemoteDeviceCoordinator};
use quickdraw_core::sim::{ManualClock, PeerBus, SerialCable, SimPdn};
use tracing_subscriber::{fmt, EnvFilter};

const TICK_MS: u64 = 10;

struct Node {
    name: &'static str,
    sim: SimPdn,
    coordinator: RemoteDeviceCoordinator<Pdn>,
}

impl Node {
    fn boot(
        name: &'static str,
        mac: MacAddress,
        bus: &PeerBus,
        clock: &ManualClock,
    ) -> Result<Self, HandshakeError> {
        let mut sim = SimPdn::new(mac, bus, clock);
        let mut coordinator = RemoteDeviceCoordinator::new(HandshakeConfig::default())?;
        coordinator.initialize(&mut sim.device)?;
        Ok(Self {
            name,
            sim,
            coordinator,
        })
    }

    fn print(&self, jack: Jack) {
        let state = self.coordinator.port_state(jack);
        let json = serde_json::to_string(&state).unwrap_or_default();
        println!("  {} {}: {}", self.name, jack, json);
    }
}

fn run(nodes: &mut [Node; 2], clock: &ManualClock, ms: u64) {
    for _ in 0..ms / TICK_MS {
        clock.advance(TICK_MS);
        for node in nodes.iter_mut() {
            node.coordinator.sync(&mut node.sim.device);
        }
    }
}

fn main() -> Result<(), HandshakeError> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Cable Pairing ===\n");

    let bus = PeerBus::new();
    let clock = ManualClock::new();
    let mut nodes = [
        Node::boot("A", MacAddress([0x24, 0x6F, 0x28, 0, 0, 0x0A]), &bus, &clock)?,
        Node::boot("B", MacAddress([0x24, 0x6F, 0x28, 0, 0, 0x0B]), &bus, &clock)?,
    ];

    println!("Plugging A.OUTPUT into B.INPUT");
    let cable = SerialCable::plug(&nodes[0].sim.output_jack, &nodes[1].sim.input_jack);

    let mut elapsed = 0;
    while nodes[0].coordinator.port_status(Jack::Output) != PortStatus::Connected
        || nodes[1].coordinator.port_status(Jack::Input) != PortStatus::Connected
    {
        run(&mut nodes, &clock, TICK_MS);
        elapsed += TICK_MS;
    }
    println!("Paired after {elapsed} ms");
    nodes[0].print(Jack::Output);
    nodes[1].print(Jack::Input);

    println!("\nHolding the session on heartbeats for 2 s");
    run(&mut nodes, &clock, 2_000);
    nodes[0].print(Jack::Output);

    println!("\nPulling the cable");
    cable.unplug();
    run(&mut nodes, &clock, 1_000);
    nodes[0].print(Jack::Output);
    nodes[1].print(Jack::Input);

    println!("\nRadio traffic:");
    for packet in bus.log() {
        println!(
            "  {} -> {} {:?} {:?}",
            packet.from, packet.to, packet.packet_type, packet.payload
        );
    }

    for node in nodes.iter_mut() {
        node.coordinator.shutdown(&mut node.sim.device);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
