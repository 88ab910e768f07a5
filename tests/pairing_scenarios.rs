//! End-to-end pairing scenarios between simulated devices.
//!
//! Each test builds its own bus, clock and cables, so nothing leaks
//! between tests.

use quickdraw_core::config::{DaisyChainResetPolicy, HandshakeConfig};
use quickdraw_core::device::{Device, HttpRequest, Jack, MacAddress, PacketType, Pdn, WirelessMode};
use quickdraw_core::handshake::{
    HandshakePacket, HsCommand, PortStatus, RemoteDeviceCoordinator, CONNECTED, IDLE,
};
use quickdraw_core::sim::{ManualClock, PeerBus, SerialCable, SimPdn};

const TICK_MS: u64 = 10;

const MAC_A: MacAddress = MacAddress([0xA0, 0, 0, 0, 0, 0x0A]);
const MAC_B: MacAddress = MacAddress([0xB0, 0, 0, 0, 0, 0x0B]);
const MAC_C: MacAddress = MacAddress([0xC0, 0, 0, 0, 0, 0x0C]);

struct Node {
    sim: SimPdn,
    coordinator: RemoteDeviceCoordinator<Pdn>,
}

impl Node {
    fn new(mac: MacAddress, bus: &PeerBus, clock: &ManualClock, config: &HandshakeConfig) -> Self {
        let mut sim = SimPdn::new(mac, bus, clock);
        let mut coordinator = RemoteDeviceCoordinator::new(config.clone()).unwrap();
        coordinator.initialize(&mut sim.device).unwrap();
        Self { sim, coordinator }
    }

    fn sync(&mut self) {
        self.coordinator.sync(&mut self.sim.device);
    }

    fn status(&self, jack: Jack) -> PortStatus {
        self.coordinator.port_status(jack)
    }
}

struct Rig {
    bus: PeerBus,
    clock: ManualClock,
    nodes: Vec<Node>,
}

impl Rig {
    fn new(macs: &[MacAddress], config: HandshakeConfig) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let bus = PeerBus::new();
        let clock = ManualClock::new();
        let nodes = macs
            .iter()
            .map(|mac| Node::new(*mac, &bus, &clock, &config))
            .collect();
        Self { bus, clock, nodes }
    }

    fn cable(&self, from: usize, to: usize) -> SerialCable {
        SerialCable::plug(&self.nodes[from].sim.output_jack, &self.nodes[to].sim.input_jack)
    }

    fn tick(&mut self) {
        self.clock.advance(TICK_MS);
        for node in &mut self.nodes {
            node.sync();
        }
    }

    fn run_ms(&mut self, ms: u64) {
        for _ in 0..ms / TICK_MS {
            self.tick();
        }
    }

    /// Tick until `done` holds, returning the ticks it took.
    fn run_until(&mut self, max_ticks: usize, done: impl Fn(&Rig) -> bool) -> Option<usize> {
        for tick in 1..=max_ticks {
            self.tick();
            if done(self) {
                return Some(tick);
            }
        }
        None
    }

    fn commands_sent(&self, from: MacAddress, command: HsCommand) -> usize {
        self.bus
            .sent_by(from)
            .iter()
            .filter(|packet| packet.packet_type == PacketType::Handshake)
            .filter_map(|packet| HandshakePacket::decode(&packet.payload).ok())
            .filter(|packet| packet.command == command as u8)
            .count()
    }

    fn shutdown(&mut self) {
        for node in &mut self.nodes {
            node.coordinator.shutdown(&mut node.sim.device);
        }
    }
}

fn paired(rig: &Rig) -> bool {
    rig.nodes[0].status(Jack::Output) == PortStatus::Connected
        && rig.nodes[1].status(Jack::Input) == PortStatus::Connected
}

#[test]
fn happy_path_pairing_exchanges_one_id_each_way() {
    let mut rig = Rig::new(&[MAC_A, MAC_B], HandshakeConfig::default());
    let _cable = rig.cable(0, 1);

    assert_eq!(rig.nodes[0].status(Jack::Output), PortStatus::Disconnected);
    let ticks = rig.run_until(100, paired).expect("ports never paired");
    assert!(ticks <= 40, "pairing took {ticks} ticks");

    // Stay up for a while on heartbeats alone.
    rig.run_ms(3_000);
    assert!(paired(&rig));

    assert_eq!(rig.commands_sent(MAC_A, HsCommand::ExchangeId), 1);
    assert_eq!(rig.commands_sent(MAC_B, HsCommand::ExchangeId), 1);
    assert_eq!(rig.commands_sent(MAC_A, HsCommand::NotifyDisconnect), 0);

    let state = rig.nodes[0].coordinator.port_state(Jack::Output);
    assert_eq!(state.peer_addresses, vec![MAC_B]);
    assert_eq!(rig.nodes[1].coordinator.port_state(Jack::Input).peer_addresses, vec![MAC_A]);
    assert_eq!(rig.nodes[0].coordinator.active_peer(Jack::Output), Some(MAC_B));

    // The unplugged jacks never got anywhere.
    assert_eq!(rig.nodes[0].status(Jack::Input), PortStatus::Disconnected);
    assert_eq!(rig.nodes[1].status(Jack::Output), PortStatus::Disconnected);
    rig.shutdown();
}

#[test]
fn connecting_is_reported_while_waiting_for_reply() {
    let mut rig = Rig::new(&[MAC_A, MAC_B], HandshakeConfig::default());
    let _cable = rig.cable(0, 1);

    let saw_connecting = rig.run_until(100, |rig| {
        rig.nodes[0].status(Jack::Output) == PortStatus::Connecting
    });
    assert!(saw_connecting.is_some());
    assert!(rig.run_until(100, paired).is_some());
    rig.shutdown();
}

#[test]
fn heartbeat_loss_returns_to_idle_with_one_notify() {
    let config = HandshakeConfig::default();
    let window = config.first_heartbeat_timeout_ms + config.heartbeat_timeout_ms;
    let mut rig = Rig::new(&[MAC_A, MAC_B], config);
    let cable = rig.cable(0, 1);
    rig.run_until(100, paired).expect("ports never paired");
    rig.run_ms(1_000);

    cable.unplug();
    let ticks = rig
        .run_until(200, |rig| {
            rig.nodes[0].status(Jack::Output) == PortStatus::Disconnected
                && rig.nodes[1].status(Jack::Input) == PortStatus::Disconnected
        })
        .expect("ports never dropped");
    assert!(ticks as u64 * TICK_MS <= window + TICK_MS);

    rig.run_ms(1_000);
    assert_eq!(rig.commands_sent(MAC_A, HsCommand::NotifyDisconnect), 1);
    assert_eq!(rig.commands_sent(MAC_B, HsCommand::NotifyDisconnect), 1);
    assert!(rig.nodes[0].coordinator.port_state(Jack::Output).peer_addresses.is_empty());
    assert_eq!(rig.nodes[0].coordinator.active_peer(Jack::Output), None);
    assert_eq!(rig.nodes[0].coordinator.port(Jack::Output).current_index(), Some(IDLE));
    rig.shutdown();
}

#[test]
fn replugging_pairs_again() {
    let config = HandshakeConfig::default();
    // Unplugged before any heartbeat arrived, so the grace period applies.
    let window = config.first_heartbeat_timeout_ms + config.heartbeat_timeout_ms + TICK_MS;
    let mut rig = Rig::new(&[MAC_A, MAC_B], config);
    let cable = rig.cable(0, 1);
    rig.run_until(100, paired).expect("ports never paired");

    cable.unplug();
    rig.run_ms(1_000);
    assert!(paired(&rig), "dropped before the first-heartbeat grace ran out");
    rig.run_ms(window - 1_000);
    assert!(!paired(&rig));

    let _cable = rig.cable(0, 1);
    assert!(rig.run_until(100, paired).is_some());
    assert_eq!(rig.commands_sent(MAC_A, HsCommand::ExchangeId), 2);
    rig.shutdown();
}

#[test]
fn sighted_peer_daisy_chains_until_it_leaves() {
    let mut rig = Rig::new(&[MAC_A, MAC_B], HandshakeConfig::default());
    let _cable = rig.cable(0, 1);
    rig.run_until(100, paired).expect("ports never paired");

    rig.nodes[0]
        .sim
        .output_jack
        .inject_line(&format!("smac:{MAC_C}"));
    rig.tick();
    assert_eq!(rig.nodes[0].status(Jack::Output), PortStatus::DaisyChained);
    assert_eq!(
        rig.nodes[0].coordinator.port_state(Jack::Output).peer_addresses,
        vec![MAC_B, MAC_C]
    );

    let notify = HandshakePacket::new(Jack::Input, HsCommand::NotifyDisconnect)
        .encode()
        .unwrap();
    assert!(rig.bus.inject(MAC_C, MAC_A, PacketType::Handshake, &notify));
    rig.tick();

    assert_eq!(rig.nodes[0].status(Jack::Output), PortStatus::Connected);
    assert_eq!(
        rig.nodes[0].coordinator.port_state(Jack::Output).peer_addresses,
        vec![MAC_B]
    );
    // The active session is untouched.
    rig.run_ms(1_000);
    assert!(paired(&rig));
    rig.shutdown();
}

fn switch_peers(policy: DaisyChainResetPolicy) -> Rig {
    let config = HandshakeConfig {
        daisy_chain_reset: policy,
        ..HandshakeConfig::default()
    };
    let mut rig = Rig::new(&[MAC_A, MAC_B, MAC_C], config);

    let first = rig.cable(0, 1);
    rig.run_until(100, paired).expect("A and B never paired");
    first.unplug();
    rig.run_ms(3_000);
    assert_ne!(rig.nodes[0].status(Jack::Output), PortStatus::Connected);

    let _second = rig.cable(0, 2);
    rig.run_until(100, |rig| {
        rig.nodes[2].status(Jack::Input) == PortStatus::Connected
            && rig.nodes[0].coordinator.port(Jack::Output).current_index() == Some(CONNECTED)
    })
    .expect("A and C never paired");
    rig
}

#[test]
fn clear_on_disconnect_forgets_previous_peer() {
    let mut rig = switch_peers(DaisyChainResetPolicy::ClearOnDisconnect);

    assert_eq!(rig.nodes[0].status(Jack::Output), PortStatus::Connected);
    assert_eq!(
        rig.nodes[0].coordinator.port_state(Jack::Output).peer_addresses,
        vec![MAC_C]
    );
    rig.shutdown();
}

#[test]
fn clear_on_unpair_keeps_previous_peer_until_unpaired() {
    let mut rig = switch_peers(DaisyChainResetPolicy::ClearOnUnpair);

    assert_eq!(rig.nodes[0].status(Jack::Output), PortStatus::DaisyChained);
    assert_eq!(
        rig.nodes[0].coordinator.port_state(Jack::Output).peer_addresses,
        vec![MAC_B, MAC_C]
    );

    rig.bus.clear_log();
    let node = &mut rig.nodes[0];
    node.coordinator.unpair(&mut node.sim.device, Jack::Output).unwrap();
    assert_eq!(node.status(Jack::Output), PortStatus::Disconnected);
    assert!(node.coordinator.port_state(Jack::Output).peer_addresses.is_empty());
    assert_eq!(rig.commands_sent(MAC_A, HsCommand::NotifyDisconnect), 1);
    rig.shutdown();
}

#[test]
fn send_id_gives_up_on_silent_peer() {
    let config = HandshakeConfig::default();
    let timeout = config.send_id_timeout_ms;
    let mut rig = Rig::new(&[MAC_A], config);

    // A device that announces itself but never answers on the radio.
    rig.nodes[0]
        .sim
        .output_jack
        .inject_line(&format!("smac:{MAC_C}"));
    rig.run_until(5, |rig| rig.nodes[0].status(Jack::Output) == PortStatus::Connecting)
        .expect("never started connecting");
    assert_eq!(rig.nodes[0].coordinator.active_peer(Jack::Output), Some(MAC_C));

    rig.run_ms(timeout + 2 * TICK_MS);
    assert_eq!(rig.nodes[0].status(Jack::Output), PortStatus::Disconnected);
    assert_eq!(rig.nodes[0].coordinator.active_peer(Jack::Output), None);
    rig.shutdown();
}

#[test]
fn reset_port_drops_session() {
    let mut rig = Rig::new(&[MAC_A, MAC_B], HandshakeConfig::default());
    let _cable = rig.cable(0, 1);
    rig.run_until(100, paired).expect("ports never paired");

    let node = &mut rig.nodes[0];
    node.coordinator.reset_port(&mut node.sim.device, Jack::Output).unwrap();

    assert_eq!(node.status(Jack::Output), PortStatus::Disconnected);
    assert!(node.coordinator.port_state(Jack::Output).peer_addresses.is_empty());
    rig.shutdown();
}

#[test]
fn wifi_detour_does_not_break_pairing() {
    let mut rig = Rig::new(&[MAC_A, MAC_B], HandshakeConfig::default());
    let _cable = rig.cable(0, 1);

    {
        let node = &mut rig.nodes[0];
        let wireless = node.sim.device.wireless_manager();
        wireless.enable_wifi_mode();
        wireless.enable_wifi_mode();
        assert_eq!(node.sim.http.connect_count(), 1);
        assert_eq!(node.sim.http.disconnect_count(), 0);
        assert!(wireless.is_wifi_connected());

        wireless
            .queue_http_request(HttpRequest::post("/api/matches", "{}"))
            .unwrap();
        assert_eq!(node.sim.http.queued_requests().len(), 1);
    }

    // The first handshake send switches the radio back on its own.
    assert!(rig.run_until(100, paired).is_some());
    let wireless = rig.nodes[0].sim.device.wireless_manager();
    assert_eq!(wireless.mode(), WirelessMode::PeerComms);
    assert_eq!(rig.nodes[0].sim.http.disconnect_count(), 1);
    rig.shutdown();
}
