//! Property-based tests for the engine and the pairing surface.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use quickdraw_core::builder::StateMachineBuilder;
use quickdraw_core::config::HandshakeConfig;
use quickdraw_core::core::{Guard, State, StateId, StateMachine, StateTransition};
use quickdraw_core::device::{Jack, MacAddress, Mailbox, SerialDriver, SerialManager};
use quickdraw_core::handshake::{PortStatus, RemoteDeviceCoordinator};
use quickdraw_core::sim::{ManualClock, PeerBus, SimJack, SimPdn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct Counts {
    mounts: Vec<u32>,
    dismounts: Vec<u32>,
}

struct Tracked(u32);

impl State<Counts> for Tracked {
    fn state_id(&self) -> StateId {
        StateId(self.0)
    }

    fn name(&self) -> &str {
        "Tracked"
    }

    fn on_state_mounted(&mut self, counts: &mut Counts) {
        counts.mounts.push(self.0);
    }

    fn on_state_dismounted(&mut self, counts: &mut Counts) {
        counts.dismounts.push(self.0);
    }
}

fn machine_of(size: usize) -> StateMachine<Counts> {
    let mut builder = StateMachineBuilder::new(9);
    for id in 0..size {
        builder.add_state(Tracked(id as u32));
    }
    builder.build().unwrap()
}

proptest! {
    #[test]
    fn first_passing_transition_wins(guards in prop::collection::vec(any::<bool>(), 1..8)) {
        let evaluated = Rc::new(RefCell::new(Vec::new()));
        let mut builder = StateMachineBuilder::new(1);
        let origin = builder.add_state(Tracked(100));
        for (position, passes) in guards.iter().copied().enumerate() {
            let target = builder.add_state(Tracked(position as u32));
            let log = Rc::clone(&evaluated);
            builder.add_transition(origin, StateTransition::new(
                Guard::new(move || {
                    log.borrow_mut().push(position);
                    passes
                }),
                target,
            ));
        }
        let mut machine = builder.build().unwrap();
        let mut counts = Counts::default();
        machine.initialize(&mut counts).unwrap();

        let fired = machine.tick(&mut counts);

        match guards.iter().position(|passes| *passes) {
            Some(first) => {
                prop_assert_eq!(fired, Some(first + 1));
                prop_assert_eq!(evaluated.borrow().clone(), (0..=first).collect::<Vec<_>>());
            }
            None => {
                prop_assert_eq!(fired, None);
                prop_assert_eq!(evaluated.borrow().len(), guards.len());
            }
        }
        machine.shutdown(&mut counts);
    }

    #[test]
    fn skip_always_dismounts_once_and_mounts_once(
        size in 1..6usize,
        start in 0..6usize,
        target in 0..6usize,
    ) {
        let start = start % size;
        let target = target % size;
        let mut machine = machine_of(size);
        let mut counts = Counts::default();
        machine.initialize(&mut counts).unwrap();
        machine.skip_to_state(&mut counts, start).unwrap();
        counts = Counts::default();

        machine.skip_to_state(&mut counts, target).unwrap();

        prop_assert_eq!(&counts.dismounts, &vec![start as u32]);
        prop_assert_eq!(&counts.mounts, &vec![target as u32]);
        prop_assert_eq!(machine.current_index(), Some(target));
        machine.shutdown(&mut counts);
    }

    #[test]
    fn history_never_exceeds_capacity(capacity in 1..16usize, skips in prop::collection::vec(0..3usize, 0..40)) {
        let mut builder = StateMachineBuilder::new(2);
        for id in 0..3 {
            builder.add_state(Tracked(id));
        }
        builder.history_capacity(capacity);
        let mut machine = builder.build().unwrap();
        let mut counts = Counts::default();
        machine.initialize(&mut counts).unwrap();

        for index in &skips {
            machine.skip_to_state(&mut counts, *index).unwrap();
        }

        prop_assert_eq!(machine.history().len(), (skips.len() + 1).min(capacity));
        let last = machine.history().last().map(|record| record.to);
        prop_assert_eq!(last, machine.current_state_id());
        machine.shutdown(&mut counts);
    }

    #[test]
    fn guard_checks_are_repeatable(value in any::<bool>()) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let guard = Guard::new(move || {
            counter.set(counter.get() + 1);
            value
        });
        prop_assert_eq!(guard.check(), guard.check());
        prop_assert_eq!(calls.get(), 2);
    }

    #[test]
    fn serial_lines_survive_any_chunking(
        payloads in prop::collection::vec("[a-z0-9:]{1,20}", 1..6),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let stream: Vec<u8> = payloads
            .iter()
            .flat_map(|payload| quickdraw_core::device::encode_line(payload))
            .collect();
        let mut points: Vec<usize> = cuts.iter().map(|cut| cut.index(stream.len())).collect();
        points.sort_unstable();
        points.dedup();

        let jack = SimJack::new();
        let mut manager = SerialManager::new(Box::new(jack.clone()), Box::new(SimJack::new()));
        let lines = Mailbox::new();
        let sink = lines.clone();
        manager.set_line_callback(Jack::Output, Box::new(move |line| sink.push(line.to_string())));

        let mut previous = 0;
        for point in points.into_iter().chain(std::iter::once(stream.len())) {
            jack.inject(&stream[previous..point]);
            manager.pump();
            previous = point;
        }

        prop_assert_eq!(lines.drain(), payloads);
    }

    #[test]
    fn port_status_is_a_pure_function_of_peer_set(
        ops in prop::collection::vec((any::<bool>(), 0..4u8), 0..20),
    ) {
        let bus = PeerBus::new();
        let clock = ManualClock::new();
        let mut sim = SimPdn::new(MacAddress([1; 6]), &bus, &clock);
        let mut coordinator = RemoteDeviceCoordinator::new(HandshakeConfig::default()).unwrap();
        coordinator.initialize(&mut sim.device).unwrap();

        let mut expected = std::collections::BTreeSet::new();
        for (add, last_byte) in ops {
            let peer = MacAddress([0x30, 0, 0, 0, 0, last_byte]);
            if add {
                coordinator.add_daisy_chained_peer(Jack::Output, peer);
                expected.insert(peer);
            } else {
                coordinator.remove_daisy_chained_peer(Jack::Output, peer);
                expected.remove(&peer);
            }

            let first = coordinator.port_status(Jack::Output);
            let second = coordinator.port_status(Jack::Output);
            prop_assert_eq!(first, second);
            let want = if expected.len() > 1 {
                PortStatus::DaisyChained
            } else {
                PortStatus::Disconnected
            };
            prop_assert_eq!(first, want);
            prop_assert_eq!(coordinator.port_state(Jack::Output).peer_addresses.len(), expected.len());
        }
        prop_assert_eq!(coordinator.port_status(Jack::Input), PortStatus::Disconnected);
        coordinator.shutdown(&mut sim.device);
    }
}

#[test]
fn sim_jack_is_a_serial_driver() {
    let mut jack = SimJack::new();
    jack.inject(b"*hb\r");
    assert_eq!(jack.read_bytes(), b"*hb\r");
}
