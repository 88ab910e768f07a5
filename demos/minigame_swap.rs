//! Minigame Swap
//!
//! This example runs a small main game, pauses it in the middle of a
//! duel to play a minigame, and returns to the duel with its progress
//! intact.
//!
//! Key concepts:
//! - Pausing a machine and carrying state progress in a snapshot
//! - A swappable game reporting its outcome
//! - Automatic resume once the swapped game reaches a terminal state
//!
//! Run with: RUST_LOG=quickdraw_core=debug cargo run --example minigame_swap

use quickdraw_core::builder::StateMachineBuilder;
use quickdraw_core::core::{Flag, State, StateId, StateMachine, StateTransition};
use quickdraw_core::device::{Device, MacAddress, Pdn};
use quickdraw_core::manager::{GameType, StateMachineManager, SwappableGame, SwappableOutcome};
use quickdraw_core::sim::{ManualClock, PeerBus, SimPdn};
use quickdraw_core::snapshot::Snapshot;
use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;
use tracing_subscriber::{fmt, EnvFilter};

const DUEL_ID: StateId = StateId(1);
const DUEL: usize = 1;

struct Lobby {
    ready: Flag,
}

impl State<Pdn> for Lobby {
    fn state_id(&self) -> StateId {
        StateId(0)
    }

    fn name(&self) -> &str {
        "Lobby"
    }

    fn on_state_mounted(&mut self, device: &mut Pdn) {
        device.display().draw_text(0, "LOBBY");
    }

    fn on_state_loop(&mut self, _device: &mut Pdn) {
        self.ready.raise();
    }

    fn on_state_dismounted(&mut self, _device: &mut Pdn) {
        self.ready.lower();
    }
}

struct Duel {
    round: u32,
}

impl State<Pdn> for Duel {
    fn state_id(&self) -> StateId {
        DUEL_ID
    }

    fn name(&self) -> &str {
        "Duel"
    }

    fn on_state_mounted(&mut self, _device: &mut Pdn) {
        self.round = 0;
    }

    fn on_state_loop(&mut self, device: &mut Pdn) {
        self.round += 1;
        device.display().draw_text(1, &format!("ROUND {}", self.round));
        println!("  duel round {}", self.round);
    }

    fn on_state_paused(&mut self, _device: &mut Pdn) -> Option<Snapshot> {
        println!("  duel paused at round {}", self.round);
        Some(Snapshot::new(DUEL_ID, self.round))
    }

    fn on_state_resumed(&mut self, _device: &mut Pdn, snapshot: Option<Snapshot>) {
        if let Some(round) = snapshot.and_then(|snapshot| snapshot.into_inner::<u32>().ok()) {
            self.round = round;
        }
        println!("  duel resumed at round {}", self.round);
    }
}

struct Aim {
    shots: u32,
    done: Flag,
}

impl State<Pdn> for Aim {
    fn state_id(&self) -> StateId {
        StateId(0)
    }

    fn name(&self) -> &str {
        "Aim"
    }

    fn on_state_loop(&mut self, device: &mut Pdn) {
        self.shots += 1;
        device.haptics().set_intensity(120);
        println!("  minigame shot {}", self.shots);
        if self.shots == 3 {
            device.haptics().off();
            self.done.raise();
        }
    }
}

struct Scored;

impl State<Pdn> for Scored {
    fn state_id(&self) -> StateId {
        StateId(1)
    }

    fn name(&self) -> &str {
        "Scored"
    }

    fn is_terminal_state(&self) -> bool {
        true
    }
}

struct TargetPractice {
    machine: StateMachine<Pdn>,
}

impl SwappableGame<Pdn> for TargetPractice {
    fn machine(&self) -> &StateMachine<Pdn> {
        &self.machine
    }

    fn machine_mut(&mut self) -> &mut StateMachine<Pdn> {
        &mut self.machine
    }

    fn game_type(&self) -> GameType {
        GameType(7)
    }

    fn outcome(&self) -> SwappableOutcome {
        if self.machine.is_finished() {
            SwappableOutcome::won(3)
        } else {
            SwappableOutcome::default()
        }
    }
}

fn target_practice() -> Result<TargetPractice, Box<dyn Error>> {
    let done = Flag::new();
    let mut builder = StateMachineBuilder::new(2);
    let aim = builder.add_state(Aim {
        shots: 0,
        done: done.clone(),
    });
    let scored = builder.add_state(Scored);
    builder.add_transition(aim, StateTransition::on_flag(&done, scored));
    Ok(TargetPractice {
        machine: builder.build()?,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Minigame Swap ===\n");

    let bus = PeerBus::new();
    let clock = ManualClock::new();
    let mut sim = SimPdn::new(MacAddress([0x24, 0x6F, 0x28, 0, 0, 0x01]), &bus, &clock);

    let ready = Flag::new();
    let mut builder = StateMachineBuilder::new(1);
    let lobby = builder.add_state(Lobby {
        ready: ready.clone(),
    });
    let duel = builder.add_state(Duel { round: 0 });
    builder.add_transition(lobby, StateTransition::on_flag(&ready, duel));

    let main_game = Rc::new(RefCell::new(builder.build()?));
    main_game.borrow_mut().initialize(&mut sim.device)?;

    let mut manager = StateMachineManager::new();
    manager.set_default_state_machine(Rc::clone(&main_game));

    println!("Main game:");
    for _ in 0..3 {
        clock.advance(10);
        manager.tick(&mut sim.device);
    }

    println!("\nSwapping in target practice:");
    manager.pause_and_load(&mut sim.device, Box::new(target_practice()?), DUEL)?;
    while manager.is_swapped() {
        clock.advance(10);
        manager.tick(&mut sim.device);
    }
    println!(
        "  {:?} finished with {:?}",
        manager.last_game_type(),
        manager.last_outcome()
    );

    println!("\nBack in the main game:");
    for _ in 0..2 {
        clock.advance(10);
        manager.tick(&mut sim.device);
    }

    manager.shutdown(&mut sim.device);
    main_game.borrow_mut().shutdown(&mut sim.device);

    println!("\n=== Example Complete ===");
    Ok(())
}
