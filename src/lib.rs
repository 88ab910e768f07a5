//! Quickdraw core: the cooperative state machine engine and port pairing
//! protocol of a handheld game device.
//!
//! Everything runs on one thread in run-to-completion ticks. One device
//! tick calls, in order:
//!
//! 1. [`RemoteDeviceCoordinator::sync`](handshake::RemoteDeviceCoordinator::sync),
//!    which pumps serial and radio I/O and advances pairing on both jacks
//! 2. [`StateMachineManager::tick`](manager::StateMachineManager::tick),
//!    which advances whichever game machine is active
//!
//! # Modules
//!
//! - [`core`]: `State` lifecycle, guards, transitions, the `StateMachine`
//! - [`builder`]: assembling machines and declaring state ids
//! - [`snapshot`]: progress captured across pause/resume
//! - [`manager`]: swapping a minigame in and returning to the main game
//! - [`device`]: the capability surface states run against
//! - [`handshake`]: serial discovery plus radio identity exchange per jack
//! - [`config`]: protocol timings and daisy-chain policy
//! - [`sim`]: in-memory drivers for host runs and tests
//!
//! # Example
//!
//! ```rust
//! use quickdraw_core::builder::StateMachineBuilder;
//! use quickdraw_core::core::{Flag, State, StateId, StateTransition};
//!
//! struct Waiting {
//!     ticks: u32,
//!     ready: Flag,
//! }
//!
//! impl State<()> for Waiting {
//!     fn state_id(&self) -> StateId {
//!         StateId(0)
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Waiting"
//!     }
//!
//!     fn on_state_loop(&mut self, _ctx: &mut ()) {
//!         self.ticks += 1;
//!         if self.ticks == 2 {
//!             self.ready.raise();
//!         }
//!     }
//! }
//!
//! struct Done;
//!
//! impl State<()> for Done {
//!     fn state_id(&self) -> StateId {
//!         StateId(1)
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Done"
//!     }
//!
//!     fn is_terminal_state(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let ready = Flag::new();
//! let mut builder = StateMachineBuilder::new(7);
//! let waiting = builder.add_state(Waiting { ticks: 0, ready: ready.clone() });
//! let done = builder.add_state(Done);
//! builder.add_transition(waiting, StateTransition::on_flag(&ready, done));
//!
//! let mut machine = builder.build().unwrap();
//! machine.initialize(&mut ()).unwrap();
//! machine.tick(&mut ());
//! assert!(!machine.is_finished());
//! machine.tick(&mut ());
//! assert!(machine.is_finished());
//! machine.shutdown(&mut ());
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod device;
pub mod handshake;
pub mod manager;
pub mod sim;
pub mod snapshot;

// Re-export commonly used types
pub use core::{Flag, Guard, State, StateId, StateMachine, StateTransition};
pub use device::{Device, Jack, MacAddress};
pub use handshake::{PortState, PortStatus, RemoteDeviceCoordinator};
pub use manager::StateMachineManager;
