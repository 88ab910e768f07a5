//! Call/return between the default state machine and swapped-in games.
//!
//! The [`StateMachineManager`] runs a default machine (the main game) and,
//! on demand, one temporarily swapped machine such as a minigame:
//!
//! 1. `pause_and_load` asks the default machine's mounted state for a
//!    [`Snapshot`] and stops ticking the default machine
//! 2. the swapped game is initialized and ticked instead
//! 3. when the game reports ready, the manager records its outcome, shuts
//!    it down, skips the default machine to the caller's resume index and
//!    hands the snapshot back to the resumed state
//!
//! The default machine is shared with its owner, not owned. The swapped
//! game is owned and dropped on resume.

mod error;
mod game;

pub use error::ManagerError;
pub use game::{GameResult, GameType, SwappableGame, SwappableOutcome};

use crate::core::{AppId, StateIndex, StateMachine};
use crate::snapshot::Snapshot;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Shared handle to a state machine.
pub type SharedMachine<C> = Rc<RefCell<StateMachine<C>>>;

pub struct StateMachineManager<C> {
    default: Option<SharedMachine<C>>,
    swapped: Option<Box<dyn SwappableGame<C>>>,
    resume_index: StateIndex,
    paused_snapshot: Option<Snapshot>,
    last_outcome: SwappableOutcome,
    last_game_type: Option<GameType>,
}

impl<C> Default for StateMachineManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> StateMachineManager<C> {
    pub fn new() -> Self {
        Self {
            default: None,
            swapped: None,
            resume_index: 0,
            paused_snapshot: None,
            last_outcome: SwappableOutcome::default(),
            last_game_type: None,
        }
    }

    /// Register the default machine. The manager shares it, it does not own it.
    pub fn set_default_state_machine(&mut self, machine: SharedMachine<C>) {
        self.default = Some(machine);
    }

    /// Pause the default machine and start running `game`.
    ///
    /// Only one game can be swapped in at a time; a second call while one
    /// is running is rejected with [`ManagerError::AlreadySwapped`] and
    /// leaves everything untouched.
    pub fn pause_and_load(
        &mut self,
        ctx: &mut C,
        mut game: Box<dyn SwappableGame<C>>,
        resume_index: StateIndex,
    ) -> Result<(), ManagerError> {
        if self.swapped.is_some() {
            return Err(ManagerError::AlreadySwapped);
        }
        let default = self.default.as_ref().ok_or(ManagerError::NoDefaultMachine)?;

        let snapshot = {
            let mut machine = default.borrow_mut();
            if resume_index >= machine.len() {
                return Err(ManagerError::InvalidResumeIndex {
                    index: resume_index,
                    len: machine.len(),
                });
            }
            machine.pause(ctx)?
        };

        if let Err(err) = game.machine_mut().initialize(ctx) {
            default.borrow_mut().resume(ctx, snapshot)?;
            return Err(err.into());
        }

        info!(
            game = %game.game_type(),
            resume_index,
            has_snapshot = snapshot.is_some(),
            "swapped in game"
        );
        self.paused_snapshot = snapshot;
        self.resume_index = resume_index;
        self.swapped = Some(game);
        Ok(())
    }

    /// Finish the swapped game and return control to the default machine.
    pub fn resume_previous(&mut self, ctx: &mut C) -> Result<(), ManagerError> {
        let mut game = self.swapped.take().ok_or(ManagerError::NotSwapped)?;

        self.last_outcome = game.outcome();
        self.last_game_type = Some(game.game_type());
        game.machine_mut().shutdown(ctx);
        drop(game);

        let snapshot = self.paused_snapshot.take();
        let default = self.default.as_ref().ok_or(ManagerError::NoDefaultMachine)?;
        let mut machine = default.borrow_mut();
        machine.skip_to_state(ctx, self.resume_index)?;

        let snapshot = match snapshot {
            Some(snapshot) if Some(snapshot.origin()) == machine.current_state_id() => Some(snapshot),
            Some(snapshot) => {
                warn!(
                    origin = %snapshot.origin(),
                    resumed = ?machine.current_state_id(),
                    "snapshot belongs to a different state; discarding"
                );
                None
            }
            None => None,
        };
        machine.resume(ctx, snapshot)?;

        info!(
            outcome = ?self.last_outcome,
            resume_index = self.resume_index,
            "resumed default machine"
        );
        Ok(())
    }

    /// Tick whichever machine is active.
    ///
    /// Automatically resumes the default machine once the swapped game is
    /// ready.
    pub fn tick(&mut self, ctx: &mut C) {
        if let Some(game) = self.swapped.as_mut() {
            game.machine_mut().tick(ctx);
            if game.is_ready_for_resume() {
                debug!(game = %game.game_type(), "swapped game ready for resume");
                if let Err(err) = self.resume_previous(ctx) {
                    warn!(error = %err, "failed to resume default machine");
                }
            }
        } else if let Some(default) = &self.default {
            default.borrow_mut().tick(ctx);
        }
    }

    /// Shut down a still-running swapped game without resuming.
    pub fn shutdown(&mut self, ctx: &mut C) {
        if let Some(mut game) = self.swapped.take() {
            game.machine_mut().shutdown(ctx);
        }
        self.paused_snapshot = None;
    }

    pub fn is_swapped(&self) -> bool {
        self.swapped.is_some()
    }

    /// App id of the machine currently being ticked.
    pub fn active_app_id(&self) -> Option<AppId> {
        match &self.swapped {
            Some(game) => Some(game.machine().app_id()),
            None => self.default.as_ref().map(|machine| machine.borrow().app_id()),
        }
    }

    pub fn last_outcome(&self) -> SwappableOutcome {
        self.last_outcome
    }

    pub fn last_game_type(&self) -> Option<GameType> {
        self.last_game_type
    }
}
