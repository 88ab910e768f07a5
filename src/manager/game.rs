//! The contract a swapped-in game satisfies.

use crate::core::StateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a swapped game ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    #[default]
    InProgress,
    Won,
    Lost,
}

/// Lightweight result of a completed game.
///
/// Game-agnostic so the manager never depends on game-specific types.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwappableOutcome {
    pub result: GameResult,
    pub score: u32,
}

impl SwappableOutcome {
    pub fn won(score: u32) -> Self {
        Self {
            result: GameResult::Won,
            score,
        }
    }

    pub fn lost(score: u32) -> Self {
        Self {
            result: GameResult::Lost,
            score,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.result != GameResult::InProgress
    }
}

/// Identifies which game produced an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameType(pub u16);

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "game-{}", self.0)
    }
}

/// A state machine that can be swapped in by the
/// [`StateMachineManager`](super::StateMachineManager) and report an
/// outcome when it finishes.
pub trait SwappableGame<C> {
    fn machine(&self) -> &StateMachine<C>;

    fn machine_mut(&mut self) -> &mut StateMachine<C>;

    fn game_type(&self) -> GameType;

    fn outcome(&self) -> SwappableOutcome;

    /// Whether the manager should hand control back.
    ///
    /// Defaults to "a terminal state is mounted".
    fn is_ready_for_resume(&self) -> bool {
        self.machine().is_finished()
    }
}
