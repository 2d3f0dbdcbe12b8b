//! Asynchronous abstraction for sourcing player intent.
//!
//! Runtime users plug in [`ActionProvider`] implementations so a match can run
//! with human input, scripted fixtures, or AI policies.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use minefront_core::{Action, GameEnv, GameState, PlayerId};

use super::errors::{ProviderKind, Result, RuntimeError};

/// Trait for providing actions based on the current game state.
///
/// Different implementations can handle:
/// - Human input (from a UI or a network peer)
/// - AI decisions
/// - Scripted/replayed actions
/// - Testing fixtures
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Provide the next action for `player` based on the current game state.
    ///
    /// # Arguments
    /// * `player` - The side that has to act
    /// * `state` - Read-only snapshot of the current game state
    /// * `env` - Rules configuration and randomness the engine will use
    ///
    /// # Returns
    /// The action to execute, or an error if no action can be determined
    async fn provide_action(
        &self,
        player: PlayerId,
        state: &GameState,
        env: GameEnv<'_>,
    ) -> Result<Action>;

    /// Called with the canonical state after every turn hand-over.
    ///
    /// Providers that learn from the opponent override this.
    fn observe(&self, _player: PlayerId, _state: &GameState) {}

    fn kind(&self) -> ProviderKind;
}

/// Replays a fixed queue of actions, for fixtures and replays.
#[derive(Debug, Default)]
pub struct ScriptedActionProvider {
    queue: Mutex<VecDeque<Action>>,
}

impl ScriptedActionProvider {
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            queue: Mutex::new(actions.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ActionProvider for ScriptedActionProvider {
    async fn provide_action(
        &self,
        player: PlayerId,
        _state: &GameState,
        _env: GameEnv<'_>,
    ) -> Result<Action> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| RuntimeError::ScriptExhausted { player })?;
        queue
            .pop_front()
            .ok_or(RuntimeError::ScriptExhausted { player })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Scripted
    }
}
