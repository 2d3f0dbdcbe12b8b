use crate::env::GameEnv;
use crate::state::{GameState, PlayerId, UnitId};

/// Rules for one action kind, split into check, mutate and re-check.
///
/// The engine calls `pre_validate`, `apply` and `post_validate` in order on a
/// scratch copy and rolls back on the first error. The two checks only read.
/// `apply` can rely on `pre_validate` having passed.
pub trait ActionTransition {
    type Error;
    type Result;

    /// Who sent it.
    fn player(&self) -> PlayerId;

    /// Acting unit. `None` for phase and turn actions.
    fn actor(&self) -> Option<UnitId> {
        None
    }

    /// Energy, range, phase and turn checks against the current state.
    fn pre_validate(&self, _state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<Self::Result, Self::Error>;

    /// Invariants that must hold once the action has been applied.
    fn post_validate(&self, _state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        Ok(())
    }
}
