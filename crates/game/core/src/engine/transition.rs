//! Action transition dispatch and execution logic.

use crate::action::{Action, ActionTransition, MoveOutcome, RejectReason};
use crate::env::GameEnv;
use crate::error::ErrorContext;
use crate::resolution::AttackPlan;
use crate::state::{BuildingId, GameState, MineId, UnitId};

use super::errors::{ExecuteError, TransitionPhase, TransitionPhaseError};

/// Action-specific result of an accepted transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionResult {
    Move(MoveOutcome),
    Attack(AttackPlan),
    /// Mine placed, disarmed, converted, picked up or dropped.
    Mine(MineId),
    Building(BuildingId),
    /// Mines found by a scan or destroyed by a detonation.
    Count(u32),
    /// Damage dealt by a thrown mine.
    Damage(u32),
    /// Energy paid for a skip.
    Paid(u32),
    Evolved(u8),
    TurnEnded(UnitId),
    Done,
}

/// Executes a transition through the three-phase pipeline and returns the result.
///
/// Phases:
/// 1. `pre_validate` - Check preconditions before mutation
/// 2. `apply` - Mutate the game state and return result
/// 3. `post_validate` - Verify postconditions after mutation
#[inline]
fn drive_transition<T>(
    transition: &T,
    state: &mut GameState,
    env: &GameEnv<'_>,
) -> Result<T::Result, TransitionPhaseError<T::Error>>
where
    T: ActionTransition,
{
    transition
        .pre_validate(state, env)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PreValidate, error))?;

    let result = transition
        .apply(state, env)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::Apply, error))?;

    transition
        .post_validate(state, env)
        .map_err(|error| TransitionPhaseError::new(TransitionPhase::PostValidate, error))?;

    Ok(result)
}

/// Routes an action to its transition. The caller owns rollback.
pub(super) fn execute_transition(
    action: &Action,
    state: &mut GameState,
    env: &GameEnv<'_>,
) -> Result<ActionResult, ExecuteError> {
    let tag = action.tag();
    let context = match action.actor() {
        Some(unit) => ErrorContext::new(state.nonce, state.turn).with_unit(unit),
        None => ErrorContext::new(state.nonce, state.turn).with_player(action.player()),
    };
    let run = |state: &mut GameState| -> Result<ActionResult, TransitionPhaseError<RejectReason>> {
        let result = match action {
            Action::Move(t) => ActionResult::Move(drive_transition(t, state, env)?),
            Action::Teleport(t) => {
                drive_transition(t, state, env)?;
                ActionResult::Done
            }
            Action::Attack(t) => ActionResult::Attack(drive_transition(t, state, env)?),
            Action::Scan(t) => ActionResult::Count(drive_transition(t, state, env)? as u32),
            Action::SensorScan(t) => ActionResult::Count(drive_transition(t, state, env)?),
            Action::PlaceMine(t) => ActionResult::Mine(drive_transition(t, state, env)?),
            Action::Disarm(t) => ActionResult::Mine(drive_transition(t, state, env)?),
            Action::MoveMine(t) => {
                drive_transition(t, state, env)?;
                ActionResult::Done
            }
            Action::ConvertMine(t) => ActionResult::Mine(drive_transition(t, state, env)?),
            Action::PickupMine(t) => ActionResult::Mine(drive_transition(t, state, env)?),
            Action::DropMine(t) => ActionResult::Mine(drive_transition(t, state, env)?),
            Action::ThrowMine(t) => ActionResult::Damage(drive_transition(t, state, env)?),
            Action::PlaceBuilding(t) => ActionResult::Building(drive_transition(t, state, env)?),
            Action::DetonateTower(t) => {
                ActionResult::Count(drive_transition(t, state, env)? as u32)
            }
            Action::PickupFlag(t) => {
                drive_transition(t, state, env)?;
                ActionResult::Done
            }
            Action::DropFlag(t) => {
                drive_transition(t, state, env)?;
                ActionResult::Done
            }
            Action::Stealth(t) => {
                drive_transition(t, state, env)?;
                ActionResult::Done
            }
            Action::Evolve(t) => ActionResult::Evolved(drive_transition(t, state, env)?),
            Action::EndTurn(t) => ActionResult::TurnEnded(drive_transition(t, state, env)?),
            Action::SkipTurn(t) => ActionResult::Paid(drive_transition(t, state, env)?),
            Action::Ready(t) => {
                drive_transition(t, state, env)?;
                ActionResult::Done
            }
            Action::PlaceSetupMine(t) => ActionResult::Mine(drive_transition(t, state, env)?),
            Action::FinishPlacement(t) => {
                drive_transition(t, state, env)?;
                ActionResult::Done
            }
        };
        Ok(result)
    };
    run(state).map_err(|error| ExecuteError::rejected(tag, error, context))
}
