//! Turn-structure checks and energy charging shared by unit actions.

use crate::config::GameConfig;
use crate::resolution::check_energy;
use crate::state::{GameState, Phase, PlayerId, Unit, UnitId, UnitType};

use super::RejectReason;

/// Phase, turn ownership and game-over checks for any player action.
pub fn ensure_turn(state: &GameState, player: PlayerId, phase: Phase) -> Result<(), RejectReason> {
    if state.game_over {
        return Err(RejectReason::GameOver);
    }
    if state.phase != phase {
        return Err(RejectReason::WrongPhase);
    }
    if phase == Phase::Action && state.current_player != player {
        return Err(RejectReason::NotYourTurn);
    }
    Ok(())
}

/// Resolves the unit that is about to act and checks it may.
///
/// The unit must belong to `player`, be alive, not have acted this round, and
/// no other unit of the player may be mid-action.
pub fn acting_unit(state: &GameState, player: PlayerId, id: UnitId) -> Result<&Unit, RejectReason> {
    ensure_turn(state, player, Phase::Action)?;
    if id.owner != player {
        return Err(RejectReason::NotYourTurn);
    }
    let unit = state.unit(id).ok_or(RejectReason::UnitNotFound(id))?;
    if unit.is_dead {
        return Err(RejectReason::UnitDead(id));
    }
    if unit.has_acted {
        return Err(RejectReason::UnitActed(id));
    }
    match state.active_unit {
        Some(active) if active != id => Err(RejectReason::Committed(active)),
        _ => Ok(unit),
    }
}

/// Like [`acting_unit`], additionally requiring a unit type.
pub fn acting_unit_of(
    state: &GameState,
    player: PlayerId,
    id: UnitId,
    kind: UnitType,
) -> Result<&Unit, RejectReason> {
    let unit = acting_unit(state, player, id)?;
    if unit.kind() != kind {
        return Err(RejectReason::WrongUnit);
    }
    Ok(unit)
}

/// Affordability then cap, using the generic low-energy rejection.
pub fn ensure_energy(
    state: &GameState,
    config: &GameConfig,
    unit: &Unit,
    cost: u32,
) -> Result<(), RejectReason> {
    check_energy(
        &state.players[unit.owner()],
        unit,
        config,
        cost,
        RejectReason::LowEnergy { cost },
    )
}

/// Deducts `cost`, books it against the unit's cap and commits the unit.
pub fn charge(state: &mut GameState, id: UnitId, cost: u32) -> Result<(), RejectReason> {
    let player = state.player_mut(id.owner);
    player.energy = player
        .energy
        .checked_sub(cost)
        .ok_or(RejectReason::LowEnergy { cost })?;
    let unit = state.unit_mut(id).ok_or(RejectReason::UnitNotFound(id))?;
    unit.energy_used_this_turn += cost;
    state.active_unit = Some(id);
    Ok(())
}

/// Ends the unit's opportunity for this round.
pub fn mark_acted(state: &mut GameState, id: UnitId) -> Result<(), RejectReason> {
    let unit = state.unit_mut(id).ok_or(RejectReason::UnitNotFound(id))?;
    unit.has_acted = true;
    Ok(())
}
