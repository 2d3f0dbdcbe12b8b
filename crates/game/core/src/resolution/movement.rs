//! Movement costs and reachability.

use crate::action::RejectReason;
use crate::config::GameConfig;
use crate::state::{Branch, BuildingKind, GameState, Position, Unit, UnitType, Variant};

use super::energy::with_surcharge;

/// Cost before the hub discount, debuff, stealth and surcharge.
fn base_move_cost(state: &GameState, unit: &Unit) -> u32 {
    let player = &state.players[unit.owner()];
    let base = match (unit.kind(), unit.has_flag) {
        (UnitType::General, true) if player.level(UnitType::General, Branch::B) >= 3 => {
            GameConfig::CARRIER_MOVE_COST
        }
        (UnitType::General, true) => GameConfig::GENERAL_FLAG_MOVE_COST,
        (_, true) => GameConfig::CARRIER_MOVE_COST,
        _ if unit.carried_mine.is_some() => GameConfig::MINE_CARRIER_MOVE_COST,
        (kind, false) => GameConfig::unit_profile(kind).move_cost,
    };
    if unit.kind() == UnitType::Ranger && player.level(UnitType::Ranger, Branch::B) >= 3 {
        2
    } else {
        base
    }
}

/// Authoritative cost of one step for `unit`.
pub fn move_cost(state: &GameState, unit: &Unit) -> u32 {
    let owner = unit.owner();
    let mut cost = base_move_cost(state, unit);

    let near_hub = state
        .buildings_of(owner, BuildingKind::Hub)
        .any(|hub| hub.position.manhattan(unit.position) <= 2);
    if near_hub {
        cost = cost.saturating_sub(1).max(1);
    }
    cost += unit.status.move_cost_debuff;

    let shadow_step = unit.kind() == UnitType::Ranger
        && state.players[owner].is_variant(UnitType::Ranger, Branch::B, Variant::First);
    if unit.status.stealthed && !shadow_step {
        cost = 3;
    }
    with_surcharge(unit, cost)
}

/// Geometry and blocking checks for a single step to `to`.
pub fn check_step(state: &GameState, unit: &Unit, to: Position) -> Result<(), RejectReason> {
    if !to.in_bounds() {
        return Err(RejectReason::OutOfBounds);
    }
    if unit.position.manhattan(to) != 1 {
        return Err(RejectReason::OutOfRange);
    }
    if state.board.is_obstacle(to) {
        return Err(RejectReason::Obstacle);
    }
    if state.is_occupied(to) {
        return Err(RejectReason::Occupied);
    }
    Ok(())
}

/// Flag carriers are limited to a number of steps per turn.
pub fn check_flag_moves(state: &GameState, unit: &Unit) -> Result<(), RejectReason> {
    if !unit.has_flag {
        return Ok(());
    }
    let player = &state.players[unit.owner()];
    if unit.kind() == UnitType::General {
        if player.flag_moves_made_this_turn >= GameConfig::FLAG_MOVE_LIMIT {
            return Err(RejectReason::GeneralFlagMoveLimit);
        }
    } else if player.non_general_flag_moves_made_this_turn >= GameConfig::FLAG_MOVE_LIMIT {
        return Err(RejectReason::FlagMoveLimit);
    }
    Ok(())
}

/// Whether `unit` may use the hub teleport at all.
pub fn can_teleport(state: &GameState, unit: &Unit) -> bool {
    let player = &state.players[unit.owner()];
    let ranger_a = player.level(UnitType::Ranger, Branch::A);
    let gate = (unit.kind() == UnitType::Ranger && ranger_a >= 2)
        || player.is_variant(UnitType::Ranger, Branch::A, Variant::Second);
    gate && state
        .buildings_of(unit.owner(), BuildingKind::Hub)
        .next()
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Building, BuildingId, PlayerId, UnitId};

    fn state_with(kind: UnitType, at: Position) -> (GameState, UnitId) {
        let mut state = GameState::new(5);
        let id = UnitId::new(PlayerId::P1, kind);
        if let Some(u) = state.unit_mut(id) {
            u.position = at;
        }
        (state, id)
    }

    #[test]
    fn base_costs_and_surcharge() {
        let (mut state, id) = state_with(UnitType::Ranger, Position::new(3, 8));
        assert_eq!(move_cost(&state, state.unit(id).unwrap()), 2);
        if let Some(u) = state.unit_mut(id) {
            u.position = Position::new(3, 14);
        }
        // base 2 < 5, so +1 in the enemy half
        assert_eq!(move_cost(&state, state.unit(id).unwrap()), 3);
    }

    #[test]
    fn hub_debuff_and_stealth_stack_in_order() {
        let (mut state, id) = state_with(UnitType::Maker, Position::new(2, 5));
        state.buildings.push(Building {
            id: BuildingId(1),
            owner: PlayerId::P1,
            kind: BuildingKind::Hub,
            position: Position::new(2, 6),
            level: 1,
            variant: None,
            duration: None,
        });
        assert_eq!(move_cost(&state, state.unit(id).unwrap()), 2);
        if let Some(u) = state.unit_mut(id) {
            u.status.apply_debuff(2, 2);
        }
        assert_eq!(move_cost(&state, state.unit(id).unwrap()), 4);
        if let Some(u) = state.unit_mut(id) {
            u.status.stealthed = true;
        }
        assert_eq!(move_cost(&state, state.unit(id).unwrap()), 3);
    }

    #[test]
    fn general_carrier_pays_flag_rate() {
        let (mut state, id) = state_with(UnitType::General, Position::new(3, 4));
        if let Some(u) = state.unit_mut(id) {
            u.has_flag = true;
        }
        assert_eq!(move_cost(&state, state.unit(id).unwrap()), 5);
        state.players[PlayerId::P1]
            .evolution
            .set(UnitType::General, Branch::B, 3, Some(Variant::First));
        assert_eq!(move_cost(&state, state.unit(id).unwrap()), 4);
    }
}
