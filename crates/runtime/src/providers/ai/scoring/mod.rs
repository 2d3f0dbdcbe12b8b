//! Utility scoring for the Minefront AI.
//!
//! Scoring runs in two layers that share [`ScoreBreakdown`]:
//!
//! 1. **Unit priority** ([`evaluator::unit_priority`]): which unit to activate.
//! 2. **Action value** ([`evaluator::evaluate_action`]): which candidate that
//!    unit should perform.
//!
//! Raw components (attack, flag, safety, utility, energy) are weighted by the
//! difficulty tier, then context bonuses (intent, role, opponent, opening,
//! endgame) are added, and finally [`tuning`] applies the profile bias.
//! [`selector`] orders the results and enforces the energy reserve.
//!
//! [`ScoreBreakdown`]: crate::providers::ai::types::ScoreBreakdown

pub mod evaluator;
pub mod selector;
pub mod tuning;

use minefront_core::{Branch, GameState, MineType, Position, Unit, UnitType, Variant};

use super::context::{BLOCKED, ThreatMap};
use super::types::{CandidateKind, Intent, Role};

/// Flat bonus an intent gives to one action family.
pub fn intent_bonus(intent: Intent, kind: CandidateKind) -> f64 {
    use CandidateKind as K;
    match intent {
        Intent::PushFlag => match kind {
            K::Move => 3.0,
            K::PickupFlag => 12.0,
            K::Attack => 1.5,
            K::Teleport => 2.0,
            K::PlaceHub => 1.1,
            K::DropFlag => -10.0,
            K::EndTurn => -2.0,
            _ => 0.0,
        },
        Intent::HuntFlagCarrier => match kind {
            K::Attack => 5.0,
            K::Move => 2.2,
            K::Scan => 1.4,
            K::SensorScan => 1.8,
            K::DropFlag => -2.0,
            _ => 0.0,
        },
        Intent::ControlMines => match kind {
            K::Scan => 4.5,
            K::SensorScan => 5.2,
            K::Disarm => 4.2,
            K::PlaceTower => 2.2,
            K::DetonateTower => 3.4,
            K::PlaceMine => 3.5,
            K::ThrowMine => 2.1,
            K::PickupMine => 1.7,
            K::MoveMine => 3.2,
            K::ConvertMine => 3.6,
            K::EvolveA => 0.8,
            K::EvolveB => 1.4,
            K::EvolveB1 | K::EvolveB2 => 1.8,
            K::Move => 0.8,
            _ => 0.0,
        },
        Intent::Stabilize => match kind {
            K::Disarm => 2.4,
            K::Scan => 1.8,
            K::SensorScan => 2.4,
            K::PlaceTower => 1.5,
            K::Teleport => 1.2,
            K::Move => -0.8,
            K::PlaceMine => -1.2,
            K::EvolveA | K::EvolveB => 1.2,
            K::EvolveA1 | K::EvolveA2 | K::EvolveB1 | K::EvolveB2 => 1.4,
            K::Attack => -1.0,
            K::EndTurn => 1.2,
            _ => 0.0,
        },
    }
}

/// Flat bonus a unit role gives to one action family.
pub fn role_bonus(role: Role, kind: CandidateKind) -> f64 {
    use CandidateKind as K;
    match role {
        Role::Striker => match kind {
            K::Attack => 4.2,
            K::Move => 1.8,
            K::ThrowMine => 1.6,
            K::Teleport => 1.4,
            K::PickupFlag => 2.2,
            K::EndTurn => -0.8,
            _ => 0.0,
        },
        Role::Flanker => match kind {
            K::Move => 2.2,
            K::Attack => 1.5,
            K::Scan => 1.2,
            K::SensorScan => 1.4,
            K::EvolveA | K::EvolveB => 0.8,
            K::PlaceMine => 0.8,
            _ => 0.0,
        },
        Role::Controller => match kind {
            K::PlaceMine => 4.3,
            K::PlaceTower => 2.2,
            K::DetonateTower => 2.6,
            K::MoveMine => 2.6,
            K::ConvertMine => 2.8,
            K::Disarm => 2.8,
            K::Scan => 2.3,
            K::SensorScan => 2.8,
            K::EvolveA => 1.4,
            K::EvolveB => 1.6,
            K::Attack => -0.6,
            _ => 0.0,
        },
        Role::Scout => match kind {
            K::Scan => 4.1,
            K::SensorScan => 4.6,
            K::PickupMine => 1.2,
            K::Move => 1.6,
            K::EvolveB => 0.8,
            K::Disarm => 1.8,
            _ => 0.0,
        },
        Role::Support => match kind {
            K::Disarm => 4.2,
            K::Scan => 2.2,
            K::SensorScan => 2.8,
            K::PlaceHub => 1.4,
            K::PlaceFactory => 1.2,
            K::PlaceTower => 1.4,
            K::EvolveB => 1.2,
            K::Move => 1.2,
            K::PickupFlag => -0.8,
            _ => 0.0,
        },
    }
}

/// Danger of `unit` stepping onto `cell`.
///
/// Impassable cells score [`BLOCKED`]. Enemy mines the unit's side can see
/// always count, a NUKE only when the step newly enters its radius. A threat
/// map, when given, is added on top.
pub fn target_cell_risk(
    state: &GameState,
    unit: &Unit,
    cell: Position,
    threat: Option<&ThreatMap>,
) -> f64 {
    if !cell.in_bounds() || state.board.is_obstacle(cell) || state.is_occupied(cell) {
        return BLOCKED;
    }
    let owner = unit.owner();
    let enemy = owner.opponent();

    let mut risk = 0.0;
    for mine in state.mines.iter().filter(|m| m.owner == enemy && m.is_visible_to(owner)) {
        if mine.position == cell {
            risk += 90.0;
        }
        if mine.kind == MineType::Nuke
            && mine.position.chebyshev(cell) <= 1
            && mine.position.chebyshev(unit.position) > 1
        {
            risk += 70.0;
        }
    }
    if let Some(map) = threat {
        risk += map.entering(unit.position, cell);
    }

    // A fully evolved General b2 guards the ring around its flag.
    let enemy_flag = state.players[enemy].flag_position;
    if state.players[enemy].is_variant(UnitType::General, Branch::B, Variant::Second)
        && unit.position.chebyshev(enemy_flag) > 1
        && cell.chebyshev(enemy_flag) <= 1
    {
        risk += 18.0;
    }

    let per_enemy = 7.0 + 10.0 * (1.0 - hp_ratio(unit));
    let adjacent = state.players[enemy]
        .living()
        .filter(|u| u.position.chebyshev(cell) <= 1)
        .count();
    risk + adjacent as f64 * per_enemy
}

/// Hit-point ratio, treating a zero maximum as full health.
pub(crate) fn hp_ratio(unit: &Unit) -> f64 {
    if unit.max_hp == 0 {
        return 1.0;
    }
    f64::from(unit.hp) / f64::from(unit.max_hp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ai::types::Difficulty;
    use minefront_core::state::Board;
    use minefront_core::{Mine, PlayerId, UnitId};

    fn clear_board() -> GameState {
        let mut state = GameState::new(13);
        for cell in Board::positions() {
            state.board.set_obstacle(cell, false);
        }
        state
    }

    #[test]
    fn pickup_flag_dominates_the_push() {
        assert_eq!(intent_bonus(Intent::PushFlag, CandidateKind::PickupFlag), 12.0);
        assert!(intent_bonus(Intent::PushFlag, CandidateKind::DropFlag) < 0.0);
        assert_eq!(intent_bonus(Intent::ControlMines, CandidateKind::EvolveA1), 0.0);
        assert_eq!(role_bonus(Role::Controller, CandidateKind::PlaceMine), 4.3);
    }

    #[test]
    fn risk_counts_mines_and_neighbours() {
        let mut state = clear_board();
        let id = UnitId::new(PlayerId::P1, UnitType::General);
        let Some(general) = state.unit(id).cloned() else {
            panic!("general missing");
        };
        let step = general.position.offset(0, 1);
        assert_eq!(target_cell_risk(&state, &general, step, None), 0.0);

        let mine_id = state.allocate_mine_id();
        state.mines.push(Mine::new(mine_id, PlayerId::P2, MineType::Normal, step));
        assert_eq!(target_cell_risk(&state, &general, step, None), 0.0);

        for mine in &mut state.mines {
            mine.reveal_to(PlayerId::P1);
        }
        assert_eq!(target_cell_risk(&state, &general, step, None), 90.0);

        let occupied = state.players.p1.units[1].position;
        assert_eq!(target_cell_risk(&state, &general, occupied, None), BLOCKED);
    }

    fn ranger_beside_nuke() -> (GameState, Unit) {
        let mut state = clear_board();
        let id = UnitId::new(PlayerId::P1, UnitType::Ranger);
        if let Some(u) = state.unit_mut(id) {
            u.position = Position::new(3, 4);
        }
        let mine_id = state.allocate_mine_id();
        let mut nuke = Mine::new(mine_id, PlayerId::P2, MineType::Nuke, Position::new(2, 5));
        nuke.reveal_to(PlayerId::P1);
        state.mines.push(nuke);
        let Some(ranger) = state.unit(id).cloned() else {
            panic!("ranger missing");
        };
        (state, ranger)
    }

    #[test]
    fn threat_map_adds_to_the_mine_rules() {
        let (state, ranger) = ranger_beside_nuke();
        let map = ThreatMap::build(&state, PlayerId::P1, Difficulty::Normal);

        // Already inside the blast radius: neither layer charges the step.
        let inside = Position::new(3, 5);
        assert_eq!(target_cell_risk(&state, &ranger, inside, Some(&map)), 0.0);

        let mut far = ranger.clone();
        far.position = Position::new(3, 7);
        let entry = Position::new(3, 6);
        assert_eq!(target_cell_risk(&state, &far, entry, None), 70.0);
        assert_eq!(target_cell_risk(&state, &far, entry, Some(&map)), 135.0);
    }

    #[test]
    fn hidden_mines_carry_no_risk() {
        let (mut state, ranger) = ranger_beside_nuke();
        for mine in &mut state.mines {
            mine.revealed_to.retain(|&p| p == PlayerId::P2);
        }
        let map = ThreatMap::build(&state, PlayerId::P1, Difficulty::Normal);
        let mut far = ranger;
        far.position = Position::new(3, 7);
        assert_eq!(target_cell_risk(&state, &far, Position::new(2, 5), Some(&map)), 0.0);
    }

    #[test]
    fn neighbour_risk_grows_as_hp_falls() {
        let mut state = clear_board();
        let enemy = UnitId::new(PlayerId::P2, UnitType::Sweeper);
        if let Some(u) = state.unit_mut(enemy) {
            u.position = Position::new(3, 6);
        }
        let Some(mut ranger) = state.unit(UnitId::new(PlayerId::P1, UnitType::Ranger)).cloned()
        else {
            panic!("ranger missing");
        };
        ranger.position = Position::new(3, 4);
        let cell = Position::new(3, 5);

        let full = target_cell_risk(&state, &ranger, cell, None);
        ranger.hp = ranger.max_hp / 2;
        let half = target_cell_risk(&state, &ranger, cell, None);
        ranger.hp = ranger.max_hp / 2 - 1;
        let lower = target_cell_risk(&state, &ranger, cell, None);

        assert_eq!(full, 7.0);
        assert!(half > full);
        assert!(lower > half);
    }
}
