//! Unit roles and formation keeping.
use minefront_core::{GameConfig, GameState, PlayerId, Unit, UnitType};

use super::opponent::OpponentModel;
use super::types::{Intent, Role};

/// Role of `kind` under the current intent.
pub fn assign(kind: UnitType, intent: Intent, model: &OpponentModel) -> Role {
    match kind {
        UnitType::General if intent == Intent::Stabilize && model.aggression > 3.5 => Role::Support,
        UnitType::General => Role::Striker,
        UnitType::Ranger if intent == Intent::HuntFlagCarrier => Role::Striker,
        UnitType::Ranger => Role::Flanker,
        UnitType::Maker => Role::Controller,
        UnitType::Sweeper => Role::Scout,
        UnitType::Defuser => Role::Support,
    }
}

/// Open cardinal neighbours of `unit`.
fn mobility(state: &GameState, unit: &Unit) -> f64 {
    unit.position
        .neighbors()
        .filter(|p| p.in_bounds() && !state.board.is_obstacle(*p) && !state.is_occupied(*p))
        .count() as f64
}

/// How well `unit` currently sits in its role's part of the formation.
pub fn formation_bonus(
    state: &GameState,
    unit: &Unit,
    role: Role,
    intent: Intent,
    ai: PlayerId,
) -> f64 {
    let own_flag = state.players[ai].flag_position;
    let enemy_flag = state.players[ai.opponent()].flag_position;
    let to_enemy = f64::from(unit.position.manhattan(enemy_flag));
    let to_own = f64::from(unit.position.manhattan(own_flag));

    let mut bonus = match role {
        Role::Striker => {
            let carry = if unit.has_flag { 4.0 } else { 0.0 };
            (9.0 - to_enemy).max(0.0) * 0.7 + (to_own - to_enemy) * 0.25 + carry
        }
        Role::Flanker => (8.0 - to_enemy).max(0.0) * 0.45 + mobility(state, unit) * 0.65,
        Role::Controller => {
            let center = f64::from(enemy_flag.c + own_flag.c) / 2.0;
            let off_center = (f64::from(unit.position.c) - center).abs();
            (6.0 - off_center).max(0.0) * 0.6 + mobility(state, unit) * 0.35
        }
        Role::Scout => mobility(state, unit) * 0.8 + (10.0 - to_enemy).max(0.0) * 0.3,
        Role::Support => {
            let step = f64::from(GameConfig::unit_profile(unit.kind()).move_cost);
            (8.0 - to_own).max(0.0) * 0.75 + (7.0 - step).max(0.0) * 0.3
        }
    };

    bonus += match (intent, role) {
        (Intent::PushFlag, Role::Striker | Role::Flanker) => 1.4,
        (Intent::PushFlag, _) => -0.2,
        (Intent::HuntFlagCarrier, Role::Striker) => 1.8,
        (Intent::HuntFlagCarrier, Role::Flanker) => 1.0,
        (Intent::HuntFlagCarrier, _) => 0.0,
        (Intent::ControlMines, Role::Controller | Role::Scout | Role::Support) => 1.3,
        (Intent::ControlMines, _) => -0.4,
        (Intent::Stabilize, Role::Support) => 1.6,
        (Intent::Stabilize, Role::Striker) => -0.8,
        (Intent::Stabilize, _) => 0.3,
    };
    bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_follow_type_and_intent() {
        let calm = OpponentModel::new();
        assert_eq!(assign(UnitType::Ranger, Intent::PushFlag, &calm), Role::Flanker);
        assert_eq!(assign(UnitType::Ranger, Intent::HuntFlagCarrier, &calm), Role::Striker);
        assert_eq!(assign(UnitType::General, Intent::Stabilize, &calm), Role::Striker);

        let pressed = OpponentModel {
            aggression: 4.0,
            ..OpponentModel::new()
        };
        assert_eq!(assign(UnitType::General, Intent::Stabilize, &pressed), Role::Support);
    }

    #[test]
    fn strikers_prefer_the_front() {
        let mut state = GameState::new(2);
        let Some(general) = state.players.p1.general().cloned() else {
            panic!("general missing");
        };
        let back = formation_bonus(&state, &general, Role::Striker, Intent::PushFlag, PlayerId::P1);

        let mut forward = general.clone();
        forward.position = state.players.p2.flag_position.offset(0, -2);
        state.players.p1.units[0].position = forward.position;
        let front = formation_bonus(&state, &forward, Role::Striker, Intent::PushFlag, PlayerId::P1);
        assert!(front > back);
    }
}
