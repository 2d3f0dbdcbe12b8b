//! General attack resolution.

use crate::action::RejectReason;
use crate::config::GameConfig;
use crate::state::{Branch, GameState, Position, Unit, UnitId, UnitType, Variant};

use super::energy::{check_energy, with_surcharge};

/// Cost of the hit while carrying the flag with General a3 variant 1.
const CARRIER_STRIKE_COST: u32 = 6;
const CARRIER_STRIKE_HEAL: u32 = 4;
const PUSH_DISTANCE: i32 = 2;

/// Displacement from General a3 variant 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Push {
    pub target_to: Position,
    /// The attacker dashes into the cell the target vacated.
    pub attacker_to: Position,
}

/// Everything an accepted attack will do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttackPlan {
    pub cost: u32,
    pub damage: u32,
    /// Defender's flag aura reduced the hit.
    pub reduced: bool,
    pub lethal: bool,
    pub heal_attacker: u32,
    pub add_vulnerability: bool,
    pub apply_debuff: bool,
    pub push: Option<Push>,
}

/// Manhattan reach along a cardinal line.
pub fn attack_range(state: &GameState, attacker: &Unit) -> i32 {
    if state.players[attacker.owner()].level(UnitType::General, Branch::A) >= 2 {
        2
    } else {
        1
    }
}

pub fn attack_cost(state: &GameState, attacker: &Unit) -> u32 {
    let player = &state.players[attacker.owner()];
    let base = if attacker.has_flag && player.is_variant(UnitType::General, Branch::A, Variant::First)
    {
        CARRIER_STRIKE_COST
    } else {
        GameConfig::GENERAL_ATTACK_COST
    };
    with_surcharge(attacker, base)
}

/// True when the defender's own flag aura shields `unit`.
pub fn flag_aura_applies(state: &GameState, unit: &Unit) -> bool {
    let owner = &state.players[unit.owner()];
    owner.level(UnitType::General, Branch::B) >= 2
        && unit.position.chebyshev(owner.flag_position) <= 2
}

/// Applies the ×0.75 flag aura when it covers `unit`.
pub fn apply_flag_aura(state: &GameState, unit: &Unit, damage: u32) -> u32 {
    if flag_aura_applies(state, unit) {
        damage * 3 / 4
    } else {
        damage
    }
}

/// Full legality chain for a General attack, excluding turn structure.
///
/// Checks unit type, liveness, target ownership, cardinal range, the
/// flag-carry restriction, affordability and the energy cap.
pub fn can_general_attack(
    state: &GameState,
    config: &GameConfig,
    attacker: UnitId,
    target: UnitId,
) -> Result<u32, RejectReason> {
    let unit = state
        .unit(attacker)
        .ok_or(RejectReason::UnitNotFound(attacker))?;
    if unit.kind() != UnitType::General {
        return Err(RejectReason::WrongUnit);
    }
    if unit.is_dead {
        return Err(RejectReason::UnitDead(attacker));
    }
    let victim = state
        .unit(target)
        .filter(|v| v.is_alive() && v.owner() != unit.owner())
        .ok_or(RejectReason::InvalidTarget)?;

    let distance = unit.position.manhattan(victim.position);
    if !unit.position.is_cardinal_to(victim.position) || distance > attack_range(state, unit) {
        return Err(RejectReason::OutOfRange);
    }

    let player = &state.players[unit.owner()];
    if unit.has_flag && !player.is_variant(UnitType::General, Branch::A, Variant::First) {
        return Err(RejectReason::CarryingFlag);
    }

    let cost = attack_cost(state, unit);
    check_energy(
        player,
        unit,
        config,
        cost,
        RejectReason::LowEnergyAttack { cost },
    )?;
    Ok(cost)
}

/// Computes the outcome of an attack that already passed
/// [`can_general_attack`].
pub fn plan_attack(state: &GameState, attacker: &Unit, target: &Unit) -> AttackPlan {
    let player = &state.players[attacker.owner()];
    let a_level = player.level(UnitType::General, Branch::A);

    let base = GameConfig::GENERAL_ATTACK_DAMAGE;
    let damage = apply_flag_aura(state, target, base);
    let lethal = damage >= target.hp;

    let heal_attacker =
        if attacker.has_flag && player.is_variant(UnitType::General, Branch::A, Variant::First) {
            CARRIER_STRIKE_HEAL
        } else {
            0
        };

    let push = (!lethal && player.is_variant(UnitType::General, Branch::A, Variant::Second))
        .then(|| push_target(state, attacker.position, target.position))
        .flatten();

    AttackPlan {
        cost: attack_cost(state, attacker),
        damage,
        reduced: damage < base,
        lethal,
        heal_attacker,
        add_vulnerability: a_level >= 1,
        apply_debuff: a_level >= 2,
        push,
    }
}

fn push_target(state: &GameState, from: Position, target: Position) -> Option<Push> {
    let dr = (target.r - from.r).signum();
    let dc = (target.c - from.c).signum();
    let mut landing = target;
    for _ in 0..PUSH_DISTANCE {
        let next = landing.offset(dr, dc);
        if !next.in_bounds() || state.board.is_obstacle(next) || state.is_occupied(next) {
            break;
        }
        landing = next;
    }
    (landing != target).then_some(Push {
        target_to: landing,
        attacker_to: target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Phase, PlayerId};

    fn duel() -> (GameState, UnitId, UnitId) {
        let mut state = GameState::new(3);
        state.phase = Phase::Action;
        let p1 = UnitId::new(PlayerId::P1, UnitType::General);
        let p2 = UnitId::new(PlayerId::P2, UnitType::General);
        if let Some(u) = state.unit_mut(p1) {
            u.position = Position::new(3, 5);
            u.start_of_action_energy = 50;
        }
        if let Some(u) = state.unit_mut(p2) {
            u.position = Position::new(3, 6);
        }
        (state, p1, p2)
    }

    #[test]
    fn adjacent_attack_is_legal() {
        let (state, p1, p2) = duel();
        assert_eq!(can_general_attack(&state, &GameConfig::new(), p1, p2), Ok(8));
    }

    #[test]
    fn diagonal_and_far_targets_rejected() {
        let (mut state, p1, p2) = duel();
        if let Some(u) = state.unit_mut(p2) {
            u.position = Position::new(4, 6);
        }
        assert_eq!(
            can_general_attack(&state, &GameConfig::new(), p1, p2),
            Err(RejectReason::OutOfRange)
        );
        if let Some(u) = state.unit_mut(p2) {
            u.position = Position::new(3, 7);
        }
        assert_eq!(
            can_general_attack(&state, &GameConfig::new(), p1, p2),
            Err(RejectReason::OutOfRange)
        );
        state.players[PlayerId::P1]
            .evolution
            .set(UnitType::General, Branch::A, 2, None);
        assert!(can_general_attack(&state, &GameConfig::new(), p1, p2).is_ok());
    }

    #[test]
    fn flag_aura_reduces_hit() {
        let (mut state, p1, p2) = duel();
        state.players[PlayerId::P2].flag_position = Position::new(3, 8);
        state.players[PlayerId::P2]
            .evolution
            .set(UnitType::General, Branch::B, 2, None);
        let plan = plan_attack(&state, state.unit(p1).unwrap(), state.unit(p2).unwrap());
        assert_eq!(plan.damage, 3);
        assert!(plan.reduced);
    }

    #[test]
    fn push_slides_until_blocked() {
        let (mut state, p1, p2) = duel();
        state.players[PlayerId::P1]
            .evolution
            .set(UnitType::General, Branch::A, 3, Some(Variant::Second));
        state.board.set_obstacle(Position::new(3, 8), true);
        let plan = plan_attack(&state, state.unit(p1).unwrap(), state.unit(p2).unwrap());
        assert_eq!(
            plan.push,
            Some(Push {
                target_to: Position::new(3, 7),
                attacker_to: Position::new(3, 6),
            })
        );
    }
}
