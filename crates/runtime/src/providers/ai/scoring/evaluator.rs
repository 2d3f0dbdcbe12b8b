//! Unit priority and action evaluation.

use minefront_core::resolution::{can_general_attack, move_cost, plan_attack};
use minefront_core::{
    Branch, BuildingKind, GameConfig, GameState, MineType, PlayerId, Position, Unit, UnitType,
};

use super::{hp_ratio, intent_bonus, role_bonus, target_cell_risk, tuning};
use crate::providers::ai::context::PlanningContext;
use crate::providers::ai::opening;
use crate::providers::ai::roles;
use crate::providers::ai::types::{
    Candidate, CandidateKind, Difficulty, EndgameMode, Intent, OpeningPlan, Role, ScoreBreakdown,
    Target,
};

/// Context-free priority of activating `unit` next.
pub fn unit_priority(
    state: &GameState,
    config: &GameConfig,
    unit: &Unit,
    difficulty: Difficulty,
) -> ScoreBreakdown {
    let w = difficulty.weights();
    let enemy = unit.owner().opponent();
    let enemy_flag = state.players[enemy].flag_position;
    let energy_pool = state.players[unit.owner()].energy;

    let can_strike = unit.kind() == UnitType::General
        && state.players[enemy]
            .living()
            .any(|target| can_general_attack(state, config, unit.id, target.id).is_ok());
    let attack = if can_strike { 12.0 } else { 0.0 };
    let flag = (12.0 - f64::from(unit.position.manhattan(enemy_flag))).max(0.0);
    let ratio = if unit.max_hp > 0 { hp_ratio(unit) } else { 0.0 };
    let safety = if ratio < 0.4 { 8.0 } else { 3.0 };
    let energy = if energy_pool == 0 {
        0.0
    } else {
        let step = f64::from(move_cost(state, unit));
        (8.0 - step / f64::from(energy_pool.max(1)) * 20.0).max(0.0)
    };

    ScoreBreakdown {
        attack,
        flag,
        safety,
        energy,
        total: attack * w.unit_attack_opportunity
            + flag * w.unit_flag_pressure
            + safety * w.unit_survival
            + energy * w.unit_energy_efficiency,
        ..ScoreBreakdown::default()
    }
}

/// [`unit_priority`] plus intent, formation, opponent, opening and endgame
/// adjustments, then the profile bias.
pub fn unit_priority_in_context(
    state: &GameState,
    config: &GameConfig,
    unit: &Unit,
    ctx: &PlanningContext<'_>,
) -> ScoreBreakdown {
    let mut score = unit_priority(state, config, unit, ctx.difficulty);
    let kind = unit.kind();
    let striker_type = matches!(kind, UnitType::General | UnitType::Ranger);
    let mut bonus = 0.0;

    bonus += match ctx.intent {
        Intent::PushFlag => {
            (if unit.has_flag { 8.0 } else { 0.0 }) + if striker_type { 2.0 } else { 0.0 }
        }
        Intent::HuntFlagCarrier => match kind {
            UnitType::General | UnitType::Ranger => 4.0,
            UnitType::Sweeper => 1.5,
            _ => 0.0,
        },
        Intent::ControlMines => match kind {
            UnitType::Sweeper | UnitType::Defuser | UnitType::Maker => 4.0,
            _ => 0.0,
        },
        Intent::Stabilize => {
            let hurt = if hp_ratio(unit) <= 0.5 { 3.0 } else { 0.0 };
            let steady = matches!(kind, UnitType::Defuser | UnitType::Sweeper);
            hurt + if steady { 2.0 } else { 0.0 }
        }
    };

    bonus += roles::formation_bonus(state, unit, ctx.role(kind), ctx.intent, ctx.player);

    if ctx.model.flag_rush >= 4.5 && striker_type {
        bonus += 2.0;
    }
    if ctx.model.mine_pressure >= 4.5 && matches!(kind, UnitType::Sweeper | UnitType::Defuser) {
        bonus += 2.8;
    }

    if let Some(opening) = ctx.opening {
        let favoured = match opening.plan {
            OpeningPlan::CenterBreak if striker_type => 1.6,
            OpeningPlan::MineScreen if matches!(kind, UnitType::Maker | UnitType::Sweeper) => 1.5,
            OpeningPlan::Fortress if kind == UnitType::Defuser => 1.8,
            _ => 0.0,
        };
        bonus += favoured * opening.weight;
    }

    let urgency = ctx.endgame.urgency;
    bonus += match ctx.endgame.mode {
        EndgameMode::None => 0.0,
        EndgameMode::Race => {
            let carry = if unit.has_flag { 6.5 } else { 0.0 };
            (carry + if striker_type { 2.1 } else { 0.0 }) * urgency
        }
        EndgameMode::Defense => {
            let own_flag = state.players[unit.owner()].flag_position;
            let near = (6.0 - f64::from(unit.position.manhattan(own_flag))).max(0.0) * 0.8;
            let guard = matches!(kind, UnitType::Sweeper | UnitType::Defuser | UnitType::General);
            (near + if guard { 1.8 } else { 0.0 }) * urgency
        }
        EndgameMode::Attrition => (if hp_ratio(unit) < 0.45 { 1.2 } else { 0.5 }) * urgency,
    };

    score.total += bonus;
    tuning::tune_unit(&mut score, ctx.profile);
    score
}

fn enemies_within(state: &GameState, enemy: PlayerId, cell: Position, radius: i32) -> usize {
    state.players[enemy]
        .living()
        .filter(|u| u.position.chebyshev(cell) <= radius)
        .count()
}

fn near(cell: Position, flag: Position, radius: i32, hit: f64, miss: f64) -> f64 {
    if cell.manhattan(flag) <= radius { hit } else { miss }
}

/// Unweighted components. Energy is derived from the cost separately.
#[derive(Default)]
struct Raw {
    attack: f64,
    flag: f64,
    safety: f64,
    utility: f64,
}

fn raw_components(
    state: &GameState,
    unit: &Unit,
    candidate: &Candidate,
    cell: Option<Position>,
    ctx: &PlanningContext<'_>,
) -> Raw {
    let owner = unit.owner();
    let enemy = owner.opponent();
    let enemy_flag = state.players[enemy].flag_position;
    let own_flag = state.players[owner].flag_position;
    let risk = |to: Position| target_cell_risk(state, unit, to, Some(&ctx.threat));
    let mut raw = Raw::default();

    match (candidate.kind, cell) {
        (CandidateKind::Move, Some(to)) => {
            let before = unit.position.manhattan(enemy_flag);
            let after = to.manhattan(enemy_flag);
            let advance = f64::from((before - after).max(0));
            raw.flag = advance * if unit.has_flag { 6.0 } else { 3.0 };
            raw.safety = (20.0 - risk(to)).max(0.0);
            let hotspot = ctx.hotspot_pressure(to, 4);
            match ctx.role(unit.kind()) {
                Role::Striker => raw.utility += advance * 1.4 + hotspot * 0.45,
                Role::Flanker => {
                    raw.utility += f64::from((to.c - own_flag.c).abs()) * 0.5 + hotspot * 0.35;
                }
                Role::Controller => {
                    let center = f64::from(enemy_flag.c + own_flag.c) / 2.0;
                    raw.utility += (4.0 - (f64::from(to.c) - center).abs()).max(0.0) * 1.2;
                    raw.utility += hotspot * 0.55;
                }
                Role::Scout => raw.utility += hotspot * 0.9,
                Role::Support => {
                    let own_before = unit.position.manhattan(own_flag);
                    let own_after = to.manhattan(own_flag);
                    raw.utility += f64::from((own_before - own_after).max(0)) * 1.1;
                    raw.safety += f64::from((4 - own_after).max(0)) * 0.5;
                }
            }
        }
        (CandidateKind::Attack, _) => {
            if let Target::Unit(id) = candidate.target
                && let Some(victim) = state.unit(id)
            {
                let plan = plan_attack(state, unit, victim);
                raw.attack = f64::from(plan.damage) * 2.0
                    + if plan.lethal { 10.0 } else { 0.0 }
                    + if victim.has_flag { 8.0 } else { 0.0 };
            }
            raw.safety = 7.0;
        }
        (CandidateKind::Scan, target) => {
            raw.utility = 6.0;
            if let Some(at) = target {
                let unrevealed = state
                    .mines
                    .iter()
                    .filter(|m| {
                        m.owner == enemy && !m.is_visible_to(owner) && m.position.chebyshev(at) <= 2
                    })
                    .count();
                raw.utility += enemies_within(state, enemy, at, 2) as f64 * 2.0
                    + near(at, enemy_flag, 3, 3.0, 0.0)
                    + unrevealed as f64 * 2.0
                    + ctx.hotspot_pressure(at, 4) * 0.8;
            }
            raw.safety = 6.0;
        }
        (CandidateKind::SensorScan, target) => {
            raw.utility = 7.5;
            if let Some(at) = target {
                raw.utility += enemies_within(state, enemy, at, 2) as f64 * 2.2
                    + near(at, enemy_flag, 3, 3.5, 0.0)
                    + ctx.hotspot_pressure(at, 4) * 0.9;
            }
            raw.safety = 6.5;
        }
        (CandidateKind::PlaceMine, Some(at)) => {
            let near_flag = near(at, enemy_flag, 4, 8.0, 3.0);
            let closest = state.players[enemy]
                .living()
                .map(|u| at.manhattan(u.position))
                .min()
                .unwrap_or(6);
            let unit_pressure = match closest {
                0..=2 => 8.0,
                3..=4 => 4.0,
                _ => 0.0,
            };
            let type_bonus = match candidate.mine_type {
                Some(MineType::Slow) => {
                    if closest <= 2 { 6.0 } else { 2.0 }
                }
                Some(MineType::Smoke) => {
                    if closest <= 3 { 4.0 } else { 1.0 }
                }
                Some(MineType::Chain) => {
                    if near_flag >= 8.0 { 6.0 } else { 3.0 }
                }
                Some(MineType::Nuke) => {
                    if enemies_within(state, enemy, at, 2) >= 2 { 10.0 } else { 4.0 }
                }
                Some(MineType::Normal) | None => 0.0,
            };
            raw.utility =
                near_flag + unit_pressure + type_bonus + ctx.hotspot_pressure(at, 3) * 0.75;
            raw.safety = (14.0 - risk(at)).max(0.0);
        }
        (CandidateKind::PlaceTower, Some(at)) => {
            let covered = state
                .mines
                .iter()
                .filter(|m| m.owner == enemy && m.position.chebyshev(at) <= 1)
                .count();
            raw.utility =
                8.0 + covered as f64 * 4.0 + enemies_within(state, enemy, at, 2) as f64 * 1.6;
            raw.safety = 6.5;
        }
        (CandidateKind::DetonateTower, _) => {
            let towers: Vec<Position> = state
                .buildings_of(owner, BuildingKind::Tower)
                .map(|b| b.position)
                .collect();
            let covered = |p: Position| towers.iter().any(|t| t.chebyshev(p) <= 1);
            let mines = state
                .mines
                .iter()
                .filter(|m| m.owner == enemy && covered(m.position))
                .count();
            let units = state.players[enemy]
                .living()
                .filter(|u| covered(u.position))
                .count();
            raw.attack = units as f64 * 5.5;
            raw.utility = 9.0 + mines as f64 * 3.5;
            raw.safety = 5.5;
        }
        (CandidateKind::PlaceFactory, Some(at)) => {
            raw.utility = 7.0 + (10.0 - f64::from(at.manhattan(enemy_flag))).max(0.0) * 0.4;
            raw.safety = 5.0;
        }
        (CandidateKind::PlaceHub, Some(at)) => {
            raw.utility = 8.0
                + (9.0 - f64::from(at.manhattan(enemy_flag))).max(0.0) * 0.35
                + (6.0 - f64::from(at.manhattan(own_flag))).max(0.0) * 0.25;
            raw.safety = 5.5;
        }
        (CandidateKind::Teleport, Some(to)) => {
            let push = f64::from(
                (unit.position.manhattan(enemy_flag) - to.manhattan(enemy_flag)).max(0),
            );
            let defense =
                f64::from((unit.position.manhattan(own_flag) - to.manhattan(own_flag)).max(0));
            raw.flag = push * if unit.has_flag { 4.0 } else { 2.2 };
            raw.utility = 6.0 + push * 1.8 + defense * 1.1;
            raw.safety = (20.0 - risk(to)).max(0.0);
        }
        (CandidateKind::ThrowMine, Some(at)) => {
            let hit = state.players[enemy]
                .living()
                .filter(|u| u.position == at)
                .count() as f64;
            raw.attack = hit * 8.5;
            raw.utility = 7.0 + near(at, enemy_flag, 3, 6.0, 2.0) + hit * 3.5;
            raw.safety = 5.2;
        }
        (CandidateKind::PickupMine, Some(at)) => {
            raw.utility = 6.5 + near(at, enemy_flag, 4, 3.0, 0.0);
            raw.safety = 6.0;
        }
        (CandidateKind::DropMine, Some(at)) => {
            raw.utility = 6.0 + near(at, enemy_flag, 4, 6.0, 2.0);
            raw.safety = 5.8;
        }
        (CandidateKind::MoveMine, Some(at)) => {
            let pressed = state.players[enemy]
                .living()
                .filter(|u| u.position.manhattan(at) <= 1)
                .count();
            raw.utility = 8.0 + pressed as f64 * 2.4 + near(at, enemy_flag, 4, 5.0, 1.0);
            raw.safety = 5.2;
        }
        (CandidateKind::ConvertMine, Some(at)) => {
            raw.utility = 9.0 + near(at, enemy_flag, 4, 5.5, 2.0);
            raw.safety = 6.2;
        }
        (CandidateKind::Disarm, target) => {
            raw.utility = 9.0;
            if let Some(at) = target {
                raw.utility += enemies_within(state, enemy, at, 2) as f64 * 2.0
                    + ctx.hotspot_pressure(at, 3) * 0.65;
            }
            raw.safety = 7.0;
        }
        (CandidateKind::PickupFlag, _) => {
            raw.flag = 12.0;
            raw.utility = 5.0;
        }
        (CandidateKind::DropFlag, _) => {
            let crowded = enemies_within(state, enemy, unit.position, 2) >= 2;
            raw.utility = if crowded { 7.0 } else { 2.0 };
            raw.safety = if crowded { 10.0 } else { 3.0 };
        }
        (CandidateKind::Stealth, _) => {
            let exposed = enemies_within(state, enemy, unit.position, 2) as f64;
            raw.utility = 4.0 + exposed * 1.5;
            raw.safety = 5.0 + exposed * 2.0;
        }
        (CandidateKind::EndTurn, _) => {
            raw.utility = 0.5;
            raw.safety = 1.5;
        }
        (kind, _) => {
            if let Some((branch, variant)) = kind.as_evolution() {
                let level = state.players[owner].level(unit.kind(), branch);
                let next = f64::from((level + 1).min(GameConfig::MAX_EVOLUTION_LEVEL));
                raw.utility = 7.0 + next * 2.2;
                raw.safety = 4.5;
                match (unit.kind(), branch) {
                    (UnitType::General, Branch::A) => raw.attack += 4.5,
                    (UnitType::General, Branch::B) => raw.flag += 4.5,
                    (UnitType::Ranger, Branch::A) => {
                        raw.flag += 2.5;
                        raw.utility += 1.5;
                    }
                    (UnitType::Maker, Branch::B) => raw.utility += 2.0,
                    (UnitType::Defuser, Branch::B) => raw.safety += 1.8,
                    _ => {}
                }
                if variant.is_some() {
                    raw.utility += 1.2;
                }
            }
        }
    }
    raw
}

fn opponent_bias(ctx: &PlanningContext<'_>, kind: CandidateKind) -> f64 {
    use CandidateKind as K;
    let model = ctx.model;
    let mut bias = 0.0;
    if model.mine_pressure >= 4.5 {
        bias += match kind {
            K::Scan | K::SensorScan | K::Disarm => 1.8,
            K::PlaceMine | K::PlaceTower | K::MoveMine | K::ConvertMine => 1.1,
            _ => 0.0,
        };
    }
    if model.flag_rush >= 4.5 {
        bias += match kind {
            K::Attack => 2.3,
            K::Move | K::Teleport => 1.2,
            _ => 0.0,
        };
    }
    if model.aggression >= 5.5 {
        bias += match kind {
            K::EndTurn if ctx.intent == Intent::Stabilize => 1.0,
            K::DropFlag => 0.8,
            _ => 0.0,
        };
    }
    bias
}

fn endgame_bias(
    state: &GameState,
    ctx: &PlanningContext<'_>,
    unit: &Unit,
    kind: CandidateKind,
    cell: Option<Position>,
) -> f64 {
    use CandidateKind as K;
    let urgency = ctx.endgame.urgency;
    let factor = match ctx.endgame.mode {
        EndgameMode::None => 0.0,
        EndgameMode::Race => match kind {
            K::Move if unit.has_flag => 2.2,
            K::PickupFlag => 1.6,
            K::Teleport => 1.5,
            K::Attack => 1.1,
            K::DropFlag => -2.7,
            K::EndTurn => -1.8,
            _ => 0.0,
        },
        EndgameMode::Defense => match (kind, cell) {
            (K::Attack, _) => 2.5,
            (K::Scan | K::SensorScan | K::Disarm, _) => 1.6,
            (K::PlaceTower | K::ConvertMine | K::MoveMine, _) => 1.3,
            (K::DropFlag, _) => 1.1,
            (K::EndTurn, _) => -1.5,
            (K::Move, Some(to)) => {
                let own_flag = state.players[unit.owner()].flag_position;
                let gain = unit.position.manhattan(own_flag) - to.manhattan(own_flag);
                f64::from(gain.max(0)) * 0.9
            }
            _ => 0.0,
        },
        EndgameMode::Attrition => match kind {
            K::Attack => 1.2,
            K::DetonateTower | K::ThrowMine => 1.3,
            K::Move => 0.7,
            K::EndTurn => -0.8,
            _ => 0.0,
        },
    };
    factor * urgency
}

/// Scores `candidate` for `unit` in the current planning context.
pub fn evaluate_action(
    state: &GameState,
    unit: &Unit,
    candidate: &Candidate,
    ctx: &PlanningContext<'_>,
) -> ScoreBreakdown {
    let w = ctx.difficulty.weights();
    let cell = candidate.target.cell(state);
    let raw = raw_components(state, unit, candidate, cell, ctx);

    let mut energy = if candidate.kind == CandidateKind::EndTurn {
        1.0
    } else {
        (10.0 - f64::from(candidate.cost)).max(0.0)
    };
    if candidate.cost > 0 {
        let left = i64::from(state.players[unit.owner()].energy) - i64::from(candidate.cost);
        let shortfall = (i64::from(ctx.reserve) - left).max(0);
        energy = (energy - shortfall as f64 * 1.6).max(0.0);
    }

    let kind = candidate.kind;
    let mut score = ScoreBreakdown {
        attack: raw.attack,
        flag: raw.flag,
        safety: raw.safety,
        utility: raw.utility,
        energy,
        intent: intent_bonus(ctx.intent, kind),
        role: role_bonus(ctx.role(unit.kind()), kind),
        opponent: opponent_bias(ctx, kind),
        opening: opening::action_bias(ctx, unit, kind, cell, candidate.mine_type),
        endgame: endgame_bias(state, ctx, unit, kind, cell),
        total: 0.0,
    };
    score.total = score.attack * w.action_damage
        + score.flag * w.action_flag_pressure
        + score.safety * w.action_safety
        + score.utility * w.action_utility
        + score.energy * 0.6
        + score.intent
        + score.role
        + score.opponent
        + score.opening
        + score.endgame;
    tuning::tune_action(&mut score, ctx.profile);
    score
}
