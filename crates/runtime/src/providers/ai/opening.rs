//! Opening book.
//!
//! One plan is picked the first time the AI decides and stays fixed for the
//! match. While the opening is active (early turns, no carrier, no endgame)
//! the plan adds a fading bias toward its preferred action families, roles
//! and board lane.

use minefront_core::{GameState, MineType, PlayerId, Position, Unit, UnitType};

use super::context::PlanningContext;
use super::opponent::OpponentModel;
use super::types::{CandidateKind, Difficulty, OpeningPlan, Role, TuningProfile};

/// Part of the board a plan wants its units in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lane {
    Center,
    Upper,
    Lower,
    Fortress,
    Wide,
}

struct BookEntry {
    actions: &'static [(CandidateKind, f64)],
    roles: &'static [(Role, f64)],
    lane: Lane,
}

fn entry(plan: OpeningPlan) -> BookEntry {
    use CandidateKind as K;
    match plan {
        OpeningPlan::CenterBreak => BookEntry {
            actions: &[(K::Move, 2.2), (K::Attack, 1.1), (K::Scan, 0.8), (K::Teleport, 0.9)],
            roles: &[(Role::Striker, 1.5), (Role::Flanker, 1.1)],
            lane: Lane::Center,
        },
        OpeningPlan::LanePressure => BookEntry {
            actions: &[(K::Move, 2.4), (K::Attack, 0.8), (K::PickupFlag, 0.7)],
            roles: &[(Role::Flanker, 1.5), (Role::Striker, 1.1)],
            lane: Lane::Wide,
        },
        OpeningPlan::MineScreen => BookEntry {
            actions: &[
                (K::PlaceMine, 2.8),
                (K::PlaceTower, 1.6),
                (K::MoveMine, 1.3),
                (K::ConvertMine, 1.4),
                (K::Scan, 1.3),
                (K::Disarm, 0.8),
                (K::Move, 0.6),
            ],
            roles: &[(Role::Controller, 1.6), (Role::Support, 1.1)],
            lane: Lane::Center,
        },
        OpeningPlan::ScoutProbe => BookEntry {
            actions: &[(K::Scan, 2.7), (K::Move, 1.6), (K::Disarm, 1.2)],
            roles: &[(Role::Scout, 1.8), (Role::Support, 0.9)],
            lane: Lane::Upper,
        },
        OpeningPlan::Fortress => BookEntry {
            actions: &[
                (K::PlaceMine, 1.9),
                (K::PlaceTower, 1.5),
                (K::PlaceHub, 1.2),
                (K::Disarm, 1.4),
                (K::Move, 0.4),
                (K::EndTurn, 0.3),
            ],
            roles: &[(Role::Support, 1.5), (Role::Controller, 1.2)],
            lane: Lane::Fortress,
        },
        OpeningPlan::FlagSpear => BookEntry {
            actions: &[(K::Move, 2.5), (K::PickupFlag, 1.1), (K::Attack, 1.4)],
            roles: &[(Role::Striker, 1.7), (Role::Flanker, 1.2)],
            lane: Lane::Lower,
        },
    }
}

fn lookup<K: PartialEq>(table: &[(K, f64)], key: K) -> f64 {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(0.0, |(_, bonus)| *bonus)
}

/// Obstacles in the four middle columns.
fn center_obstacles(state: &GameState) -> usize {
    minefront_core::state::Board::positions()
        .filter(|p| (10..=13).contains(&p.c) && state.board.is_obstacle(*p))
        .count()
}

/// Enemy units already within striking distance of the AI flag.
fn forward_pressure(state: &GameState, ai: PlayerId) -> usize {
    let flag = state.players[ai].flag_position;
    state.players[ai.opponent()]
        .living()
        .filter(|u| u.position.manhattan(flag) <= 7)
        .count()
}

/// Picks the opening plan for `ai`. First match wins.
pub fn choose_plan(
    state: &GameState,
    difficulty: Difficulty,
    profile: TuningProfile,
    model: &OpponentModel,
    ai: PlayerId,
) -> OpeningPlan {
    let obstacles = center_obstacles(state);
    let pressure = forward_pressure(state, ai);

    if model.mine_pressure >= 4.5 {
        return OpeningPlan::ScoutProbe;
    }
    match profile {
        TuningProfile::Conservative if pressure >= 2 => return OpeningPlan::Fortress,
        TuningProfile::Conservative => return OpeningPlan::MineScreen,
        TuningProfile::Aggressive if obstacles <= 5 => return OpeningPlan::CenterBreak,
        TuningProfile::Aggressive => return OpeningPlan::FlagSpear,
        TuningProfile::Balanced => {}
    }
    if difficulty == Difficulty::Hard && obstacles <= 4 {
        return OpeningPlan::CenterBreak;
    }
    if pressure >= 2 || model.flag_rush >= 4.2 || obstacles >= 8 {
        return OpeningPlan::LanePressure;
    }
    OpeningPlan::MineScreen
}

fn lane_score(lane: Lane, cell: Position, ai: PlayerId) -> f64 {
    let r = f64::from(cell.r);
    let c = f64::from(cell.c);
    match lane {
        Lane::Center => (4.0 - ((r - 3.0).abs() * 0.7 + (c - 12.0).abs() * 0.18)).clamp(0.0, 4.0),
        Lane::Upper => (3.8 - r * 0.9).clamp(0.0, 3.8),
        Lane::Lower => (3.8 - (6.0 - r) * 0.9).clamp(0.0, 3.8),
        Lane::Fortress => {
            let back = f64::from(ai.mirror_col(2));
            (4.2 - (c - back).abs() * 0.45).clamp(0.0, 4.2)
        }
        Lane::Wide => (3.4 - r.min(6.0 - r) * 0.9).clamp(0.0, 3.4),
    }
}

/// Columns gained toward the enemy side by stepping from `from` to `to`.
fn forward_gain(ai: PlayerId, from: Position, to: Position) -> i32 {
    match ai {
        PlayerId::P1 => to.c - from.c,
        PlayerId::P2 => from.c - to.c,
    }
}

/// Opening bias for one candidate. Zero once the opening is over.
pub fn action_bias(
    ctx: &PlanningContext<'_>,
    unit: &Unit,
    kind: CandidateKind,
    target: Option<Position>,
    mine: Option<MineType>,
) -> f64 {
    let Some(opening) = ctx.opening else {
        return 0.0;
    };
    let book = entry(opening.plan);

    let mut bias = lookup(book.actions, kind) + lookup(book.roles, ctx.role(unit.kind()));
    if let Some(cell) = target {
        bias += lane_score(book.lane, cell, ctx.player) * 0.65;
        if kind == CandidateKind::Move {
            let forward = forward_gain(ctx.player, unit.position, cell);
            if forward > 0 {
                bias += f64::from(forward) * 0.55;
            }
        }
    }

    bias += match (opening.plan, mine) {
        (OpeningPlan::MineScreen, Some(MineType::Chain)) => 1.2,
        (OpeningPlan::Fortress, Some(MineType::Normal | MineType::Slow)) => 0.9,
        _ => 0.0,
    };
    if opening.plan == OpeningPlan::FlagSpear
        && kind == CandidateKind::PickupFlag
        && unit.kind() == UnitType::General
    {
        bias += 1.3;
    }
    bias * opening.weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use minefront_core::state::Board;

    fn open_board() -> GameState {
        let mut state = GameState::new(5);
        for cell in Board::positions() {
            state.board.set_obstacle(cell, false);
        }
        state
    }

    #[test]
    fn profile_steers_the_plan() {
        let state = open_board();
        let calm = OpponentModel::new();
        let pick = |difficulty, profile| choose_plan(&state, difficulty, profile, &calm, PlayerId::P2);

        assert_eq!(pick(Difficulty::Normal, TuningProfile::Aggressive), OpeningPlan::CenterBreak);
        assert_eq!(pick(Difficulty::Normal, TuningProfile::Conservative), OpeningPlan::MineScreen);
        assert_eq!(pick(Difficulty::Hard, TuningProfile::Balanced), OpeningPlan::CenterBreak);
        assert_eq!(pick(Difficulty::Normal, TuningProfile::Balanced), OpeningPlan::MineScreen);

        let mined = OpponentModel {
            mine_pressure: 5.0,
            ..OpponentModel::new()
        };
        assert_eq!(
            choose_plan(&state, Difficulty::Hard, TuningProfile::Aggressive, &mined, PlayerId::P2),
            OpeningPlan::ScoutProbe
        );
    }

    #[test]
    fn crowded_center_sends_aggression_down_the_side() {
        let mut state = open_board();
        for r in 0..6 {
            state.board.set_obstacle(Position::new(r, 11), true);
        }
        let calm = OpponentModel::new();
        assert_eq!(
            choose_plan(&state, Difficulty::Normal, TuningProfile::Aggressive, &calm, PlayerId::P1),
            OpeningPlan::FlagSpear
        );
    }

    #[test]
    fn lanes_favour_their_rows() {
        let middle = Position::new(3, 12);
        assert_eq!(lane_score(Lane::Center, middle, PlayerId::P1), 4.0);
        let upper = |r| lane_score(Lane::Upper, Position::new(r, 5), PlayerId::P1);
        assert!(upper(0) > upper(4));
        assert_eq!(lane_score(Lane::Fortress, Position::new(3, 21), PlayerId::P2), 4.2);
        assert!((lane_score(Lane::Wide, middle, PlayerId::P1) - 0.7).abs() < 1e-9);
    }
}
