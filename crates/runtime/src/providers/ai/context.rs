//! Per-decision planning context.
//!
//! [`PlanningContext`] is built once per AI decision from the current state
//! and the opponent model. It fixes the intent, the per-cell threat overlay,
//! the energy reserve, unit roles, hot cells, and the opening and endgame
//! situation, so every candidate is scored against the same picture.

use minefront_core::{
    Branch, GameConfig, GameState, MineType, PlayerId, Position, UnitType, state::Board,
};

use super::opponent::OpponentModel;
use super::scoring::tuning;
use super::types::{
    Difficulty, EndgameState, Intent, OpeningPlan, OpeningState, Role, TuningProfile,
};
use super::{endgame, opening, roles};

/// Risk value of a cell no unit may enter.
pub const BLOCKED: f64 = 999.0;

const HOTSPOT_LIMIT: usize = 8;
const OPENING_LAST_TURN: u32 = 6;

/// Decides what the AI is trying to do this turn. First match wins.
pub fn derive_intent(state: &GameState, ai: PlayerId, model: &OpponentModel) -> Intent {
    let own = &state.players[ai];
    let enemy = ai.opponent();

    if state.players[enemy].carrier().is_some() {
        return Intent::HuntFlagCarrier;
    }
    if own.carrier().is_some() {
        return Intent::PushFlag;
    }

    let mines_close = state
        .mines
        .iter()
        .filter(|m| m.owner == enemy && m.is_visible_to(ai))
        .any(|m| own.living().any(|u| u.position.manhattan(m.position) <= 2));
    if mines_close || model.mine_pressure >= 4.5 {
        return Intent::ControlMines;
    }

    let fragile = own
        .living()
        .filter(|u| u.max_hp > 0 && f64::from(u.hp) / f64::from(u.max_hp) <= 0.45)
        .count();
    if fragile >= 2 || own.energy <= 12 || model.aggression >= 5.5 {
        return Intent::Stabilize;
    }

    if model.flag_rush >= 5.2 {
        return Intent::HuntFlagCarrier;
    }
    Intent::PushFlag
}

/// Per-cell danger overlay for one side.
///
/// Only mines the side can see are counted. Proximity NUKEs are kept apart
/// from the base layer so a move that starts inside a blast radius is not
/// charged for it again.
#[derive(Clone, Debug, PartialEq)]
pub struct ThreatMap {
    cells: Vec<f64>,
    nukes: Vec<Position>,
    scale: f64,
}

const NUKE_RISK: f64 = 65.0;

impl ThreatMap {
    pub fn build(state: &GameState, ai: PlayerId, difficulty: Difficulty) -> Self {
        let enemy = ai.opponent();
        let general_reach =
            if state.players[enemy].level(UnitType::General, Branch::A) >= 2 { 2 } else { 1 };
        let scale = difficulty.threat_scale();
        let known = || state.mines.iter().filter(|m| m.owner == enemy && m.is_visible_to(ai));

        let cells = Board::positions()
            .map(|cell| {
                if state.board.is_obstacle(cell) {
                    return BLOCKED;
                }
                let mut risk = 0.0;
                if known().any(|m| m.position == cell) {
                    risk += 90.0;
                }
                for unit in state.players[enemy].living() {
                    let distance = unit.position.manhattan(cell);
                    if distance <= 1 {
                        risk += 9.0;
                    } else if distance == 2 {
                        risk += 4.0;
                    }
                    let in_lane = unit.position.r == cell.r || unit.position.c == cell.c;
                    if unit.kind() == UnitType::General && in_lane && distance <= general_reach {
                        risk += 16.0;
                    }
                }
                risk * scale
            })
            .collect();
        let nukes = known().filter(|m| m.kind == MineType::Nuke).map(|m| m.position).collect();
        Self { cells, nukes, scale }
    }

    fn base(&self, pos: Position) -> f64 {
        if !pos.in_bounds() {
            return BLOCKED;
        }
        let index = (pos.r * GameConfig::GRID_COLS + pos.c) as usize;
        self.cells.get(index).copied().unwrap_or(BLOCKED)
    }

    fn nuke_layer(&self, hit: impl Fn(Position) -> bool) -> f64 {
        self.nukes.iter().filter(|&&nuke| hit(nuke)).count() as f64 * NUKE_RISK * self.scale
    }

    /// Threat at `pos`. Off-board cells are blocked.
    pub fn at(&self, pos: Position) -> f64 {
        let base = self.base(pos);
        if base >= BLOCKED {
            return base;
        }
        base + self.nuke_layer(|nuke| nuke.chebyshev(pos) <= 1)
    }

    /// Threat of stepping from `from` onto `to`. NUKEs whose radius already
    /// holds `from` add nothing.
    pub fn entering(&self, from: Position, to: Position) -> f64 {
        let base = self.base(to);
        if base >= BLOCKED {
            return base;
        }
        base + self.nuke_layer(|nuke| nuke.chebyshev(to) <= 1 && nuke.chebyshev(from) > 1)
    }
}

/// Energy the AI keeps back, before tuning.
pub fn reserve_energy(state: &GameState, intent: Intent, difficulty: Difficulty, ai: PlayerId) -> u32 {
    let bonus = match intent {
        Intent::HuntFlagCarrier | Intent::Stabilize => 2,
        Intent::PushFlag | Intent::ControlMines => 1,
    };
    let pool_cap = (f64::from(state.players[ai].energy) * 0.55).floor() as u32;
    (difficulty.base_reserve() + bonus).min(pool_cap)
}

/// Everything the evaluator needs besides the candidate itself.
#[derive(Clone, Debug)]
pub struct PlanningContext<'a> {
    pub player: PlayerId,
    pub difficulty: Difficulty,
    pub profile: TuningProfile,
    pub intent: Intent,
    pub threat: ThreatMap,
    pub reserve: u32,
    pub model: &'a OpponentModel,
    pub hotspots: Vec<(Position, f64)>,
    pub opening: Option<OpeningState>,
    pub endgame: EndgameState,
    roles: [Role; GameConfig::ROSTER_SIZE],
}

impl<'a> PlanningContext<'a> {
    /// `plan` is the opening plan fixed earlier in the match, if any.
    pub fn build(
        state: &GameState,
        ai: PlayerId,
        difficulty: Difficulty,
        profile: TuningProfile,
        model: &'a OpponentModel,
        plan: Option<OpeningPlan>,
    ) -> Self {
        let endgame = endgame::evaluate(state, ai);
        let intent = derive_intent(state, ai, model);
        let threat = ThreatMap::build(state, ai, difficulty);
        let reserve = tuning::adjust_reserve(
            reserve_energy(state, intent, difficulty, ai),
            profile,
        );
        let roles = UnitType::ALL.map(|kind| roles::assign(kind, intent, model));

        let carrier = PlayerId::ALL
            .into_iter()
            .any(|p| state.players[p].carrier().is_some());
        let opening = (!endgame.is_endgame() && !carrier && state.turn <= OPENING_LAST_TURN)
            .then(|| OpeningState {
                plan: plan.unwrap_or_else(|| {
                    opening::choose_plan(state, difficulty, profile, model, ai)
                }),
                weight: ((7.0 - f64::from(state.turn)) / 6.0).max(0.22),
            });

        Self {
            player: ai,
            difficulty,
            profile,
            intent,
            threat,
            reserve,
            model,
            hotspots: model.top_hotspots(HOTSPOT_LIMIT),
            opening,
            endgame,
            roles,
        }
    }

    pub fn role(&self, kind: UnitType) -> Role {
        self.roles[kind.index()]
    }

    /// Heat of known hotspots within `radius` of `pos`, fading with distance.
    pub fn hotspot_pressure(&self, pos: Position, radius: i32) -> f64 {
        self.hotspots
            .iter()
            .filter_map(|(cell, heat)| {
                let distance = cell.manhattan(pos);
                (distance <= radius).then(|| heat / f64::from(distance + 1))
            })
            .sum()
    }
}
