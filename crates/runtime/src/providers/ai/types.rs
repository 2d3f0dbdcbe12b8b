//! Core types for the utility-based AI.
//!
//! Difficulty and tuning knobs, the planning-level decisions (intent, role,
//! opening plan, endgame mode) and the candidate records passed between the
//! generator, the evaluator and the selector.

use minefront_core::{Action, Branch, GameState, MineType, Position, UnitId, Variant};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Skill tier. Shifts the scoring weights, the jitter and the reserve.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// Multipliers applied to each named score component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifficultyWeights {
    pub unit_attack_opportunity: f64,
    pub unit_flag_pressure: f64,
    pub unit_survival: f64,
    pub unit_energy_efficiency: f64,
    pub action_damage: f64,
    pub action_flag_pressure: f64,
    pub action_safety: f64,
    pub action_utility: f64,
    pub random_jitter: f64,
}

impl Difficulty {
    pub const fn weights(self) -> DifficultyWeights {
        match self {
            Difficulty::Easy => DifficultyWeights {
                unit_attack_opportunity: 0.8,
                unit_flag_pressure: 0.7,
                unit_survival: 0.6,
                unit_energy_efficiency: 0.5,
                action_damage: 0.9,
                action_flag_pressure: 0.8,
                action_safety: 0.7,
                action_utility: 0.6,
                random_jitter: 0.8,
            },
            Difficulty::Normal => DifficultyWeights {
                unit_attack_opportunity: 1.2,
                unit_flag_pressure: 1.0,
                unit_survival: 1.0,
                unit_energy_efficiency: 0.8,
                action_damage: 1.3,
                action_flag_pressure: 1.1,
                action_safety: 1.2,
                action_utility: 1.0,
                random_jitter: 0.4,
            },
            Difficulty::Hard => DifficultyWeights {
                unit_attack_opportunity: 1.5,
                unit_flag_pressure: 1.3,
                unit_survival: 1.2,
                unit_energy_efficiency: 1.0,
                action_damage: 1.6,
                action_flag_pressure: 1.3,
                action_safety: 1.5,
                action_utility: 1.2,
                random_jitter: 0.15,
            },
        }
    }

    /// Energy kept back before intent and tuning adjustments.
    pub const fn base_reserve(self) -> u32 {
        match self {
            Difficulty::Easy => 4,
            Difficulty::Normal => 6,
            Difficulty::Hard => 8,
        }
    }

    pub const fn threat_scale(self) -> f64 {
        match self {
            Difficulty::Easy => 0.9,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.15,
        }
    }
}

/// Play-style bias layered on top of difficulty.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TuningProfile {
    Aggressive,
    #[default]
    Balanced,
    Conservative,
}

/// What the AI wants this turn. Derived once per decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    PushFlag,
    HuntFlagCarrier,
    ControlMines,
    Stabilize,
}

/// Tactical role of one unit inside the formation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Striker,
    Flanker,
    Controller,
    Scout,
    Support,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EndgameMode {
    #[default]
    None,
    /// The AI carries its flag toward the enemy base.
    Race,
    /// An enemy carrier is heading for the AI base.
    Defense,
    /// Late game without a carrier.
    Attrition,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EndgameState {
    pub mode: EndgameMode,
    pub urgency: f64,
    pub own_alive: usize,
    pub enemy_alive: usize,
}

impl EndgameState {
    pub fn is_endgame(&self) -> bool {
        self.mode != EndgameMode::None
    }
}

/// Scripted plan for the first rounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum OpeningPlan {
    CenterBreak,
    LanePressure,
    MineScreen,
    ScoutProbe,
    Fortress,
    FlagSpear,
}

/// Active opening plan and how strongly it still applies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpeningState {
    pub plan: OpeningPlan,
    pub weight: f64,
}

/// Action family as the AI reasons about it.
///
/// Evolutions are split per branch and, at the variant step, per variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum CandidateKind {
    Move,
    Attack,
    Scan,
    SensorScan,
    PlaceMine,
    PlaceTower,
    PlaceHub,
    PlaceFactory,
    DetonateTower,
    Teleport,
    ThrowMine,
    PickupMine,
    DropMine,
    MoveMine,
    ConvertMine,
    Disarm,
    PickupFlag,
    DropFlag,
    Stealth,
    EvolveA,
    EvolveB,
    #[strum(serialize = "evolve_a_1")]
    EvolveA1,
    #[strum(serialize = "evolve_a_2")]
    EvolveA2,
    #[strum(serialize = "evolve_b_1")]
    EvolveB1,
    #[strum(serialize = "evolve_b_2")]
    EvolveB2,
    EndTurn,
}

impl CandidateKind {
    /// Tie-break order when two candidates score the same.
    pub const fn priority(self) -> u32 {
        match self {
            CandidateKind::Attack => 90,
            CandidateKind::PickupFlag => 80,
            CandidateKind::DetonateTower => 79,
            CandidateKind::EvolveA1 | CandidateKind::EvolveA2 => 78,
            CandidateKind::EvolveB1 | CandidateKind::EvolveB2 => 76,
            CandidateKind::EvolveA => 74,
            CandidateKind::EvolveB => 72,
            CandidateKind::ConvertMine => 71,
            CandidateKind::MoveMine => 69,
            CandidateKind::Teleport => 67,
            CandidateKind::ThrowMine => 66,
            CandidateKind::PlaceTower => 64,
            CandidateKind::PlaceFactory => 63,
            CandidateKind::PlaceHub => 62,
            CandidateKind::PickupMine => 61,
            CandidateKind::DropMine | CandidateKind::PlaceMine => 60,
            CandidateKind::Disarm => 55,
            CandidateKind::SensorScan => 50,
            CandidateKind::Stealth => 40,
            CandidateKind::Scan => 45,
            CandidateKind::Move => 35,
            CandidateKind::DropFlag => 20,
            CandidateKind::EndTurn => 0,
        }
    }

    pub const fn evolution(branch: Branch, variant: Option<Variant>) -> Self {
        match (branch, variant) {
            (Branch::A, None) => CandidateKind::EvolveA,
            (Branch::B, None) => CandidateKind::EvolveB,
            (Branch::A, Some(Variant::First)) => CandidateKind::EvolveA1,
            (Branch::A, Some(Variant::Second)) => CandidateKind::EvolveA2,
            (Branch::B, Some(Variant::First)) => CandidateKind::EvolveB1,
            (Branch::B, Some(Variant::Second)) => CandidateKind::EvolveB2,
        }
    }

    /// Branch and variant of an evolution kind.
    pub const fn as_evolution(self) -> Option<(Branch, Option<Variant>)> {
        match self {
            CandidateKind::EvolveA => Some((Branch::A, None)),
            CandidateKind::EvolveB => Some((Branch::B, None)),
            CandidateKind::EvolveA1 => Some((Branch::A, Some(Variant::First))),
            CandidateKind::EvolveA2 => Some((Branch::A, Some(Variant::Second))),
            CandidateKind::EvolveB1 => Some((Branch::B, Some(Variant::First))),
            CandidateKind::EvolveB2 => Some((Branch::B, Some(Variant::Second))),
            _ => None,
        }
    }
}

/// What a candidate points at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Target {
    #[default]
    None,
    Cell(Position),
    Unit(UnitId),
}

impl Target {
    /// Board cell of the target, following a unit to where it stands.
    pub fn cell(self, state: &GameState) -> Option<Position> {
        match self {
            Target::None => None,
            Target::Cell(pos) => Some(pos),
            Target::Unit(id) => state.unit(id).map(|u| u.position),
        }
    }
}

/// Named score components. `total` is the weighted sum after tuning.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub attack: f64,
    pub flag: f64,
    pub safety: f64,
    pub utility: f64,
    pub energy: f64,
    pub intent: f64,
    pub role: f64,
    pub opponent: f64,
    pub opening: f64,
    pub endgame: f64,
    pub total: f64,
}

/// One concrete action the AI may take, with its score.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub unit: UnitId,
    pub kind: CandidateKind,
    pub action: Action,
    pub target: Target,
    pub mine_type: Option<MineType>,
    /// Energy the action is expected to spend.
    pub cost: u32,
    pub score: ScoreBreakdown,
}

impl Candidate {
    pub fn new(unit: UnitId, kind: CandidateKind, action: impl Into<Action>, cost: u32) -> Self {
        Self {
            unit,
            kind,
            action: action.into(),
            target: Target::None,
            mine_type: None,
            cost,
            score: ScoreBreakdown::default(),
        }
    }

    pub fn at(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_mine(mut self, kind: MineType) -> Self {
        self.mine_type = Some(kind);
        self
    }

    pub fn total(&self) -> f64 {
        self.score.total
    }
}

/// A unit the AI may activate next, with its priority score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitCandidate {
    pub unit: UnitId,
    pub score: ScoreBreakdown,
}

impl UnitCandidate {
    pub fn total(&self) -> f64 {
        self.score.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn evolution_kinds_round_trip() {
        for kind in CandidateKind::iter() {
            if let Some((branch, variant)) = kind.as_evolution() {
                assert_eq!(CandidateKind::evolution(branch, variant), kind);
            }
        }
        assert_eq!(CandidateKind::EvolveB2.to_string(), "evolve_b_2");
        assert_eq!(CandidateKind::SensorScan.to_string(), "sensor_scan");
    }

    #[test]
    fn harder_tiers_jitter_less() {
        let easy = Difficulty::Easy.weights();
        let hard = Difficulty::Hard.weights();
        assert!(hard.random_jitter < easy.random_jitter);
        assert!(hard.action_safety > easy.action_safety);
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
    }
}
