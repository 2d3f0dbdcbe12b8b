//! Rule rejections.
//!
//! Every expected precondition failure is a [`RejectReason`]. Its
//! [`GameError::error_code`] is the localized log key written to the acting
//! player's log when the engine drops the action.

use crate::error::{ErrorSeverity, GameError};
use crate::state::{LogValue, UnitId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RejectReason {
    // ===== turn structure =====
    #[error("action not allowed in this phase")]
    WrongPhase,

    #[error("not this player's turn")]
    NotYourTurn,

    #[error("the match is over")]
    GameOver,

    #[error("player already confirmed")]
    AlreadyReady,

    // ===== unit state =====
    #[error("unit {0} not found")]
    UnitNotFound(UnitId),

    #[error("unit {0} is dead")]
    UnitDead(UnitId),

    #[error("unit {0} already acted this round")]
    UnitActed(UnitId),

    #[error("another unit ({0}) is mid-action")]
    Committed(UnitId),

    #[error("this unit type cannot do that")]
    WrongUnit,

    // ===== energy =====
    #[error("not enough energy (needs {cost})")]
    LowEnergy { cost: u32 },

    #[error("not enough energy to attack (needs {cost})")]
    LowEnergyAttack { cost: u32 },

    #[error("energy cap of {cap} reached")]
    EnergyCap { cap: u32 },

    // ===== geometry =====
    #[error("target out of range")]
    OutOfRange,

    #[error("target out of bounds")]
    OutOfBounds,

    #[error("cell blocked")]
    Obstacle,

    #[error("cell occupied")]
    Occupied,

    #[error("scan target out of range")]
    ScanRange,

    #[error("disarm target out of range")]
    DisarmRange,

    #[error("mine target out of range")]
    MakerRange,

    #[error("scan blocked by smoke")]
    ScanSmokeBlocked,

    #[error("invalid target")]
    InvalidTarget,

    // ===== mines =====
    #[error("no mine there")]
    NoMine,

    #[error("cell already holds a mine")]
    SpaceHasMine,

    #[error("setup mine limit reached")]
    MineLimit,

    #[error("setup mines must be placed in the own half")]
    MineZone,

    #[error("cannot target an own mine")]
    OwnMine,

    #[error("mine not revealed")]
    MineNotRevealed,

    #[error("mine limit of {limit} reached")]
    MaxMines { limit: usize },

    #[error("throw requires an enemy on the target cell")]
    ThrowRequiresEnemy,

    // ===== buildings =====
    #[error("building limit reached")]
    MaxBuildings,

    #[error("hub is occupied")]
    UnitOnHub,

    #[error("no own hub")]
    NoHub,

    // ===== flag =====
    #[error("general flag move limit reached")]
    GeneralFlagMoveLimit,

    #[error("flag move limit reached")]
    FlagMoveLimit,

    #[error("cannot do that while carrying the flag")]
    CarryingFlag,

    #[error("not standing on the flag")]
    NotOnFlag,

    #[error("not carrying the flag")]
    NoFlag,

    // ===== evolution =====
    #[error("evolution level too low")]
    EvolutionLocked,

    #[error("branch already at max level")]
    MaxLevel,

    #[error("quest progress {progress}/{required}")]
    QuestIncomplete { progress: u32, required: u32 },

    #[error("level 3 requires a variant")]
    VariantRequired,

    // ===== internal =====
    #[error("invariant violated: {0}")]
    #[cfg_attr(feature = "serde", serde(skip_deserializing))]
    InvariantViolated(#[cfg_attr(feature = "serde", serde(skip_deserializing))] &'static str),
}

impl RejectReason {
    /// Parameters for the localized rejection log.
    pub fn log_params(&self) -> Vec<(&'static str, LogValue)> {
        match self {
            Self::LowEnergy { cost } | Self::LowEnergyAttack { cost } => {
                vec![("cost", LogValue::from(*cost))]
            }
            Self::EnergyCap { cap } => vec![("cap", LogValue::from(*cap))],
            Self::MaxMines { limit } => vec![("limit", LogValue::Number(*limit as i64))],
            Self::QuestIncomplete { progress, required } => vec![
                ("progress", LogValue::from(*progress)),
                ("required", LogValue::from(*required)),
            ],
            Self::UnitNotFound(id)
            | Self::UnitDead(id)
            | Self::UnitActed(id)
            | Self::Committed(id) => vec![("unit", LogValue::from(id.to_string()))],
            _ => Vec::new(),
        }
    }
}

impl GameError for RejectReason {
    fn severity(&self) -> ErrorSeverity {
        use RejectReason::*;
        match self {
            WrongPhase | NotYourTurn | GameOver | UnitNotFound(_) | WrongUnit | OutOfBounds
            | InvalidTarget | AlreadyReady => ErrorSeverity::Validation,
            InvariantViolated(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        use RejectReason::*;
        match self {
            WrongPhase => "log_wrong_phase",
            NotYourTurn => "log_not_your_turn",
            GameOver => "log_game_over",
            AlreadyReady => "log_already_ready",
            UnitNotFound(_) => "log_unit_not_found",
            UnitDead(_) => "log_unit_dead",
            UnitActed(_) => "log_unit_acted",
            Committed(_) => "log_committed",
            WrongUnit => "log_wrong_unit",
            LowEnergy { .. } => "log_low_energy",
            LowEnergyAttack { .. } => "log_low_energy_attack",
            EnergyCap { .. } => "log_energy_cap",
            OutOfRange => "log_out_of_range",
            OutOfBounds => "log_out_of_bounds",
            Obstacle => "log_obstacle",
            Occupied => "log_occupied",
            ScanRange => "log_scan_range",
            DisarmRange => "log_disarm_range",
            MakerRange => "log_maker_range",
            ScanSmokeBlocked => "log_scan_smoke_blocked",
            InvalidTarget => "log_invalid_target",
            NoMine => "log_no_mine",
            SpaceHasMine => "log_space_has_mine",
            MineLimit => "log_mine_limit",
            MineZone => "log_mine_zone",
            OwnMine => "log_own_mine",
            MineNotRevealed => "log_mine_not_revealed",
            MaxMines { .. } => "log_max_mines",
            ThrowRequiresEnemy => "log_throw_requires_enemy",
            MaxBuildings => "log_max_buildings",
            UnitOnHub => "log_unit_on_hub",
            NoHub => "log_no_hub",
            GeneralFlagMoveLimit => "log_general_flag_move_limit",
            FlagMoveLimit => "log_flag_move_limit",
            CarryingFlag => "log_carrying_flag",
            NotOnFlag => "log_not_on_flag",
            NoFlag => "log_no_flag",
            EvolutionLocked => "log_low_energy_evolve",
            MaxLevel => "log_max_level",
            QuestIncomplete { .. } => "log_quest_incomplete",
            VariantRequired => "log_variant_required",
            InvariantViolated(_) => "log_invariant",
        }
    }
}
