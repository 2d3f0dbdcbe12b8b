pub mod board;
pub mod building;
pub mod common;
pub mod effects;
pub mod mine;
pub mod player;
pub mod unit;

// Re-export grid primitives
pub use common::{Branch, CARDINALS, Phase, PlayerId, Position, Variant};

// Re-export board and entity types
pub use board::{Board, Cell, OreSize};
pub use building::{Building, BuildingId, BuildingKind};
pub use mine::{Mine, MineId, MineType, ParseMineIdError};
pub use unit::{ParseUnitIdError, Unit, UnitId, UnitStatus, UnitType};

// Re-export player records
pub use player::{
    BranchLevel, EvolutionTree, PlayerState, Players, QuestStats, Roster, UnitEvolution,
};

// Re-export transient effects
pub use effects::{SensorKind, SensorResult, Smoke, Vfx, VfxKind, VfxSize};
