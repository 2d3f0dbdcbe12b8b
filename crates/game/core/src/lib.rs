//! Deterministic rules for Minefront, a two-player capture-the-flag game on a
//! mined grid.
//!
//! `minefront-core` defines the canonical rules (actions, resolution, engine,
//! match state) and exposes pure APIs reused by the match runtime, the AI and
//! offline tools. All state mutation flows through [`engine::GameEngine`];
//! randomness and wall-clock time come in through [`env::GameEnv`].
pub mod action;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod resolution;
pub mod state;

pub use action::{
    Action, ActionMask, ActionTag, ActionTransition, AttackAction, ConvertMineAction,
    DetonateTowerAction, DisarmAction, DropFlagAction, DropMineAction, EndTurnAction,
    EvolveAction, FinishPlacementAction, MoveAction, MoveMineAction, MoveOutcome,
    PickupFlagAction, PickupMineAction, PlaceBuildingAction, PlaceMineAction,
    PlaceSetupMineAction, ReadyAction, RejectReason, ScanAction, SensorScanAction,
    SkipTurnAction, StealthAction, TeleportAction, ThrowMineAction, unit_abilities,
};
pub use config::GameConfig;
pub use engine::{
    ActionResult, ExecuteError, ExecutionOutcome, GameEngine, TransitionPhase,
    TransitionPhaseError, step,
};
pub use env::{GameEnv, PcgRng, RngOracle, compute_seed};
pub use error::{ErrorContext, ErrorSeverity, GameError};
pub use state::{
    Board, Branch, Building, BuildingId, BuildingKind, GameState, LogEntry, LogHistory, LogKind,
    LogValue, Mine, MineId, MineType, OreSize, Phase, PlayerId, PlayerState, Position,
    QuestStats, Unit, UnitId, UnitType, Variant,
};
