pub mod buildings;
pub mod combat;
pub mod flag;
pub mod mines;
pub mod movement;
pub mod scan;
pub mod setup;
pub mod turn;
pub mod unit;

pub use buildings::{DetonateTowerAction, PlaceBuildingAction};
pub use combat::AttackAction;
pub use flag::{DropFlagAction, PickupFlagAction};
pub use mines::{
    ConvertMineAction, DisarmAction, DropMineAction, MoveMineAction, PickupMineAction,
    PlaceMineAction, ThrowMineAction,
};
pub use movement::{MoveAction, MoveOutcome, TeleportAction};
pub use scan::{ScanAction, SensorScanAction};
pub use setup::{FinishPlacementAction, PlaceSetupMineAction};
pub use turn::{EndTurnAction, ReadyAction, SkipTurnAction};
pub use unit::{EvolveAction, StealthAction};
