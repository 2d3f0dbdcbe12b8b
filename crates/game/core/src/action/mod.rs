//! Action domain.
//!
//! Every player intent is one variant of [`Action`]. Each variant wraps a
//! concrete struct implementing [`ActionTransition`], which splits execution
//! into `pre_validate` (read-only rule checks), `apply` (mutation) and
//! `post_validate` (cross-entity invariants).
//!
//! # Module Structure
//!
//! - `error`: [`RejectReason`], the single rule-rejection enum
//! - `transition`: the [`ActionTransition`] trait
//! - `guard`: turn/ownership/energy checks shared by unit actions
//! - `effects`: damage, mine resolution, death and victory helpers
//! - `available`: per-unit action availability as a bitflag set
//! - `kinds`: one module per family of concrete actions
pub mod available;
pub mod effects;
pub mod error;
pub mod guard;
pub mod kinds;
mod transition;

pub use available::{ActionMask, unit_abilities};
pub use error::RejectReason;
pub use kinds::{
    AttackAction, ConvertMineAction, DetonateTowerAction, DisarmAction, DropFlagAction,
    DropMineAction, EndTurnAction, EvolveAction, FinishPlacementAction, MoveAction, MoveMineAction,
    MoveOutcome, PickupFlagAction, PickupMineAction, PlaceBuildingAction, PlaceMineAction,
    PlaceSetupMineAction, ReadyAction, ScanAction, SensorScanAction, SkipTurnAction,
    StealthAction, TeleportAction, ThrowMineAction,
};
pub use transition::ActionTransition;

use crate::env::GameEnv;
use crate::state::{GameState, PlayerId, UnitId};

/// Discriminant of [`Action`], rendered as the wire name (`MOVE`, `SENSOR_SCAN`).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ActionTag {
    Move,
    Teleport,
    Attack,
    Scan,
    SensorScan,
    PlaceMine,
    Disarm,
    MoveMine,
    ConvertMine,
    PickupMine,
    DropMine,
    ThrowMine,
    PlaceBuilding,
    DetonateTower,
    PickupFlag,
    DropFlag,
    Stealth,
    Evolve,
    EndTurn,
    SkipTurn,
    Ready,
    PlaceSetupMine,
    FinishPlacement,
}

/// A fully-typed player intent. Human input, the network boundary and the AI
/// all produce one of these; the engine is the only consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Action {
    Move(MoveAction),
    Teleport(TeleportAction),
    Attack(AttackAction),
    Scan(ScanAction),
    SensorScan(SensorScanAction),
    PlaceMine(PlaceMineAction),
    Disarm(DisarmAction),
    MoveMine(MoveMineAction),
    ConvertMine(ConvertMineAction),
    PickupMine(PickupMineAction),
    DropMine(DropMineAction),
    ThrowMine(ThrowMineAction),
    PlaceBuilding(PlaceBuildingAction),
    DetonateTower(DetonateTowerAction),
    PickupFlag(PickupFlagAction),
    DropFlag(DropFlagAction),
    Stealth(StealthAction),
    Evolve(EvolveAction),
    EndTurn(EndTurnAction),
    SkipTurn(SkipTurnAction),
    Ready(ReadyAction),
    PlaceSetupMine(PlaceSetupMineAction),
    FinishPlacement(FinishPlacementAction),
}

/// Expands `$body` once per variant with `$inner` bound to the wrapped action.
macro_rules! for_each_action {
    ($action:expr, $inner:ident => $body:expr) => {
        match $action {
            Action::Move($inner) => $body,
            Action::Teleport($inner) => $body,
            Action::Attack($inner) => $body,
            Action::Scan($inner) => $body,
            Action::SensorScan($inner) => $body,
            Action::PlaceMine($inner) => $body,
            Action::Disarm($inner) => $body,
            Action::MoveMine($inner) => $body,
            Action::ConvertMine($inner) => $body,
            Action::PickupMine($inner) => $body,
            Action::DropMine($inner) => $body,
            Action::ThrowMine($inner) => $body,
            Action::PlaceBuilding($inner) => $body,
            Action::DetonateTower($inner) => $body,
            Action::PickupFlag($inner) => $body,
            Action::DropFlag($inner) => $body,
            Action::Stealth($inner) => $body,
            Action::Evolve($inner) => $body,
            Action::EndTurn($inner) => $body,
            Action::SkipTurn($inner) => $body,
            Action::Ready($inner) => $body,
            Action::PlaceSetupMine($inner) => $body,
            Action::FinishPlacement($inner) => $body,
        }
    };
}
pub(crate) use for_each_action;

impl Action {
    pub fn tag(&self) -> ActionTag {
        match self {
            Action::Move(_) => ActionTag::Move,
            Action::Teleport(_) => ActionTag::Teleport,
            Action::Attack(_) => ActionTag::Attack,
            Action::Scan(_) => ActionTag::Scan,
            Action::SensorScan(_) => ActionTag::SensorScan,
            Action::PlaceMine(_) => ActionTag::PlaceMine,
            Action::Disarm(_) => ActionTag::Disarm,
            Action::MoveMine(_) => ActionTag::MoveMine,
            Action::ConvertMine(_) => ActionTag::ConvertMine,
            Action::PickupMine(_) => ActionTag::PickupMine,
            Action::DropMine(_) => ActionTag::DropMine,
            Action::ThrowMine(_) => ActionTag::ThrowMine,
            Action::PlaceBuilding(_) => ActionTag::PlaceBuilding,
            Action::DetonateTower(_) => ActionTag::DetonateTower,
            Action::PickupFlag(_) => ActionTag::PickupFlag,
            Action::DropFlag(_) => ActionTag::DropFlag,
            Action::Stealth(_) => ActionTag::Stealth,
            Action::Evolve(_) => ActionTag::Evolve,
            Action::EndTurn(_) => ActionTag::EndTurn,
            Action::SkipTurn(_) => ActionTag::SkipTurn,
            Action::Ready(_) => ActionTag::Ready,
            Action::PlaceSetupMine(_) => ActionTag::PlaceSetupMine,
            Action::FinishPlacement(_) => ActionTag::FinishPlacement,
        }
    }

    /// Player issuing the action.
    pub fn player(&self) -> PlayerId {
        for_each_action!(self, inner => inner.player())
    }

    /// Unit performing the action, for unit-scoped actions.
    pub fn actor(&self) -> Option<UnitId> {
        for_each_action!(self, inner => inner.actor())
    }

    /// Runs the rule checks of the action against `state` without applying it.
    ///
    /// Candidate generators use this to offer only actions the engine would
    /// accept right now.
    pub fn validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), RejectReason> {
        for_each_action!(self, inner => inner.pre_validate(state, env))
    }

    /// Snake-case name for diagnostics.
    pub fn as_snake_case(&self) -> String {
        self.tag().as_ref().to_ascii_lowercase()
    }
}

macro_rules! impl_from_action {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Action {
                fn from(action: $ty) -> Self {
                    Action::$variant(action)
                }
            }
        )*
    };
}

impl_from_action!(
    Move(MoveAction),
    Teleport(TeleportAction),
    Attack(AttackAction),
    Scan(ScanAction),
    SensorScan(SensorScanAction),
    PlaceMine(PlaceMineAction),
    Disarm(DisarmAction),
    MoveMine(MoveMineAction),
    ConvertMine(ConvertMineAction),
    PickupMine(PickupMineAction),
    DropMine(DropMineAction),
    ThrowMine(ThrowMineAction),
    PlaceBuilding(PlaceBuildingAction),
    DetonateTower(DetonateTowerAction),
    PickupFlag(PickupFlagAction),
    DropFlag(DropFlagAction),
    Stealth(StealthAction),
    Evolve(EvolveAction),
    EndTurn(EndTurnAction),
    SkipTurn(SkipTurnAction),
    Ready(ReadyAction),
    PlaceSetupMine(PlaceSetupMineAction),
    FinishPlacement(FinishPlacementAction),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Position, UnitType};

    #[test]
    fn tags_render_as_wire_names() {
        let unit = UnitId::new(PlayerId::P2, UnitType::Sweeper);
        let action = Action::from(SensorScanAction {
            unit,
            target: Position::new(1, 1),
        });
        assert_eq!(action.tag().to_string(), "SENSOR_SCAN");
        assert_eq!(action.as_snake_case(), "sensor_scan");
        assert_eq!(action.player(), PlayerId::P2);
        assert_eq!(action.actor(), Some(unit));
        assert_eq!("END_TURN".parse::<ActionTag>(), Ok(ActionTag::EndTurn));
    }

    #[test]
    fn player_level_actions_have_no_actor() {
        let action = Action::from(SkipTurnAction { player: PlayerId::P1 });
        assert_eq!(action.actor(), None);
    }
}
