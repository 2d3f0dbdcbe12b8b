use crate::action::{ActionTransition, RejectReason, effects, guard};
use crate::env::GameEnv;
use crate::state::{Branch, GameState, LogKind, PlayerId, UnitId, UnitType};

const CARRIER_UNLOCK_LEVEL: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PickupFlagAction {
    pub unit: UnitId,
}

impl ActionTransition for PickupFlagAction {
    type Error = RejectReason;
    type Result = ();

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let player = self.player();
        let unit = guard::acting_unit(state, player, self.unit)?;
        let side = &state.players[player];
        let may_carry = unit.kind() == UnitType::General
            || side.level(UnitType::General, Branch::B) >= CARRIER_UNLOCK_LEVEL;
        if !may_carry {
            return Err(RejectReason::WrongUnit);
        }
        if unit.has_flag || side.carrier().is_some() {
            return Err(RejectReason::InvalidTarget);
        }
        if unit.position != side.flag_position {
            return Err(RejectReason::NotOnFlag);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        guard::charge(state, self.unit, 0)?;
        let unit = state
            .unit_mut(self.unit)
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        unit.has_flag = true;
        let cell = unit.position;

        let entry = state
            .entry("log_flag_pickup", LogKind::Move)
            .owned_by(self.player())
            .with("unit", self.unit.to_string())
            .with("r", cell.r)
            .with("c", cell.c);
        state.log(entry);
        Ok(())
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Leaves the flag on the carrier's cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropFlagAction {
    pub unit: UnitId,
}

impl ActionTransition for DropFlagAction {
    type Error = RejectReason;
    type Result = ();

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let unit = guard::acting_unit(state, self.player(), self.unit)?;
        if !unit.has_flag {
            return Err(RejectReason::NoFlag);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        guard::charge(state, self.unit, 0)?;
        let unit = state
            .unit_mut(self.unit)
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        unit.has_flag = false;
        let cell = unit.position;
        state.players[self.player()].flag_position = cell;

        let entry = state
            .entry("log_flag_drop", LogKind::Move)
            .owned_by(self.player())
            .with("unit", self.unit.to_string())
            .with("r", cell.r)
            .with("c", cell.c);
        state.log(entry);
        Ok(())
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::testing::{action_state, run};
    use crate::state::Position;

    #[test]
    fn general_lifts_flag_from_its_base() {
        let mut state = action_state(61);
        let general = UnitId::new(PlayerId::P1, UnitType::General);
        let pickup = PickupFlagAction { unit: general };
        assert_eq!(run(&pickup, &mut state), Err(RejectReason::NotOnFlag));

        if let Some(u) = state.unit_mut(general) {
            u.position = Position::new(3, 0);
        }
        assert!(run(&pickup, &mut state).is_ok());
        assert_eq!(state.players.p1.carrier().map(|u| u.id), Some(general));
        assert!(!state.unit(general).unwrap().has_acted);
    }

    #[test]
    fn only_evolved_teams_let_others_carry() {
        let mut state = action_state(61);
        let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);
        if let Some(u) = state.unit_mut(ranger) {
            u.position = Position::new(3, 0);
        }
        let pickup = PickupFlagAction { unit: ranger };
        assert_eq!(run(&pickup, &mut state), Err(RejectReason::WrongUnit));
        state
            .players
            .p1
            .evolution
            .set(UnitType::General, Branch::B, 3, None);
        assert!(run(&pickup, &mut state).is_ok());
    }

    #[test]
    fn drop_leaves_flag_on_the_cell() {
        let mut state = action_state(61);
        let general = UnitId::new(PlayerId::P1, UnitType::General);
        let cell = Position::new(3, 4);
        if let Some(u) = state.unit_mut(general) {
            u.position = cell;
            u.has_flag = true;
        }
        state.players.p1.flag_position = cell;
        assert!(run(&DropFlagAction { unit: general }, &mut state).is_ok());
        assert!(state.players.p1.carrier().is_none());
        assert_eq!(state.players.p1.flag_position, cell);
        assert_eq!(
            run(&DropFlagAction { unit: general }, &mut state),
            Err(RejectReason::NoFlag)
        );
    }
}
