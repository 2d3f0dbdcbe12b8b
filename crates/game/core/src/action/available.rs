//! Which action families a unit has unlocked.
//!
//! This only reflects unit type and evolution state. Targets, energy and turn
//! structure are still checked by each action's `pre_validate`.

use bitflags::bitflags;

use crate::state::{Branch, BuildingKind, GameState, Unit, UnitType, Variant};

bitflags! {
    /// One bit per action family a unit may attempt.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ActionMask: u32 {
        const MOVE           = 1 << 0;
        const ATTACK         = 1 << 1;
        const SCAN           = 1 << 2;
        const SENSOR_SCAN    = 1 << 3;
        const PLACE_MINE     = 1 << 4;
        const DISARM         = 1 << 5;
        const MOVE_MINE      = 1 << 6;
        const CONVERT_MINE   = 1 << 7;
        const PICKUP_MINE    = 1 << 8;
        const THROW_MINE     = 1 << 9;
        const PLACE_TOWER    = 1 << 10;
        const PLACE_HUB      = 1 << 11;
        const PLACE_FACTORY  = 1 << 12;
        const DETONATE_TOWER = 1 << 13;
        const TELEPORT       = 1 << 14;
        const PICKUP_FLAG    = 1 << 15;
        const STEALTH        = 1 << 16;
        const END_TURN       = 1 << 17;
    }
}

impl ActionMask {
    pub fn building(kind: BuildingKind) -> Self {
        match kind {
            BuildingKind::Tower => Self::PLACE_TOWER,
            BuildingKind::Hub => Self::PLACE_HUB,
            BuildingKind::Factory => Self::PLACE_FACTORY,
        }
    }
}

/// Action families `unit` has unlocked. Dead units get an empty set.
pub fn unit_abilities(state: &GameState, unit: &Unit) -> ActionMask {
    if unit.is_dead {
        return ActionMask::empty();
    }
    let side = &state.players[unit.owner()];
    let level = |kind, branch| side.level(kind, branch);
    let variant = |kind, branch, v| side.is_variant(kind, branch, v);

    let mut mask = ActionMask::MOVE | ActionMask::END_TURN;

    if unit.kind() == UnitType::General || level(UnitType::General, Branch::B) >= 3 {
        mask |= ActionMask::PICKUP_FLAG;
    }
    if variant(UnitType::Ranger, Branch::A, Variant::Second)
        || (unit.kind() == UnitType::Ranger && level(UnitType::Ranger, Branch::A) >= 2)
    {
        mask |= ActionMask::TELEPORT;
    }

    match unit.kind() {
        UnitType::General => mask |= ActionMask::ATTACK,
        UnitType::Sweeper => {
            mask |= ActionMask::SCAN;
            mask.set(ActionMask::SENSOR_SCAN, level(UnitType::Sweeper, Branch::B) >= 1);
            mask.set(ActionMask::PLACE_TOWER, level(UnitType::Sweeper, Branch::A) >= 1);
            mask.set(
                ActionMask::DETONATE_TOWER,
                variant(UnitType::Sweeper, Branch::A, Variant::Second),
            );
        }
        UnitType::Ranger => {
            mask |= ActionMask::PICKUP_MINE;
            mask.set(ActionMask::PLACE_HUB, level(UnitType::Ranger, Branch::A) >= 1);
            mask.set(ActionMask::STEALTH, level(UnitType::Ranger, Branch::B) >= 2);
            mask.set(
                ActionMask::THROW_MINE,
                variant(UnitType::Ranger, Branch::B, Variant::Second),
            );
        }
        UnitType::Maker => {
            mask |= ActionMask::PLACE_MINE;
            mask.set(ActionMask::PLACE_FACTORY, level(UnitType::Maker, Branch::B) >= 1);
        }
        UnitType::Defuser => {
            mask |= ActionMask::DISARM;
            mask.set(ActionMask::MOVE_MINE, level(UnitType::Defuser, Branch::B) >= 2);
            mask.set(
                ActionMask::CONVERT_MINE,
                variant(UnitType::Defuser, Branch::B, Variant::First),
            );
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PlayerId, UnitId};

    fn abilities(state: &GameState, kind: UnitType) -> ActionMask {
        let unit = state.unit(UnitId::new(PlayerId::P1, kind)).unwrap();
        unit_abilities(state, unit)
    }

    #[test]
    fn fresh_roster_has_base_kit_only() {
        let state = GameState::new(3);
        let general = abilities(&state, UnitType::General);
        assert!(general.contains(ActionMask::ATTACK | ActionMask::PICKUP_FLAG));
        let sweeper = abilities(&state, UnitType::Sweeper);
        assert!(sweeper.contains(ActionMask::SCAN));
        assert!(!sweeper.intersects(ActionMask::SENSOR_SCAN | ActionMask::PLACE_TOWER));
        assert!(!abilities(&state, UnitType::Ranger).contains(ActionMask::TELEPORT));
    }

    #[test]
    fn evolutions_unlock_families() {
        let mut state = GameState::new(3);
        state
            .players
            .p1
            .evolution
            .set(UnitType::Ranger, Branch::A, 3, Some(Variant::Second));
        state
            .players
            .p1
            .evolution
            .set(UnitType::Defuser, Branch::B, 3, Some(Variant::First));
        assert!(abilities(&state, UnitType::Maker).contains(ActionMask::TELEPORT));
        let defuser = abilities(&state, UnitType::Defuser);
        assert!(defuser.contains(ActionMask::MOVE_MINE | ActionMask::CONVERT_MINE));
    }

    #[test]
    fn dead_units_have_nothing() {
        let mut state = GameState::new(3);
        let id = UnitId::new(PlayerId::P1, UnitType::Maker);
        if let Some(u) = state.unit_mut(id) {
            u.is_dead = true;
            u.hp = 0;
        }
        assert!(abilities(&state, UnitType::Maker).is_empty());
    }
}
