//! Evolution-dependent limits and ranges for mines, scans and buildings.

use crate::config::GameConfig;
use crate::state::{
    Branch, Building, BuildingKind, GameState, MineType, PlayerId, Position, Unit, UnitType,
    Variant,
};

use super::energy::with_surcharge;

const TOWER_COST_DISCOUNTED: u32 = 5;
const FACTORY_MINE_COST: u32 = 3;
const SENSOR_COST: u32 = 5;
const SENSOR_COST_UPGRADED: u32 = 4;

/// Own mines `player` may have on the board at once.
pub fn mine_limit(state: &GameState, player: PlayerId) -> usize {
    let side = &state.players[player];
    let maker_b = side.level(UnitType::Maker, Branch::B);
    let mut limit = if side.is_variant(UnitType::Maker, Branch::B, Variant::Second) {
        GameConfig::MAX_MINES_ON_BOARD + 2 * state.buildings_of(player, BuildingKind::Factory).count()
    } else if side.is_variant(UnitType::Maker, Branch::B, Variant::First) {
        8
    } else {
        GameConfig::MAX_MINES_ON_BOARD + maker_b as usize
    };
    if side.is_variant(UnitType::Defuser, Branch::B, Variant::First) {
        limit += 1;
    }
    limit
}

pub fn own_mine_count(state: &GameState, player: PlayerId) -> usize {
    state.mines.iter().filter(|m| m.owner == player).count()
}

/// True when `target` lies in the placement area of one of `player`'s factories.
pub fn in_factory_range(state: &GameState, player: PlayerId, target: Position) -> bool {
    state
        .buildings_of(player, BuildingKind::Factory)
        .any(|factory| {
            if factory.level >= 2 {
                factory.position.manhattan(target) <= 2
            } else {
                factory.position.chebyshev(target) <= 1
            }
        })
}

/// Maker placement reach.
pub fn maker_can_reach(state: &GameState, maker: &Unit, target: Position) -> bool {
    maker.position.manhattan(target) <= 1 || in_factory_range(state, maker.owner(), target)
}

/// Minimum Maker a-level or variant needed for each mine type.
pub fn mine_type_unlocked(state: &GameState, player: PlayerId, kind: MineType) -> bool {
    let side = &state.players[player];
    let maker_a = side.level(UnitType::Maker, Branch::A);
    match kind {
        MineType::Normal => true,
        MineType::Slow => maker_a >= 1,
        MineType::Smoke => maker_a >= 2,
        MineType::Chain => side.is_variant(UnitType::Maker, Branch::A, Variant::First),
        MineType::Nuke => side.is_variant(UnitType::Maker, Branch::A, Variant::Second),
    }
}

pub fn place_mine_cost(
    state: &GameState,
    maker: &Unit,
    kind: MineType,
    target: Position,
) -> u32 {
    let side = &state.players[maker.owner()];
    let base = if side.is_variant(UnitType::Maker, Branch::B, Variant::First)
        && in_factory_range(state, maker.owner(), target)
    {
        FACTORY_MINE_COST
    } else {
        GameConfig::mine_cost(kind)
    };
    with_surcharge(maker, base)
}

pub fn scan_cost(state: &GameState, sweeper: &Unit) -> u32 {
    let scans = state.players[sweeper.owner()].quest.sweeper_scans_this_round;
    with_surcharge(sweeper, if scans >= 2 { 4 } else { 3 })
}

pub fn sensor_cost(state: &GameState, sweeper: &Unit) -> u32 {
    let base = if state.players[sweeper.owner()].level(UnitType::Sweeper, Branch::B) >= 3 {
        SENSOR_COST_UPGRADED
    } else {
        SENSOR_COST
    };
    with_surcharge(sweeper, base)
}

/// Scans into enemy smoke or near an enemy level-3 variant-1 hub are blocked.
pub fn scan_blocked(state: &GameState, viewer: PlayerId, target: Position) -> bool {
    state.in_enemy_smoke(viewer, target)
        || state
            .buildings_of(viewer.opponent(), BuildingKind::Hub)
            .any(|hub| hub.is_variant(3, Variant::First) && hub.position.manhattan(target) <= 2)
}

/// Number of buildings of `kind` `player` may own at once.
pub fn building_limit(state: &GameState, player: PlayerId, kind: BuildingKind) -> usize {
    let side = &state.players[player];
    match kind {
        BuildingKind::Tower if side.is_variant(UnitType::Sweeper, Branch::A, Variant::First) => 2,
        BuildingKind::Factory if side.is_variant(UnitType::Maker, Branch::B, Variant::Second) => 2,
        _ => 1,
    }
}

/// Builder type, evolution gate and level source for each building kind.
pub fn building_gate(kind: BuildingKind) -> (UnitType, Branch) {
    match kind {
        BuildingKind::Tower => (UnitType::Sweeper, Branch::A),
        BuildingKind::Factory => (UnitType::Maker, Branch::B),
        BuildingKind::Hub => (UnitType::Ranger, Branch::A),
    }
}

pub fn building_cost(state: &GameState, builder: &Unit, kind: BuildingKind) -> u32 {
    let discounted = kind == BuildingKind::Tower
        && state.players[builder.owner()].is_variant(UnitType::Sweeper, Branch::A, Variant::First);
    let base = if discounted {
        TOWER_COST_DISCOUNTED
    } else {
        GameConfig::building_cost(kind)
    };
    with_surcharge(builder, base)
}

/// Level and lifetime of a new building.
pub fn building_profile(
    state: &GameState,
    owner: PlayerId,
    kind: BuildingKind,
) -> (u8, Option<Variant>, Option<u32>) {
    let (unit, branch) = building_gate(kind);
    let track = state.players[owner].evolution.get(unit).branch(branch);
    let duration = (kind == BuildingKind::Tower && track.level <= 1).then_some(2);
    (track.level, track.variant, duration)
}

/// Oldest own building of `kind`, replaced when a tower is built at the limit.
pub fn oldest_building(state: &GameState, owner: PlayerId, kind: BuildingKind) -> Option<&Building> {
    state.buildings_of(owner, kind).min_by_key(|b| b.id)
}
