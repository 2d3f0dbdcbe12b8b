use crate::state::{BuildingKind, MineType, OreSize, UnitType};

/// Game configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Numerator of the per-unit energy cap ratio.
    pub energy_cap_numerator: u32,
    /// Denominator of the per-unit energy cap ratio.
    pub energy_cap_denominator: u32,
    /// Energy each player starts the match with.
    pub initial_energy: u32,
    /// Number of NORMAL mines a player may bury during setup.
    pub placement_mine_limit: usize,
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    pub const GRID_ROWS: i32 = 7;
    pub const GRID_COLS: i32 = 24;
    pub const ROSTER_SIZE: usize = 5;
    pub const MAX_LOG_ENTRIES: usize = 100;
    pub const MAX_EVOLUTION_LEVEL: u8 = 3;

    /// First column of the P2 half. Everything left of it belongs to P1.
    pub const MIDLINE_COL: i32 = 12;
    /// Inclusive column band used for obstacles and ore.
    pub const CONTESTED_COLS: (i32, i32) = (6, 17);
    pub const OBSTACLE_COUNT: usize = 6;

    // ===== rule constants =====
    pub const FLAG_MOVE_LIMIT: u32 = 5;
    pub const MAX_MINES_ON_BOARD: usize = 5;
    pub const MINE_DAMAGE: u32 = 8;
    pub const CHAIN_DIRECT_DAMAGE: u32 = 6;
    pub const CHAIN_SEARCH_RADIUS: i32 = 2;
    pub const NUKE_DAMAGE: u32 = 12;
    pub const NUKE_OWNER_DAMAGE: u32 = 6;
    pub const SLOW_DAMAGE: u32 = 4;
    pub const SMOKE_DAMAGE: u32 = 7;
    pub const SLOW_DEBUFF: u32 = 2;
    pub const SLOW_DURATION: u32 = 2;
    pub const SMOKE_DURATION: u32 = 3;
    pub const PASS_HEAL: u32 = 3;
    pub const KIRIN_ENTRY_DAMAGE: u32 = 2;
    pub const KIRIN_DOMAIN_DAMAGE: u32 = 4;
    pub const SCAN_RANGE: i32 = 3;
    pub const SENSOR_RANGE: i32 = 2;
    pub const TOWER_DETONATE_DAMAGE: u32 = 3;
    pub const TELEPORT_COST: u32 = 5;
    pub const THROW_COST: u32 = 5;
    pub const CONVERT_COST: u32 = 5;
    pub const STEALTH_COST: u32 = 3;
    pub const DETONATE_COST: u32 = 2;
    pub const SKIP_COST_STEP: u32 = 10;
    pub const VFX_LIFETIME_MS: u64 = 2_000;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_INITIAL_ENERGY: u32 = 50;
    pub const DEFAULT_PLACEMENT_MINE_LIMIT: usize = 3;

    pub fn new() -> Self {
        Self {
            energy_cap_numerator: 1,
            energy_cap_denominator: 3,
            initial_energy: Self::DEFAULT_INITIAL_ENERGY,
            placement_mine_limit: Self::DEFAULT_PLACEMENT_MINE_LIMIT,
        }
    }

    pub fn with_energy_cap_ratio(numerator: u32, denominator: u32) -> Self {
        Self {
            energy_cap_numerator: numerator,
            energy_cap_denominator: denominator.max(1),
            ..Self::new()
        }
    }

    /// Spend ceiling for one unit opportunity, `floor(start * ratio)`.
    pub fn energy_cap(&self, start_of_action_energy: u32) -> u32 {
        start_of_action_energy * self.energy_cap_numerator / self.energy_cap_denominator.max(1)
    }

    /// Static per-type numbers for units.
    pub const fn unit_profile(kind: UnitType) -> UnitProfile {
        match kind {
            UnitType::General => UnitProfile::new(28, 3),
            UnitType::Sweeper => UnitProfile::new(14, 3),
            UnitType::Ranger => UnitProfile::new(16, 2),
            UnitType::Maker => UnitProfile::new(12, 3),
            UnitType::Defuser => UnitProfile::new(18, 3),
        }
    }

    pub const GENERAL_ATTACK_COST: u32 = 8;
    pub const GENERAL_ATTACK_DAMAGE: u32 = 4;
    pub const GENERAL_FLAG_MOVE_COST: u32 = 5;
    pub const CARRIER_MOVE_COST: u32 = 4;
    pub const MINE_CARRIER_MOVE_COST: u32 = 3;
    pub const DISARM_COST: u32 = 2;

    /// Energy to leave `level` on any branch.
    pub const fn evolution_cost(level: u8) -> Option<u32> {
        match level {
            0 => Some(10),
            1 => Some(20),
            2 => Some(30),
            _ => None,
        }
    }

    /// Quest counter needed to leave `level` on the given branch.
    pub const fn evolution_threshold(kind: UnitType, branch_b: bool, level: u8) -> Option<u32> {
        let table: [u32; 3] = match (kind, branch_b) {
            (UnitType::General, false) => [4, 12, 20],
            (UnitType::General, true) => [6, 13, 20],
            (UnitType::Sweeper, false) => [2, 5, 8],
            (UnitType::Sweeper, true) => [2, 4, 6],
            (UnitType::Ranger, false) => [8, 18, 28],
            (UnitType::Ranger, true) => [3, 7, 12],
            (UnitType::Maker, false) => [2, 5, 8],
            (UnitType::Maker, true) => [3, 6, 9],
            (UnitType::Defuser, _) => [2, 5, 8],
        };
        if (level as usize) < table.len() {
            Some(table[level as usize])
        } else {
            None
        }
    }

    pub const fn mine_cost(kind: MineType) -> u32 {
        match kind {
            MineType::Normal => 5,
            MineType::Slow => 4,
            MineType::Smoke => 6,
            MineType::Nuke => 9,
            MineType::Chain => 7,
        }
    }

    /// Direct trigger damage before any modifier.
    pub const fn mine_damage(kind: MineType) -> u32 {
        match kind {
            MineType::Normal => Self::MINE_DAMAGE,
            MineType::Slow => Self::SLOW_DAMAGE,
            MineType::Smoke => Self::SMOKE_DAMAGE,
            MineType::Nuke => Self::NUKE_DAMAGE,
            MineType::Chain => Self::CHAIN_DIRECT_DAMAGE,
        }
    }

    pub const fn building_cost(kind: BuildingKind) -> u32 {
        match kind {
            BuildingKind::Tower => 6,
            BuildingKind::Factory => 15,
            BuildingKind::Hub => 4,
        }
    }

    pub const fn ore_value(size: OreSize) -> u32 {
        match size {
            OreSize::Small => 4,
            OreSize::Medium => 7,
            OreSize::Large => 10,
        }
    }

    /// Base regeneration by turn tier.
    pub const fn base_regen(turn: u32) -> u32 {
        if turn >= 12 {
            50
        } else if turn >= 8 {
            45
        } else if turn >= 4 {
            40
        } else {
            35
        }
    }

    /// Ore multiplier in tenths by turn tier.
    pub const fn ore_multiplier_tenths(turn: u32) -> u32 {
        if turn >= 12 {
            16
        } else if turn >= 8 {
            14
        } else if turn >= 4 {
            12
        } else {
            10
        }
    }

    pub const fn respawn_rounds(turn: u32) -> u32 {
        if turn <= 10 { 2 } else { 3 }
    }

    pub const fn ore_spawn_count(turn: u32) -> usize {
        if turn >= 12 { 2 } else { 1 }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Static numbers for one unit type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitProfile {
    pub max_hp: u32,
    pub move_cost: u32,
}

impl UnitProfile {
    pub const fn new(max_hp: u32, move_cost: u32) -> Self {
        Self { max_hp, move_cost }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_cap_floors_one_third() {
        let config = GameConfig::new();
        assert_eq!(config.energy_cap(20), 6);
        assert_eq!(config.energy_cap(50), 16);
        assert_eq!(config.energy_cap(2), 0);
    }

    #[test]
    fn evolution_tables_stop_at_level_three() {
        assert_eq!(GameConfig::evolution_cost(2), Some(30));
        assert_eq!(GameConfig::evolution_cost(3), None);
        assert_eq!(GameConfig::evolution_threshold(UnitType::Ranger, false, 1), Some(18));
        assert_eq!(GameConfig::evolution_threshold(UnitType::Ranger, false, 3), None);
    }

    #[test]
    fn income_tiers() {
        assert_eq!(GameConfig::base_regen(1), 35);
        assert_eq!(GameConfig::base_regen(4), 40);
        assert_eq!(GameConfig::base_regen(12), 50);
        assert_eq!(GameConfig::respawn_rounds(10), 2);
        assert_eq!(GameConfig::respawn_rounds(11), 3);
    }
}
