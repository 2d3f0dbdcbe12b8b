//! Energy economy.

use crate::action::RejectReason;
use crate::config::GameConfig;
use crate::state::{OreSize, PlayerState, Unit};

/// Interest never exceeds this many points per round.
pub const MAX_INTEREST: u32 = 10;

/// Extra cost for acting from the enemy half.
pub fn territory_surcharge(unit: &Unit, base: u32) -> u32 {
    if unit.owner().owns_column(unit.position.c) {
        0
    } else if base < 5 {
        1
    } else {
        2
    }
}

pub fn with_surcharge(unit: &Unit, base: u32) -> u32 {
    base + territory_surcharge(unit, base)
}

/// Affordability first, then the per-unit cap.
///
/// `low` is the rejection used when the player cannot pay at all.
pub fn check_energy(
    player: &PlayerState,
    unit: &Unit,
    config: &GameConfig,
    cost: u32,
    low: RejectReason,
) -> Result<(), RejectReason> {
    if player.energy < cost {
        return Err(low);
    }
    if unit.energy_used_this_turn + cost > config.energy_cap(unit.start_of_action_energy) {
        return Err(RejectReason::EnergyCap {
            cap: config.energy_cap(unit.start_of_action_energy),
        });
    }
    Ok(())
}

/// Convenience for the generator: true when [`check_energy`] would pass.
pub fn can_spend(player: &PlayerState, unit: &Unit, config: &GameConfig, cost: u32) -> bool {
    check_energy(player, unit, config, cost, RejectReason::LowEnergy { cost }).is_ok()
}

/// Bonus credited for killing a unit of a player holding `victim_energy`.
pub fn kill_reward(victim_energy: u32) -> u32 {
    3 + victim_energy * 15 / 100
}

/// Ore value scaled by the turn tier, rounded up.
pub fn ore_reward(size: OreSize, turn: u32) -> u32 {
    (GameConfig::ore_value(size) * GameConfig::ore_multiplier_tenths(turn)).div_ceil(10)
}

/// Breakdown of one player's round-end income.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Income {
    pub regen: u32,
    pub interest: u32,
    pub ore: u32,
    pub kills: u32,
}

impl Income {
    pub fn total(&self) -> u32 {
        self.regen + self.interest + self.ore + self.kills
    }
}

/// Income for the round that starts at `next_turn`.
pub fn round_income(energy: u32, next_turn: u32, ore: u32, kills: u32) -> Income {
    Income {
        regen: GameConfig::base_regen(next_turn),
        interest: (energy / 10).min(MAX_INTEREST),
        ore,
        kills,
    }
}
