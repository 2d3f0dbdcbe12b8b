//! Pure rule resolution.
//!
//! Everything here reads a [`GameState`](crate::state::GameState) and returns
//! a descriptor of what should happen; nothing mutates. Actions in
//! [`crate::action`] validate with these functions and then apply the
//! descriptors, so candidate generators can ask the same questions without
//! touching the state.
//!
//! - `energy`: costs, territory surcharge, the energy cap, round income
//! - `combat`: the General's attack legality chain and hit effects
//! - `mines`: trigger detection, damage modifiers and mine outcomes
//! - `movement`: step costs, flag-carry limits, teleport eligibility
//! - `limits`: evolution-dependent caps, ranges and building profiles

pub mod combat;
pub mod energy;
pub mod limits;
pub mod mines;
pub mod movement;

pub use combat::{
    AttackPlan, Push, apply_flag_aura, attack_cost, attack_range, can_general_attack, plan_attack,
};
pub use energy::{
    Income, can_spend, check_energy, kill_reward, ore_reward, round_income, with_surcharge,
};
pub use limits::{
    building_cost, building_gate, building_limit, building_profile, in_factory_range,
    maker_can_reach, mine_limit, mine_type_unlocked, own_mine_count, place_mine_cost,
    scan_blocked, scan_cost, sensor_cost,
};
pub use mines::{
    Hit, MineResolution, mine_triggered_by_move, resolve_trigger, trigger_damage, would_trigger,
};
pub use movement::{can_teleport, check_flag_moves, check_step, move_cost};
