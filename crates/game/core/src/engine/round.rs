//! Round-end maintenance.
//!
//! Runs once when every unit of both players has acted or is dead. The steps
//! read the whole roster on each call, and the entry guard refuses a state that
//! already left the action phase, so a repeated call is a no-op.

use crate::action::effects;
use crate::config::GameConfig;
use crate::env::{GameEnv, compute_seed, draw};
use crate::resolution::{apply_flag_aura, ore_reward, round_income};
use crate::state::{
    Board, Branch, GameState, LogKind, OreSize, Phase, PlayerId, Position, SensorKind, UnitId,
    UnitType, Variant,
};

/// Applies round-end maintenance. Returns false when the round is not over.
pub fn end_round(state: &mut GameState, env: &GameEnv<'_>) -> bool {
    if state.game_over || state.phase != Phase::Action || !state.round_complete() {
        return false;
    }
    let next_turn = state.turn + 1;

    tick_durations(state);
    let ore = collect_ore(state, next_turn);
    pay_income(state, next_turn, ore);
    decay_debuffs(state);
    apply_domains(state);
    respawn_units(state, env);
    reset_counters(state);
    spawn_ore(state, env, next_turn);

    state.turn = next_turn;
    state.phase = Phase::Thinking;
    state.current_player = PlayerId::P1;
    state.active_unit = None;
    let entry = state
        .entry("log_round_start", LogKind::Info)
        .with("round", next_turn);
    state.logs.push_once_this_turn(entry);
    tracing::debug!(turn = next_turn, "round started");

    effects::check_victory(state);
    true
}

fn tick_durations(state: &mut GameState) {
    for smoke in &mut state.smokes {
        smoke.duration = smoke.duration.saturating_sub(1);
    }
    state.smokes.retain(|s| s.duration > 0);

    for building in &mut state.buildings {
        if let Some(duration) = building.duration.as_mut() {
            *duration = duration.saturating_sub(1);
        }
    }
    state.buildings.retain(|b| b.duration != Some(0));
}

/// Consumes each deposit under a standing unit once. Returns ore income per player.
fn collect_ore(state: &mut GameState, next_turn: u32) -> [u32; 2] {
    let standing: Vec<(UnitId, Position)> = state
        .players
        .all_units()
        .filter(|u| u.is_alive())
        .map(|u| (u.id, u.position))
        .collect();

    let mut income = [0; 2];
    for (id, position) in standing {
        let Some(size) = state.board.take_ore(position) else {
            continue;
        };
        let amount = ore_reward(size, next_turn);
        income[id.owner.index()] += amount;
        let entry = state
            .entry("log_ore_collected", LogKind::Info)
            .owned_by(id.owner)
            .with("unit", id.kind.as_ref())
            .with("amount", amount);
        state.log(entry);
    }
    income
}

fn pay_income(state: &mut GameState, next_turn: u32, ore: [u32; 2]) {
    for player in state.players.iter_mut() {
        let income = round_income(
            player.energy,
            next_turn,
            ore[player.id.index()],
            player.energy_from_kills,
        );
        player.energy += income.total();
        player.energy_from_kills = 0;
        tracing::trace!(player = %player.id, ?income, "round income");
    }
}

fn decay_debuffs(state: &mut GameState) {
    for unit in state.players.all_units_mut() {
        let status = &mut unit.status;
        status.debuff_duration = status.debuff_duration.saturating_sub(1);
        if status.debuff_duration == 0 {
            status.move_cost_debuff = 0;
        }
    }
}

/// General evolution auras: the Kirin domain burns intruders next to the
/// owner's flag, and General b1 mends units behind their own flag line.
fn apply_domains(state: &mut GameState) {
    for owner in PlayerId::ALL {
        let enemy = owner.opponent();
        if !state.players[owner].is_variant(UnitType::General, Branch::B, Variant::Second) {
            continue;
        }
        let flag = state.players[owner].flag_position;
        let victims: Vec<(UnitId, u32)> = state.players[enemy]
            .living()
            .filter(|u| u.position.chebyshev(flag) <= 1)
            .map(|u| (u.id, apply_flag_aura(state, u, GameConfig::KIRIN_DOMAIN_DAMAGE)))
            .collect();
        for (id, damage) in victims {
            let entry = state
                .entry("log_attack_hit", LogKind::Combat)
                .owned_by(owner)
                .with("attacker", "evol_gen_b_r3_2")
                .with("target", id.to_string())
                .with("dmg", damage);
            state.log(entry);
            effects::damage_unit(state, id, damage, Some(owner));
        }
    }

    for player in state.players.iter_mut() {
        if player.level(UnitType::General, Branch::B) < 1 {
            continue;
        }
        let (id, flag_c) = (player.id, player.flag_position.c);
        let behind = |c: i32| match id {
            PlayerId::P1 => c <= flag_c,
            PlayerId::P2 => c >= flag_c,
        };
        for unit in player.units.iter_mut() {
            if behind(unit.position.c) {
                unit.heal(1);
            }
        }
    }
}

fn respawn_units(state: &mut GameState, env: &GameEnv<'_>) {
    let fallen: Vec<UnitId> = state
        .players
        .all_units()
        .filter(|u| u.is_dead && u.kind() != UnitType::General)
        .map(|u| u.id)
        .collect();

    for id in fallen {
        let Some(unit) = state.unit_mut(id) else {
            continue;
        };
        unit.respawn_timer = unit.respawn_timer.saturating_sub(1);
        if unit.respawn_timer > 0 {
            continue;
        }
        let spawn = unit.spawn;
        let Some(position) = respawn_cell(state, env, id, spawn) else {
            tracing::debug!(unit = %id, "no free respawn cell");
            continue;
        };
        if let Some(unit) = state.unit_mut(id) {
            unit.resurrect(position);
        }
        let entry = state
            .entry("log_unit_resurrected", LogKind::Info)
            .owned_by(id.owner)
            .with("unit", id.kind.as_ref())
            .with("r", position.r + 1)
            .with("c", position.c + 1);
        state.log(entry);
    }
}

/// Spawn slot if free, else a random free neighbour, else any free slot of the
/// same player.
fn respawn_cell(
    state: &GameState,
    env: &GameEnv<'_>,
    id: UnitId,
    spawn: Position,
) -> Option<Position> {
    if state.is_free(spawn) {
        return Some(spawn);
    }
    let rng = env.rng();

    let adjacent: Vec<Position> = spawn.square(1).filter(|p| state.is_free(*p)).collect();
    let actor = id.seed_index();
    let seed = compute_seed(state.game_seed, state.nonce, actor, draw::RESPAWN_ADJACENT);
    if let Some(i) = rng.pick(seed, adjacent.len()) {
        return Some(adjacent[i]);
    }

    let slots: Vec<Position> = state.players[id.owner]
        .units
        .iter()
        .map(|u| u.spawn)
        .filter(|p| state.is_free(*p))
        .collect();
    let seed = compute_seed(state.game_seed, state.nonce, actor, draw::RESPAWN_SLOT);
    rng.pick(seed, slots.len()).map(|i| slots[i])
}

fn reset_counters(state: &mut GameState) {
    for player in state.players.iter_mut() {
        let quest = &mut player.quest;
        if !quest.triggered_mine_this_round {
            quest.consecutive_safe_rounds += 1;
        }
        quest.triggered_mine_this_round = false;
        quest.sweeper_scans_this_round = 0;
        quest.ranger_mines_moved_this_round.clear();

        player.skips_this_round = 0;
        player.ready = false;
        player.reset_turn_counters();

        let energy = player.energy;
        for unit in player.units.iter_mut() {
            unit.has_acted = false;
            unit.energy_used_this_turn = 0;
            unit.moved_this_turn = false;
            unit.last_from = None;
            unit.start_of_action_energy = energy;
        }
    }
    state.sensor_results.retain(|s| s.kind != SensorKind::Count);
}

fn spawn_ore(state: &mut GameState, env: &GameEnv<'_>, next_turn: u32) {
    let (min_c, max_c) = GameConfig::CONTESTED_COLS;
    let rng = env.rng();
    for k in 0..GameConfig::ore_spawn_count(next_turn) {
        let candidates: Vec<Position> = Board::positions()
            .filter(|p| (min_c..=max_c).contains(&p.c))
            .filter(|p| state.is_free(*p) && !state.board.is_flag_base(*p))
            .filter(|p| state.board.ore(*p).is_none())
            .collect();

        let actor = k as u32;
        let seed = compute_seed(state.game_seed, state.nonce, actor, draw::ORE_CELL);
        let Some(i) = rng.pick(seed, candidates.len()) else {
            break;
        };
        let seed = compute_seed(state.game_seed, state.nonce, actor, draw::ORE_SIZE);
        let size = OreSize::from_roll(rng.roll_d100(seed));
        state.board.set_ore(candidates[i], Some(size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::testing::action_state;
    use crate::env::PcgRng;

    fn finished_round(seed: u64) -> GameState {
        let mut state = action_state(seed);
        for unit in state.players.all_units_mut() {
            unit.has_acted = true;
        }
        state
    }

    fn env(config: &GameConfig) -> GameEnv<'_> {
        GameEnv::new(config, &PcgRng, 0)
    }

    #[test]
    fn unfinished_round_is_left_alone() {
        let config = GameConfig::new();
        let mut state = action_state(5);
        let before = state.clone();
        assert!(!end_round(&mut state, &env(&config)));
        assert_eq!(state, before);
    }

    #[test]
    fn income_and_turn_advance() {
        let config = GameConfig::new();
        let mut state = finished_round(5);
        state.players.p1.energy_from_kills = 6;
        assert!(end_round(&mut state, &env(&config)));

        // regen 35 + interest 5 + kills 6
        assert_eq!(state.players.p1.energy, 96);
        assert_eq!(state.players.p2.energy, 90);
        assert_eq!(state.players.p1.energy_from_kills, 0);
        assert_eq!(state.turn, 2);
        assert_eq!(state.phase, Phase::Thinking);
        assert!(state.players.all_units().all(|u| !u.has_acted));
        assert!(state.logs.contains_key("log_round_start"));
        let deposits = Board::positions()
            .filter(|p| state.board.ore(*p).is_some())
            .count();
        assert!(deposits >= 1);
    }

    #[test]
    fn ore_under_a_unit_is_consumed_once() {
        let config = GameConfig::new();
        let mut state = finished_round(5);
        let pos = state.players.p1.units[1].position;
        state.board.set_ore(pos, Some(OreSize::Medium));
        end_round(&mut state, &env(&config));
        assert_eq!(state.players.p1.energy, 50 + 35 + 5 + 7);
        assert_eq!(state.board.ore(pos), None);
    }

    #[test]
    fn debuffs_decay_and_clear() {
        let config = GameConfig::new();
        let mut state = finished_round(5);
        state.players.p1.units[2].status.apply_debuff(2, 1);
        end_round(&mut state, &env(&config));
        let status = &state.players.p1.units[2].status;
        assert_eq!((status.move_cost_debuff, status.debuff_duration), (0, 0));
    }

    #[test]
    fn fallen_unit_returns_to_its_slot() {
        let config = GameConfig::new();
        let mut state = finished_round(5);
        let unit = &mut state.players.p2.units[3];
        unit.position = Position::new(0, 10);
        unit.is_dead = true;
        unit.hp = 0;
        unit.respawn_timer = 1;
        let spawn = unit.spawn;

        end_round(&mut state, &env(&config));
        let unit = &state.players.p2.units[3];
        assert!(unit.is_alive());
        assert_eq!(unit.position, spawn);
        assert_eq!(unit.hp, unit.max_hp);
        assert!(state.logs.contains_key("log_unit_resurrected"));
    }

    #[test]
    fn occupied_slot_falls_back_to_a_neighbour() {
        let config = GameConfig::new();
        let mut state = finished_round(5);
        let spawn = state.players.p1.units[3].spawn;
        state.players.p1.units[3].is_dead = true;
        state.players.p1.units[3].hp = 0;
        state.players.p1.units[3].respawn_timer = 1;
        state.players.p2.units[1].position = spawn;

        end_round(&mut state, &env(&config));
        let unit = &state.players.p1.units[3];
        assert!(unit.is_alive());
        assert_ne!(unit.position, spawn);
        assert!(unit.position.chebyshev(spawn) <= 1);
    }

    #[test]
    fn kirin_domain_burns_intruders() {
        let config = GameConfig::new();
        let mut state = finished_round(5);
        state
            .players
            .p2
            .evolution
            .set(UnitType::General, Branch::B, 3, Some(Variant::Second));
        let flag = state.players.p2.flag_position;
        state.players.p1.units[2].position = flag.offset(1, 0);
        let hp = state.players.p1.units[2].hp;

        end_round(&mut state, &env(&config));
        assert_eq!(state.players.p1.units[2].hp, hp - GameConfig::KIRIN_DOMAIN_DAMAGE);
    }
}
