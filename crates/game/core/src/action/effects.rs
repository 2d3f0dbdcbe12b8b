//! State mutations shared by several actions and by round maintenance.
//!
//! These helpers apply outcomes computed in [`crate::resolution`]: damage and
//! deaths, mine resolutions, relocation of units together with whatever they
//! carry, and the cross-entity invariant check run after every transition.

use crate::config::GameConfig;
use crate::env::GameEnv;
use crate::resolution::{MineResolution, kill_reward, mine_triggered_by_move, resolve_trigger};
use crate::state::{
    BuildingKind, GameState, LogKind, Mine, MineId, PlayerId, Position, UnitId, UnitType,
};

use super::RejectReason;

/// Applies `amount` damage. Returns true if the unit died from it.
///
/// A death drops any carried flag on the unit's cell, returns a carried mine
/// to the board, starts the respawn timer and credits `credit` with the kill
/// reward.
pub fn damage_unit(
    state: &mut GameState,
    id: UnitId,
    amount: u32,
    credit: Option<PlayerId>,
) -> bool {
    let turn = state.turn;
    let Some(unit) = state.unit_mut(id) else {
        return false;
    };
    if unit.is_dead || amount == 0 {
        return false;
    }
    unit.hp = unit.hp.saturating_sub(amount);
    if unit.hp > 0 {
        return false;
    }

    unit.is_dead = true;
    unit.respawn_timer = if unit.kind() == UnitType::General {
        0
    } else {
        GameConfig::respawn_rounds(turn)
    };
    unit.status = Default::default();
    let position = unit.position;
    let dropped_flag = std::mem::take(&mut unit.has_flag);
    let carried = unit.carried_mine.take();

    if dropped_flag {
        state.players[id.owner].flag_position = position;
        let entry = state
            .entry("log_flag_drop", LogKind::Info)
            .owned_by(id.owner)
            .with("unit", id.to_string());
        state.log(entry);
    }
    if let Some(mut mine) = carried
        && state.mine_of(id.owner, position).is_none()
    {
        mine.owner = id.owner;
        mine.position = position;
        mine.revealed_to = vec![id.owner];
        mine.immune_units.clear();
        state.mines.push(mine);
    }
    if state.active_unit == Some(id) {
        state.active_unit = None;
    }

    if let Some(killer) = credit.filter(|p| *p != id.owner) {
        let reward = kill_reward(state.players[id.owner].energy);
        state.players[killer].energy_from_kills += reward;
    }
    let entry = state
        .entry("log_unit_killed", LogKind::Combat)
        .with("unit", id.to_string());
    state.log(entry);
    tracing::debug!(unit = %id, "unit killed");
    true
}

/// Heals a living unit and returns the amount actually restored.
pub fn heal_unit(state: &mut GameState, id: UnitId, amount: u32) -> u32 {
    state.unit_mut(id).map_or(0, |unit| unit.heal(amount))
}

/// Removes a mine from the board and clears stale mark hints on its cell.
pub fn remove_mine(state: &mut GameState, id: MineId) -> Option<Mine> {
    let index = state.mines.iter().position(|m| m.id == id)?;
    let mine = state.mines.remove(index);
    state.clear_marks_at(mine.position);
    Some(mine)
}

/// Applies a computed trigger outcome, including its quest bookkeeping.
pub fn apply_mine_resolution(state: &mut GameState, env: &GameEnv<'_>, res: &MineResolution) {
    let now = env.now_ms();
    let victim_owner = res.triggered_by.owner;

    for id in &res.removed_mines {
        remove_mine(state, *id);
    }
    state
        .buildings
        .retain(|b| !res.removed_buildings.contains(&b.id));

    for hit in &res.hits {
        let entry = state
            .entry(hit.key, LogKind::Mine)
            .with("unit", hit.unit.to_string())
            .with("dmg", hit.amount)
            .with("mine", res.kind.as_ref());
        state.log(entry);
        damage_unit(state, hit.unit, hit.amount, Some(res.owner));
    }

    if let Some((unit, magnitude, duration)) = res.debuff
        && let Some(target) = state.unit_mut(unit).filter(|u| u.is_alive())
    {
        target.status.apply_debuff(magnitude, duration);
    }
    if let Some(smoke) = res.smoke.clone() {
        state.smokes.push(smoke);
    }
    for (unit, amount) in &res.heals {
        let healed = heal_unit(state, *unit, *amount);
        if healed > 0 {
            let entry = state
                .entry("log_evol_def_a_heal", LogKind::Evolution)
                .owned_by(victim_owner)
                .with("unit", unit.to_string())
                .with("amount", healed);
            state.log(entry);
        }
    }
    if let Some(reflect) = &res.reflect {
        let entry = state
            .entry(reflect.key, LogKind::Combat)
            .owned_by(victim_owner)
            .with("unit", reflect.unit.to_string())
            .with("dmg", reflect.amount);
        state.log(entry);
        damage_unit(state, reflect.unit, reflect.amount, Some(victim_owner));
    }
    for (kind, position, size) in &res.vfx {
        state.push_vfx(*kind, *position, *size, now);
    }

    let quest = &mut state.players[victim_owner].quest;
    if res.triggered_by.kind == UnitType::Defuser {
        quest.defuser_mines_soaked += 1;
    } else {
        quest.triggered_mine_this_round = true;
    }
    if res.owner != victim_owner {
        state.players[res.owner].quest.maker_mines_triggered_by_enemy += 1;
    }
}

/// Puts a unit on `to`, dragging its carried flag, and drops immunity on the
/// cell it left. Does not resolve mines.
pub fn relocate(state: &mut GameState, id: UnitId, to: Position) -> Option<Position> {
    let unit = state.unit_mut(id)?;
    let from = unit.position;
    unit.position = to;
    unit.last_from = Some(from);
    let carrying = unit.has_flag;
    if carrying {
        state.players[id.owner].flag_position = to;
    }
    for mine in state.mines.iter_mut().filter(|m| m.position == from) {
        mine.immune_units.retain(|u| *u != id);
    }
    Some(from)
}

/// Resolves the mine `id` sets off by having stepped from `from` onto its
/// current cell. Returns the number of mines triggered, zero or one.
pub fn resolve_arrival(
    state: &mut GameState,
    env: &GameEnv<'_>,
    id: UnitId,
    from: Position,
) -> usize {
    let Some(unit) = state.unit(id).filter(|u| u.is_alive()).cloned() else {
        return 0;
    };
    let Some(mine) = mine_triggered_by_move(state, &unit, from, unit.position).map(|m| m.id)
    else {
        return 0;
    };
    let Some(res) = resolve_trigger(state, id, mine) else {
        return 0;
    };
    apply_mine_resolution(state, env, &res);
    1
}

/// Every tower reveals enemy mines within Chebyshev 1 to its owner.
pub fn radar_reveal(state: &mut GameState) -> usize {
    let towers: Vec<(PlayerId, Position)> = state
        .buildings
        .iter()
        .filter(|b| b.kind == BuildingKind::Tower)
        .map(|b| (b.owner, b.position))
        .collect();
    let mut revealed = 0;
    for (owner, position) in towers {
        for mine in state
            .mines
            .iter_mut()
            .filter(|m| m.owner != owner && m.position.chebyshev(position) <= 1)
        {
            if mine.reveal_to(owner) {
                revealed += 1;
            }
        }
    }
    revealed
}

/// Ends the match when a General died or a flag reached the enemy base.
///
/// Both Generals dead is a draw. Returns true if the match is over.
pub fn check_victory(state: &mut GameState) -> bool {
    if state.game_over {
        return true;
    }
    let general_dead = |p: PlayerId| state.players[p].general().is_none_or(|g| g.is_dead);
    let (p1_dead, p2_dead) = (general_dead(PlayerId::P1), general_dead(PlayerId::P2));

    let winner = match (p1_dead, p2_dead) {
        (true, true) => None,
        (true, false) => Some(PlayerId::P2),
        (false, true) => Some(PlayerId::P1),
        (false, false) => {
            let captured = PlayerId::ALL
                .into_iter()
                .find(|p| state.players[*p].flag_position == p.opponent().flag_base());
            match captured {
                Some(player) => Some(player),
                None => return false,
            }
        }
    };

    state.game_over = true;
    state.winner = winner;
    state.active_unit = None;
    let mut entry = state.entry("log_victory", LogKind::Info);
    if let Some(player) = winner {
        entry = entry.with("winner", player.as_ref());
    } else {
        entry = entry.with("winner", "draw");
    }
    state.log(entry);
    tracing::debug!(?winner, "match over");
    true
}

/// Cross-entity invariants that must hold after every accepted action.
pub fn check_invariants(state: &GameState, config: &GameConfig) -> Result<(), RejectReason> {
    for (i, mine) in state.mines.iter().enumerate() {
        if state.mines[i + 1..]
            .iter()
            .any(|m| m.owner == mine.owner && m.position == mine.position)
        {
            return Err(RejectReason::InvariantViolated("two own mines on one cell"));
        }
    }
    for player in state.players.iter() {
        let carriers: Vec<_> = player.units.iter().filter(|u| u.has_flag).collect();
        match carriers.as_slice() {
            [] => {}
            [carrier] if carrier.position == player.flag_position && carrier.is_alive() => {}
            [_] => return Err(RejectReason::InvariantViolated("flag out of sync with carrier")),
            _ => return Err(RejectReason::InvariantViolated("more than one flag carrier")),
        }
        for unit in &player.units {
            if unit.is_dead && unit.hp != 0 {
                return Err(RejectReason::InvariantViolated("dead unit with hp"));
            }
            if unit.energy_used_this_turn > config.energy_cap(unit.start_of_action_energy) {
                return Err(RejectReason::InvariantViolated("energy cap exceeded"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::PcgRng;
    use crate::state::{MineType, Phase};

    #[test]
    fn killing_a_carrier_drops_the_flag_and_credits_reward() {
        let mut state = GameState::new(4);
        state.phase = Phase::Action;
        let general = UnitId::new(PlayerId::P2, UnitType::General);
        let cell = Position::new(3, 9);
        if let Some(u) = state.unit_mut(general) {
            u.position = cell;
            u.has_flag = true;
            u.hp = 3;
        }
        state.players[PlayerId::P2].flag_position = cell;

        assert!(damage_unit(&mut state, general, 4, Some(PlayerId::P1)));
        let unit = state.unit(general).unwrap();
        assert!(unit.is_dead && !unit.has_flag && unit.hp == 0);
        assert_eq!(state.players[PlayerId::P2].flag_position, cell);
        // 3 + floor(50 * 0.15)
        assert_eq!(state.players[PlayerId::P1].energy_from_kills, 10);
        assert!(check_victory(&mut state));
        assert_eq!(state.winner, Some(PlayerId::P1));
    }

    #[test]
    fn radar_reveal_is_idempotent() {
        let mut state = GameState::new(4);
        let id = state.allocate_mine_id();
        state
            .mines
            .push(Mine::new(id, PlayerId::P2, MineType::Normal, Position::new(2, 10)));
        let tower = state.allocate_building_id();
        state.buildings.push(crate::state::Building {
            id: tower,
            owner: PlayerId::P1,
            kind: BuildingKind::Tower,
            position: Position::new(3, 9),
            level: 1,
            variant: None,
            duration: Some(2),
        });
        assert_eq!(radar_reveal(&mut state), 1);
        assert_eq!(radar_reveal(&mut state), 0);
        assert_eq!(state.mines[0].revealed_to, vec![PlayerId::P2, PlayerId::P1]);
    }

    #[test]
    fn arrival_resolves_normal_mine() {
        let mut state = GameState::new(4);
        state.phase = Phase::Action;
        let config = GameConfig::new();
        let env = GameEnv::new(&config, &PcgRng, 0);
        let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);
        let cell = Position::new(3, 10);
        let id = state.allocate_mine_id();
        state
            .mines
            .push(Mine::new(id, PlayerId::P2, MineType::Normal, cell));
        relocate(&mut state, ranger, cell);

        assert_eq!(resolve_arrival(&mut state, &env, ranger, Position::new(3, 9)), 1);
        assert_eq!(state.unit(ranger).map(|u| u.hp), Some(8));
        assert!(state.mines.is_empty());
        assert!(state.players[PlayerId::P1].quest.triggered_mine_this_round);
        assert_eq!(
            state.players[PlayerId::P2].quest.maker_mines_triggered_by_enemy,
            1
        );
        assert!(check_invariants(&state, &config).is_ok());
    }
}
