//! Mine trigger detection and outcome computation.
//!
//! [`resolve_trigger`] turns "unit U set off mine M" into a
//! [`MineResolution`]: every hit, heal, removal and spawned effect in the
//! order the action layer must apply them. CHAIN cascades and NUKE blasts are
//! fully expanded here, so applying a resolution never triggers further mines.

use crate::config::GameConfig;
use crate::state::{
    Branch, BuildingId, GameState, Mine, MineId, MineType, PlayerId, Position, Smoke, Unit, UnitId,
    UnitType, Variant, VfxKind, VfxSize,
};

use super::combat::apply_flag_aura;

/// Damage dealt to one unit, tagged with the log key that reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hit {
    pub unit: UnitId,
    pub amount: u32,
    pub key: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MineResolution {
    pub mine: MineId,
    pub kind: MineType,
    pub owner: PlayerId,
    pub position: Position,
    pub triggered_by: UnitId,
    /// Hits in application order. The triggering unit's share is one entry.
    pub hits: Vec<Hit>,
    pub removed_mines: Vec<MineId>,
    pub removed_buildings: Vec<BuildingId>,
    /// Mines consumed by a CHAIN cascade, excluding the chain itself.
    pub chained: Vec<MineId>,
    pub debuff: Option<(UnitId, u32, u32)>,
    pub smoke: Option<Smoke>,
    pub heals: Vec<(UnitId, u32)>,
    pub reflect: Option<Hit>,
    pub vfx: Vec<(VfxKind, Position, VfxSize)>,
}

/// Whether `unit` sets off `mine` on contact.
pub fn would_trigger(state: &GameState, unit: &Unit, mine: &Mine) -> bool {
    if mine.owner == unit.owner() || mine.immune_units.contains(&unit.id) {
        return false;
    }
    let player = &state.players[unit.owner()];
    !(unit.kind() == UnitType::Maker && player.is_variant(UnitType::Maker, Branch::A, Variant::Second))
}

/// The mine set off by `unit` stepping from `from` to `to`, if any.
///
/// One mine resolves per move. An enemy NUKE whose 3×3 radius `to` enters
/// while `from` lay outside it wins over direct contact with a mine on `to`.
pub fn mine_triggered_by_move<'s>(
    state: &'s GameState,
    unit: &Unit,
    from: Position,
    to: Position,
) -> Option<&'s Mine> {
    let proximity = state.mines.iter().find(|m| {
        m.kind == MineType::Nuke
            && m.position.chebyshev(to) <= 1
            && m.position.chebyshev(from) > 1
            && would_trigger(state, unit, m)
    });
    proximity.or_else(|| state.mines_at(to).find(|m| would_trigger(state, unit, m)))
}

/// Direct trigger damage after every modifier.
pub fn trigger_damage(state: &GameState, unit: &Unit, base: u32) -> u32 {
    let player = &state.players[unit.owner()];
    let is_defuser = unit.kind() == UnitType::Defuser;

    let mut damage = if is_defuser { base / 2 } else { base };
    damage += unit.status.mine_vulnerability;
    damage = apply_flag_aura(state, unit, damage);

    let defuser_a = player.level(UnitType::Defuser, Branch::A);
    let shield_wall = player.is_variant(UnitType::Defuser, Branch::A, Variant::Second);
    if !is_defuser && defuser_a >= 1 {
        let low = unit.is_below_half();
        let mitigation = match (shield_wall, low) {
            (true, true) => 3,
            (true, false) | (false, true) => 2,
            (false, false) => 1,
        };
        damage = damage.saturating_sub(mitigation);
    }
    if is_defuser && shield_wall {
        damage /= 2;
    }
    damage
}

/// Secondary blast damage: Defuser half, vulnerability and aura only.
fn chain_blast_damage(state: &GameState, unit: &Unit, base: u32) -> u32 {
    let mut damage = if unit.kind() == UnitType::Defuser {
        base / 2
    } else {
        base
    };
    damage += unit.status.mine_vulnerability;
    apply_flag_aura(state, unit, damage)
}

/// Computes the full outcome of `unit` setting off `mine`.
pub fn resolve_trigger(state: &GameState, unit: UnitId, mine: MineId) -> Option<MineResolution> {
    let victim = state.unit(unit)?;
    let mine = state.mine(mine)?;

    let mut res = MineResolution {
        mine: mine.id,
        kind: mine.kind,
        owner: mine.owner,
        position: mine.position,
        triggered_by: unit,
        hits: Vec::new(),
        removed_mines: vec![mine.id],
        removed_buildings: Vec::new(),
        chained: Vec::new(),
        debuff: None,
        smoke: None,
        heals: Vec::new(),
        reflect: None,
        vfx: Vec::new(),
    };

    let direct = trigger_damage(state, victim, GameConfig::mine_damage(mine.kind));
    match mine.kind {
        MineType::Normal => {
            res.hits.push(hit(unit, direct, "log_hit_mine"));
            res.vfx
                .push((VfxKind::Explosion, mine.position, VfxSize::Small));
        }
        MineType::Slow => {
            res.hits.push(hit(unit, direct, "log_hit_mine"));
            res.debuff = Some((unit, GameConfig::SLOW_DEBUFF, GameConfig::SLOW_DURATION));
            res.vfx.push((VfxKind::Slow, mine.position, VfxSize::Small));
        }
        MineType::Smoke => {
            res.hits.push(hit(unit, direct, "log_hit_mine"));
            res.smoke = Some(Smoke {
                position: mine.position,
                owner: mine.owner,
                duration: GameConfig::SMOKE_DURATION,
            });
            res.vfx.push((VfxKind::Smoke, mine.position, VfxSize::Large));
        }
        MineType::Nuke => {
            res.hits.push(hit(unit, direct, "log_hit_mine"));
            resolve_nuke(state, mine, unit, &mut res);
        }
        MineType::Chain => resolve_chain(state, mine, victim, direct, &mut res),
    }

    resolve_defuser_support(state, victim, &mut res);
    Some(res)
}

fn hit(unit: UnitId, amount: u32, key: &'static str) -> Hit {
    Hit { unit, amount, key }
}

fn resolve_nuke(state: &GameState, mine: &Mine, trigger: UnitId, res: &mut MineResolution) {
    for other in state.players.all_units() {
        if other.is_dead || other.id == trigger || other.position.chebyshev(mine.position) > 1 {
            continue;
        }
        let base = if other.owner() == mine.owner {
            GameConfig::NUKE_OWNER_DAMAGE
        } else {
            GameConfig::NUKE_DAMAGE
        };
        let amount = apply_flag_aura(state, other, base);
        res.hits.push(hit(other.id, amount, "log_evol_nuke_blast_hit"));
    }
    for other in &state.mines {
        if other.id != mine.id
            && other.owner != mine.owner
            && other.position.chebyshev(mine.position) <= 1
        {
            res.removed_mines.push(other.id);
        }
    }
    for building in &state.buildings {
        if building.owner != mine.owner && building.position.chebyshev(mine.position) <= 1 {
            res.removed_buildings.push(building.id);
        }
    }
    res.vfx.push((VfxKind::Nuke, mine.position, VfxSize::Large));
}

fn resolve_chain(
    state: &GameState,
    mine: &Mine,
    victim: &Unit,
    direct: u32,
    res: &mut MineResolution,
) {
    let mut victim_total = direct;
    res.vfx.push((VfxKind::Chain, mine.position, VfxSize::Small));

    let chained: Vec<&Mine> = state
        .mines
        .iter()
        .filter(|m| {
            m.id != mine.id
                && m.kind == MineType::Normal
                && m.position.chebyshev(mine.position) <= GameConfig::CHAIN_SEARCH_RADIUS
        })
        .collect();

    for link in chained {
        res.chained.push(link.id);
        res.removed_mines.push(link.id);
        res.vfx
            .push((VfxKind::Explosion, link.position, VfxSize::Large));

        for unit in state.players[victim.owner()].living() {
            if unit.position.chebyshev(link.position) > 1 {
                continue;
            }
            let amount = chain_blast_damage(state, unit, GameConfig::MINE_DAMAGE);
            if unit.id == victim.id {
                victim_total += amount;
            } else {
                res.hits.push(hit(unit.id, amount, "log_chain_aoe"));
            }
        }
    }
    res.hits.insert(0, hit(victim.id, victim_total, "log_evol_mkr_chain"));
}

fn resolve_defuser_support(state: &GameState, victim: &Unit, res: &mut MineResolution) {
    let side = &state.players[victim.owner()];
    if side.level(UnitType::Defuser, Branch::A) >= 2 {
        for mate in side.living() {
            if mate.kind() == UnitType::Defuser || mate.id == victim.id {
                continue;
            }
            let amount = if mate.is_below_half() { 2 } else { 1 };
            res.heals.push((mate.id, amount));
        }
    }
    if side.is_variant(UnitType::Defuser, Branch::A, Variant::First) {
        let amount = if victim.kind() == UnitType::Defuser { 3 } else { 2 };
        let target = state.players[victim.owner().opponent()]
            .living()
            .min_by_key(|u| (u.hp, u.id));
        if let Some(target) = target {
            res.reflect = Some(hit(target.id, amount, "log_evol_def_reflect_hit"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Phase;

    fn board_with_mine(kind: MineType, at: Position) -> (GameState, MineId, UnitId) {
        let mut state = GameState::new(1);
        state.phase = Phase::Action;
        let id = state.allocate_mine_id();
        state.mines.push(Mine::new(id, PlayerId::P2, kind, at));
        let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);
        (state, id, ranger)
    }

    #[test]
    fn owner_and_immune_units_do_not_trigger() {
        let (mut state, id, ranger) = board_with_mine(MineType::Normal, Position::new(3, 9));
        let enemy = UnitId::new(PlayerId::P2, UnitType::Ranger);
        let mine = state.mine(id).cloned().unwrap();
        assert!(!would_trigger(&state, state.unit(enemy).unwrap(), &mine));
        assert!(would_trigger(&state, state.unit(ranger).unwrap(), &mine));

        state.mines[0].immune_units.push(ranger);
        let mine = state.mine(id).cloned().unwrap();
        assert!(!would_trigger(&state, state.unit(ranger).unwrap(), &mine));
    }

    #[test]
    fn defuser_takes_half_and_team_mitigation_applies() {
        let (mut state, _, _) = board_with_mine(MineType::Normal, Position::new(3, 9));
        let defuser = state
            .unit(UnitId::new(PlayerId::P1, UnitType::Defuser))
            .cloned()
            .unwrap();
        assert_eq!(trigger_damage(&state, &defuser, 8), 4);

        state.players[PlayerId::P1]
            .evolution
            .set(UnitType::Defuser, Branch::A, 1, None);
        let ranger = state
            .unit(UnitId::new(PlayerId::P1, UnitType::Ranger))
            .cloned()
            .unwrap();
        assert_eq!(trigger_damage(&state, &ranger, 8), 7);
    }

    #[test]
    fn nuke_proximity_only_on_new_entry() {
        let (mut state, id, ranger) = board_with_mine(MineType::Nuke, Position::new(2, 9));
        if let Some(u) = state.unit_mut(ranger) {
            u.position = Position::new(3, 7);
        }
        let unit = state.unit(ranger).cloned().unwrap();
        let entering =
            mine_triggered_by_move(&state, &unit, Position::new(3, 7), Position::new(3, 8));
        assert_eq!(entering.map(|m| m.id), Some(id));
        let already_adjacent =
            mine_triggered_by_move(&state, &unit, Position::new(3, 8), Position::new(3, 9));
        assert!(already_adjacent.is_none());
    }

    #[test]
    fn one_mine_per_move_with_nuke_first() {
        let (mut state, first, ranger) = board_with_mine(MineType::Nuke, Position::new(2, 9));
        let second = state.allocate_mine_id();
        state
            .mines
            .push(Mine::new(second, PlayerId::P2, MineType::Nuke, Position::new(4, 9)));
        let contact = state.allocate_mine_id();
        state
            .mines
            .push(Mine::new(contact, PlayerId::P2, MineType::Normal, Position::new(3, 9)));
        let unit = state.unit(ranger).cloned().unwrap();

        let from = Position::new(3, 7);
        let picked = mine_triggered_by_move(&state, &unit, from, Position::new(3, 9));
        assert_eq!(picked.map(|m| m.id), Some(first));

        state.mines.retain(|m| m.kind != MineType::Nuke);
        let picked = mine_triggered_by_move(&state, &unit, from, Position::new(3, 9));
        assert_eq!(picked.map(|m| m.id), Some(contact));
    }

    #[test]
    fn nuke_blast_hits_neighbours_and_clears_enemy_mines() {
        let (mut state, id, ranger) = board_with_mine(MineType::Nuke, Position::new(2, 9));
        let sweeper = UnitId::new(PlayerId::P1, UnitType::Sweeper);
        if let Some(u) = state.unit_mut(ranger) {
            u.position = Position::new(2, 9);
        }
        if let Some(u) = state.unit_mut(sweeper) {
            u.position = Position::new(1, 10);
        }
        let own = state.allocate_mine_id();
        state
            .mines
            .push(Mine::new(own, PlayerId::P1, MineType::Normal, Position::new(1, 8)));

        let res = resolve_trigger(&state, ranger, id).unwrap();
        assert_eq!(res.hits[0], hit(ranger, 12, "log_hit_mine"));
        assert!(res.hits.contains(&hit(sweeper, 12, "log_evol_nuke_blast_hit")));
        assert!(res.removed_mines.contains(&own));
    }
}
