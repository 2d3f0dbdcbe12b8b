//! Mine placement and manipulation by the Maker, Ranger and Defuser.

use crate::action::{ActionTransition, RejectReason, effects, guard};
use crate::config::GameConfig;
use crate::env::GameEnv;
use crate::resolution::{
    apply_flag_aura, maker_can_reach, mine_limit, mine_type_unlocked, own_mine_count,
    place_mine_cost, with_surcharge,
};
use crate::state::{
    Branch, BuildingKind, GameState, LogKind, Mine, MineId, MineType, PlayerId, Position, Smoke,
    UnitId, UnitType, Variant, VfxKind, VfxSize,
};

const PICKUP_RANGE_EVOLVED: i32 = 2;
const THROW_RANGE: i32 = 2;
const DEFUSER_REACH: i32 = 2;
const MOVE_MINE_COST: u32 = 2;
const MOVE_MINE_STRIKE_COST: u32 = 5;

/// Enemy mine on `pos` that `viewer` can currently see.
fn revealed_enemy_mine(state: &GameState, viewer: PlayerId, pos: Position) -> Option<MineId> {
    state
        .mines_at(pos)
        .find(|m| m.owner != viewer && m.is_visible_to(viewer))
        .map(|m| m.id)
}

fn mine_mut(state: &mut GameState, id: MineId) -> Result<&mut Mine, RejectReason> {
    state
        .mines
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or(RejectReason::NoMine)
}

// ===== Maker =====

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceMineAction {
    pub unit: UnitId,
    pub target: Position,
    pub mine_type: MineType,
}

impl ActionTransition for PlaceMineAction {
    type Error = RejectReason;
    type Result = MineId;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let player = self.player();
        let maker = guard::acting_unit_of(state, player, self.unit, UnitType::Maker)?;
        if !self.target.in_bounds() {
            return Err(RejectReason::OutOfBounds);
        }
        if !maker_can_reach(state, maker, self.target) {
            return Err(RejectReason::MakerRange);
        }
        // The Maker may mine the cell it stands on.
        let self_cell = self.target == maker.position;
        let other_unit = state.unit_at(self.target).is_some_and(|u| u.id != self.unit);
        if (state.board.is_obstacle(self.target) && !self_cell)
            || other_unit
            || state.building_at(self.target).is_some()
        {
            return Err(RejectReason::Obstacle);
        }
        if state.mine_of(player, self.target).is_some()
            || revealed_enemy_mine(state, player, self.target).is_some()
        {
            return Err(RejectReason::SpaceHasMine);
        }
        if !mine_type_unlocked(state, player, self.mine_type) {
            return Err(RejectReason::EvolutionLocked);
        }
        let limit = mine_limit(state, player);
        if own_mine_count(state, player) >= limit {
            return Err(RejectReason::MaxMines { limit });
        }
        let cost = place_mine_cost(state, maker, self.mine_type, self.target);
        guard::ensure_energy(state, env.config(), maker, cost)
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<MineId, Self::Error> {
        let player = self.player();
        let cost = {
            let maker = state
                .unit(self.unit)
                .ok_or(RejectReason::UnitNotFound(self.unit))?;
            place_mine_cost(state, maker, self.mine_type, self.target)
        };
        guard::charge(state, self.unit, cost)?;

        let id = state.allocate_mine_id();
        let mut mine = Mine::new(id, player, self.mine_type, self.target);
        mine.immune_units = state
            .players
            .all_units()
            .filter(|u| u.is_alive() && u.position == self.target)
            .map(|u| u.id)
            .collect();
        state.mines.push(mine);
        state.clear_marks_at(self.target);
        state.players[player].quest.maker_mines_placed += 1;

        let entry = state
            .entry("log_mine_placed", LogKind::Mine)
            .owned_by(player)
            .about_mine(id)
            .with("r", self.target.r)
            .with("c", self.target.c)
            .with("mine", self.mine_type.as_ref());
        state.log(entry);
        Ok(id)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

// ===== Defuser =====

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisarmAction {
    pub unit: UnitId,
    pub target: Position,
}

impl ActionTransition for DisarmAction {
    type Error = RejectReason;
    type Result = MineId;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let defuser = guard::acting_unit_of(state, self.player(), self.unit, UnitType::Defuser)?;
        if !self.target.in_bounds() {
            return Err(RejectReason::OutOfBounds);
        }
        if defuser.position.chebyshev(self.target) > 1 {
            return Err(RejectReason::DisarmRange);
        }
        // Hidden mines answer exactly like empty cells.
        revealed_enemy_mine(state, self.player(), self.target).ok_or(RejectReason::NoMine)?;
        let cost = with_surcharge(defuser, GameConfig::DISARM_COST);
        guard::ensure_energy(state, env.config(), defuser, cost)
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<MineId, Self::Error> {
        let player = self.player();
        let mine = revealed_enemy_mine(state, player, self.target).ok_or(RejectReason::NoMine)?;
        let cost = state
            .unit(self.unit)
            .map(|u| with_surcharge(u, GameConfig::DISARM_COST))
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        guard::charge(state, self.unit, cost)?;

        effects::remove_mine(state, mine);
        state.players[player].quest.defuser_mines_disarmed += 1;
        state.push_vfx(VfxKind::Shield, self.target, VfxSize::Small, env.now_ms());
        let entry = state
            .entry("log_mine_disarmed", LogKind::Move)
            .owned_by(player)
            .with("r", self.target.r)
            .with("c", self.target.c);
        state.log(entry);
        guard::mark_acted(state, self.unit)?;
        Ok(mine)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Defuser b2+: relocates a revealed enemy mine.
///
/// With b3 variant 2 the mine may be dropped onto an enemy unit, which
/// consumes it for a fraction of the normal mine damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveMineAction {
    pub unit: UnitId,
    pub from: Position,
    pub to: Position,
}

impl MoveMineAction {
    fn strikes(state: &GameState, player: PlayerId) -> bool {
        state.players[player].is_variant(UnitType::Defuser, Branch::B, Variant::Second)
    }

    fn base_cost(state: &GameState, player: PlayerId) -> u32 {
        if Self::strikes(state, player) {
            MOVE_MINE_STRIKE_COST
        } else {
            MOVE_MINE_COST
        }
    }

    fn struck_enemy(&self, state: &GameState) -> Option<UnitId> {
        if !Self::strikes(state, self.player()) {
            return None;
        }
        state
            .unit_at(self.to)
            .filter(|u| u.owner() != self.player())
            .map(|u| u.id)
    }
}

impl ActionTransition for MoveMineAction {
    type Error = RejectReason;
    type Result = ();

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let player = self.player();
        let defuser = guard::acting_unit_of(state, player, self.unit, UnitType::Defuser)?;
        if state.players[player].level(UnitType::Defuser, Branch::B) < 2 {
            return Err(RejectReason::EvolutionLocked);
        }
        if !self.from.in_bounds() || !self.to.in_bounds() {
            return Err(RejectReason::OutOfBounds);
        }
        if defuser.position.manhattan(self.from) > DEFUSER_REACH
            || defuser.position.manhattan(self.to) > DEFUSER_REACH
        {
            return Err(RejectReason::OutOfRange);
        }
        revealed_enemy_mine(state, player, self.from).ok_or(RejectReason::NoMine)?;
        if state.board.is_obstacle(self.to) || state.building_at(self.to).is_some() {
            return Err(RejectReason::Obstacle);
        }
        if state.mines_at(self.to).next().is_some() {
            return Err(RejectReason::SpaceHasMine);
        }
        if state.is_occupied(self.to) && self.struck_enemy(state).is_none() {
            return Err(RejectReason::Occupied);
        }
        let cost = with_surcharge(defuser, Self::base_cost(state, player));
        guard::ensure_energy(state, env.config(), defuser, cost)
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let player = self.player();
        let mine = revealed_enemy_mine(state, player, self.from).ok_or(RejectReason::NoMine)?;
        let cost = state
            .unit(self.unit)
            .map(|u| with_surcharge(u, Self::base_cost(state, player)))
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        let struck = self.struck_enemy(state);
        guard::charge(state, self.unit, cost)?;

        if let Some(target) = struck {
            let damage = state
                .unit(target)
                .map(|u| apply_flag_aura(state, u, GameConfig::MINE_DAMAGE * 2 / 5))
                .unwrap_or_default();
            effects::remove_mine(state, mine);
            state.clear_marks_at(self.to);
            let entry = state
                .entry("log_evol_def_move_mine_skill_damage", LogKind::Combat)
                .owned_by(player)
                .with("unit", target.to_string())
                .with("dmg", damage);
            state.log(entry);
            state.push_vfx(VfxKind::Explosion, self.to, VfxSize::Small, env.now_ms());
            effects::damage_unit(state, target, damage, Some(player));
        } else {
            let moved = mine_mut(state, mine)?;
            moved.position = self.to;
            moved.immune_units.clear();
            state.clear_marks_at(self.from);
            state.clear_marks_at(self.to);
        }

        let entry = state
            .entry("log_evol_def_move_mine", LogKind::Move)
            .owned_by(player);
        state.log(entry);
        guard::mark_acted(state, self.unit)?;
        Ok(())
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Defuser b3 variant 1: takes ownership of a revealed enemy mine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvertMineAction {
    pub unit: UnitId,
    pub target: Position,
}

impl ActionTransition for ConvertMineAction {
    type Error = RejectReason;
    type Result = MineId;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let player = self.player();
        let defuser = guard::acting_unit_of(state, player, self.unit, UnitType::Defuser)?;
        if !state.players[player].is_variant(UnitType::Defuser, Branch::B, Variant::First) {
            return Err(RejectReason::EvolutionLocked);
        }
        if !self.target.in_bounds() {
            return Err(RejectReason::OutOfBounds);
        }
        if defuser.position.manhattan(self.target) > DEFUSER_REACH {
            return Err(RejectReason::OutOfRange);
        }
        revealed_enemy_mine(state, player, self.target).ok_or(RejectReason::NoMine)?;
        if state.mine_of(player, self.target).is_some() {
            return Err(RejectReason::SpaceHasMine);
        }
        // The conversion bonus is part of the limit already.
        let limit = mine_limit(state, player);
        if own_mine_count(state, player) >= limit {
            return Err(RejectReason::MaxMines { limit });
        }
        let cost = with_surcharge(defuser, GameConfig::CONVERT_COST);
        guard::ensure_energy(state, env.config(), defuser, cost)
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<MineId, Self::Error> {
        let player = self.player();
        let id = revealed_enemy_mine(state, player, self.target).ok_or(RejectReason::NoMine)?;
        let cost = state
            .unit(self.unit)
            .map(|u| with_surcharge(u, GameConfig::CONVERT_COST))
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        guard::charge(state, self.unit, cost)?;

        let mine = mine_mut(state, id)?;
        mine.owner = player;
        mine.revealed_to = vec![player];
        mine.immune_units.clear();
        mine.converted = true;
        state.clear_marks_at(self.target);

        let entry = state
            .entry("log_evol_def_convert_mine", LogKind::Mine)
            .owned_by(player)
            .with("r", self.target.r)
            .with("c", self.target.c);
        state.log(entry);
        guard::mark_acted(state, self.unit)?;
        Ok(id)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

// ===== Ranger =====

/// Lifts an own or revealed mine off the board. Free of cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PickupMineAction {
    pub unit: UnitId,
    pub target: Position,
}

impl PickupMineAction {
    /// Own mines are preferred when several share the cell.
    fn pickable(&self, state: &GameState) -> Option<MineId> {
        let player = self.player();
        state
            .mine_of(player, self.target)
            .map(|m| m.id)
            .or_else(|| revealed_enemy_mine(state, player, self.target))
    }
}

impl ActionTransition for PickupMineAction {
    type Error = RejectReason;
    type Result = MineId;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let ranger = guard::acting_unit_of(state, self.player(), self.unit, UnitType::Ranger)?;
        if ranger.carried_mine.is_some() {
            return Err(RejectReason::InvalidTarget);
        }
        let range = if state.players[self.player()].level(UnitType::Ranger, Branch::B) >= 1 {
            PICKUP_RANGE_EVOLVED
        } else {
            0
        };
        if ranger.position.manhattan(self.target) > range {
            return Err(RejectReason::OutOfRange);
        }
        self.pickable(state).map(|_| ()).ok_or(RejectReason::NoMine)
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<MineId, Self::Error> {
        let player = self.player();
        let id = self.pickable(state).ok_or(RejectReason::NoMine)?;
        guard::charge(state, self.unit, 0)?;
        let mine = effects::remove_mine(state, id).ok_or(RejectReason::NoMine)?;

        let quest = &mut state.players[player].quest;
        if quest.ranger_mines_moved_this_round.insert(id) {
            quest.ranger_mines_moved += 1;
        }
        if let Some(ranger) = state.unit_mut(self.unit) {
            ranger.carried_mine = Some(mine);
        }

        let entry = state
            .entry("log_pickup_mine", LogKind::Move)
            .owned_by(player)
            .about_mine(id)
            .with("r", self.target.r)
            .with("c", self.target.c);
        state.log(entry);
        Ok(id)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Puts the carried mine down on the Ranger's cell as an own mine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropMineAction {
    pub unit: UnitId,
}

impl ActionTransition for DropMineAction {
    type Error = RejectReason;
    type Result = MineId;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let ranger = guard::acting_unit_of(state, self.player(), self.unit, UnitType::Ranger)?;
        if ranger.carried_mine.is_none() {
            return Err(RejectReason::NoMine);
        }
        if state.mines_at(ranger.position).next().is_some() {
            return Err(RejectReason::SpaceHasMine);
        }
        if state.board.is_obstacle(ranger.position) {
            return Err(RejectReason::Obstacle);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<MineId, Self::Error> {
        let player = self.player();
        let (mut mine, cell) = state
            .unit_mut(self.unit)
            .and_then(|u| Some((u.carried_mine.take()?, u.position)))
            .ok_or(RejectReason::NoMine)?;

        let mut revealed_to = vec![player];
        for tower in state
            .buildings
            .iter()
            .filter(|b| b.kind == BuildingKind::Tower && b.position.chebyshev(cell) <= 1)
        {
            if !revealed_to.contains(&tower.owner) {
                revealed_to.push(tower.owner);
            }
        }
        let id = mine.id;
        mine.owner = player;
        mine.position = cell;
        mine.revealed_to = revealed_to;
        mine.immune_units.clear();
        state.mines.push(mine);
        state.clear_marks_at(cell);

        let entry = state
            .entry("log_place_mine", LogKind::Move)
            .owned_by(player)
            .about_mine(id)
            .with("r", cell.r)
            .with("c", cell.c);
        state.log(entry);
        guard::charge(state, self.unit, 0)?;
        guard::mark_acted(state, self.unit)?;
        Ok(id)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Ranger b3 variant 2: hurls the carried mine at an enemy unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThrowMineAction {
    pub unit: UnitId,
    pub target: Position,
}

impl ThrowMineAction {
    fn victim(&self, state: &GameState) -> Option<UnitId> {
        state
            .unit_at(self.target)
            .filter(|u| u.owner() != self.player())
            .map(|u| u.id)
    }
}

impl ActionTransition for ThrowMineAction {
    type Error = RejectReason;
    type Result = u32;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let player = self.player();
        let ranger = guard::acting_unit_of(state, player, self.unit, UnitType::Ranger)?;
        if !state.players[player].is_variant(UnitType::Ranger, Branch::B, Variant::Second) {
            return Err(RejectReason::EvolutionLocked);
        }
        if ranger.carried_mine.is_none() {
            return Err(RejectReason::NoMine);
        }
        if !self.target.in_bounds() {
            return Err(RejectReason::OutOfBounds);
        }
        if ranger.position.manhattan(self.target) > THROW_RANGE {
            return Err(RejectReason::OutOfRange);
        }
        self.victim(state).ok_or(RejectReason::ThrowRequiresEnemy)?;
        let cost = with_surcharge(ranger, GameConfig::THROW_COST);
        guard::ensure_energy(state, env.config(), ranger, cost)
    }

    /// Returns the damage dealt.
    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<u32, Self::Error> {
        let player = self.player();
        let victim = self.victim(state).ok_or(RejectReason::ThrowRequiresEnemy)?;
        let cost = state
            .unit(self.unit)
            .map(|u| with_surcharge(u, GameConfig::THROW_COST))
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        guard::charge(state, self.unit, cost)?;
        let mine = state
            .unit_mut(self.unit)
            .and_then(|u| u.carried_mine.take())
            .ok_or(RejectReason::NoMine)?;

        let damage = state
            .unit(victim)
            .map(|u| apply_flag_aura(state, u, GameConfig::mine_damage(mine.kind) / 2))
            .unwrap_or_default();
        let entry = state
            .entry("log_hit_mine", LogKind::Mine)
            .owned_by(victim.owner)
            .with("unit", victim.to_string())
            .with("dmg", damage)
            .with("mine", mine.kind.as_ref());
        state.log(entry);
        state.push_vfx(VfxKind::Explosion, self.target, VfxSize::Small, env.now_ms());

        let killed = effects::damage_unit(state, victim, damage, Some(player));
        match mine.kind {
            MineType::Slow if !killed => {
                if let Some(u) = state.unit_mut(victim) {
                    u.status
                        .apply_debuff(GameConfig::SLOW_DEBUFF, GameConfig::SLOW_DURATION);
                }
                state.push_vfx(VfxKind::Slow, self.target, VfxSize::Small, env.now_ms());
            }
            MineType::Smoke => {
                state.smokes.push(Smoke {
                    position: self.target,
                    owner: player,
                    duration: GameConfig::SMOKE_DURATION,
                });
                state.push_vfx(VfxKind::Smoke, self.target, VfxSize::Large, env.now_ms());
            }
            _ => {}
        }
        guard::mark_acted(state, self.unit)?;
        Ok(damage)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::testing::{action_state, run};

    fn place(state: &mut GameState, owner: PlayerId, kind: MineType, at: Position) -> MineId {
        let id = state.allocate_mine_id();
        state.mines.push(Mine::new(id, owner, kind, at));
        id
    }

    fn put(state: &mut GameState, id: UnitId, at: Position) {
        if let Some(u) = state.unit_mut(id) {
            u.position = at;
        }
    }

    #[test]
    fn maker_mines_own_cell_and_becomes_immune() {
        let mut state = action_state(41);
        let maker = UnitId::new(PlayerId::P1, UnitType::Maker);
        let action = PlaceMineAction {
            unit: maker,
            target: Position::new(2, 3),
            mine_type: MineType::Normal,
        };
        let id = run(&action, &mut state).expect("placed");
        let mine = state.mine(id).unwrap();
        assert_eq!(mine.immune_units, vec![maker]);
        assert_eq!(state.players.p1.energy, 45);
        assert_eq!(state.players.p1.quest.maker_mines_placed, 1);
        assert!(!state.unit(maker).unwrap().has_acted);
    }

    #[test]
    fn maker_placement_gates() {
        let mut state = action_state(41);
        let maker = UnitId::new(PlayerId::P1, UnitType::Maker);
        let at = |target, mine_type| PlaceMineAction { unit: maker, target, mine_type };

        assert_eq!(
            run(&at(Position::new(2, 5), MineType::Normal), &mut state),
            Err(RejectReason::MakerRange)
        );
        assert_eq!(
            run(&at(Position::new(2, 4), MineType::Slow), &mut state),
            Err(RejectReason::EvolutionLocked)
        );
        let hidden = place(&mut state, PlayerId::P2, MineType::Normal, Position::new(2, 4));
        assert!(run(&at(Position::new(2, 4), MineType::Normal), &mut state).is_ok());

        if let Some(m) = state.mines.iter_mut().find(|m| m.id == hidden) {
            m.reveal_to(PlayerId::P1);
        }
        assert!(run(&at(Position::new(1, 3), MineType::Normal), &mut state).is_ok());
        for c in 0..3 {
            place(&mut state, PlayerId::P1, MineType::Normal, Position::new(0, c));
        }
        assert_eq!(
            run(&at(Position::new(2, 2), MineType::Normal), &mut state),
            Err(RejectReason::MaxMines { limit: 5 })
        );
    }

    #[test]
    fn disarm_needs_a_visible_adjacent_enemy_mine() {
        let mut state = action_state(41);
        let defuser = UnitId::new(PlayerId::P1, UnitType::Defuser);
        let cell = Position::new(4, 4);
        let id = place(&mut state, PlayerId::P2, MineType::Normal, cell);
        let disarm = DisarmAction { unit: defuser, target: cell };
        assert_eq!(run(&disarm, &mut state), Err(RejectReason::NoMine));

        if let Some(m) = state.mines.iter_mut().find(|m| m.id == id) {
            m.reveal_to(PlayerId::P1);
        }
        assert_eq!(run(&disarm, &mut state), Ok(id));
        assert!(state.mines.is_empty());
        assert_eq!(state.players.p1.quest.defuser_mines_disarmed, 1);
        assert!(state.unit(defuser).unwrap().has_acted);
    }

    #[test]
    fn pickup_and_drop_keep_mine_identity() {
        let mut state = action_state(41);
        let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);
        let cell = Position::new(5, 2);
        let id = place(&mut state, PlayerId::P1, MineType::Slow, cell);

        assert_eq!(run(&PickupMineAction { unit: ranger, target: cell }, &mut state), Ok(id));
        assert!(state.mines.is_empty());
        assert_eq!(state.players.p1.quest.ranger_mines_moved, 1);
        assert_eq!(state.active_unit, Some(ranger));

        put(&mut state, ranger, Position::new(5, 4));
        assert_eq!(run(&DropMineAction { unit: ranger }, &mut state), Ok(id));
        let mine = state.mine(id).unwrap();
        assert_eq!(mine.position, Position::new(5, 4));
        assert_eq!(mine.revealed_to, vec![PlayerId::P1]);
        assert!(state.unit(ranger).unwrap().has_acted);
    }

    #[test]
    fn thrown_slow_mine_halves_damage_and_debuffs() {
        let mut state = action_state(41);
        let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);
        let enemy = UnitId::new(PlayerId::P2, UnitType::Sweeper);
        state
            .players
            .p1
            .evolution
            .set(UnitType::Ranger, Branch::B, 3, Some(Variant::Second));
        put(&mut state, ranger, Position::new(3, 4));
        put(&mut state, enemy, Position::new(3, 6));
        let id = state.allocate_mine_id();
        if let Some(u) = state.unit_mut(ranger) {
            u.carried_mine = Some(Mine::new(id, PlayerId::P1, MineType::Slow, Position::new(3, 4)));
        }

        let thrown = run(&ThrowMineAction { unit: ranger, target: Position::new(3, 6) }, &mut state);
        assert_eq!(thrown, Ok(2));
        let target = state.unit(enemy).unwrap();
        assert_eq!(target.hp, 12);
        assert_eq!(target.status.move_cost_debuff, 2);
        assert!(state.unit(ranger).unwrap().carried_mine.is_none());
        assert_eq!(
            run(&ThrowMineAction { unit: ranger, target: Position::new(3, 6) }, &mut state),
            Err(RejectReason::UnitActed(ranger))
        );
    }

    #[test]
    fn moved_mine_strikes_enemy_with_variant() {
        let mut state = action_state(41);
        let defuser = UnitId::new(PlayerId::P1, UnitType::Defuser);
        let enemy = UnitId::new(PlayerId::P2, UnitType::Maker);
        state
            .players
            .p1
            .evolution
            .set(UnitType::Defuser, Branch::B, 3, Some(Variant::Second));
        put(&mut state, enemy, Position::new(4, 5));
        let id = place(&mut state, PlayerId::P2, MineType::Normal, Position::new(4, 4));
        if let Some(m) = state.mines.iter_mut().find(|m| m.id == id) {
            m.reveal_to(PlayerId::P1);
        }

        let action = MoveMineAction {
            unit: defuser,
            from: Position::new(4, 4),
            to: Position::new(4, 5),
        };
        assert!(run(&action, &mut state).is_ok());
        assert!(state.mines.is_empty());
        assert_eq!(state.unit(enemy).map(|u| u.hp), Some(9));
        assert_eq!(state.players.p1.energy, 45);
    }

    #[test]
    fn converted_mine_changes_hands() {
        let mut state = action_state(41);
        let defuser = UnitId::new(PlayerId::P1, UnitType::Defuser);
        state
            .players
            .p1
            .evolution
            .set(UnitType::Defuser, Branch::B, 3, Some(Variant::First));
        let id = place(&mut state, PlayerId::P2, MineType::Nuke, Position::new(3, 4));
        if let Some(m) = state.mines.iter_mut().find(|m| m.id == id) {
            m.reveal_to(PlayerId::P1);
        }
        assert_eq!(
            run(&ConvertMineAction { unit: defuser, target: Position::new(3, 4) }, &mut state),
            Ok(id)
        );
        let mine = state.mine(id).unwrap();
        assert_eq!(mine.owner, PlayerId::P1);
        assert_eq!(mine.revealed_to, vec![PlayerId::P1]);
        assert!(mine.converted);
    }
}
