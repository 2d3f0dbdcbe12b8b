use crate::action::{ActionTransition, RejectReason, effects, guard};
use crate::config::GameConfig;
use crate::env::GameEnv;
use crate::resolution::limits::oldest_building;
use crate::resolution::{
    apply_flag_aura, building_cost, building_gate, building_limit, building_profile,
    with_surcharge,
};
use crate::state::{
    Branch, Building, BuildingId, BuildingKind, GameState, LogKind, PlayerId, Position, UnitId,
    UnitType, Variant, VfxKind, VfxSize,
};

/// Raises a tower, hub or factory on the builder's own cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceBuildingAction {
    pub unit: UnitId,
    pub kind: BuildingKind,
}

impl PlaceBuildingAction {
    pub fn new(unit: UnitId, kind: BuildingKind) -> Self {
        Self { unit, kind }
    }

    fn log_key(&self) -> &'static str {
        match self.kind {
            BuildingKind::Tower => "log_built_tower",
            BuildingKind::Hub => "log_built_hub",
            BuildingKind::Factory => "log_built_factory",
        }
    }

    /// Tower to tear down first, when building at the tower limit.
    fn replaced(&self, state: &GameState) -> Option<BuildingId> {
        let player = self.player();
        let at_limit =
            state.buildings_of(player, self.kind).count() >= building_limit(state, player, self.kind);
        if self.kind == BuildingKind::Tower && at_limit {
            oldest_building(state, player, self.kind).map(|b| b.id)
        } else {
            None
        }
    }
}

impl ActionTransition for PlaceBuildingAction {
    type Error = RejectReason;
    type Result = BuildingId;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let player = self.player();
        let (builder_kind, branch) = building_gate(self.kind);
        let builder = guard::acting_unit_of(state, player, self.unit, builder_kind)?;
        if state.players[player].level(builder_kind, branch) < 1 {
            return Err(RejectReason::EvolutionLocked);
        }
        let cell = builder.position;
        if state.mines_at(cell).next().is_some() {
            return Err(RejectReason::SpaceHasMine);
        }
        if state.building_at(cell).is_some() {
            return Err(RejectReason::Obstacle);
        }
        let at_limit =
            state.buildings_of(player, self.kind).count() >= building_limit(state, player, self.kind);
        if at_limit && self.kind != BuildingKind::Tower {
            return Err(RejectReason::MaxBuildings);
        }
        guard::ensure_energy(state, env.config(), builder, building_cost(state, builder, self.kind))
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<BuildingId, Self::Error> {
        let player = self.player();
        let (cost, cell) = {
            let builder = state
                .unit(self.unit)
                .ok_or(RejectReason::UnitNotFound(self.unit))?;
            (building_cost(state, builder, self.kind), builder.position)
        };
        guard::charge(state, self.unit, cost)?;

        if let Some(old) = self.replaced(state) {
            state.buildings.retain(|b| b.id != old);
        }
        let (level, variant, duration) = building_profile(state, player, self.kind);
        let id = state.allocate_building_id();
        state.buildings.push(Building {
            id,
            owner: player,
            kind: self.kind,
            position: cell,
            level,
            variant,
            duration,
        });

        let entry = state
            .entry(self.log_key(), LogKind::Move)
            .owned_by(player)
            .with("r", cell.r)
            .with("c", cell.c);
        state.log(entry);
        guard::mark_acted(state, self.unit)?;
        Ok(id)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Sweeper a3 variant 2: blows up every own tower together with the enemy
/// mines around them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetonateTowerAction {
    pub unit: UnitId,
}

impl DetonateTowerAction {
    fn towers(state: &GameState, player: PlayerId) -> Vec<Position> {
        state
            .buildings_of(player, BuildingKind::Tower)
            .map(|b| b.position)
            .collect()
    }
}

impl ActionTransition for DetonateTowerAction {
    type Error = RejectReason;
    type Result = usize;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let player = self.player();
        let sweeper = guard::acting_unit_of(state, player, self.unit, UnitType::Sweeper)?;
        if !state.players[player].is_variant(UnitType::Sweeper, Branch::A, Variant::Second) {
            return Err(RejectReason::EvolutionLocked);
        }
        let towers = Self::towers(state, player);
        let in_blast = state
            .mines
            .iter()
            .any(|m| m.owner != player && towers.iter().any(|t| t.chebyshev(m.position) <= 1));
        if !in_blast {
            return Err(RejectReason::NoMine);
        }
        let cost = with_surcharge(sweeper, GameConfig::DETONATE_COST);
        guard::ensure_energy(state, env.config(), sweeper, cost)
    }

    /// Returns the number of mines destroyed.
    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<usize, Self::Error> {
        let player = self.player();
        let cost = state
            .unit(self.unit)
            .map(|u| with_surcharge(u, GameConfig::DETONATE_COST))
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        guard::charge(state, self.unit, cost)?;

        let towers = Self::towers(state, player);
        let covered = |pos: Position| towers.iter().any(|t| t.chebyshev(pos) <= 1);

        let blasted: Vec<_> = state
            .mines
            .iter()
            .filter(|m| m.owner != player && covered(m.position))
            .map(|m| m.id)
            .collect();
        for id in &blasted {
            effects::remove_mine(state, *id);
        }

        let hits: Vec<(UnitId, u32)> = state.players[player.opponent()]
            .living()
            .filter(|u| covered(u.position))
            .map(|u| (u.id, apply_flag_aura(state, u, GameConfig::TOWER_DETONATE_DAMAGE)))
            .collect();
        for (id, damage) in hits {
            let entry = state
                .entry("log_attack_hit", LogKind::Combat)
                .owned_by(player)
                .with("attacker", self.unit.to_string())
                .with("target", id.to_string())
                .with("dmg", damage);
            state.log(entry);
            effects::damage_unit(state, id, damage, Some(player));
        }

        let now = env.now_ms();
        for tower in &towers {
            state.push_vfx(VfxKind::Explosion, *tower, VfxSize::Large, now);
        }
        state
            .buildings
            .retain(|b| !(b.owner == player && b.kind == BuildingKind::Tower));

        let cell = state.unit(self.unit).map(|u| u.position).unwrap_or_default();
        let entry = state
            .entry("log_evol_swp_detonate", LogKind::Mine)
            .owned_by(player)
            .with("r", cell.r)
            .with("c", cell.c)
            .with("mines", blasted.len() as u32);
        state.log(entry);
        guard::mark_acted(state, self.unit)?;
        Ok(blasted.len())
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::testing::{action_state, run};
    use crate::state::{Mine, MineType};

    fn sweeper_a(state: &mut GameState, level: u8, variant: Option<Variant>) {
        state
            .players
            .p1
            .evolution
            .set(UnitType::Sweeper, Branch::A, level, variant);
    }

    #[test]
    fn tower_needs_evolution_and_expires_at_level_one() {
        let mut state = action_state(51);
        let sweeper = UnitId::new(PlayerId::P1, UnitType::Sweeper);
        let build = PlaceBuildingAction::new(sweeper, BuildingKind::Tower);
        assert_eq!(run(&build, &mut state), Err(RejectReason::EvolutionLocked));

        sweeper_a(&mut state, 1, None);
        assert!(run(&build, &mut state).is_ok());
        let tower = &state.buildings[0];
        assert_eq!(tower.position, Position::new(1, 2));
        assert_eq!((tower.level, tower.duration), (1, Some(2)));
        assert_eq!(state.players.p1.energy, 44);
        assert!(state.unit(sweeper).unwrap().has_acted);
    }

    #[test]
    fn tower_at_limit_replaces_the_oldest() {
        let mut state = action_state(51);
        let sweeper = UnitId::new(PlayerId::P1, UnitType::Sweeper);
        sweeper_a(&mut state, 2, None);
        let old = state.allocate_building_id();
        state.buildings.push(Building {
            id: old,
            owner: PlayerId::P1,
            kind: BuildingKind::Tower,
            position: Position::new(0, 0),
            level: 2,
            variant: None,
            duration: None,
        });
        assert!(run(&PlaceBuildingAction::new(sweeper, BuildingKind::Tower), &mut state).is_ok());
        assert_eq!(state.buildings.len(), 1);
        assert_ne!(state.buildings[0].id, old);
    }

    #[test]
    fn second_hub_is_rejected() {
        let mut state = action_state(51);
        let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);
        state
            .players
            .p1
            .evolution
            .set(UnitType::Ranger, Branch::A, 1, None);
        let hub = state.allocate_building_id();
        state.buildings.push(Building {
            id: hub,
            owner: PlayerId::P1,
            kind: BuildingKind::Hub,
            position: Position::new(0, 0),
            level: 1,
            variant: None,
            duration: None,
        });
        assert_eq!(
            run(&PlaceBuildingAction::new(ranger, BuildingKind::Hub), &mut state),
            Err(RejectReason::MaxBuildings)
        );
    }

    #[test]
    fn detonation_clears_mines_and_towers() {
        let mut state = action_state(51);
        let sweeper = UnitId::new(PlayerId::P1, UnitType::Sweeper);
        let enemy = UnitId::new(PlayerId::P2, UnitType::Ranger);
        sweeper_a(&mut state, 3, Some(Variant::Second));
        let tower = state.allocate_building_id();
        state.buildings.push(Building {
            id: tower,
            owner: PlayerId::P1,
            kind: BuildingKind::Tower,
            position: Position::new(3, 4),
            level: 3,
            variant: Some(Variant::Second),
            duration: None,
        });
        let detonate = DetonateTowerAction { unit: sweeper };
        assert_eq!(run(&detonate, &mut state), Err(RejectReason::NoMine));

        let id = state.allocate_mine_id();
        state
            .mines
            .push(Mine::new(id, PlayerId::P2, MineType::Normal, Position::new(2, 5)));
        if let Some(u) = state.unit_mut(enemy) {
            u.position = Position::new(3, 5);
        }
        assert_eq!(run(&detonate, &mut state), Ok(1));
        assert!(state.mines.is_empty());
        assert!(state.buildings.is_empty());
        assert_eq!(state.unit(enemy).map(|u| u.hp), Some(13));
    }
}
