//! Per-unit toggles and the evolution tree.

use crate::action::{ActionTransition, RejectReason, effects, guard};
use crate::config::GameConfig;
use crate::env::GameEnv;
use crate::resolution::with_surcharge;
use crate::state::{
    Branch, BranchLevel, GameState, LogKind, Phase, PlayerId, UnitId, UnitType, Variant,
};

/// Ranger b2+ stealth. Activation costs energy, deactivation is free.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StealthAction {
    pub unit: UnitId,
    pub active: bool,
}

impl StealthAction {
    fn cost(&self, state: &GameState) -> u32 {
        match state.unit(self.unit) {
            Some(unit) if self.active => with_surcharge(unit, GameConfig::STEALTH_COST),
            _ => 0,
        }
    }
}

impl ActionTransition for StealthAction {
    type Error = RejectReason;
    type Result = ();

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let ranger = guard::acting_unit_of(state, self.player(), self.unit, UnitType::Ranger)?;
        if state.players[self.player()].level(UnitType::Ranger, Branch::B) < 2 {
            return Err(RejectReason::EvolutionLocked);
        }
        if ranger.status.stealthed == self.active {
            return Err(RejectReason::InvalidTarget);
        }
        guard::ensure_energy(state, env.config(), ranger, self.cost(state))
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        guard::charge(state, self.unit, self.cost(state))?;
        let ranger = state
            .unit_mut(self.unit)
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        ranger.status.stealthed = self.active;
        if self.active {
            let entry = state
                .entry("log_stealth_activated", LogKind::Move)
                .owned_by(self.player())
                .with("unit", self.unit.to_string());
            state.log(entry);
        }
        Ok(())
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Raises one evolution branch by a level.
///
/// Both gates are checked against the live state at execution time: the
/// quest counter for the branch and the energy price of the current level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolveAction {
    pub player: PlayerId,
    pub unit_type: UnitType,
    pub branch: Branch,
    pub variant: Option<Variant>,
}

impl EvolveAction {
    pub fn new(player: PlayerId, unit_type: UnitType, branch: Branch) -> Self {
        Self {
            player,
            unit_type,
            branch,
            variant: None,
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }

    fn track(&self, state: &GameState) -> BranchLevel {
        *state.players[self.player]
            .evolution
            .get(self.unit_type)
            .branch(self.branch)
    }

    /// Price of the next level, or the first failing gate.
    fn price(&self, state: &GameState) -> Result<u32, RejectReason> {
        let level = self.track(state).level;
        let (Some(cost), Some(required)) = (
            GameConfig::evolution_cost(level),
            GameConfig::evolution_threshold(self.unit_type, self.branch == Branch::B, level),
        ) else {
            return Err(RejectReason::MaxLevel);
        };
        if level + 1 == GameConfig::MAX_EVOLUTION_LEVEL && self.variant.is_none() {
            return Err(RejectReason::VariantRequired);
        }
        let progress = state.players[self.player]
            .quest
            .progress(self.unit_type, self.branch);
        if progress < required {
            return Err(RejectReason::QuestIncomplete { progress, required });
        }
        Ok(cost)
    }
}

impl ActionTransition for EvolveAction {
    type Error = RejectReason;
    type Result = u8;

    fn player(&self) -> PlayerId {
        self.player
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        guard::ensure_turn(state, self.player, Phase::Action)?;
        let cost = self.price(state)?;
        if state.players[self.player].energy < cost {
            return Err(RejectReason::LowEnergy { cost });
        }
        Ok(())
    }

    /// Returns the new level.
    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<u8, Self::Error> {
        let cost = self.price(state)?;
        let track = self.track(state);
        let level = track.level + 1;
        let variant = if level == GameConfig::MAX_EVOLUTION_LEVEL {
            self.variant
        } else {
            track.variant
        };

        let side = state.player_mut(self.player);
        side.energy = side
            .energy
            .checked_sub(cost)
            .ok_or(RejectReason::LowEnergy { cost })?;
        side.evolution
            .set(self.unit_type, self.branch, level, variant);

        let mut entry = state
            .entry("log_evolved", LogKind::Evolution)
            .owned_by(self.player)
            .with("unitType", self.unit_type.as_ref())
            .with("branch", self.branch.as_ref())
            .with("level", level);
        if let Some(variant) = variant.filter(|_| level == GameConfig::MAX_EVOLUTION_LEVEL) {
            entry = entry.with("variant", variant.number());
        }
        state.log(entry);
        tracing::debug!(player = %self.player, unit = %self.unit_type, branch = %self.branch, level, "evolved");
        Ok(level)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::testing::{action_state, run};

    #[test]
    fn evolution_checks_quest_then_energy() {
        let mut state = action_state(71);
        let evolve = EvolveAction::new(PlayerId::P1, UnitType::Maker, Branch::B);
        assert_eq!(
            run(&evolve, &mut state),
            Err(RejectReason::QuestIncomplete { progress: 0, required: 3 })
        );

        state.players.p1.quest.maker_mines_placed = 3;
        state.players.p1.energy = 9;
        assert_eq!(run(&evolve, &mut state), Err(RejectReason::LowEnergy { cost: 10 }));

        state.players.p1.energy = 30;
        assert_eq!(run(&evolve, &mut state), Ok(1));
        assert_eq!(state.players.p1.energy, 20);
        assert_eq!(state.players.p1.level(UnitType::Maker, Branch::B), 1);
        assert!(state.logs.contains_key("log_evolved"));
    }

    #[test]
    fn third_level_needs_a_variant() {
        let mut state = action_state(71);
        state
            .players
            .p1
            .evolution
            .set(UnitType::General, Branch::A, 2, None);
        state.players.p1.quest.general_damage = 20;
        let evolve = EvolveAction::new(PlayerId::P1, UnitType::General, Branch::A);
        assert_eq!(run(&evolve, &mut state), Err(RejectReason::VariantRequired));

        let evolve = evolve.with_variant(Variant::Second);
        assert_eq!(run(&evolve, &mut state), Ok(3));
        assert!(state.players.p1.is_variant(UnitType::General, Branch::A, Variant::Second));
        assert_eq!(run(&evolve, &mut state), Err(RejectReason::MaxLevel));
    }

    #[test]
    fn stealth_costs_only_to_activate() {
        let mut state = action_state(71);
        let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);
        let on = StealthAction { unit: ranger, active: true };
        assert_eq!(run(&on, &mut state), Err(RejectReason::EvolutionLocked));

        state
            .players
            .p1
            .evolution
            .set(UnitType::Ranger, Branch::B, 2, None);
        assert!(run(&on, &mut state).is_ok());
        assert_eq!(state.players.p1.energy, 47);
        assert!(state.unit(ranger).unwrap().status.stealthed);

        assert!(run(&StealthAction { unit: ranger, active: false }, &mut state).is_ok());
        assert_eq!(state.players.p1.energy, 47);
    }
}
