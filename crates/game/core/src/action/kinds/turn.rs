//! Turn control: finishing a unit's opportunity, paid skips and the
//! planning-phase handshake.
//!
//! None of these hand turn ownership over by themselves. The engine notices a
//! unit leaving the pending pool (or a skip) and rotates the turn afterwards.

use crate::action::{ActionTransition, RejectReason, effects, guard};
use crate::config::GameConfig;
use crate::env::GameEnv;
use crate::state::{GameState, LogKind, Phase, PlayerId, UnitId};

/// Completes the active unit's opportunity, or passes with the first pending
/// unit when nothing was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndTurnAction {
    pub player: PlayerId,
    pub unit: Option<UnitId>,
}

impl EndTurnAction {
    pub fn new(player: PlayerId) -> Self {
        Self { player, unit: None }
    }

    pub fn for_unit(unit: UnitId) -> Self {
        Self {
            player: unit.owner,
            unit: Some(unit),
        }
    }

    /// Unit whose opportunity this action closes.
    pub fn resolve(&self, state: &GameState) -> Option<UnitId> {
        self.unit.or(state.active_unit).or_else(|| {
            state.players[self.player]
                .units
                .iter()
                .find(|u| u.can_act())
                .map(|u| u.id)
        })
    }
}

impl ActionTransition for EndTurnAction {
    type Error = RejectReason;
    type Result = UnitId;

    fn player(&self) -> PlayerId {
        self.player
    }

    fn actor(&self) -> Option<UnitId> {
        self.unit
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        guard::ensure_turn(state, self.player, Phase::Action)?;
        let id = self.resolve(state).ok_or(RejectReason::InvalidTarget)?;
        guard::acting_unit(state, self.player, id)?;
        Ok(())
    }

    /// Returns the unit that was marked acted.
    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<UnitId, Self::Error> {
        let id = self.resolve(state).ok_or(RejectReason::InvalidTarget)?;
        let unit = state.unit_mut(id).ok_or(RejectReason::UnitNotFound(id))?;
        let idle = !unit.moved_this_turn && unit.energy_used_this_turn == 0;
        if idle {
            unit.heal(GameConfig::PASS_HEAL);
            let entry = state
                .entry("log_pass_turn", LogKind::Move)
                .owned_by(self.player)
                .with("unit", id.kind.as_ref());
            state.log(entry);
        }
        guard::mark_acted(state, id)?;
        if state.active_unit == Some(id) {
            state.active_unit = None;
        }
        Ok(id)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Hands the turn over without spending a unit, at an escalating price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkipTurnAction {
    pub player: PlayerId,
}

impl SkipTurnAction {
    pub fn cost(state: &GameState, player: PlayerId) -> u32 {
        (state.players[player].skips_this_round + 1) * GameConfig::SKIP_COST_STEP
    }
}

impl ActionTransition for SkipTurnAction {
    type Error = RejectReason;
    type Result = u32;

    fn player(&self) -> PlayerId {
        self.player
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        guard::ensure_turn(state, self.player, Phase::Action)?;
        let cost = Self::cost(state, self.player);
        if state.players[self.player].energy < cost {
            return Err(RejectReason::LowEnergy { cost });
        }
        Ok(())
    }

    /// Returns the energy paid.
    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<u32, Self::Error> {
        let cost = Self::cost(state, self.player);
        let side = state.player_mut(self.player);
        side.energy = side
            .energy
            .checked_sub(cost)
            .ok_or(RejectReason::LowEnergy { cost })?;
        side.skips_this_round += 1;
        let skips = side.skips_this_round;

        let entry = state
            .entry("log_skip_turn", LogKind::Info)
            .owned_by(self.player)
            .with("cost", cost)
            .with("skipCount", skips);
        state.log(entry);
        Ok(cost)
    }
}

/// Confirms the planning phase for one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadyAction {
    pub player: PlayerId,
}

impl ActionTransition for ReadyAction {
    type Error = RejectReason;
    type Result = ();

    fn player(&self) -> PlayerId {
        self.player
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        guard::ensure_turn(state, self.player, Phase::Thinking)?;
        if state.players[self.player].ready {
            return Err(RejectReason::AlreadyReady);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        state.player_mut(self.player).ready = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::testing::{action_state, run};
    use crate::state::UnitType;

    #[test]
    fn idle_pass_heals_the_first_pending_unit() {
        let mut state = action_state(81);
        let general = UnitId::new(PlayerId::P1, UnitType::General);
        if let Some(u) = state.unit_mut(general) {
            u.hp = 20;
        }
        assert_eq!(run(&EndTurnAction::new(PlayerId::P1), &mut state), Ok(general));
        let unit = state.unit(general).unwrap();
        assert!(unit.has_acted);
        assert_eq!(unit.hp, 23);
        assert!(state.logs.contains_key("log_pass_turn"));
    }

    #[test]
    fn ending_after_a_spend_does_not_heal() {
        let mut state = action_state(81);
        let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);
        if let Some(u) = state.unit_mut(ranger) {
            u.hp = 10;
            u.energy_used_this_turn = 2;
        }
        state.active_unit = Some(ranger);
        assert_eq!(run(&EndTurnAction::new(PlayerId::P1), &mut state), Ok(ranger));
        assert_eq!(state.unit(ranger).map(|u| u.hp), Some(10));
        assert_eq!(state.active_unit, None);
    }

    #[test]
    fn skip_price_escalates() {
        let mut state = action_state(81);
        let skip = SkipTurnAction { player: PlayerId::P1 };
        assert_eq!(run(&skip, &mut state), Ok(10));
        assert_eq!(run(&skip, &mut state), Ok(20));
        assert_eq!(state.players.p1.energy, 20);
        assert_eq!(run(&skip, &mut state), Err(RejectReason::LowEnergy { cost: 30 }));
    }

    #[test]
    fn skip_is_charged_when_the_opponent_is_done() {
        let mut state = action_state(81);
        for unit in state.players.p2.units.iter_mut() {
            unit.has_acted = true;
        }
        assert_eq!(run(&SkipTurnAction { player: PlayerId::P1 }, &mut state), Ok(10));
        assert_eq!(state.players.p1.energy, 40);
        assert_eq!(state.players.p1.skips_this_round, 1);
    }

    #[test]
    fn ready_only_once_per_planning_phase() {
        let mut state = action_state(81);
        state.phase = Phase::Thinking;
        let ready = ReadyAction { player: PlayerId::P2 };
        assert!(run(&ready, &mut state).is_ok());
        assert_eq!(run(&ready, &mut state), Err(RejectReason::AlreadyReady));
    }
}
