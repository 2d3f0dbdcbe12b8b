//! Utility-based AI action provider.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use minefront_core::{
    Action, EndTurnAction, FinishPlacementAction, GameEnv, GameState, Phase, PlaceSetupMineAction,
    PlayerId, Position, ReadyAction, UnitId,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::context::PlanningContext;
use super::generator::{action_candidates, unit_candidates};
use super::opening::choose_plan;
use super::opponent::OpponentModel;
use super::scoring::selector::{best_unit, select_action};
use super::types::{Difficulty, OpeningPlan, TuningProfile};
use crate::api::{ActionProvider, ProviderKind, Result, RuntimeError};

/// Consecutive picks of the same unit in one round before the AI gives up on
/// it and ends its turn.
const MAX_ATTEMPTS_PER_UNIT: u32 = 6;

#[derive(Debug, Default)]
struct Memory {
    model: OpponentModel,
    last_seen: Option<GameState>,
    opening: Option<OpeningPlan>,
    /// Round and unit of the previous action pick.
    last_pick: Option<(u32, UnitId)>,
    attempts: u32,
}

/// Utility-based AI provider.
///
/// Each call runs the pipeline described in the [module docs](super):
///
/// 1. **Context**: intent, threat map, reserve, roles, opening and endgame
/// 2. **Unit**: the active unit, or the best-scoring unit that may still act
/// 3. **Candidates**: every rule-valid action for that unit, scored
/// 4. **Selection**: best candidate that respects the energy reserve
///
/// Placement and planning phases are handled with a small fixed policy. All
/// randomness comes from the seeded generator, so a given seed and match
/// replay the same decisions.
#[derive(Debug)]
pub struct AiProvider {
    difficulty: Difficulty,
    profile: TuningProfile,
    rng: Mutex<StdRng>,
    memory: Mutex<Memory>,
}

impl AiProvider {
    pub fn new(difficulty: Difficulty, profile: TuningProfile, seed: u64) -> Self {
        Self {
            difficulty,
            profile,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            memory: Mutex::new(Memory::default()),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> TuningProfile {
        self.profile
    }

    /// Buries setup mines on the near side of the own half, then locks in.
    fn placement(&self, player: PlayerId, state: &GameState, env: GameEnv<'_>) -> Action {
        let front = |c: i32| player.owns_column(c) && (c - player.flag_base().c).abs() >= 4;
        let mut cells: Vec<Position> = minefront_core::Board::positions()
            .filter(|p| front(p.c) && state.is_free(*p))
            .collect();
        cells.shuffle(&mut *self.rng.lock().unwrap_or_else(PoisonError::into_inner));

        cells
            .into_iter()
            .map(|target| Action::from(PlaceSetupMineAction { player, target }))
            .find(|action| action.validate(state, &env).is_ok())
            .unwrap_or_else(|| FinishPlacementAction { player }.into())
    }

    fn action_phase(
        &self,
        player: PlayerId,
        state: &GameState,
        env: GameEnv<'_>,
    ) -> Result<Action> {
        let mut guard = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
        let memory = &mut *guard;

        let plan = *memory.opening.get_or_insert_with(|| {
            choose_plan(state, self.difficulty, self.profile, &memory.model, player)
        });
        let ctx = PlanningContext::build(
            state,
            player,
            self.difficulty,
            self.profile,
            &memory.model,
            Some(plan),
        );

        let unit_id = match state.active_unit.filter(|id| id.owner == player) {
            Some(active) => Some(active),
            None => {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                let units = unit_candidates(state, env.config(), &ctx, &mut *rng);
                best_unit(&units).map(|c| c.unit)
            }
        };
        let Some(unit) = unit_id.and_then(|id| state.unit(id)) else {
            tracing::warn!(%player, "no unit left to act, ending turn");
            return Ok(EndTurnAction::new(player).into());
        };

        let pick = (state.turn, unit.id);
        if memory.last_pick == Some(pick) {
            memory.attempts += 1;
        } else {
            memory.last_pick = Some(pick);
            memory.attempts = 1;
        }
        if memory.attempts > MAX_ATTEMPTS_PER_UNIT {
            tracing::debug!(unit = %unit.id, attempts = memory.attempts, "unit keeps stalling");
            return Ok(EndTurnAction::for_unit(unit.id).into());
        }

        let candidates = action_candidates(state, env, unit, &ctx);
        let energy = state.players[player].energy;
        let choice = select_action(candidates, energy, ctx.reserve)
            .ok_or(RuntimeError::NoAction { player })?;

        tracing::debug!(
            unit = %unit.id,
            kind = %choice.kind,
            score = choice.total(),
            intent = %ctx.intent,
            reserve = ctx.reserve,
            "AI selected action"
        );
        Ok(choice.action)
    }
}

#[async_trait]
impl ActionProvider for AiProvider {
    async fn provide_action(
        &self,
        player: PlayerId,
        state: &GameState,
        env: GameEnv<'_>,
    ) -> Result<Action> {
        match state.phase {
            Phase::Placement => Ok(self.placement(player, state, env)),
            Phase::Thinking => Ok(ReadyAction { player }.into()),
            Phase::Action => self.action_phase(player, state, env),
        }
    }

    fn observe(&self, player: PlayerId, state: &GameState) {
        let mut memory = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = memory.last_seen.take() {
            memory.model.update(&prev, state, player);
        }
        memory.last_seen = Some(state.clone());
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ai
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minefront_core::{GameConfig, Mine, MineType, PcgRng};

    fn env(config: &GameConfig) -> GameEnv<'_> {
        GameEnv::new(config, &PcgRng, 0)
    }

    #[tokio::test]
    async fn placement_buries_mines_then_finishes() {
        let config = GameConfig::default();
        let mut state = GameState::new(5);
        let ai = AiProvider::new(Difficulty::Normal, TuningProfile::Balanced, 9);

        let first = ai.provide_action(PlayerId::P2, &state, env(&config)).await;
        let Ok(Action::PlaceSetupMine(setup)) = &first else {
            panic!("expected a setup mine, got {first:?}");
        };
        assert!(PlayerId::P2.owns_column(setup.target.c));

        for (r, c) in [(0, 20), (6, 20), (0, 19)] {
            let id = state.allocate_mine_id();
            state
                .mines
                .push(Mine::new(id, PlayerId::P2, MineType::Normal, Position::new(r, c)));
        }
        let next = ai.provide_action(PlayerId::P2, &state, env(&config)).await;
        assert_eq!(next.ok(), Some(FinishPlacementAction { player: PlayerId::P2 }.into()));
    }

    #[tokio::test]
    async fn thinking_confirms_ready() {
        let config = GameConfig::default();
        let mut state = GameState::new(5);
        state.phase = Phase::Thinking;
        let ai = AiProvider::new(Difficulty::Easy, TuningProfile::Aggressive, 1);
        let action = ai.provide_action(PlayerId::P1, &state, env(&config)).await;
        assert_eq!(action.ok(), Some(ReadyAction { player: PlayerId::P1 }.into()));
    }

    #[tokio::test]
    async fn action_phase_returns_a_valid_action() {
        let config = GameConfig::default();
        let mut state = GameState::new(17);
        state.phase = Phase::Action;
        for player in state.players.iter_mut() {
            player.checkpoint_energy();
        }
        let ai = AiProvider::new(Difficulty::Hard, TuningProfile::Balanced, 3);
        ai.observe(PlayerId::P1, &state);

        let action = ai
            .provide_action(PlayerId::P1, &state, env(&config))
            .await
            .unwrap_or_else(|e| panic!("no action: {e}"));
        assert_eq!(action.validate(&state, &env(&config)), Ok(()));
    }
}
