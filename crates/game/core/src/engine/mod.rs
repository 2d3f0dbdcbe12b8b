//! Phase scheduling and action execution pipeline.
//!
//! The [`GameEngine`] is the authoritative reducer for [`GameState`]. It runs
//! every action through the transition phases, restores the previous snapshot
//! when a rule rejects it, and afterwards advances the match: placement to
//! thinking, thinking to action, turn hand-over, and round-end maintenance.

mod errors;
mod round;
mod transition;
mod turns;

pub use errors::{ExecuteError, TransitionPhase, TransitionPhaseError};
pub use transition::ActionResult;
pub use turns::hand_over;

use crate::action::{Action, ActionTag, effects};
use crate::env::GameEnv;
use crate::error::GameError;
use crate::state::{GameState, LogKind, Phase};

/// Complete outcome of an accepted action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Action-specific execution result.
    pub result: ActionResult,
    /// Turn ownership moved (possibly back to the same player).
    pub handed_over: bool,
    /// Round-end maintenance ran after this action.
    pub round_ended: bool,
}

/// Game engine that manages action execution and phase scheduling.
///
/// All state mutations flow through the three-phase action pipeline:
/// pre_validate → apply → post_validate
///
/// A rejected action leaves the state exactly as it was, apart from one
/// player-scoped log entry naming the reason.
pub struct GameEngine<'a> {
    state: &'a mut GameState,
}

impl<'a> GameEngine<'a> {
    /// Creates a new game engine with the given state.
    pub fn new(state: &'a mut GameState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &GameState {
        self.state
    }

    /// Executes an action and advances the match if it completed a turn,
    /// a round or a phase.
    pub fn execute(
        &mut self,
        env: GameEnv<'_>,
        action: &Action,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        let snapshot = self.state.clone();

        let result = match transition::execute_transition(action, self.state, &env) {
            Ok(result) => result,
            Err(error) => {
                *self.state = snapshot;
                self.log_rejection(action, &error);
                return Err(error);
            }
        };

        self.state.nonce += 1;
        tracing::debug!(
            action = %action.tag(),
            player = %action.player(),
            nonce = self.state.nonce,
            "action applied"
        );

        let mut outcome = ExecutionOutcome {
            result,
            handed_over: false,
            round_ended: false,
        };
        if effects::check_victory(self.state) {
            return Ok(outcome);
        }

        match self.state.phase {
            Phase::Placement => {
                turns::try_enter_thinking(self.state);
            }
            Phase::Thinking => {
                turns::try_enter_action(self.state);
            }
            Phase::Action => {
                let completed = self.finished_turn(action);
                if self.state.round_complete() {
                    outcome.round_ended = round::end_round(self.state, &env);
                } else if completed {
                    turns::hand_over(self.state, action.player());
                    outcome.handed_over = true;
                }
            }
        }
        Ok(outcome)
    }

    /// Runs round-end maintenance if every unit has acted or is dead.
    ///
    /// [`GameEngine::execute`] calls this itself. A second call on the result
    /// does nothing.
    pub fn end_round(&mut self, env: GameEnv<'_>) -> bool {
        round::end_round(self.state, &env)
    }

    /// Whether `action` used up its player's opportunity. Only the acting
    /// unit counts: a teammate killed by splash leaves the turn where it is.
    fn finished_turn(&self, action: &Action) -> bool {
        match action.tag() {
            ActionTag::SkipTurn | ActionTag::EndTurn => true,
            _ => action
                .actor()
                .and_then(|id| self.state.unit(id))
                .is_some_and(|unit| !unit.can_act()),
        }
    }

    fn log_rejection(&mut self, action: &Action, error: &ExecuteError) {
        let reason = error.reason();
        let mut entry = self
            .state
            .entry(error.error_code(), LogKind::Error)
            .owned_by(action.player());
        for (name, value) in reason.log_params() {
            entry = entry.with(name, value);
        }
        self.state.log(entry);
        tracing::warn!(
            action = %action.tag(),
            player = %action.player(),
            phase = error.phase().as_str(),
            severity = error.severity().as_str(),
            "{reason}"
        );
    }
}

/// Pure variant of [`GameEngine::execute`]: returns the next snapshot
/// together with the outcome and leaves `state` untouched.
pub fn step(
    state: &GameState,
    env: GameEnv<'_>,
    action: &Action,
) -> (GameState, Result<ExecutionOutcome, ExecuteError>) {
    let mut next = state.clone();
    let outcome = GameEngine::new(&mut next).execute(env, action);
    (next, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::testing::action_state;
    use crate::action::{
        EndTurnAction, FinishPlacementAction, MoveAction, ReadyAction, RejectReason,
        SkipTurnAction,
    };
    use crate::config::GameConfig;
    use crate::env::PcgRng;
    use crate::state::{PlayerId, Position, UnitId, UnitType};

    fn run(
        state: &mut GameState,
        action: impl Into<Action>,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        let config = GameConfig::new();
        let env = GameEnv::new(&config, &PcgRng, 0);
        GameEngine::new(state).execute(env, &action.into())
    }

    #[test]
    fn rejection_restores_state_and_logs_privately() {
        let mut state = action_state(12);
        let unit = UnitId::new(PlayerId::P2, UnitType::Ranger);
        let before = state.clone();
        let action = MoveAction {
            unit,
            to: Position::new(5, 20),
            quoted_cost: None,
        };
        let err = run(&mut state, action).unwrap_err();

        assert_eq!(err.reason(), &RejectReason::NotYourTurn);
        let context = err.context().copied().unwrap_or_default();
        assert_eq!(context.unit, Some(unit));
        assert_eq!(context.player, Some(PlayerId::P2));
        assert_eq!(context.turn, before.turn);
        assert_eq!(state.nonce, before.nonce);
        assert_eq!(state.players, before.players);
        let latest = state.logs.latest().unwrap();
        assert_eq!(latest.key, "log_not_your_turn");
        assert_eq!(latest.owner, Some(PlayerId::P2));
    }

    #[test]
    fn end_turn_hands_ownership_over() {
        let mut state = action_state(12);
        let unit = UnitId::new(PlayerId::P1, UnitType::Maker);
        let outcome = run(&mut state, EndTurnAction::for_unit(unit)).unwrap();
        assert!(outcome.handed_over);
        assert_eq!(state.current_player, PlayerId::P2);
        assert_eq!(state.nonce, 1);
    }

    #[test]
    fn skip_passes_without_marking_units() {
        let mut state = action_state(12);
        let outcome = run(&mut state, SkipTurnAction { player: PlayerId::P1 }).unwrap();
        assert!(outcome.handed_over);
        assert_eq!(state.current_player, PlayerId::P2);
        assert!(state.players.p1.units.iter().all(|u| !u.has_acted));
        assert_eq!(state.players.p1.energy, 40);
    }

    #[test]
    fn skip_stays_with_the_player_when_opponent_is_done() {
        let mut state = action_state(12);
        for unit in state.players.p2.units.iter_mut() {
            unit.has_acted = true;
        }
        let outcome = run(&mut state, SkipTurnAction { player: PlayerId::P1 }).unwrap();
        assert!(outcome.handed_over);
        assert!(!outcome.round_ended);
        assert_eq!(state.current_player, PlayerId::P1);
        assert_eq!(state.players.p1.energy, 40);
    }

    #[test]
    fn setup_and_ready_walk_the_phases() {
        let mut state = GameState::new(12);
        for player in PlayerId::ALL {
            run(&mut state, FinishPlacementAction { player }).unwrap();
        }
        assert_eq!(state.phase, Phase::Thinking);
        for player in PlayerId::ALL {
            run(&mut state, ReadyAction { player }).unwrap();
        }
        assert_eq!(state.phase, Phase::Action);
        assert_eq!(state.current_player, PlayerId::P1);
    }

    #[test]
    fn last_end_turn_closes_the_round() {
        let mut state = action_state(12);
        for unit in state.players.all_units_mut() {
            if unit.id != UnitId::new(PlayerId::P1, UnitType::General) {
                unit.has_acted = true;
            }
        }
        let general = UnitId::new(PlayerId::P1, UnitType::General);
        let outcome = run(&mut state, EndTurnAction::for_unit(general)).unwrap();
        assert!(outcome.round_ended);
        assert_eq!(state.turn, 2);
        assert_eq!(state.phase, Phase::Thinking);

        let config = GameConfig::new();
        let env = GameEnv::new(&config, &PcgRng, 0);
        let energy = state.players.p1.energy;
        assert!(!GameEngine::new(&mut state).end_round(env));
        assert_eq!(state.players.p1.energy, energy);
    }

    #[test]
    fn step_leaves_the_input_alone() {
        let state = action_state(12);
        let config = GameConfig::new();
        let env = GameEnv::new(&config, &PcgRng, 0);
        let action = Action::from(SkipTurnAction { player: PlayerId::P1 });
        let (next, outcome) = step(&state, env, &action);
        assert!(outcome.is_ok());
        assert_eq!(state.nonce, 0);
        assert_eq!(next.nonce, 1);
    }
}
