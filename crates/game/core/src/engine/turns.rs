use crate::action::effects;
use crate::state::{GameState, LogKind, Phase, PlayerId};

/// Hands turn ownership to the opponent, or back to `acting` when the
/// opponent has no unit left to move this round.
pub fn hand_over(state: &mut GameState, acting: PlayerId) -> PlayerId {
    let opponent = acting.opponent();
    let next = if state.players[opponent].has_pending_units() {
        opponent
    } else {
        acting
    };

    state.current_player = next;
    state.active_unit = None;
    state.action_window += 1;
    let player = state.player_mut(next);
    player.checkpoint_energy();
    player.reset_turn_counters();
    tracing::debug!(from = %acting, to = %next, window = state.action_window, "turn handed over");
    next
}

/// Placement ends once both players finished their setup.
pub fn try_enter_thinking(state: &mut GameState) -> bool {
    if state.phase != Phase::Placement || !state.players.iter().all(|p| p.ready) {
        return false;
    }
    for player in state.players.iter_mut() {
        player.ready = false;
    }
    state.phase = Phase::Thinking;
    tracing::debug!("placement finished");
    true
}

/// Opens the action phase once both players are ready: new energy-cap
/// baselines, passive radar, P1 to move.
pub fn try_enter_action(state: &mut GameState) -> bool {
    if state.phase != Phase::Thinking || !state.players.iter().all(|p| p.ready) {
        return false;
    }
    for player in state.players.iter_mut() {
        player.ready = false;
        player.checkpoint_energy();
        player.reset_turn_counters();
    }
    let revealed = effects::radar_reveal(state);

    state.phase = Phase::Action;
    state.current_player = PlayerId::P1;
    state.active_unit = None;
    state.action_window += 1;
    let entry = state.entry("log_action_phase", LogKind::Info);
    state.logs.push_once_this_turn(entry);
    tracing::debug!(turn = state.turn, revealed, "action phase");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::testing::action_state;

    #[test]
    fn ownership_alternates_while_both_sides_have_units() {
        let mut state = action_state(8);
        state.players.p2.energy = 70;
        assert_eq!(hand_over(&mut state, PlayerId::P1), PlayerId::P2);
        assert_eq!(state.current_player, PlayerId::P2);
        assert!(
            state
                .players
                .p2
                .units
                .iter()
                .all(|u| u.start_of_action_energy == 70)
        );
    }

    #[test]
    fn ownership_stays_when_opponent_is_exhausted() {
        let mut state = action_state(8);
        for unit in state.players.p2.units.iter_mut() {
            unit.has_acted = true;
        }
        let window = state.action_window;
        assert_eq!(hand_over(&mut state, PlayerId::P1), PlayerId::P1);
        assert_eq!(state.action_window, window + 1);
    }

    #[test]
    fn action_phase_waits_for_both_players() {
        let mut state = GameState::new(8);
        state.phase = Phase::Thinking;
        state.players.p1.ready = true;
        assert!(!try_enter_action(&mut state));
        state.players.p2.ready = true;
        assert!(try_enter_action(&mut state));
        assert_eq!(state.phase, Phase::Action);
        assert!(state.players.iter().all(|p| !p.ready));
        assert!(state.logs.contains_key("log_action_phase"));
    }
}
