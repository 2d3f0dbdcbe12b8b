//! Endgame classification.
use minefront_core::{GameState, PlayerId};

use super::types::{EndgameMode, EndgameState};

const LOW_POPULATION: usize = 5;
const LATE_TURN: u32 = 18;

/// Classifies `state` from the point of view of `ai`.
///
/// A carrier on the AI side wins over an enemy carrier: the result is
/// [`EndgameMode::Race`] even when both flags are on the move.
pub fn evaluate(state: &GameState, ai: PlayerId) -> EndgameState {
    let enemy = ai.opponent();
    let own = &state.players[ai];
    let theirs = &state.players[enemy];
    let own_alive = own.living().count();
    let enemy_alive = theirs.living().count();

    let own_carrier = own.carrier();
    let enemy_carrier = theirs.carrier();

    let low_population = own_alive + enemy_alive <= LOW_POPULATION;
    let late = state.turn >= LATE_TURN;
    let carriers = own_carrier.is_some() || enemy_carrier.is_some();

    let mut result = EndgameState {
        mode: EndgameMode::None,
        urgency: 0.0,
        own_alive,
        enemy_alive,
    };
    if !(low_population || late || carriers) {
        return result;
    }

    if let Some(carrier) = own_carrier {
        let distance = f64::from(carrier.position.manhattan(theirs.flag_position));
        let finish = if enemy_alive <= 2 { 0.45 } else { 0.0 };
        result.mode = EndgameMode::Race;
        result.urgency = (1.2 + (11.0 - distance) * 0.22 + finish).clamp(1.0, 4.2);
    } else if let Some(carrier) = enemy_carrier {
        let distance = f64::from(carrier.position.manhattan(own.flag_position));
        let thin = if own_alive <= 2 { 0.55 } else { 0.0 };
        result.mode = EndgameMode::Defense;
        result.urgency = (1.4 + (10.0 - distance) * 0.24 + thin).clamp(1.0, 4.6);
    } else {
        let thin = if low_population { 0.5 } else { 0.0 };
        result.mode = EndgameMode::Attrition;
        result.urgency = (0.9 + (f64::from(state.turn) - 14.0) * 0.12 + thin).clamp(0.9, 3.5);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use minefront_core::{UnitId, UnitType};

    fn give_flag(state: &mut GameState, id: UnitId) {
        if let Some(unit) = state.unit_mut(id) {
            unit.has_flag = true;
        }
    }

    #[test]
    fn quiet_opening_is_not_endgame() {
        let state = GameState::new(8);
        let result = evaluate(&state, PlayerId::P2);
        assert!(!result.is_endgame());
        assert_eq!(result.own_alive, 5);
    }

    #[test]
    fn race_wins_over_defense() {
        let mut state = GameState::new(8);
        give_flag(&mut state, UnitId::new(PlayerId::P1, UnitType::General));
        give_flag(&mut state, UnitId::new(PlayerId::P2, UnitType::General));
        let result = evaluate(&state, PlayerId::P2);
        assert_eq!(result.mode, EndgameMode::Race);
        assert!((1.0..=4.2).contains(&result.urgency));
    }

    #[test]
    fn enemy_carrier_means_defense() {
        let mut state = GameState::new(8);
        give_flag(&mut state, UnitId::new(PlayerId::P1, UnitType::Ranger));
        let result = evaluate(&state, PlayerId::P2);
        assert_eq!(result.mode, EndgameMode::Defense);
        assert!((1.0..=4.6).contains(&result.urgency));
    }

    #[test]
    fn late_turns_become_attrition() {
        let mut state = GameState::new(8);
        state.turn = 40;
        let result = evaluate(&state, PlayerId::P1);
        assert_eq!(result.mode, EndgameMode::Attrition);
        assert_eq!(result.urgency, 3.5);
    }
}
