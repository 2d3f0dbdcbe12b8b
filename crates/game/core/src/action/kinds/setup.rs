//! Placement-phase actions. Both players set up simultaneously, so these do
//! not check turn ownership.

use crate::action::{ActionTransition, RejectReason, effects, guard};
use crate::env::GameEnv;
use crate::state::{GameState, LogKind, Mine, MineId, MineType, Phase, PlayerId, Position};

fn ensure_setting_up(state: &GameState, player: PlayerId) -> Result<(), RejectReason> {
    guard::ensure_turn(state, player, Phase::Placement)?;
    if state.players[player].ready {
        return Err(RejectReason::AlreadyReady);
    }
    Ok(())
}

/// Buries a NORMAL mine in the player's own half before the match starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceSetupMineAction {
    pub player: PlayerId,
    pub target: Position,
}

impl ActionTransition for PlaceSetupMineAction {
    type Error = RejectReason;
    type Result = MineId;

    fn player(&self) -> PlayerId {
        self.player
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        ensure_setting_up(state, self.player)?;
        if !self.target.in_bounds() {
            return Err(RejectReason::OutOfBounds);
        }
        if !self.player.owns_column(self.target.c) {
            return Err(RejectReason::MineZone);
        }
        if !state.is_free(self.target) || self.target == self.player.flag_base() {
            return Err(RejectReason::Obstacle);
        }
        if state.mine_of(self.player, self.target).is_some() {
            return Err(RejectReason::SpaceHasMine);
        }
        let placed = state.mines.iter().filter(|m| m.owner == self.player).count();
        if placed >= env.config().placement_mine_limit {
            return Err(RejectReason::MineLimit);
        }
        Ok(())
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<MineId, Self::Error> {
        let id = state.allocate_mine_id();
        state
            .mines
            .push(Mine::new(id, self.player, MineType::Normal, self.target));
        Ok(id)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Locks in the player's setup and records the layout summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FinishPlacementAction {
    pub player: PlayerId,
}

impl ActionTransition for FinishPlacementAction {
    type Error = RejectReason;
    type Result = ();

    fn player(&self) -> PlayerId {
        self.player
    }

    fn pre_validate(&self, state: &GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        ensure_setting_up(state, self.player)
    }

    fn apply(&self, state: &mut GameState, _env: &GameEnv<'_>) -> Result<(), Self::Error> {
        state.player_mut(self.player).ready = true;
        upsert_placement_logs(state, self.player);
        Ok(())
    }
}

fn one_based(pos: Position) -> String {
    format!("({},{})", pos.r + 1, pos.c + 1)
}

/// Rewrites the player's placement summary. Calling it again replaces the
/// previous entries instead of stacking new ones.
pub fn upsert_placement_logs(state: &mut GameState, player: PlayerId) {
    let units = state.players[player]
        .units
        .iter()
        .map(|u| format!("{}{}", u.kind(), one_based(u.position)))
        .collect::<Vec<_>>()
        .join(", ");
    let mines = state
        .mines
        .iter()
        .filter(|m| m.owner == player)
        .map(|m| one_based(m.position))
        .collect::<Vec<_>>()
        .join(", ");

    if !units.is_empty() {
        let entry = state
            .entry("log_placement_units", LogKind::Move)
            .owned_by(player)
            .with("units", units);
        state.logs.upsert(entry);
    }
    if !mines.is_empty() {
        let entry = state
            .entry("log_placement_mines", LogKind::Move)
            .owned_by(player)
            .with("mines", mines);
        state.logs.upsert(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::kinds::testing::run;

    fn place(state: &mut GameState, r: i32, c: i32) -> Result<MineId, RejectReason> {
        run(
            &PlaceSetupMineAction {
                player: PlayerId::P1,
                target: Position::new(r, c),
            },
            state,
        )
    }

    #[test]
    fn setup_mines_stay_home_and_respect_the_limit() {
        let mut state = GameState::new(91);
        assert_eq!(place(&mut state, 0, 14), Err(RejectReason::MineZone));
        assert_eq!(place(&mut state, 3, 1), Err(RejectReason::Obstacle));
        assert!(place(&mut state, 0, 5).is_ok());
        assert_eq!(place(&mut state, 0, 5), Err(RejectReason::SpaceHasMine));
        assert!(place(&mut state, 1, 5).is_ok());
        assert!(place(&mut state, 2, 5).is_ok());
        assert_eq!(place(&mut state, 4, 5), Err(RejectReason::MineLimit));
        assert!(state.mines.iter().all(|m| m.kind == MineType::Normal));
    }

    #[test]
    fn placement_summary_is_replaced_not_duplicated() {
        let mut state = GameState::new(91);
        assert!(place(&mut state, 0, 5).is_ok());
        upsert_placement_logs(&mut state, PlayerId::P1);
        assert!(run(&FinishPlacementAction { player: PlayerId::P1 }, &mut state).is_ok());

        let summaries = state
            .logs
            .iter()
            .filter(|e| e.key == "log_placement_mines" && e.owner == Some(PlayerId::P1))
            .count();
        assert_eq!(summaries, 1);
        assert!(state.players.p1.ready);
        assert_eq!(place(&mut state, 1, 5), Err(RejectReason::AlreadyReady));
    }
}
