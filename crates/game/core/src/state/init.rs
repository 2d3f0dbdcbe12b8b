//! Match setup.
use crate::config::GameConfig;
use crate::env::{PcgRng, RngOracle, compute_seed, draw};

use super::types::{Board, Phase, PlayerId, Players, Position, UnitType};
use super::{GameState, LogHistory, LogKind};

/// Upper bound on obstacle draws; a full board simply keeps fewer obstacles.
const MAX_OBSTACLE_DRAWS: u32 = 256;

impl GameState {
    /// New match with the default configuration and the PCG oracle.
    pub fn new(game_seed: u64) -> Self {
        Self::with_config(game_seed, &GameConfig::default(), &PcgRng)
    }

    /// New match in the placement phase, turn 1, P1 to move.
    ///
    /// Obstacles are drawn from `rng`, so the same seed always yields the same
    /// board.
    pub fn with_config(game_seed: u64, config: &GameConfig, rng: &dyn RngOracle) -> Self {
        let mut state = Self {
            game_seed,
            nonce: 0,
            turn: 1,
            phase: Phase::Placement,
            players: Players::new(config.initial_energy),
            board: Board::new(),
            mines: Vec::new(),
            buildings: Vec::new(),
            smokes: Vec::new(),
            current_player: PlayerId::P1,
            active_unit: None,
            logs: LogHistory::new(),
            vfx: Vec::new(),
            sensor_results: Vec::new(),
            game_over: false,
            winner: None,
            action_window: 0,
            next_mine_id: 1,
            next_building_id: 1,
        };
        state.seed_obstacles(rng);
        let entry = state.entry("log_game_start", LogKind::Info);
        state.log(entry);
        state
    }

    fn seed_obstacles(&mut self, rng: &dyn RngOracle) {
        let (min_c, max_c) = GameConfig::CONTESTED_COLS;
        let mut placed = 0;
        let mut attempt = 0;
        while placed < GameConfig::OBSTACLE_COUNT && attempt < MAX_OBSTACLE_DRAWS {
            let seed = compute_seed(self.game_seed, 0, attempt, draw::OBSTACLE);
            let r = rng.range(seed, 0, (GameConfig::GRID_ROWS - 1) as u32) as i32;
            let c = rng.range(seed.rotate_left(17), min_c as u32, max_c as u32) as i32;
            attempt += 1;

            let pos = Position::new(r, c);
            if !Self::may_hold_obstacle(pos) || self.board.is_obstacle(pos) {
                continue;
            }
            self.board.set_obstacle(pos, true);
            placed += 1;
        }
    }

    /// Row 3 stays open as the central lane; bases and spawn slots stay clear.
    fn may_hold_obstacle(pos: Position) -> bool {
        if pos.r == 3 {
            return false;
        }
        let reserved = PlayerId::ALL.into_iter().any(|player| {
            player.flag_base() == pos
                || UnitType::ALL.into_iter().any(|kind| {
                    let slot = kind.spawn_slot();
                    Position::new(slot.r, player.mirror_col(slot.c)) == pos
                })
        });
        !reserved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_match_shape() {
        let state = GameState::new(7);
        assert_eq!(state.phase, Phase::Placement);
        assert_eq!(state.turn, 1);
        assert_eq!(state.current_player, PlayerId::P1);
        for player in state.players.iter() {
            assert_eq!(player.energy, GameConfig::DEFAULT_INITIAL_ENERGY);
            assert_eq!(player.units.len(), GameConfig::ROSTER_SIZE);
            assert_eq!(player.flag_position, player.id.flag_base());
        }
    }

    #[test]
    fn obstacles_stay_in_contested_band() {
        for seed in 0..20 {
            let state = GameState::new(seed);
            let obstacles: Vec<_> = Board::positions()
                .filter(|p| state.board.is_obstacle(*p))
                .collect();
            assert_eq!(obstacles.len(), GameConfig::OBSTACLE_COUNT);
            for pos in obstacles {
                assert_ne!(pos.r, 3);
                assert!((6..=17).contains(&pos.c));
                assert!(!state.is_occupied(pos));
            }
        }
    }

    #[test]
    fn same_seed_same_board() {
        assert_eq!(GameState::new(42).board, GameState::new(42).board);
    }
}
