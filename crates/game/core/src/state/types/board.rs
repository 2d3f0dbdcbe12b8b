use crate::config::GameConfig;

use super::common::{PlayerId, Position};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OreSize {
    Small,
    Medium,
    Large,
}

impl OreSize {
    /// Maps a d100 roll onto the 60/30/10 size distribution.
    pub const fn from_roll(roll: u32) -> Self {
        if roll <= 60 {
            OreSize::Small
        } else if roll <= 90 {
            OreSize::Medium
        } else {
            OreSize::Large
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub obstacle: bool,
    pub flag_base: Option<PlayerId>,
    pub ore: Option<OreSize>,
}

/// Static grid plus the ore layer, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    cells: Vec<Cell>,
}

impl Board {
    /// Empty board with both flag bases marked.
    pub fn new() -> Self {
        let len = (GameConfig::GRID_ROWS * GameConfig::GRID_COLS) as usize;
        let mut board = Self {
            cells: vec![Cell::default(); len],
        };
        for player in PlayerId::ALL {
            if let Some(cell) = board.cell_mut(player.flag_base()) {
                cell.flag_base = Some(player);
            }
        }
        board
    }

    fn index(pos: Position) -> Option<usize> {
        pos.in_bounds()
            .then(|| (pos.r * GameConfig::GRID_COLS + pos.c) as usize)
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        Self::index(pos).and_then(|i| self.cells.get(i))
    }

    pub fn cell_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        Self::index(pos).and_then(|i| self.cells.get_mut(i))
    }

    /// Out-of-bounds positions count as blocked.
    pub fn is_obstacle(&self, pos: Position) -> bool {
        self.cell(pos).is_none_or(|cell| cell.obstacle)
    }

    pub fn set_obstacle(&mut self, pos: Position, obstacle: bool) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.obstacle = obstacle;
        }
    }

    pub fn ore(&self, pos: Position) -> Option<OreSize> {
        self.cell(pos).and_then(|cell| cell.ore)
    }

    pub fn set_ore(&mut self, pos: Position, ore: Option<OreSize>) {
        if let Some(cell) = self.cell_mut(pos) {
            cell.ore = ore;
        }
    }

    pub fn take_ore(&mut self, pos: Position) -> Option<OreSize> {
        self.cell_mut(pos).and_then(|cell| cell.ore.take())
    }

    pub fn is_flag_base(&self, pos: Position) -> bool {
        self.cell(pos).is_some_and(|cell| cell.flag_base.is_some())
    }

    pub fn positions() -> impl Iterator<Item = Position> {
        (0..GameConfig::GRID_ROWS)
            .flat_map(|r| (0..GameConfig::GRID_COLS).map(move |c| Position::new(r, c)))
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bases_marked_and_bounds_blocked() {
        let board = Board::new();
        assert!(board.is_flag_base(Position::new(3, 0)));
        assert!(board.is_flag_base(Position::new(3, 23)));
        assert!(board.is_obstacle(Position::new(-1, 0)));
        assert!(!board.is_obstacle(Position::new(0, 0)));
    }

    #[test]
    fn ore_roll_distribution_edges() {
        assert_eq!(OreSize::from_roll(60), OreSize::Small);
        assert_eq!(OreSize::from_roll(61), OreSize::Medium);
        assert_eq!(OreSize::from_roll(91), OreSize::Large);
    }
}
