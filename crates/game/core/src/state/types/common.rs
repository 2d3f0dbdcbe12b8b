use std::fmt;

use crate::config::GameConfig;

/// One of the two sides of a match.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayerId {
    P1,
    P2,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::P1, PlayerId::P2];

    pub const fn opponent(self) -> Self {
        match self {
            PlayerId::P1 => PlayerId::P2,
            PlayerId::P2 => PlayerId::P1,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            PlayerId::P1 => 0,
            PlayerId::P2 => 1,
        }
    }

    /// Cell holding this player's flag at match start.
    pub const fn flag_base(self) -> Position {
        match self {
            PlayerId::P1 => Position::new(3, 0),
            PlayerId::P2 => Position::new(3, GameConfig::GRID_COLS - 1),
        }
    }

    /// True if `pos` lies in this player's half of the board.
    pub const fn owns_column(self, c: i32) -> bool {
        match self {
            PlayerId::P1 => c < GameConfig::MIDLINE_COL,
            PlayerId::P2 => c >= GameConfig::MIDLINE_COL,
        }
    }

    /// Mirrors a P1-relative column onto this player's side.
    pub const fn mirror_col(self, c: i32) -> i32 {
        match self {
            PlayerId::P1 => c,
            PlayerId::P2 => GameConfig::GRID_COLS - 1 - c,
        }
    }
}

/// Discrete grid position as (row, column).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub r: i32,
    pub c: i32,
}

impl Position {
    pub const fn new(r: i32, c: i32) -> Self {
        Self { r, c }
    }

    pub const fn in_bounds(self) -> bool {
        self.r >= 0 && self.r < GameConfig::GRID_ROWS && self.c >= 0 && self.c < GameConfig::GRID_COLS
    }

    pub const fn manhattan(self, other: Position) -> i32 {
        (self.r - other.r).abs() + (self.c - other.c).abs()
    }

    pub const fn chebyshev(self, other: Position) -> i32 {
        let dr = (self.r - other.r).abs();
        let dc = (self.c - other.c).abs();
        if dr > dc { dr } else { dc }
    }

    /// Same row or same column, excluding the cell itself.
    pub const fn is_cardinal_to(self, other: Position) -> bool {
        (self.r == other.r) != (self.c == other.c)
    }

    pub const fn offset(self, dr: i32, dc: i32) -> Self {
        Self::new(self.r + dr, self.c + dc)
    }

    /// The four orthogonal neighbours that are on the board.
    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        CARDINALS
            .into_iter()
            .map(move |(dr, dc)| self.offset(dr, dc))
            .filter(|p| p.in_bounds())
    }

    /// All in-bounds cells within Chebyshev `radius`, including the centre.
    pub fn square(self, radius: i32) -> impl Iterator<Item = Position> {
        (-radius..=radius)
            .flat_map(move |dr| (-radius..=radius).map(move |dc| self.offset(dr, dc)))
            .filter(|p| p.in_bounds())
    }

    /// All in-bounds cells within Manhattan `radius`, including the centre.
    pub fn diamond(self, radius: i32) -> impl Iterator<Item = Position> {
        self.square(radius)
            .filter(move |p| p.manhattan(self) <= radius)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.r, self.c)
    }
}

pub const CARDINALS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Top-level match phase.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Phase {
    Placement,
    Thinking,
    Action,
}

/// Evolution branch of a unit type.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Branch {
    A,
    B,
}

/// Level-3 specialisation. Serialized as `1` / `2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum Variant {
    First,
    Second,
}

impl Variant {
    pub const fn number(self) -> u8 {
        match self {
            Variant::First => 1,
            Variant::Second => 2,
        }
    }

    pub const fn from_number(value: u8) -> Option<Self> {
        match value {
            1 => Some(Variant::First),
            2 => Some(Variant::Second),
            _ => None,
        }
    }
}

impl From<Variant> for u8 {
    fn from(value: Variant) -> Self {
        value.number()
    }
}

impl TryFrom<u8> for Variant {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Variant::from_number(value).ok_or_else(|| format!("variant must be 1 or 2, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        let a = Position::new(3, 5);
        assert_eq!(a.manhattan(Position::new(4, 7)), 3);
        assert_eq!(a.chebyshev(Position::new(4, 7)), 2);
        assert!(a.is_cardinal_to(Position::new(3, 7)));
        assert!(!a.is_cardinal_to(Position::new(4, 6)));
        assert!(!a.is_cardinal_to(a));
    }

    #[test]
    fn square_clips_at_edges() {
        assert_eq!(Position::new(0, 0).square(1).count(), 4);
        assert_eq!(Position::new(3, 5).square(1).count(), 9);
        assert_eq!(Position::new(3, 5).diamond(2).count(), 13);
    }

    #[test]
    fn halves_and_bases() {
        assert!(PlayerId::P1.owns_column(11));
        assert!(!PlayerId::P1.owns_column(12));
        assert_eq!(PlayerId::P2.flag_base(), Position::new(3, 23));
        assert_eq!(PlayerId::P2.mirror_col(1), 22);
        assert_eq!("p2".parse::<PlayerId>().ok(), Some(PlayerId::P2));
    }
}
