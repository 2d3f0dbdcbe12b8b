use std::fmt;
use std::str::FromStr;

use crate::config::GameConfig;

use super::common::{PlayerId, Position};
use super::mine::Mine;

/// The five roster slots. Every player fields exactly one of each.
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
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum UnitType {
    General,
    #[strum(to_string = "MINESWEEPER", serialize = "SWEEPER")]
    #[cfg_attr(feature = "serde", serde(rename = "MINESWEEPER"))]
    Sweeper,
    Ranger,
    Maker,
    Defuser,
}

impl UnitType {
    pub const ALL: [UnitType; 5] = [
        UnitType::General,
        UnitType::Sweeper,
        UnitType::Ranger,
        UnitType::Maker,
        UnitType::Defuser,
    ];

    pub const fn index(self) -> usize {
        match self {
            UnitType::General => 0,
            UnitType::Sweeper => 1,
            UnitType::Ranger => 2,
            UnitType::Maker => 3,
            UnitType::Defuser => 4,
        }
    }

    const fn slug(self) -> &'static str {
        match self {
            UnitType::General => "general",
            UnitType::Sweeper => "sweeper",
            UnitType::Ranger => "ranger",
            UnitType::Maker => "maker",
            UnitType::Defuser => "defuser",
        }
    }

    /// P1-relative spawn slot. P2 mirrors the column.
    pub const fn spawn_slot(self) -> Position {
        match self {
            UnitType::General => Position::new(3, 1),
            UnitType::Sweeper => Position::new(1, 2),
            UnitType::Ranger => Position::new(5, 2),
            UnitType::Maker => Position::new(2, 3),
            UnitType::Defuser => Position::new(4, 3),
        }
    }
}

/// Stable unit identifier, rendered as `p1-general`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct UnitId {
    pub owner: PlayerId,
    pub kind: UnitType,
}

impl UnitId {
    pub const fn new(owner: PlayerId, kind: UnitType) -> Self {
        Self { owner, kind }
    }

    /// Compact number used when deriving RNG seeds.
    pub const fn seed_index(self) -> u32 {
        (self.owner.index() * GameConfig::ROSTER_SIZE + self.kind.index()) as u32
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = match self.owner {
            PlayerId::P1 => "p1",
            PlayerId::P2 => "p2",
        };
        write!(f, "{owner}-{}", self.kind.slug())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed unit id `{0}`")]
pub struct ParseUnitIdError(pub String);

impl FromStr for UnitId {
    type Err = ParseUnitIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, kind) = s
            .split_once('-')
            .ok_or_else(|| ParseUnitIdError(s.to_string()))?;
        let owner = owner
            .parse::<PlayerId>()
            .map_err(|_| ParseUnitIdError(s.to_string()))?;
        let kind = kind
            .parse::<UnitType>()
            .map_err(|_| ParseUnitIdError(s.to_string()))?;
        Ok(Self { owner, kind })
    }
}

impl From<UnitId> for String {
    fn from(value: UnitId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for UnitId {
    type Error = ParseUnitIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Temporary modifiers on a unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitStatus {
    pub move_cost_debuff: u32,
    pub debuff_duration: u32,
    /// Extra damage taken from mines, capped at 2.
    pub mine_vulnerability: u32,
    pub stealthed: bool,
}

impl UnitStatus {
    /// Applies a move debuff, keeping the stronger magnitude and longer duration.
    pub fn apply_debuff(&mut self, magnitude: u32, duration: u32) {
        self.move_cost_debuff = self.move_cost_debuff.max(magnitude);
        self.debuff_duration = self.debuff_duration.max(duration);
    }
}

/// A single unit on the roster.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    pub id: UnitId,
    pub position: Position,
    pub hp: u32,
    pub max_hp: u32,
    pub has_acted: bool,
    pub is_dead: bool,
    pub respawn_timer: u32,
    pub has_flag: bool,
    /// Mine lifted off the grid by a Ranger.
    pub carried_mine: Option<Mine>,
    pub status: UnitStatus,
    /// Player energy when this unit's current opportunity began.
    pub start_of_action_energy: u32,
    pub energy_used_this_turn: u32,
    pub moved_this_turn: bool,
    /// Cell left by the most recent move, cleared at round end.
    pub last_from: Option<Position>,
    pub spawn: Position,
}

impl Unit {
    pub fn new(id: UnitId, spawn: Position) -> Self {
        let max_hp = GameConfig::unit_profile(id.kind).max_hp;
        Self {
            id,
            position: spawn,
            hp: max_hp,
            max_hp,
            has_acted: false,
            is_dead: false,
            respawn_timer: 0,
            has_flag: false,
            carried_mine: None,
            status: UnitStatus::default(),
            start_of_action_energy: 0,
            energy_used_this_turn: 0,
            moved_this_turn: false,
            last_from: None,
            spawn,
        }
    }

    #[inline]
    pub fn owner(&self) -> PlayerId {
        self.id.owner
    }

    #[inline]
    pub fn kind(&self) -> UnitType {
        self.id.kind
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Living and still holding its action this round.
    #[inline]
    pub fn can_act(&self) -> bool {
        !self.is_dead && !self.has_acted
    }

    pub fn is_below_half(&self) -> bool {
        self.hp * 2 < self.max_hp
    }

    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.is_dead {
            return 0;
        }
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// Remaining spend allowance under the energy cap.
    pub fn cap_remaining(&self, config: &GameConfig) -> u32 {
        config
            .energy_cap(self.start_of_action_energy)
            .saturating_sub(self.energy_used_this_turn)
    }

    /// Restores the unit at `position` with full health and a clean status.
    pub fn resurrect(&mut self, position: Position) {
        self.position = position;
        self.hp = self.max_hp;
        self.is_dead = false;
        self.respawn_timer = 0;
        self.has_flag = false;
        self.carried_mine = None;
        self.status = UnitStatus::default();
        self.energy_used_this_turn = 0;
        self.moved_this_turn = false;
        self.last_from = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_id_text_form() {
        let id = UnitId::new(PlayerId::P2, UnitType::Sweeper);
        assert_eq!(id.to_string(), "p2-sweeper");
        assert_eq!("p2-sweeper".parse::<UnitId>(), Ok(id));
        assert!("p3-general".parse::<UnitId>().is_err());
        assert!("general".parse::<UnitId>().is_err());
    }

    #[test]
    fn unit_type_accepts_both_sweeper_names() {
        assert_eq!("MINESWEEPER".parse::<UnitType>().ok(), Some(UnitType::Sweeper));
        assert_eq!("sweeper".parse::<UnitType>().ok(), Some(UnitType::Sweeper));
        assert_eq!(UnitType::Sweeper.to_string(), "MINESWEEPER");
    }

    #[test]
    fn heal_clamps_to_max() {
        let mut unit = Unit::new(UnitId::new(PlayerId::P1, UnitType::Maker), Position::new(2, 3));
        unit.hp = 10;
        assert_eq!(unit.heal(5), 2);
        assert_eq!(unit.hp, 12);
    }
}
