use std::fmt;
use std::str::FromStr;

use super::common::{PlayerId, Position};
use super::unit::UnitId;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum MineType {
    Normal,
    Slow,
    Smoke,
    Nuke,
    Chain,
}

/// Monotonic mine identifier, rendered as `m-<n>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct MineId(pub u32);

impl fmt::Display for MineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m-{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed mine id `{0}`")]
pub struct ParseMineIdError(pub String);

impl FromStr for MineId {
    type Err = ParseMineIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("m-")
            .and_then(|n| n.parse().ok())
            .map(MineId)
            .ok_or_else(|| ParseMineIdError(s.to_string()))
    }
}

impl From<MineId> for String {
    fn from(value: MineId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for MineId {
    type Error = ParseMineIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mine {
    pub id: MineId,
    pub owner: PlayerId,
    pub kind: MineType,
    pub position: Position,
    /// Players who can currently see this mine. The owner always can,
    /// whether or not it appears here.
    pub revealed_to: Vec<PlayerId>,
    /// Units standing on the cell at placement. They do not trigger it until
    /// they step off.
    pub immune_units: Vec<UnitId>,
    pub converted: bool,
}

impl Mine {
    pub fn new(id: MineId, owner: PlayerId, kind: MineType, position: Position) -> Self {
        Self {
            id,
            owner,
            kind,
            position,
            revealed_to: vec![owner],
            immune_units: Vec::new(),
            converted: false,
        }
    }

    pub fn is_visible_to(&self, viewer: PlayerId) -> bool {
        self.owner == viewer || self.revealed_to.contains(&viewer)
    }

    /// Adds `viewer` to the reveal list. Returns true if it was not there yet.
    pub fn reveal_to(&mut self, viewer: PlayerId) -> bool {
        if self.revealed_to.contains(&viewer) {
            return false;
        }
        self.revealed_to.push(viewer);
        true
    }
}
