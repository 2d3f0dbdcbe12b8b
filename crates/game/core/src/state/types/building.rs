use super::common::{PlayerId, Position, Variant};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BuildingKind {
    Tower,
    Hub,
    Factory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildingId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Building {
    pub id: BuildingId,
    pub owner: PlayerId,
    pub kind: BuildingKind,
    pub position: Position,
    pub level: u8,
    pub variant: Option<Variant>,
    /// Rounds left before expiry; `None` is permanent.
    pub duration: Option<u32>,
}

impl Building {
    pub fn is_variant(&self, level: u8, variant: Variant) -> bool {
        self.level >= level && self.variant == Some(variant)
    }
}
