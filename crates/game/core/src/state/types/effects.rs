use crate::config::GameConfig;

use super::common::{PlayerId, Position};

/// Fog field left behind by a SMOKE mine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Smoke {
    pub position: Position,
    pub owner: PlayerId,
    /// Rounds left.
    pub duration: u32,
}

impl Smoke {
    /// The field covers the 3x3 block around its centre.
    pub fn covers(&self, pos: Position) -> bool {
        self.position.chebyshev(pos) <= 1
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SensorKind {
    /// Single-cell mark left by a plain scan. Persists until the cell changes.
    Mark,
    /// Mine count around a cell. Expires at round end.
    Count,
}

/// Hint shown to the scanning player.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorResult {
    pub kind: SensorKind,
    pub owner: PlayerId,
    pub position: Position,
    pub count: u32,
    pub turn: u32,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VfxKind {
    Explosion,
    Nuke,
    Smoke,
    Slow,
    Heal,
    Shield,
    Chain,
    Scan,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum VfxSize {
    Small,
    Large,
}

/// Ephemeral visual-effect descriptor for the rendering layer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vfx {
    pub kind: VfxKind,
    pub position: Position,
    pub size: VfxSize,
    pub created_at_ms: u64,
}

impl Vfx {
    pub fn new(kind: VfxKind, position: Position, size: VfxSize, created_at_ms: u64) -> Self {
        Self {
            kind,
            position,
            size,
            created_at_ms,
        }
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > GameConfig::VFX_LIFETIME_MS
    }
}
