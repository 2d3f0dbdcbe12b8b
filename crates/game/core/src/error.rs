//! Shared error vocabulary.
//!
//! Rule rejections ([`RejectReason`](crate::action::RejectReason)) and engine
//! failures ([`ExecuteError`](crate::engine::ExecuteError)) are defined where
//! they are raised. Both implement [`GameError`], which gives callers a
//! severity, a stable code and, where known, the match coordinates of the
//! failure.

use crate::state::{PlayerId, UnitId};

/// How bad a failure is, judged by what the caller can do about it.
///
/// - **Recoverable**: retry with another target, unit or amount
/// - **Validation**: the request does not fit the current phase or turn
/// - **Internal**: an invariant broke after a rule accepted the action
/// - **Fatal**: the state itself is unusable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Not enough energy, target out of range.
    Recoverable,
    /// Wrong phase, unknown unit, acting out of turn.
    Validation,
    /// Flag position out of sync with its carrier.
    Internal,
    /// Snapshot missing a player record.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Internal and fatal failures point at a bug rather than a bad request.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Where in the match an error was raised.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Accepted-action counter of the snapshot the action was checked against.
    pub nonce: u64,
    pub turn: u32,
    pub player: Option<PlayerId>,
    pub unit: Option<UnitId>,
}

impl ErrorContext {
    pub const fn new(nonce: u64, turn: u32) -> Self {
        Self {
            nonce,
            turn,
            player: None,
            unit: None,
        }
    }

    #[must_use]
    pub const fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    /// Also records the unit's owner as the player.
    #[must_use]
    pub const fn with_unit(mut self, unit: UnitId) -> Self {
        self.unit = Some(unit);
        self.player = Some(unit.owner);
        self
    }
}

/// Common surface of every minefront-core error.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Stable identifier for the failure.
    ///
    /// Rule rejections return their log key, which is also the localization
    /// key shown to the acting player.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
