//! Failures of [`GameEngine::execute`](super::GameEngine::execute).

use std::fmt;

use crate::action::{ActionTag, RejectReason};
use crate::error::{ErrorContext, ErrorSeverity, GameError};

/// Step of an action's transition that refused it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionPhase {
    PreValidate,
    Apply,
    PostValidate,
}

impl TransitionPhase {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// A rule error tagged with the step that raised it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionPhaseError<E> {
    pub phase: TransitionPhase,
    pub error: E,
}

impl<E> TransitionPhaseError<E> {
    pub fn new(phase: TransitionPhase, error: E) -> Self {
        Self { phase, error }
    }
}

impl<E: fmt::Display> fmt::Display for TransitionPhaseError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.phase.as_str())
    }
}

impl<E: fmt::Display + fmt::Debug> std::error::Error for TransitionPhaseError<E> {}

/// An action the engine refused. The state is unchanged apart from the
/// rejection log entry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecuteError {
    #[error("{action} rejected at turn {}: {error}", context.turn)]
    Rejected {
        action: ActionTag,
        error: TransitionPhaseError<RejectReason>,
        context: ErrorContext,
    },
}

impl ExecuteError {
    pub fn rejected(
        action: ActionTag,
        error: TransitionPhaseError<RejectReason>,
        context: ErrorContext,
    ) -> Self {
        Self::Rejected {
            action,
            error,
            context,
        }
    }

    /// The rule that refused the action.
    pub fn reason(&self) -> &RejectReason {
        match self {
            Self::Rejected { error, .. } => &error.error,
        }
    }

    pub fn phase(&self) -> TransitionPhase {
        match self {
            Self::Rejected { error, .. } => error.phase,
        }
    }
}

impl GameError for ExecuteError {
    fn severity(&self) -> ErrorSeverity {
        self.reason().severity()
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Rejected { context, .. } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        self.reason().error_code()
    }
}
