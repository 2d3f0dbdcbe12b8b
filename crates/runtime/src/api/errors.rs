//! Runtime failures. Rule rejections are not errors here: the runner logs
//! them and substitutes a fallback action. Only a fallback that is itself
//! rejected surfaces, as [`RuntimeError::Stalled`].
use std::fmt;

use minefront_core::state::SnapshotError;
use minefront_core::{ExecuteError, PlayerId};
use thiserror::Error;

use crate::protocol::PayloadError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{player} has no action to offer")]
    NoAction { player: PlayerId },

    #[error("scripted provider for {player} ran out of actions")]
    ScriptExhausted { player: PlayerId },

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("match stalled: {player} could not make progress")]
    Stalled {
        player: PlayerId,
        #[source]
        source: ExecuteError,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Human,
    Ai,
    Scripted,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderKind::Human => "human",
            ProviderKind::Ai => "ai",
            ProviderKind::Scripted => "scripted",
        };
        f.write_str(label)
    }
}
