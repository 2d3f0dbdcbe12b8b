//! Match runtime for Minefront.
//!
//! This crate wires the deterministic rules of `minefront-core` to the
//! outside world: pluggable action providers, the utility AI, structural
//! validation of peer payloads and an async driver that plays a match from
//! setup to victory.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the match driver and its configuration
//! - [`api`] exposes the provider trait and error types clients depend on
//! - [`providers`] contains the AI implementation
//! - [`protocol`] checks JSON payloads before they become typed actions
pub mod api;
pub mod protocol;
pub mod providers;
pub mod runtime;

pub use api::{ActionProvider, ProviderKind, Result, RuntimeError, ScriptedActionProvider};
pub use protocol::{ActionPacket, PayloadError, ReadyPayload, StateSync, parse_action};
pub use providers::{AiProvider, Difficulty, TuningProfile};
pub use runtime::{AiSettings, MatchRunner, MatchSummary, RuntimeConfig, fallback_action};
