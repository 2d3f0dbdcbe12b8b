//! Action provider implementations.

pub mod ai;

pub use ai::{AiProvider, Difficulty, TuningProfile};
