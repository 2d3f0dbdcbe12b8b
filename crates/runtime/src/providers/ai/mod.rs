//! Utility-based AI for Minefront.
//!
//! The AI plays one side of a match through the same [`Action`] surface as a
//! human, and every candidate it proposes is checked against the rules before
//! it is scored. Decisions run as a short pipeline:
//!
//! 1. **Planning context**: derive the turn intent, build the threat map, fix
//!    the energy reserve, assign unit roles and detect opening or endgame
//!    - Examples: "push the flag", "hunt the carrier", "hold and stabilise"
//!
//! 2. **Unit selection**: score every unit that may still act and pick the
//!    best, unless a unit is already mid-action
//!
//! 3. **Candidate generation**: propose concrete actions per family (move,
//!    attack, scan, mines, buildings, evolution, flag) and keep the valid ones
//!
//! 4. **Evaluation and selection**: weight the score components by difficulty
//!    and profile, then take the best candidate that keeps the reserve
//!
//! # Core Components
//!
//! - [`AiProvider`]: implements [`crate::api::ActionProvider`]
//! - [`PlanningContext`]: per-decision view shared by every scorer
//! - [`OpponentModel`]: decaying estimate of what the opponent is doing
//! - [`Difficulty`] and [`TuningProfile`]: the two knobs exposed to players
//!
//! [`Action`]: minefront_core::Action

pub mod context;
pub mod endgame;
pub mod generator;
pub mod opening;
pub mod opponent;
pub mod provider;
pub mod roles;
pub mod scoring;
pub mod types;

pub use context::{PlanningContext, ThreatMap};
pub use opponent::OpponentModel;
pub use provider::AiProvider;
pub use types::{
    Candidate, CandidateKind, Difficulty, EndgameMode, Intent, OpeningPlan, Role, ScoreBreakdown,
    TuningProfile,
};
