//! What a transition may consult besides the state: rule constants, the
//! random oracle and a clock reading from the caller. The clock only stamps
//! visual-effect descriptors; rules never depend on it.
mod rng;

pub use rng::{PcgRng, RngOracle, compute_seed, draw};

use crate::config::GameConfig;

/// Read-only facts the engine consults while applying an action.
#[derive(Clone, Copy)]
pub struct GameEnv<'a> {
    config: &'a GameConfig,
    rng: &'a dyn RngOracle,
    now_ms: u64,
}

impl<'a> GameEnv<'a> {
    pub fn new(config: &'a GameConfig, rng: &'a dyn RngOracle, now_ms: u64) -> Self {
        Self {
            config,
            rng,
            now_ms,
        }
    }

    pub fn config(&self) -> &'a GameConfig {
        self.config
    }

    pub fn rng(&self) -> &'a dyn RngOracle {
        self.rng
    }

    /// Milliseconds supplied by the caller for VFX timestamps.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

impl core::fmt::Debug for GameEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GameEnv")
            .field("config", self.config)
            .field("now_ms", &self.now_ms)
            .finish_non_exhaustive()
    }
}
