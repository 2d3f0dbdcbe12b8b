//! Headless match driver.
//!
//! [`MatchRunner`] owns the canonical [`GameState`] and one
//! [`ActionProvider`] per side. It asks whichever side the rules are waiting
//! on for an action, runs it through the engine, and keeps the providers'
//! opponent models fed after every hand-over. The clock handed to the core is
//! derived from the action counter, so a seed and two deterministic providers
//! always replay the same match.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use minefront_core::{
    Action, EndTurnAction, FinishPlacementAction, GameConfig, GameEngine, GameEnv, GameState,
    PcgRng, Phase, PlayerId, ReadyAction,
};
use tracing::Instrument;

use crate::api::{ActionProvider, Result, RuntimeError};
use crate::providers::ai::{AiProvider, Difficulty, TuningProfile};

/// Milliseconds of simulated clock per accepted action.
const MS_PER_ACTION: u64 = 100;

/// Difficulty and play style of one AI side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AiSettings {
    pub difficulty: Difficulty,
    pub profile: TuningProfile,
}

/// Runtime configuration for a headless match.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub game_config: GameConfig,
    pub seed: u64,
    pub p1: AiSettings,
    pub p2: AiSettings,
    /// The match stops undecided after this many rounds.
    pub max_rounds: u32,
    /// Provider calls allowed per round before the runner forces turn ends.
    pub max_actions_per_round: u32,
    /// Where the binary writes daily log files. `None` keeps logs on stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            seed: 0,
            p1: AiSettings::default(),
            p2: AiSettings::default(),
            max_rounds: 60,
            max_actions_per_round: 200,
            log_dir: default_log_dir(),
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `MINEFRONT_SEED` - Match seed (default: 0)
    /// - `MINEFRONT_P1_DIFFICULTY`, `MINEFRONT_P2_DIFFICULTY` - `easy|normal|hard`
    /// - `MINEFRONT_P1_PROFILE`, `MINEFRONT_P2_PROFILE` - `aggressive|balanced|conservative`
    /// - `MINEFRONT_MAX_ROUNDS` - Round limit (default: 60)
    /// - `MINEFRONT_MAX_ACTIONS` - Provider calls per round (default: 200)
    /// - `MINEFRONT_INITIAL_ENERGY` - Starting energy per side (default: 50)
    /// - `MINEFRONT_LOG_DIR` - Log directory; empty disables file logging
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(seed) = read_env::<u64>("MINEFRONT_SEED") {
            config.seed = seed;
        }
        if let Some(difficulty) = read_env("MINEFRONT_P1_DIFFICULTY") {
            config.p1.difficulty = difficulty;
        }
        if let Some(difficulty) = read_env("MINEFRONT_P2_DIFFICULTY") {
            config.p2.difficulty = difficulty;
        }
        if let Some(profile) = read_env("MINEFRONT_P1_PROFILE") {
            config.p1.profile = profile;
        }
        if let Some(profile) = read_env("MINEFRONT_P2_PROFILE") {
            config.p2.profile = profile;
        }
        if let Some(rounds) = read_env::<u32>("MINEFRONT_MAX_ROUNDS") {
            config.max_rounds = rounds.max(1);
        }
        if let Some(actions) = read_env::<u32>("MINEFRONT_MAX_ACTIONS") {
            config.max_actions_per_round = actions.max(1);
        }
        if let Some(energy) = read_env::<u32>("MINEFRONT_INITIAL_ENERGY") {
            config.game_config.initial_energy = energy;
        }
        if let Ok(dir) = env::var("MINEFRONT_LOG_DIR") {
            config.log_dir = (!dir.trim().is_empty()).then(|| PathBuf::from(dir));
        }

        config
    }

    pub fn settings(&self, player: PlayerId) -> AiSettings {
        match player {
            PlayerId::P1 => self.p1,
            PlayerId::P2 => self.p2,
        }
    }
}

/// Platform log directory, e.g. `~/.cache/minefront/logs` on Linux.
pub fn default_log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "minefront").map(|dirs| dirs.cache_dir().join("logs"))
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(key, value = %raw, %error, "ignoring unparsable setting");
            None
        }
    }
}

/// Result of a finished (or abandoned) match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchSummary {
    pub winner: Option<PlayerId>,
    /// Round the match ended in.
    pub rounds: u32,
    /// Accepted actions, fallbacks included.
    pub actions: u64,
    /// Provider actions the engine rejected.
    pub rejected: u32,
    /// The round limit stopped the match before a winner emerged.
    pub round_limit_reached: bool,
    /// Hex SHA-256 of the final state.
    pub digest: String,
}

/// Drives one match between two providers.
pub struct MatchRunner {
    config: RuntimeConfig,
    state: GameState,
    providers: [Box<dyn ActionProvider>; 2],
    actions_this_round: u32,
    rejected: u32,
}

impl MatchRunner {
    pub fn new(
        config: RuntimeConfig,
        p1: impl ActionProvider + 'static,
        p2: impl ActionProvider + 'static,
    ) -> Self {
        let state = GameState::with_config(config.seed, &config.game_config, &PcgRng);
        Self::from_state(config, state, p1, p2)
    }

    /// Resumes from an existing snapshot.
    pub fn from_state(
        config: RuntimeConfig,
        state: GameState,
        p1: impl ActionProvider + 'static,
        p2: impl ActionProvider + 'static,
    ) -> Self {
        Self {
            config,
            state,
            providers: [Box::new(p1), Box::new(p2)],
            actions_this_round: 0,
            rejected: 0,
        }
    }

    /// Two AI providers configured from `config`, seeded apart per side.
    pub fn ai_vs_ai(config: RuntimeConfig) -> Self {
        let ai = |player: PlayerId| {
            let settings = config.settings(player);
            let seed = config.seed ^ 0x9e37_79b9_7f4a_7c15_u64.wrapping_mul(player.index() as u64 + 1);
            AiProvider::new(settings.difficulty, settings.profile, seed)
        };
        let (p1, p2) = (ai(PlayerId::P1), ai(PlayerId::P2));
        Self::new(config, p1, p2)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Plays until a side wins or the round limit is hit.
    pub async fn run(&mut self) -> Result<MatchSummary> {
        self.observe_all();
        let span = tracing::info_span!("setup", seed = self.config.seed);
        self.setup().instrument(span).await?;

        while !self.state.game_over && self.state.turn <= self.config.max_rounds {
            let turn = self.state.turn;
            self.play_round()
                .instrument(tracing::info_span!("round", turn))
                .await?;
        }
        self.summary()
    }

    /// Placement and planning until both sides are in the action phase.
    async fn setup(&mut self) -> Result<()> {
        while !self.state.game_over && self.state.phase != Phase::Action {
            let player = self.waiting_on();
            self.step(player).await?;
        }
        tracing::debug!("setup complete");
        Ok(())
    }

    async fn play_round(&mut self) -> Result<()> {
        let turn = self.state.turn;
        self.actions_this_round = 0;
        while !self.state.game_over && self.state.turn == turn {
            let player = self.waiting_on();
            if self.actions_this_round >= self.config.max_actions_per_round {
                self.force(player, None)?;
            } else {
                self.step(player).await?;
            }
        }
        tracing::debug!(
            turn,
            actions = self.actions_this_round,
            p1_energy = self.state.players[PlayerId::P1].energy,
            p2_energy = self.state.players[PlayerId::P2].energy,
            "round finished"
        );
        Ok(())
    }

    /// Side the rules are waiting on. During setup both sides act
    /// independently, so the first one not yet ready goes first.
    fn waiting_on(&self) -> PlayerId {
        match self.state.phase {
            Phase::Action => self.state.current_player,
            Phase::Placement | Phase::Thinking => PlayerId::ALL
                .into_iter()
                .find(|p| !self.state.players[*p].ready)
                .unwrap_or(PlayerId::P1),
        }
    }

    /// Asks `player` for one action and executes it. A rejected action is
    /// replaced by the phase fallback.
    pub async fn step(&mut self, player: PlayerId) -> Result<()> {
        let config = &self.config.game_config;
        let env = GameEnv::new(config, &PcgRng, self.state.nonce * MS_PER_ACTION);
        self.actions_this_round += 1;

        let action = self.providers[player.index()]
            .provide_action(player, &self.state, env)
            .await?;

        match GameEngine::new(&mut self.state).execute(env, &action) {
            Ok(outcome) => {
                if outcome.handed_over || outcome.round_ended {
                    self.observe_all();
                }
                Ok(())
            }
            Err(error) => {
                self.rejected += 1;
                tracing::debug!(%player, %error, "falling back after rejection");
                self.force(player, Some(action))
            }
        }
    }

    /// Executes the fallback for `player`. Failing that too means the match
    /// cannot progress.
    fn force(&mut self, player: PlayerId, rejected: Option<Action>) -> Result<()> {
        let fallback = fallback_action(&self.state, player);
        if rejected == Some(fallback) {
            tracing::warn!(%player, "fallback matches the rejected action");
        }
        let env = GameEnv::new(
            &self.config.game_config,
            &PcgRng,
            self.state.nonce * MS_PER_ACTION,
        );
        let outcome = GameEngine::new(&mut self.state)
            .execute(env, &fallback)
            .map_err(|source| RuntimeError::Stalled { player, source })?;
        if outcome.handed_over || outcome.round_ended {
            self.observe_all();
        }
        Ok(())
    }

    fn observe_all(&self) {
        for player in PlayerId::ALL {
            self.providers[player.index()].observe(player, &self.state);
        }
    }

    fn summary(&self) -> Result<MatchSummary> {
        let digest = hex::encode(self.state.digest()?);
        let summary = MatchSummary {
            winner: self.state.winner,
            rounds: self.state.turn.min(self.config.max_rounds),
            actions: self.state.nonce,
            rejected: self.rejected,
            round_limit_reached: !self.state.game_over,
            digest,
        };
        tracing::info!(
            winner = ?summary.winner,
            rounds = summary.rounds,
            actions = summary.actions,
            rejected = summary.rejected,
            digest = %summary.digest,
            "match finished"
        );
        Ok(summary)
    }
}

/// The action that always moves the match forward for `player`.
pub fn fallback_action(state: &GameState, player: PlayerId) -> Action {
    match state.phase {
        Phase::Placement => FinishPlacementAction { player }.into(),
        Phase::Thinking => ReadyAction { player }.into(),
        Phase::Action => match state.active_unit.filter(|id| id.owner == player) {
            Some(unit) => EndTurnAction::for_unit(unit).into(),
            None => EndTurnAction::new(player).into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = RuntimeConfig::default();
        assert_eq!(config.p1, AiSettings::default());
        assert_eq!(config.game_config.initial_energy, GameConfig::DEFAULT_INITIAL_ENERGY);
        assert!(config.max_rounds > 0);
        assert_eq!(config.settings(PlayerId::P2), config.p2);
    }

    #[test]
    fn fallback_follows_the_phase() {
        let mut state = GameState::new(3);
        assert_eq!(
            fallback_action(&state, PlayerId::P2),
            FinishPlacementAction { player: PlayerId::P2 }.into()
        );
        state.phase = Phase::Thinking;
        assert_eq!(
            fallback_action(&state, PlayerId::P1),
            ReadyAction { player: PlayerId::P1 }.into()
        );
        state.phase = Phase::Action;
        assert_eq!(
            fallback_action(&state, PlayerId::P1),
            EndTurnAction::new(PlayerId::P1).into()
        );
    }
}
