//! Minefront headless match binary.
//!
//! Loads configuration from the environment (and an optional `.env` file),
//! installs logging, plays one AI-versus-AI match and prints the result.
//!
//! # Examples
//!
//! ```bash
//! MINEFRONT_SEED=7 MINEFRONT_P1_DIFFICULTY=hard cargo run -p minefront-cli
//! ```

mod logging;

use anyhow::Result;
use minefront_core::PlayerId;
use minefront_runtime::{MatchRunner, MatchSummary, RuntimeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = RuntimeConfig::from_env();
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!(
        seed = config.seed,
        p1 = %format_args!("{}/{}", config.p1.difficulty, config.p1.profile),
        p2 = %format_args!("{}/{}", config.p2.difficulty, config.p2.profile),
        max_rounds = config.max_rounds,
        "Starting Minefront match"
    );

    let mut runner = MatchRunner::ai_vs_ai(config);
    let summary = runner.run().await?;
    println!("{}", render(&summary));
    Ok(())
}

fn render(summary: &MatchSummary) -> String {
    let outcome = match summary.winner {
        Some(PlayerId::P1) => "winner: P1".to_string(),
        Some(PlayerId::P2) => "winner: P2".to_string(),
        None if summary.round_limit_reached => "no winner (round limit)".to_string(),
        None => "no winner".to_string(),
    };
    format!(
        "{outcome}\nrounds: {}\nactions: {} ({} rejected)\ndigest: {}",
        summary.rounds, summary.actions, summary.rejected, summary.digest
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_names_the_limit() {
        let summary = MatchSummary {
            winner: None,
            rounds: 60,
            actions: 812,
            rejected: 3,
            round_limit_reached: true,
            digest: "ab".repeat(32),
        };
        let text = render(&summary);
        assert!(text.starts_with("no winner (round limit)"));
        assert!(text.contains("actions: 812 (3 rejected)"));
    }
}
