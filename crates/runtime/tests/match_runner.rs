use minefront_core::{Action, Phase, PlayerId, ReadyAction};
use minefront_runtime::{
    AiSettings, Difficulty, MatchRunner, RuntimeConfig, RuntimeError, ScriptedActionProvider,
    TuningProfile,
};

fn short_match(seed: u64) -> RuntimeConfig {
    RuntimeConfig {
        seed,
        p1: AiSettings {
            difficulty: Difficulty::Hard,
            profile: TuningProfile::Aggressive,
        },
        p2: AiSettings {
            difficulty: Difficulty::Normal,
            profile: TuningProfile::Conservative,
        },
        max_rounds: 6,
        log_dir: None,
        ..RuntimeConfig::default()
    }
}

#[tokio::test]
async fn ai_match_finishes_within_the_round_limit() {
    let mut runner = MatchRunner::ai_vs_ai(short_match(11));
    let summary = runner.run().await.expect("match should complete");

    assert_eq!(summary.round_limit_reached, !runner.state().game_over);
    assert!(summary.rounds <= 6);
    assert!(summary.actions > 0);
    assert_eq!(summary.digest.len(), 64);
    // Running out of rounds leaves the match in the next planning phase.
    let state = runner.state();
    if !state.game_over {
        assert_eq!(state.phase, Phase::Thinking);
        assert!(state.turn > 6);
    }
}

#[tokio::test]
async fn same_seed_replays_the_same_match() {
    let first = MatchRunner::ai_vs_ai(short_match(42)).run().await.expect("first run");
    let second = MatchRunner::ai_vs_ai(short_match(42)).run().await.expect("second run");
    assert_eq!(first, second);
}

#[tokio::test]
async fn rejected_action_falls_back_to_finishing_placement() {
    // READY is only legal while planning, so the engine rejects it here.
    let p1 = ScriptedActionProvider::new([Action::from(ReadyAction { player: PlayerId::P1 })]);
    let p2 = ScriptedActionProvider::new([]);
    let mut runner = MatchRunner::new(short_match(5), p1, p2);

    runner.step(PlayerId::P1).await.expect("fallback should apply");
    let state = runner.state();
    assert_eq!(state.phase, Phase::Placement);
    assert!(state.players[PlayerId::P1].ready);
    assert!(state.logs.contains_key("log_wrong_phase"));
}

#[tokio::test]
async fn exhausted_script_surfaces_as_an_error() {
    let mut runner = MatchRunner::new(
        short_match(5),
        ScriptedActionProvider::new([]),
        ScriptedActionProvider::new([]),
    );
    let err = runner.run().await.expect_err("empty script cannot play");
    assert!(matches!(err, RuntimeError::ScriptExhausted { player: PlayerId::P1 }));
}
