//! Cross-module rule properties, driven through the public engine.

use minefront_core::action::effects;
use minefront_core::{
    Action, AttackAction, Building, BuildingKind, GameConfig, GameEngine, GameEnv, GameState,
    Mine, MineType, MoveAction, PcgRng, Phase, PlayerId, Position, RejectReason, UnitId, UnitType,
};

fn action_state(seed: u64) -> GameState {
    let mut state = GameState::new(seed);
    state.phase = Phase::Action;
    for player in state.players.iter_mut() {
        player.checkpoint_energy();
    }
    state
}

fn execute(
    state: &mut GameState,
    config: &GameConfig,
    action: impl Into<Action>,
) -> Result<minefront_core::ExecutionOutcome, minefront_core::ExecuteError> {
    let env = GameEnv::new(config, &PcgRng, 0);
    GameEngine::new(state).execute(env, &action.into())
}

fn place_unit(state: &mut GameState, id: UnitId, at: Position) {
    if let Some(unit) = state.unit_mut(id) {
        unit.position = at;
    }
}

fn mine(state: &mut GameState, owner: PlayerId, kind: MineType, at: Position) {
    let id = state.allocate_mine_id();
    state.mines.push(Mine::new(id, owner, kind, at));
}

#[test]
fn energy_cap_rejects_exactly_past_the_ratio() {
    let config = GameConfig::new();
    let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);

    // start 30 gives a cap of 10; a Ranger step costs 2
    let mut state = action_state(2);
    place_unit(&mut state, ranger, Position::new(3, 4));
    if let Some(u) = state.unit_mut(ranger) {
        u.start_of_action_energy = 30;
        u.energy_used_this_turn = 9;
    }
    let before = state.players.clone();
    let err = execute(&mut state, &config, MoveAction::new(ranger, Position::new(3, 5)))
        .unwrap_err();
    assert_eq!(err.reason(), &RejectReason::EnergyCap { cap: 10 });
    assert_eq!(state.players, before);
    let latest = state.logs.latest().unwrap();
    assert_eq!(latest.key, "log_energy_cap");
    assert_eq!(latest.owner, Some(PlayerId::P1));

    if let Some(u) = state.unit_mut(ranger) {
        u.energy_used_this_turn = 8;
    }
    assert!(execute(&mut state, &config, MoveAction::new(ranger, Position::new(3, 5))).is_ok());
    assert_eq!(state.unit(ranger).unwrap().energy_used_this_turn, 10);
}

#[test]
fn round_end_maintenance_runs_once() {
    let config = GameConfig::new();
    let env = GameEnv::new(&config, &PcgRng, 0);
    let mut state = action_state(3);
    for unit in state.players.all_units_mut() {
        unit.has_acted = true;
    }
    let maker = UnitId::new(PlayerId::P2, UnitType::Maker);
    if let Some(u) = state.unit_mut(maker) {
        u.is_dead = true;
        u.hp = 0;
        u.respawn_timer = 2;
    }
    if let Some(u) = state.unit_mut(UnitId::new(PlayerId::P1, UnitType::Sweeper)) {
        u.status.apply_debuff(2, 2);
    }

    assert!(GameEngine::new(&mut state).end_round(env));
    let after_first = state.clone();
    assert!(!GameEngine::new(&mut state).end_round(env));
    assert_eq!(state, after_first);

    let sweeper = state.unit(UnitId::new(PlayerId::P1, UnitType::Sweeper)).unwrap();
    assert_eq!(sweeper.status.debuff_duration, 1);
    let maker = state.unit(maker).unwrap();
    assert!(maker.is_dead);
    assert_eq!(maker.respawn_timer, 1);
}

#[test]
fn radar_reveal_adds_the_owner_once() {
    let mut state = action_state(4);
    mine(&mut state, PlayerId::P2, MineType::Normal, Position::new(2, 9));
    mine(&mut state, PlayerId::P2, MineType::Normal, Position::new(2, 12));
    let id = state.allocate_building_id();
    state.buildings.push(Building {
        id,
        owner: PlayerId::P1,
        kind: BuildingKind::Tower,
        position: Position::new(3, 10),
        level: 1,
        variant: None,
        duration: None,
    });

    assert!(!state.mines[0].is_visible_to(PlayerId::P1));
    assert_eq!(effects::radar_reveal(&mut state), 1);
    assert_eq!(effects::radar_reveal(&mut state), 0);

    let near = &state.mines[0];
    assert_eq!(
        near.revealed_to.iter().filter(|p| **p == PlayerId::P1).count(),
        1
    );
    assert!(!state.mines[1].is_visible_to(PlayerId::P1));
}

#[test]
fn chain_mine_cascades_through_normal_mines() {
    let config = GameConfig::new();
    let mut state = action_state(5);
    let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);
    let maker = UnitId::new(PlayerId::P1, UnitType::Maker);
    place_unit(&mut state, ranger, Position::new(3, 7));
    place_unit(&mut state, maker, Position::new(4, 9));
    state.board.set_obstacle(Position::new(4, 9), false);

    mine(&mut state, PlayerId::P2, MineType::Chain, Position::new(3, 8));
    mine(&mut state, PlayerId::P2, MineType::Normal, Position::new(2, 9));
    mine(&mut state, PlayerId::P2, MineType::Normal, Position::new(4, 10));

    let outcome = execute(&mut state, &config, MoveAction::new(ranger, Position::new(3, 8)));
    assert!(outcome.is_ok());
    assert!(state.mines.is_empty());

    // direct 6 plus the (2,9) sub-blast that also covers (3,8)
    let ranger = state.unit(ranger).unwrap();
    assert_eq!(ranger.max_hp - ranger.hp, 6 + 8);
    // only the (4,10) sub-blast reaches (4,9)
    let maker = state.unit(maker).unwrap();
    assert_eq!(maker.max_hp - maker.hp, 8);
}

#[test]
fn lethal_general_attack_ends_the_match() {
    let attacker = UnitId::new(PlayerId::P1, UnitType::General);
    let target = UnitId::new(PlayerId::P2, UnitType::General);
    let setup = || {
        let mut state = action_state(6);
        state.players.p1.energy = 20;
        place_unit(&mut state, attacker, Position::new(3, 5));
        place_unit(&mut state, target, Position::new(3, 6));
        if let Some(u) = state.unit_mut(attacker) {
            u.start_of_action_energy = 20;
        }
        if let Some(u) = state.unit_mut(target) {
            u.hp = 1;
        }
        state
    };

    // The scenario's attack costs 8, more than the 1/3 cap of a 20-energy
    // start allows, so the lethal case runs with the cap ratio raised to 1/2.
    let mut capped = setup();
    let err = execute(&mut capped, &GameConfig::new(), AttackAction::new(attacker, target))
        .unwrap_err();
    assert_eq!(err.reason(), &RejectReason::EnergyCap { cap: 6 });
    assert!(!capped.game_over);

    let mut state = setup();
    let config = GameConfig::with_energy_cap_ratio(1, 2);
    let outcome = execute(&mut state, &config, AttackAction::new(attacker, target)).unwrap();
    assert!(!outcome.handed_over);
    assert!(state.unit(target).unwrap().is_dead);
    assert!(state.game_over);
    assert_eq!(state.winner, Some(PlayerId::P1));
    assert!(state.logs.contains_key("log_attack_hit"));
}

#[test]
fn teammate_killed_by_splash_keeps_the_turn() {
    let config = GameConfig::new();
    let ranger = UnitId::new(PlayerId::P1, UnitType::Ranger);
    let sweeper = UnitId::new(PlayerId::P1, UnitType::Sweeper);
    let mut state = action_state(9);
    for cell in [Position::new(3, 4), Position::new(2, 4), Position::new(1, 5)] {
        state.board.set_obstacle(cell, false);
    }
    place_unit(&mut state, ranger, Position::new(3, 4));
    place_unit(&mut state, sweeper, Position::new(1, 5));
    if let Some(u) = state.unit_mut(sweeper) {
        u.hp = 1;
    }
    mine(&mut state, PlayerId::P2, MineType::Nuke, Position::new(1, 4));

    let outcome = execute(&mut state, &config, MoveAction::new(ranger, Position::new(2, 4)))
        .unwrap();
    assert!(state.unit(sweeper).unwrap().is_dead);
    let mover = state.unit(ranger).unwrap();
    assert!(mover.is_alive() && !mover.has_acted);
    assert!(!outcome.handed_over);
    assert_eq!(state.current_player, PlayerId::P1);
}

#[cfg(feature = "serde")]
mod snapshots {
    use super::*;
    use minefront_core::MineId;

    #[test]
    fn quest_sets_survive_a_round_trip() {
        let mut state = action_state(7);
        let quest = &mut state.players.p2.quest;
        quest.ranger_mines_moved_this_round.insert(MineId(9));
        quest.ranger_mines_moved_this_round.insert(MineId(2));
        quest
            .flag_spirit_damage_taken_this_turn
            .insert(UnitId::new(PlayerId::P1, UnitType::Ranger));

        let json = state.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let moved = &value["players"]["P2"]["quest"]["ranger_mines_moved_this_round"];
        assert!(moved.is_array());

        let back = GameState::from_json(&json).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.digest().unwrap(), state.digest().unwrap());
    }

    #[test]
    fn snapshot_without_p1_is_rejected() {
        let state = action_state(7);
        let mut value: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
        if let Some(players) = value["players"].as_object_mut() {
            players.remove("P1");
        }
        assert!(GameState::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn digest_is_stable_for_equal_states() {
        let a = GameState::new(8);
        let b = GameState::new(8);
        assert_eq!(
            hex::encode(a.digest().unwrap()),
            hex::encode(b.digest().unwrap())
        );
    }
}
