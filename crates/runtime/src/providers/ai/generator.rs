//! Candidate generation.
//!
//! For each action family the generator proposes concrete actions around the
//! unit, keeps only those the engine would accept right now
//! ([`Action::validate`]), scores them and retains the best few per family.
//! Ending the unit's turn is always offered so the selector never comes back
//! empty-handed.

use std::collections::BTreeSet;

use minefront_core::resolution::limits::oldest_building;
use minefront_core::resolution::{
    building_cost, can_general_attack, mine_type_unlocked, move_cost, place_mine_cost, scan_cost,
    sensor_cost, with_surcharge,
};
use minefront_core::{
    Action, AttackAction, Branch, BuildingKind, ConvertMineAction, DetonateTowerAction,
    DisarmAction, DropFlagAction, DropMineAction, EndTurnAction, EvolveAction, GameConfig,
    GameEnv, GameState, MineType, MoveAction, MoveMineAction, PickupFlagAction, PickupMineAction,
    PlaceBuildingAction, PlaceMineAction, Position, ScanAction, SensorScanAction, StealthAction,
    TeleportAction, ThrowMineAction, Unit, UnitType, Variant,
};
use rand::Rng;
use strum::IntoEnumIterator;

use super::context::{BLOCKED, PlanningContext};
use super::scoring::evaluator::{evaluate_action, unit_priority_in_context};
use super::scoring::selector::sort_actions;
use super::scoring::target_cell_risk;
use super::types::{Candidate, CandidateKind, Target, UnitCandidate};

const MOVE_LIMIT: usize = 4;
const SCAN_LIMIT: usize = 2;
const MINE_LIMIT: usize = 2;
const DISARM_LIMIT: usize = 2;
const PICKUP_LIMIT: usize = 3;
const THROW_LIMIT: usize = 5;
const MOVE_MINE_LIMIT: usize = 8;
const CONVERT_LIMIT: usize = 4;

const MOVE_MINE_COST: u32 = 2;
const MOVE_MINE_STRIKE_COST: u32 = 5;

/// Scored, jittered priority for every unit of the planning side that may
/// still act this round.
pub fn unit_candidates<R: Rng + ?Sized>(
    state: &GameState,
    config: &GameConfig,
    ctx: &PlanningContext<'_>,
    rng: &mut R,
) -> Vec<UnitCandidate> {
    let jitter = ctx.difficulty.weights().random_jitter;
    state.players[ctx.player]
        .units
        .iter()
        .filter(|u| u.can_act())
        .map(|unit| {
            let mut score = unit_priority_in_context(state, config, unit, ctx);
            if jitter > 0.0 {
                score.total += rng.gen_range(-jitter / 2.0..=jitter / 2.0);
            }
            UnitCandidate {
                unit: unit.id,
                score,
            }
        })
        .collect()
}

/// Enemy flag, enemy units and their neighbours: the cells worth scanning.
fn scan_targets(state: &GameState, unit: &Unit) -> BTreeSet<Position> {
    let enemy = unit.owner().opponent();
    let mut cells = BTreeSet::from([state.players[enemy].flag_position]);
    for foe in state.players[enemy].living() {
        cells.insert(foe.position);
        cells.extend(foe.position.neighbors());
    }
    cells.retain(|p| p.in_bounds() && !state.board.is_obstacle(*p));
    cells
}

struct Builder<'s, 'c> {
    state: &'s GameState,
    env: GameEnv<'s>,
    unit: &'s Unit,
    ctx: &'s PlanningContext<'c>,
    out: Vec<Candidate>,
}

impl Builder<'_, '_> {
    fn candidate(&self, kind: CandidateKind, action: impl Into<Action>, cost: u32) -> Candidate {
        Candidate::new(self.unit.id, kind, action, cost)
    }

    /// Validates and scores one proposal.
    fn admit(&self, mut candidate: Candidate) -> Option<Candidate> {
        if let Err(reason) = candidate.action.validate(self.state, &self.env) {
            tracing::trace!(
                unit = %self.unit.id,
                kind = %candidate.kind,
                %reason,
                "candidate rejected"
            );
            return None;
        }
        candidate.score = evaluate_action(self.state, self.unit, &candidate, self.ctx);
        Some(candidate)
    }

    /// Keeps the best `limit` valid proposals of one family.
    fn family(&mut self, limit: usize, proposals: impl IntoIterator<Item = Candidate>) {
        let admitted: Vec<_> = proposals.into_iter().filter_map(|c| self.admit(c)).collect();
        let mut best = sort_actions(admitted);
        best.truncate(limit);
        self.out.extend(best);
    }

    fn single(&mut self, proposal: Candidate) {
        self.family(1, [proposal]);
    }

    fn moves(&mut self) {
        let (state, unit) = (self.state, self.unit);
        let cost = move_cost(state, unit);
        let proposals: Vec<_> = unit
            .position
            .neighbors()
            .filter(|to| target_cell_risk(state, unit, *to, Some(&self.ctx.threat)) < BLOCKED)
            .map(|to| {
                self.candidate(CandidateKind::Move, MoveAction::new(unit.id, to), cost)
                    .at(Target::Cell(to))
            })
            .collect();
        self.family(MOVE_LIMIT, proposals);
    }

    fn attacks(&mut self) {
        if self.unit.kind() != UnitType::General {
            return;
        }
        let state = self.state;
        let enemy = self.unit.owner().opponent();
        let proposals: Vec<_> = state.players[enemy]
            .living()
            .filter_map(|target| {
                let cost =
                    can_general_attack(state, self.env.config(), self.unit.id, target.id).ok()?;
                Some(
                    self.candidate(
                        CandidateKind::Attack,
                        AttackAction::new(self.unit.id, target.id),
                        cost,
                    )
                    .at(Target::Unit(target.id)),
                )
            })
            .collect();
        self.family(usize::MAX, proposals);
    }

    fn scans(&mut self) {
        if self.unit.kind() != UnitType::Sweeper {
            return;
        }
        let (state, unit) = (self.state, self.unit);
        let targets = scan_targets(state, unit);

        let cost = scan_cost(state, unit);
        let scans: Vec<_> = targets
            .iter()
            .map(|&target| {
                self.candidate(CandidateKind::Scan, ScanAction { unit: unit.id, target }, cost)
                    .at(Target::Cell(target))
            })
            .collect();
        self.family(SCAN_LIMIT, scans);

        let cost = sensor_cost(state, unit);
        let sensors: Vec<_> = targets
            .iter()
            .copied()
            .chain([unit.position])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|target| {
                self.candidate(
                    CandidateKind::SensorScan,
                    SensorScanAction { unit: unit.id, target },
                    cost,
                )
                .at(Target::Cell(target))
            })
            .collect();
        self.family(SCAN_LIMIT, sensors);
    }

    fn mines(&mut self) {
        let (state, unit) = (self.state, self.unit);
        let owner = unit.owner();
        let enemy = owner.opponent();

        if unit.kind() == UnitType::Maker {
            let mut proposals = Vec::new();
            for target in unit.position.neighbors() {
                let taken = state.mine_of(owner, target).is_some()
                    || state
                        .mine_of(enemy, target)
                        .is_some_and(|m| m.is_visible_to(owner));
                if taken {
                    continue;
                }
                for mine_type in MineType::iter().filter(|k| mine_type_unlocked(state, owner, *k)) {
                    let cost = place_mine_cost(state, unit, mine_type, target);
                    let action = PlaceMineAction {
                        unit: unit.id,
                        target,
                        mine_type,
                    };
                    proposals.push(
                        self.candidate(CandidateKind::PlaceMine, action, cost)
                            .at(Target::Cell(target))
                            .with_mine(mine_type),
                    );
                }
            }
            self.family(MINE_LIMIT, proposals);
        }

        let enemy_mines: Vec<Position> = state
            .mines
            .iter()
            .filter(|m| m.owner == enemy)
            .map(|m| m.position)
            .collect();

        let disarm_cost = with_surcharge(unit, GameConfig::DISARM_COST);
        let disarms: Vec<_> = enemy_mines
            .iter()
            .filter(|p| p.chebyshev(unit.position) <= 1)
            .map(|&target| {
                self.candidate(
                    CandidateKind::Disarm,
                    DisarmAction { unit: unit.id, target },
                    disarm_cost,
                )
                .at(Target::Cell(target))
            })
            .collect();
        self.family(DISARM_LIMIT, disarms);

        if unit.kind() == UnitType::Defuser {
            let strikes =
                state.players[owner].is_variant(UnitType::Defuser, Branch::B, Variant::Second);
            let cost = if strikes { MOVE_MINE_STRIKE_COST } else { MOVE_MINE_COST };
            let reachable: Vec<Position> = enemy_mines
                .iter()
                .copied()
                .filter(|p| p.manhattan(unit.position) <= 2)
                .collect();

            let relocations: Vec<_> = reachable
                .iter()
                .flat_map(|&from| {
                    unit.position
                        .diamond(2)
                        .filter(move |to| *to != from)
                        .map(move |to| (from, to))
                })
                .map(|(from, to)| {
                    self.candidate(
                        CandidateKind::MoveMine,
                        MoveMineAction {
                            unit: unit.id,
                            from,
                            to,
                        },
                        cost,
                    )
                    .at(Target::Cell(to))
                })
                .collect();
            self.family(MOVE_MINE_LIMIT, relocations);

            let cost = with_surcharge(unit, GameConfig::CONVERT_COST);
            let conversions: Vec<_> = reachable
                .iter()
                .map(|&target| {
                    self.candidate(
                        CandidateKind::ConvertMine,
                        ConvertMineAction { unit: unit.id, target },
                        cost,
                    )
                    .at(Target::Cell(target))
                })
                .collect();
            self.family(CONVERT_LIMIT, conversions);
        }

        if unit.kind() == UnitType::Ranger {
            if unit.carried_mine.is_none() {
                let pickups: Vec<_> = state
                    .mines
                    .iter()
                    .filter(|m| m.is_visible_to(owner) && m.position.manhattan(unit.position) <= 2)
                    .map(|m| {
                        self.candidate(
                            CandidateKind::PickupMine,
                            PickupMineAction {
                                unit: unit.id,
                                target: m.position,
                            },
                            0,
                        )
                        .at(Target::Cell(m.position))
                    })
                    .collect();
                self.family(PICKUP_LIMIT, pickups);
            } else {
                let drop = self
                    .candidate(CandidateKind::DropMine, DropMineAction { unit: unit.id }, 0)
                    .at(Target::Cell(unit.position));
                self.single(drop);

                let cost = with_surcharge(unit, GameConfig::THROW_COST);
                let throws: Vec<_> = unit
                    .position
                    .diamond(2)
                    .filter(|p| *p != unit.position)
                    .map(|target| {
                        self.candidate(
                            CandidateKind::ThrowMine,
                            ThrowMineAction { unit: unit.id, target },
                            cost,
                        )
                        .at(Target::Cell(target))
                    })
                    .collect();
                self.family(THROW_LIMIT, throws);
            }
        }
    }

    fn buildings(&mut self) {
        let (state, unit) = (self.state, self.unit);
        let here = Target::Cell(unit.position);
        let build = |kind: CandidateKind, building: BuildingKind| {
            self.candidate(
                kind,
                PlaceBuildingAction::new(unit.id, building),
                building_cost(state, unit, building),
            )
            .at(here)
        };

        let proposals = match unit.kind() {
            UnitType::Sweeper => vec![
                build(CandidateKind::PlaceTower, BuildingKind::Tower),
                self.candidate(
                    CandidateKind::DetonateTower,
                    DetonateTowerAction { unit: unit.id },
                    with_surcharge(unit, GameConfig::DETONATE_COST),
                ),
            ],
            UnitType::Maker => vec![build(CandidateKind::PlaceFactory, BuildingKind::Factory)],
            UnitType::Ranger => vec![build(CandidateKind::PlaceHub, BuildingKind::Hub)],
            _ => Vec::new(),
        };
        for proposal in proposals {
            self.single(proposal);
        }

        if let Some(hub) = oldest_building(state, unit.owner(), BuildingKind::Hub) {
            let teleport = self
                .candidate(
                    CandidateKind::Teleport,
                    TeleportAction { unit: unit.id },
                    GameConfig::TELEPORT_COST,
                )
                .at(Target::Cell(hub.position));
            self.single(teleport);
        }
    }

    fn evolutions(&mut self) {
        let (state, unit) = (self.state, self.unit);
        let owner = unit.owner();
        let kind = unit.kind();
        for branch in [Branch::A, Branch::B] {
            let level = state.players[owner].level(kind, branch);
            let Some(cost) = GameConfig::evolution_cost(level) else {
                continue;
            };
            let base = EvolveAction::new(owner, kind, branch);
            let options: Vec<(EvolveAction, Option<Variant>)> =
                if level + 1 == GameConfig::MAX_EVOLUTION_LEVEL {
                    [Variant::First, Variant::Second]
                        .into_iter()
                        .map(|v| (base.with_variant(v), Some(v)))
                        .collect()
                } else {
                    vec![(base, None)]
                };
            for (action, variant) in options {
                let proposal =
                    self.candidate(CandidateKind::evolution(branch, variant), action, cost);
                self.single(proposal);
            }
        }
    }

    fn flag_and_stealth(&mut self) {
        let unit = self.unit;
        let pickup = self.candidate(CandidateKind::PickupFlag, PickupFlagAction { unit: unit.id }, 0);
        self.single(pickup);
        let drop = self.candidate(CandidateKind::DropFlag, DropFlagAction { unit: unit.id }, 0);
        self.single(drop);

        if unit.kind() == UnitType::Ranger && !unit.status.stealthed {
            let stealth = self.candidate(
                CandidateKind::Stealth,
                StealthAction {
                    unit: unit.id,
                    active: true,
                },
                with_surcharge(unit, GameConfig::STEALTH_COST),
            );
            self.single(stealth);
        }
    }

    fn end_turn(&mut self) {
        let mut end = self.candidate(CandidateKind::EndTurn, EndTurnAction::for_unit(self.unit.id), 0);
        end.score = evaluate_action(self.state, self.unit, &end, self.ctx);
        self.out.push(end);
    }
}

/// Every scored candidate for `unit`, ending its turn included.
pub fn action_candidates(
    state: &GameState,
    env: GameEnv<'_>,
    unit: &Unit,
    ctx: &PlanningContext<'_>,
) -> Vec<Candidate> {
    if !unit.can_act() {
        return Vec::new();
    }
    let mut builder = Builder {
        state,
        env,
        unit,
        ctx,
        out: Vec::new(),
    };
    builder.moves();
    builder.attacks();
    builder.scans();
    builder.mines();
    builder.buildings();
    builder.evolutions();
    builder.flag_and_stealth();
    builder.end_turn();

    tracing::debug!(
        unit = %unit.id,
        candidates = builder.out.len(),
        "generated candidates"
    );
    builder.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ai::opponent::OpponentModel;
    use crate::providers::ai::types::{Difficulty, TuningProfile};
    use minefront_core::state::Board;
    use minefront_core::{PcgRng, Phase, PlayerId, UnitId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn action_state() -> GameState {
        let mut state = GameState::new(31);
        for cell in Board::positions() {
            state.board.set_obstacle(cell, false);
        }
        state.phase = Phase::Action;
        for player in state.players.iter_mut() {
            player.checkpoint_energy();
        }
        state
    }

    fn context<'m>(state: &GameState, model: &'m OpponentModel) -> PlanningContext<'m> {
        PlanningContext::build(
            state,
            PlayerId::P1,
            Difficulty::Normal,
            TuningProfile::Balanced,
            model,
            None,
        )
    }

    fn own_unit(state: &GameState, kind: UnitType) -> Unit {
        match state.unit(UnitId::new(PlayerId::P1, kind)) {
            Some(u) => u.clone(),
            None => panic!("{kind} missing"),
        }
    }

    #[test]
    fn every_candidate_is_accepted_by_the_rules() {
        let state = action_state();
        let config = GameConfig::default();
        let env = GameEnv::new(&config, &PcgRng, 0);
        let model = OpponentModel::new();
        let ctx = context(&state, &model);

        for kind in UnitType::ALL {
            let unit = own_unit(&state, kind);
            let candidates = action_candidates(&state, env, &unit, &ctx);
            assert_eq!(
                candidates.iter().filter(|c| c.kind == CandidateKind::EndTurn).count(),
                1
            );
            for candidate in candidates.iter().filter(|c| c.kind != CandidateKind::EndTurn) {
                assert_eq!(candidate.action.validate(&state, &env), Ok(()), "{candidate:?}");
            }
            assert!(candidates.iter().filter(|c| c.kind == CandidateKind::Move).count() <= MOVE_LIMIT);
        }
    }

    #[test]
    fn sweeper_offers_scans_at_the_front() {
        let mut state = action_state();
        let sweeper = own_unit(&state, UnitType::Sweeper);
        if let Some(ranger) = state.unit_mut(UnitId::new(PlayerId::P2, UnitType::Ranger)) {
            ranger.position = sweeper.position.offset(0, 2);
        }
        let config = GameConfig::default();
        let env = GameEnv::new(&config, &PcgRng, 0);
        let model = OpponentModel::new();
        let ctx = context(&state, &model);

        let candidates = action_candidates(&state, env, &sweeper, &ctx);
        let scans = candidates.iter().filter(|c| c.kind == CandidateKind::Scan).count();
        assert!((1..=SCAN_LIMIT).contains(&scans));
    }

    #[test]
    fn acted_units_are_not_candidates() {
        let mut state = action_state();
        if let Some(u) = state.unit_mut(UnitId::new(PlayerId::P1, UnitType::Maker)) {
            u.has_acted = true;
        }
        let config = GameConfig::default();
        let model = OpponentModel::new();
        let ctx = context(&state, &model);
        let mut rng = StdRng::seed_from_u64(4);

        let units = unit_candidates(&state, &config, &ctx, &mut rng);
        assert_eq!(units.len(), 4);
        assert!(units.iter().all(|c| c.unit.kind != UnitType::Maker));
    }
}
