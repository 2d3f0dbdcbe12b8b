use crate::action::{ActionTransition, RejectReason, effects, guard};
use crate::config::GameConfig;
use crate::env::GameEnv;
use crate::resolution::{scan_blocked, scan_cost, sensor_cost};
use crate::state::{
    Branch, GameState, LogKind, MineId, PlayerId, Position, SensorKind, SensorResult, UnitId,
    UnitType, Variant, VfxKind, VfxSize,
};

/// Sweeper mark scan of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanAction {
    pub unit: UnitId,
    pub target: Position,
}

impl ActionTransition for ScanAction {
    type Error = RejectReason;
    type Result = usize;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let unit = guard::acting_unit_of(state, self.player(), self.unit, UnitType::Sweeper)?;
        if !self.target.in_bounds() {
            return Err(RejectReason::OutOfBounds);
        }
        if unit.position.manhattan(self.target) > GameConfig::SCAN_RANGE {
            return Err(RejectReason::ScanRange);
        }
        if scan_blocked(state, self.player(), self.target) {
            return Err(RejectReason::ScanSmokeBlocked);
        }
        guard::ensure_energy(state, env.config(), unit, scan_cost(state, unit))
    }

    /// Returns the number of enemy mines found on the cell.
    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<usize, Self::Error> {
        let owner = self.player();
        let cost = {
            let unit = state
                .unit(self.unit)
                .ok_or(RejectReason::UnitNotFound(self.unit))?;
            scan_cost(state, unit)
        };
        guard::charge(state, self.unit, cost)?;

        let (found, newly) = reveal_enemy_mines(state, owner, |p| p == self.target);
        let quest = &mut state.players[owner].quest;
        quest.sweeper_scans_this_round += 1;
        quest.sweeper_mines_revealed += newly.len() as u32;
        if !found.is_empty() {
            quest.sweeper_mines_marked += 1;
        }

        state
            .sensor_results
            .retain(|s| !(s.kind == SensorKind::Mark && s.owner == owner && s.position == self.target));
        state.sensor_results.push(SensorResult {
            kind: SensorKind::Mark,
            owner,
            position: self.target,
            count: found.len() as u32,
            turn: state.turn,
        });
        state.push_vfx(VfxKind::Scan, self.target, VfxSize::Small, env.now_ms());

        let key = if found.is_empty() {
            "log_scan_mark_fail"
        } else {
            "log_scan_mark_success"
        };
        let mut entry = state
            .entry(key, LogKind::Mine)
            .owned_by(owner)
            .with("r", self.target.r)
            .with("c", self.target.c);
        if let Some(first) = found.first() {
            entry = entry.about_mine(*first);
        }
        state.log(entry);
        Ok(found.len())
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Reveals enemy mines on cells matching `covers` to `viewer`.
///
/// Returns every matching mine and the subset that was newly revealed.
fn reveal_enemy_mines(
    state: &mut GameState,
    viewer: PlayerId,
    covers: impl Fn(Position) -> bool,
) -> (Vec<MineId>, Vec<MineId>) {
    let mut found = Vec::new();
    let mut newly = Vec::new();
    for mine in state
        .mines
        .iter_mut()
        .filter(|m| m.owner != viewer && covers(m.position))
    {
        found.push(mine.id);
        if mine.reveal_to(viewer) {
            newly.push(mine.id);
        }
    }
    (found, newly)
}

fn count_enemy_mines(state: &GameState, viewer: PlayerId, center: Position) -> u32 {
    state
        .mines
        .iter()
        .filter(|m| m.owner != viewer && m.position.chebyshev(center) <= 1)
        .count() as u32
}

/// Sweeper area sensor: counts enemy mines in the 3x3 around a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorScanAction {
    pub unit: UnitId,
    pub target: Position,
}

impl ActionTransition for SensorScanAction {
    type Error = RejectReason;
    type Result = u32;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let unit = guard::acting_unit_of(state, self.player(), self.unit, UnitType::Sweeper)?;
        if state.players[self.player()].level(UnitType::Sweeper, Branch::B) < 1 {
            return Err(RejectReason::EvolutionLocked);
        }
        if !self.target.in_bounds() {
            return Err(RejectReason::OutOfBounds);
        }
        if unit.position.chebyshev(self.target) > GameConfig::SENSOR_RANGE {
            return Err(RejectReason::ScanRange);
        }
        guard::ensure_energy(state, env.config(), unit, sensor_cost(state, unit))
    }

    /// Returns the count reported for the target area.
    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<u32, Self::Error> {
        let owner = self.player();
        let (cost, caster) = {
            let unit = state
                .unit(self.unit)
                .ok_or(RejectReason::UnitNotFound(self.unit))?;
            (sensor_cost(state, unit), unit.position)
        };
        guard::charge(state, self.unit, cost)?;

        let side = &state.players[owner];
        let level = side.level(UnitType::Sweeper, Branch::B);
        let reveal_area = side.is_variant(UnitType::Sweeper, Branch::B, Variant::Second);
        let around_caster = side.is_variant(UnitType::Sweeper, Branch::B, Variant::First);

        let count = count_enemy_mines(state, owner, self.target);
        if reveal_area {
            let target = self.target;
            let (_, newly) = reveal_enemy_mines(state, owner, |p| p.chebyshev(target) <= 1);
            state.players[owner].quest.sweeper_mines_revealed += newly.len() as u32;
        } else {
            if level >= 2 {
                let (_, newly) = reveal_enemy_mines(state, owner, |p| p == self.target);
                state.players[owner].quest.sweeper_mines_revealed += newly.len() as u32;
            }
            let turn = state.turn;
            state.sensor_results.push(SensorResult {
                kind: SensorKind::Count,
                owner,
                position: self.target,
                count,
                turn,
            });
            if around_caster {
                let around = count_enemy_mines(state, owner, caster);
                state.sensor_results.push(SensorResult {
                    kind: SensorKind::Count,
                    owner,
                    position: caster,
                    count: around,
                    turn,
                });
            }
        }
        state.push_vfx(VfxKind::Scan, self.target, VfxSize::Large, env.now_ms());

        let entry = state
            .entry("log_action_sensor_scan", LogKind::Mine)
            .owned_by(owner)
            .with("r", self.target.r)
            .with("c", self.target.c)
            .with("count", count);
        state.log(entry);
        Ok(count)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}
