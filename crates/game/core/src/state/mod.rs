//! Authoritative game state representation.
//!
//! [`GameState`] is the single aggregate for a match: board, rosters, mines,
//! buildings, transient effects and the log history. Runtime layers clone and
//! query it freely but mutate it only through the engine.
mod init;
pub mod log;
#[cfg(feature = "serde")]
mod snapshot;
pub mod types;

pub use log::{LogEntry, LogHistory, LogKind, LogValue};
#[cfg(feature = "serde")]
pub use snapshot::SnapshotError;
pub use types::{
    Board, Branch, BranchLevel, Building, BuildingId, BuildingKind, CARDINALS, Cell, EvolutionTree,
    Mine, MineId, MineType, OreSize, ParseMineIdError, ParseUnitIdError, Phase, PlayerId,
    PlayerState, Players, Position, QuestStats, Roster, SensorKind, SensorResult, Smoke, Unit,
    UnitEvolution, UnitId, UnitStatus, UnitType, Variant, Vfx, VfxKind, VfxSize,
};

/// Canonical snapshot of a match.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    /// Base seed for every random draw. Set once at match creation.
    pub game_seed: u64,
    /// Count of accepted actions. Combined with `game_seed` for RNG draws.
    pub nonce: u64,
    /// Round number, starting at 1.
    pub turn: u32,
    pub phase: Phase,
    pub players: Players,
    pub board: Board,
    pub mines: Vec<Mine>,
    pub buildings: Vec<Building>,
    pub smokes: Vec<Smoke>,
    pub current_player: PlayerId,
    /// Unit that started spending this turn and must finish before another
    /// unit of the same player may act.
    pub active_unit: Option<UnitId>,
    pub logs: LogHistory,
    pub vfx: Vec<Vfx>,
    pub sensor_results: Vec<SensorResult>,
    pub game_over: bool,
    pub winner: Option<PlayerId>,
    /// Bumped on every hand-over of turn ownership.
    pub action_window: u32,
    next_mine_id: u32,
    next_building_id: u32,
}

impl GameState {
    // ===== lookup =====

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        &self.players[id]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[id]
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.players[id.owner].unit(id.kind)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.players[id.owner].unit_mut(id.kind)
    }

    /// Living unit standing on `pos`.
    pub fn unit_at(&self, pos: Position) -> Option<&Unit> {
        self.players
            .all_units()
            .find(|u| u.is_alive() && u.position == pos)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.unit_at(pos).is_some()
    }

    pub fn mine(&self, id: MineId) -> Option<&Mine> {
        self.mines.iter().find(|m| m.id == id)
    }

    pub fn mines_at(&self, pos: Position) -> impl Iterator<Item = &Mine> {
        self.mines.iter().filter(move |m| m.position == pos)
    }

    pub fn mine_of(&self, owner: PlayerId, pos: Position) -> Option<&Mine> {
        self.mines_at(pos).find(|m| m.owner == owner)
    }

    pub fn building_at(&self, pos: Position) -> Option<&Building> {
        self.buildings.iter().find(|b| b.position == pos)
    }

    pub fn buildings_of(
        &self,
        owner: PlayerId,
        kind: BuildingKind,
    ) -> impl Iterator<Item = &Building> {
        self.buildings
            .iter()
            .filter(move |b| b.owner == owner && b.kind == kind)
    }

    /// In bounds, not an obstacle, and holding neither a unit nor a building.
    pub fn is_free(&self, pos: Position) -> bool {
        pos.in_bounds()
            && !self.board.is_obstacle(pos)
            && !self.is_occupied(pos)
            && self.building_at(pos).is_none()
    }

    /// True if `pos` lies under a smoke field owned by the opponent of `viewer`.
    pub fn in_enemy_smoke(&self, viewer: PlayerId, pos: Position) -> bool {
        self.smokes
            .iter()
            .any(|s| s.owner != viewer && s.covers(pos))
    }

    /// Every unit of both players has acted or is dead.
    pub fn round_complete(&self) -> bool {
        self.players.all_units().all(|u| u.is_dead || u.has_acted)
    }

    // ===== allocation =====

    pub fn allocate_mine_id(&mut self) -> MineId {
        let id = MineId(self.next_mine_id);
        self.next_mine_id = self.next_mine_id.wrapping_add(1);
        id
    }

    pub fn allocate_building_id(&mut self) -> BuildingId {
        let id = BuildingId(self.next_building_id);
        self.next_building_id = self.next_building_id.wrapping_add(1);
        id
    }

    // ===== logs and effects =====

    /// Starts a log entry stamped with the current turn and window.
    pub fn entry(&self, key: &str, kind: LogKind) -> LogEntry {
        LogEntry::new(self.turn, self.action_window, key, kind)
    }

    pub fn log(&mut self, entry: LogEntry) -> bool {
        self.logs.push(entry)
    }

    pub fn push_vfx(&mut self, kind: VfxKind, position: Position, size: VfxSize, now_ms: u64) {
        self.vfx.push(Vfx::new(kind, position, size, now_ms));
    }

    /// Drops visual-effect descriptors older than their lifetime.
    pub fn prune_vfx(&mut self, now_ms: u64) {
        self.vfx.retain(|v| !v.is_expired(now_ms));
    }

    /// Clears mark hints on `pos` after its mine layout changed.
    pub fn clear_marks_at(&mut self, pos: Position) {
        self.sensor_results
            .retain(|s| !(s.kind == SensorKind::Mark && s.position == pos));
    }
}
