use crate::action::{ActionTransition, RejectReason, effects, guard};
use crate::config::GameConfig;
use crate::env::GameEnv;
use crate::resolution::{can_teleport, check_flag_moves, check_step, limits, move_cost};
use crate::state::{
    Branch, BuildingKind, GameState, LogKind, PlayerId, Position, UnitId, UnitType, Variant,
};

/// One orthogonal step.
///
/// `quoted_cost` is whatever the client displayed. It is carried for
/// diagnostics only; the executor always prices the step itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveAction {
    pub unit: UnitId,
    pub to: Position,
    pub quoted_cost: Option<u32>,
}

impl MoveAction {
    pub fn new(unit: UnitId, to: Position) -> Self {
        Self {
            unit,
            to,
            quoted_cost: None,
        }
    }
}

/// Outcome of an accepted step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub cost: u32,
    pub mines_triggered: usize,
}

impl ActionTransition for MoveAction {
    type Error = RejectReason;
    type Result = MoveOutcome;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let unit = guard::acting_unit(state, self.player(), self.unit)?;
        check_step(state, unit, self.to)?;
        check_flag_moves(state, unit)?;
        guard::ensure_energy(state, env.config(), unit, move_cost(state, unit))
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<MoveOutcome, Self::Error> {
        let unit = state
            .unit(self.unit)
            .cloned()
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        let cost = move_cost(state, &unit);
        if let Some(quoted) = self.quoted_cost.filter(|q| *q != cost) {
            tracing::debug!(unit = %self.unit, quoted, cost, "quoted move cost differs");
        }
        guard::charge(state, self.unit, cost)?;

        let player = state.player_mut(self.unit.owner);
        player.moves_made_this_turn += 1;
        if unit.has_flag {
            if unit.kind() == UnitType::General {
                player.flag_moves_made_this_turn += 1;
            } else {
                player.non_general_flag_moves_made_this_turn += 1;
            }
            player.quest.general_flag_steps += 1;
        }
        if unit.kind() == UnitType::Ranger {
            player.quest.ranger_steps += 1;
        }

        let from = effects::relocate(state, self.unit, self.to)
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        if let Some(u) = state.unit_mut(self.unit) {
            u.moved_this_turn = true;
        }

        kirin_entry(state, self.unit, from);
        let triggered = effects::resolve_arrival(state, env, self.unit, from);

        let shadow_step = unit.kind() == UnitType::Ranger
            && state.players[self.unit.owner].is_variant(UnitType::Ranger, Branch::B, Variant::First);
        if triggered == 0
            && shadow_step
            && let Some(u) = state.unit_mut(self.unit).filter(|u| u.is_alive())
        {
            u.status.stealthed = true;
        }

        let entry = state
            .entry("log_move", LogKind::Move)
            .owned_by(self.unit.owner)
            .with("unit", self.unit.to_string())
            .with("cost", cost);
        state.log(entry);
        Ok(MoveOutcome {
            cost,
            mines_triggered: triggered,
        })
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

/// Entry damage from an enemy General's level-3 b variant-2 flag domain.
///
/// Hits once per unit per turn when the unit newly comes within Chebyshev 1
/// of the enemy flag.
fn kirin_entry(state: &mut GameState, id: UnitId, from: Position) {
    let enemy = id.owner.opponent();
    if !state.players[enemy].is_variant(UnitType::General, Branch::B, Variant::Second) {
        return;
    }
    let flag = state.players[enemy].flag_position;
    let Some(to) = state.unit(id).map(|u| u.position) else {
        return;
    };
    if to.chebyshev(flag) > 1 || from.chebyshev(flag) <= 1 {
        return;
    }
    if !state.players[id.owner]
        .quest
        .flag_spirit_damage_taken_this_turn
        .insert(id)
    {
        return;
    }
    let entry = state
        .entry("log_attack_hit", LogKind::Combat)
        .with("attacker", "evol_gen_b_r3_2")
        .with("target", id.to_string())
        .with("dmg", GameConfig::KIRIN_ENTRY_DAMAGE);
    state.log(entry);
    effects::damage_unit(state, id, GameConfig::KIRIN_ENTRY_DAMAGE, Some(enemy));
}

/// Jump to the player's oldest hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeleportAction {
    pub unit: UnitId,
}

impl TeleportAction {
    fn hub(state: &GameState, owner: PlayerId) -> Result<Position, RejectReason> {
        limits::oldest_building(state, owner, BuildingKind::Hub)
            .map(|hub| hub.position)
            .ok_or(RejectReason::NoHub)
    }
}

impl ActionTransition for TeleportAction {
    type Error = RejectReason;
    type Result = ();

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let unit = guard::acting_unit(state, self.player(), self.unit)?;
        let hub = Self::hub(state, self.player())?;
        if !can_teleport(state, unit) {
            return Err(RejectReason::EvolutionLocked);
        }
        if state.is_occupied(hub) {
            return Err(RejectReason::UnitOnHub);
        }
        guard::ensure_energy(state, env.config(), unit, GameConfig::TELEPORT_COST)
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        let hub = Self::hub(state, self.player())?;
        guard::charge(state, self.unit, GameConfig::TELEPORT_COST)?;
        let from = effects::relocate(state, self.unit, hub)
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        effects::resolve_arrival(state, env, self.unit, from);
        guard::mark_acted(state, self.unit)?;

        let entry = state
            .entry("log_teleport", LogKind::Move)
            .owned_by(self.unit.owner)
            .with("unit", self.unit.to_string());
        state.log(entry);
        Ok(())
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}
