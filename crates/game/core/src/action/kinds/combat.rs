use crate::action::{ActionTransition, RejectReason, effects, guard};
use crate::env::GameEnv;
use crate::resolution::{AttackPlan, can_general_attack, plan_attack};
use crate::state::{GameState, LogKind, PlayerId, UnitId, UnitType, VfxKind, VfxSize};

const MAX_MINE_VULNERABILITY: u32 = 2;
const ATTACK_DEBUFF: (u32, u32) = (2, 2);

/// General strike against an enemy unit on a cardinal line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackAction {
    pub unit: UnitId,
    pub target: UnitId,
}

impl AttackAction {
    pub fn new(unit: UnitId, target: UnitId) -> Self {
        Self { unit, target }
    }
}

impl ActionTransition for AttackAction {
    type Error = RejectReason;
    type Result = AttackPlan;

    fn player(&self) -> PlayerId {
        self.unit.owner
    }

    fn actor(&self) -> Option<UnitId> {
        Some(self.unit)
    }

    fn pre_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        guard::acting_unit_of(state, self.player(), self.unit, UnitType::General)?;
        can_general_attack(state, env.config(), self.unit, self.target).map(|_| ())
    }

    fn apply(&self, state: &mut GameState, env: &GameEnv<'_>) -> Result<AttackPlan, Self::Error> {
        let attacker = state
            .unit(self.unit)
            .cloned()
            .ok_or(RejectReason::UnitNotFound(self.unit))?;
        let target = state
            .unit(self.target)
            .cloned()
            .ok_or(RejectReason::InvalidTarget)?;
        let plan = plan_attack(state, &attacker, &target);
        let owner = self.player();

        guard::charge(state, self.unit, plan.cost)?;
        state.players[owner].quest.general_damage += plan.damage;
        if plan.heal_attacker > 0 {
            effects::heal_unit(state, self.unit, plan.heal_attacker);
        }

        let entry = state
            .entry("log_attack_hit", LogKind::Combat)
            .owned_by(owner)
            .with("attacker", self.unit.to_string())
            .with("target", self.target.to_string())
            .with("dmg", plan.damage);
        state.log(entry);
        if plan.reduced {
            let entry = state
                .entry("log_evol_gen_b_dmg_reduce", LogKind::Evolution)
                .owned_by(self.target.owner)
                .with("target", self.target.to_string());
            state.log(entry);
        }
        state.push_vfx(
            VfxKind::Explosion,
            target.position,
            VfxSize::Small,
            env.now_ms(),
        );

        let killed = effects::damage_unit(state, self.target, plan.damage, Some(owner));
        if !killed {
            self.apply_on_hit(state, env, &plan);
        }
        guard::mark_acted(state, self.unit)?;
        Ok(plan)
    }

    fn post_validate(&self, state: &GameState, env: &GameEnv<'_>) -> Result<(), Self::Error> {
        effects::check_invariants(state, env.config())
    }
}

impl AttackAction {
    /// Status effects, flag drop and displacement on a surviving target.
    fn apply_on_hit(&self, state: &mut GameState, env: &GameEnv<'_>, plan: &AttackPlan) {
        let mut dropped = false;
        if let Some(t) = state.unit_mut(self.target) {
            if plan.add_vulnerability {
                t.status.mine_vulnerability =
                    (t.status.mine_vulnerability + 1).min(MAX_MINE_VULNERABILITY);
            }
            if plan.apply_debuff {
                t.status.apply_debuff(ATTACK_DEBUFF.0, ATTACK_DEBUFF.1);
            }
            dropped = std::mem::take(&mut t.has_flag);
        }
        if dropped {
            let entry = state
                .entry("log_flag_drop", LogKind::Info)
                .owned_by(self.target.owner)
                .with("unit", self.target.to_string());
            state.log(entry);
        }

        let Some(push) = plan.push else {
            return;
        };
        if let Some(from) = effects::relocate(state, self.target, push.target_to) {
            effects::resolve_arrival(state, env, self.target, from);
        }
        if let Some(from) = effects::relocate(state, self.unit, push.attacker_to) {
            effects::resolve_arrival(state, env, self.unit, from);
        }
    }
}
