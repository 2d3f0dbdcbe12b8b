use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};

use arrayvec::ArrayVec;

use crate::config::GameConfig;

use super::common::{Branch, PlayerId, Position, Variant};
use super::mine::MineId;
use super::unit::{Unit, UnitId, UnitType};

/// Progress on one evolution branch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BranchLevel {
    pub level: u8,
    pub variant: Option<Variant>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitEvolution {
    pub a: BranchLevel,
    pub b: BranchLevel,
}

impl UnitEvolution {
    pub fn branch(&self, branch: Branch) -> &BranchLevel {
        match branch {
            Branch::A => &self.a,
            Branch::B => &self.b,
        }
    }

    pub fn branch_mut(&mut self, branch: Branch) -> &mut BranchLevel {
        match branch {
            Branch::A => &mut self.a,
            Branch::B => &mut self.b,
        }
    }
}

/// Evolution levels for all five unit types of one player.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionTree {
    tracks: [UnitEvolution; GameConfig::ROSTER_SIZE],
}

impl EvolutionTree {
    pub fn get(&self, kind: UnitType) -> &UnitEvolution {
        &self.tracks[kind.index()]
    }

    pub fn get_mut(&mut self, kind: UnitType) -> &mut UnitEvolution {
        &mut self.tracks[kind.index()]
    }

    pub fn level(&self, kind: UnitType, branch: Branch) -> u8 {
        self.get(kind).branch(branch).level
    }

    /// Level 3 with the given specialisation.
    pub fn is_variant(&self, kind: UnitType, branch: Branch, variant: Variant) -> bool {
        let track = self.get(kind).branch(branch);
        track.level >= GameConfig::MAX_EVOLUTION_LEVEL && track.variant == Some(variant)
    }

    pub fn set(&mut self, kind: UnitType, branch: Branch, level: u8, variant: Option<Variant>) {
        let track = self.get_mut(kind).branch_mut(branch);
        track.level = level.min(GameConfig::MAX_EVOLUTION_LEVEL);
        track.variant = variant;
    }
}

/// Cumulative counters that gate evolution, plus per-round bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuestStats {
    pub general_damage: u32,
    pub general_flag_steps: u32,
    pub sweeper_mines_marked: u32,
    pub sweeper_mines_revealed: u32,
    pub consecutive_safe_rounds: u32,
    pub ranger_steps: u32,
    pub ranger_mines_moved: u32,
    pub maker_mines_triggered_by_enemy: u32,
    pub maker_mines_placed: u32,
    pub defuser_mines_soaked: u32,
    pub defuser_mines_disarmed: u32,

    pub triggered_mine_this_round: bool,
    pub sweeper_scans_this_round: u32,
    #[cfg_attr(feature = "serde", serde(with = "id_set"))]
    pub ranger_mines_moved_this_round: BTreeSet<MineId>,
    #[cfg_attr(feature = "serde", serde(with = "id_set"))]
    pub flag_spirit_damage_taken_this_turn: BTreeSet<UnitId>,
}

impl QuestStats {
    /// Counter that gates the given branch of `kind`.
    pub fn progress(&self, kind: UnitType, branch: Branch) -> u32 {
        match (kind, branch) {
            (UnitType::General, Branch::A) => self.general_damage,
            (UnitType::General, Branch::B) => self.general_flag_steps,
            (UnitType::Sweeper, Branch::A) => self.sweeper_mines_marked,
            (UnitType::Sweeper, Branch::B) => self.consecutive_safe_rounds,
            (UnitType::Ranger, Branch::A) => self.ranger_steps,
            (UnitType::Ranger, Branch::B) => self.ranger_mines_moved,
            (UnitType::Maker, Branch::A) => self.maker_mines_triggered_by_enemy,
            (UnitType::Maker, Branch::B) => self.maker_mines_placed,
            (UnitType::Defuser, Branch::A) => self.defuser_mines_soaked,
            (UnitType::Defuser, Branch::B) => self.defuser_mines_disarmed,
        }
    }
}

/// Sets serialize as plain ordered string arrays.
#[cfg(feature = "serde")]
mod id_set {
    use std::collections::BTreeSet;
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(set: &BTreeSet<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_seq(set.iter().map(ToString::to_string))
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<BTreeSet<T>, D::Error>
    where
        T: FromStr + Ord,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|raw| raw.parse::<T>().map_err(serde::de::Error::custom))
            .collect()
    }
}

pub type Roster = ArrayVec<Unit, { GameConfig::ROSTER_SIZE }>;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerState {
    pub id: PlayerId,
    pub energy: u32,
    pub units: Roster,
    pub evolution: EvolutionTree,
    /// Where this player's flag is: its base, its carrier, or where it was dropped.
    pub flag_position: Position,
    pub moves_made_this_turn: u32,
    pub flag_moves_made_this_turn: u32,
    pub non_general_flag_moves_made_this_turn: u32,
    pub skips_this_round: u32,
    pub energy_from_kills: u32,
    pub quest: QuestStats,
    /// Finished setup (placement) or confirmed planning (thinking).
    pub ready: bool,
}

impl PlayerState {
    pub fn new(id: PlayerId, energy: u32) -> Self {
        let units = UnitType::ALL
            .into_iter()
            .map(|kind| {
                let slot = kind.spawn_slot();
                Unit::new(UnitId::new(id, kind), Position::new(slot.r, id.mirror_col(slot.c)))
            })
            .collect();
        Self {
            id,
            energy,
            units,
            evolution: EvolutionTree::default(),
            flag_position: id.flag_base(),
            moves_made_this_turn: 0,
            flag_moves_made_this_turn: 0,
            non_general_flag_moves_made_this_turn: 0,
            skips_this_round: 0,
            energy_from_kills: 0,
            quest: QuestStats::default(),
            ready: false,
        }
    }

    pub fn unit(&self, kind: UnitType) -> Option<&Unit> {
        self.units.iter().find(|u| u.kind() == kind)
    }

    pub fn unit_mut(&mut self, kind: UnitType) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.kind() == kind)
    }

    pub fn general(&self) -> Option<&Unit> {
        self.unit(UnitType::General)
    }

    pub fn living(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.is_alive())
    }

    pub fn carrier(&self) -> Option<&Unit> {
        self.units.iter().find(|u| u.is_alive() && u.has_flag)
    }

    pub fn has_pending_units(&self) -> bool {
        self.units.iter().any(Unit::can_act)
    }

    pub fn level(&self, kind: UnitType, branch: Branch) -> u8 {
        self.evolution.level(kind, branch)
    }

    pub fn is_variant(&self, kind: UnitType, branch: Branch, variant: Variant) -> bool {
        self.evolution.is_variant(kind, branch, variant)
    }

    /// Clears the counters that reset whenever turn ownership comes back.
    pub fn reset_turn_counters(&mut self) {
        self.moves_made_this_turn = 0;
        self.flag_moves_made_this_turn = 0;
        self.non_general_flag_moves_made_this_turn = 0;
        self.quest.flag_spirit_damage_taken_this_turn.clear();
    }

    /// New energy-cap baseline for every unit of this player.
    pub fn checkpoint_energy(&mut self) {
        let energy = self.energy;
        for unit in &mut self.units {
            unit.start_of_action_energy = energy;
            unit.energy_used_this_turn = 0;
            unit.moved_this_turn = false;
        }
    }
}

/// Both player records. Deserialization rejects a snapshot missing either.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Players {
    #[cfg_attr(feature = "serde", serde(rename = "P1"))]
    pub p1: PlayerState,
    #[cfg_attr(feature = "serde", serde(rename = "P2"))]
    pub p2: PlayerState,
}

impl Players {
    pub fn new(energy: u32) -> Self {
        Self {
            p1: PlayerState::new(PlayerId::P1, energy),
            p2: PlayerState::new(PlayerId::P2, energy),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerState> {
        [&self.p1, &self.p2].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerState> {
        [&mut self.p1, &mut self.p2].into_iter()
    }

    pub fn all_units(&self) -> impl Iterator<Item = &Unit> {
        self.p1.units.iter().chain(self.p2.units.iter())
    }

    pub fn all_units_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.p1.units.iter_mut().chain(self.p2.units.iter_mut())
    }
}

impl Index<PlayerId> for Players {
    type Output = PlayerState;

    fn index(&self, index: PlayerId) -> &Self::Output {
        match index {
            PlayerId::P1 => &self.p1,
            PlayerId::P2 => &self.p2,
        }
    }
}

impl IndexMut<PlayerId> for Players {
    fn index_mut(&mut self, index: PlayerId) -> &mut Self::Output {
        match index {
            PlayerId::P1 => &mut self.p1,
            PlayerId::P2 => &mut self.p2,
        }
    }
}
