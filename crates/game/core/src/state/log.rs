//! Localized game log history.
//!
//! Entries carry a message key plus parameters; rendering them is the
//! presentation layer's job. Three closed key sets drive multiplayer
//! fairness: private hints render only to their owner, a subset of those is
//! deduplicated per turn, and enemy-mine keys are filtered per viewer by the
//! referenced mine's reveal list.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use crate::config::GameConfig;

use super::types::{Mine, MineId, PlayerId};

/// Keys only the acting player may see.
pub const PRIVATE_HINT_KEYS: &[&str] = &[
    "log_energy_cap",
    "log_low_energy",
    "log_low_energy_attack",
    "log_low_energy_evolve",
    "log_out_of_range",
    "log_unit_acted",
    "log_committed",
    "log_scan_range",
    "log_disarm_range",
    "log_no_mine",
    "log_space_has_mine",
    "log_obstacle",
    "log_maker_range",
    "log_mine_limit",
    "log_mine_zone",
    "log_own_mine",
    "log_mine_not_revealed",
    "log_general_flag_move_limit",
    "log_flag_move_limit",
    "log_hidden_mine",
    "log_max_mines",
    "log_max_buildings",
    "log_unit_on_hub",
    "log_scan_smoke_blocked",
];

/// Private hints that are written at most once per owner, turn and window.
pub const ONCE_PER_TURN_KEYS: &[&str] = &[
    "log_energy_cap",
    "log_unit_acted",
    "log_general_flag_move_limit",
    "log_flag_move_limit",
];

/// Keys that leak the position of a specific mine.
pub const ENEMY_MINE_KEYS: &[&str] = &[
    "log_placement_mines",
    "log_place_mine",
    "log_pickup_mine",
    "log_mine_placed",
    "log_mine_limit",
    "log_mine_zone",
];

pub fn is_private_hint(key: &str) -> bool {
    PRIVATE_HINT_KEYS.contains(&key)
}

pub fn is_once_per_turn(key: &str) -> bool {
    ONCE_PER_TURN_KEYS.contains(&key)
}

pub fn is_enemy_mine_key(key: &str) -> bool {
    ENEMY_MINE_KEYS.contains(&key)
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LogKind {
    Info,
    Combat,
    Mine,
    Evolution,
    Error,
    Move,
}

/// A message parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogValue {
    Number(i64),
    Text(String),
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Number(n) => write!(f, "{n}"),
            LogValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<u32> for LogValue {
    fn from(value: u32) -> Self {
        LogValue::Number(i64::from(value))
    }
}

impl From<i32> for LogValue {
    fn from(value: i32) -> Self {
        LogValue::Number(i64::from(value))
    }
}

impl From<u8> for LogValue {
    fn from(value: u8) -> Self {
        LogValue::Number(i64::from(value))
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        LogValue::Text(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        LogValue::Text(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogEntry {
    pub turn: u32,
    pub key: String,
    pub params: BTreeMap<String, LogValue>,
    pub owner: Option<PlayerId>,
    pub kind: LogKind,
    pub mine: Option<MineId>,
    /// Action window the entry was written in.
    pub window: u32,
}

impl LogEntry {
    pub fn new(turn: u32, window: u32, key: impl Into<String>, kind: LogKind) -> Self {
        Self {
            turn,
            key: key.into(),
            params: BTreeMap::new(),
            owner: None,
            kind,
            mine: None,
            window,
        }
    }

    #[must_use]
    pub fn owned_by(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<LogValue>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn about_mine(mut self, mine: MineId) -> Self {
        self.mine = Some(mine);
        self
    }

    pub fn param(&self, name: &str) -> Option<&LogValue> {
        self.params.get(name)
    }

    /// Whether `viewer` may see this entry, given the mines currently known.
    pub fn is_visible_to<'m>(
        &self,
        viewer: PlayerId,
        mut mines: impl Iterator<Item = &'m Mine>,
    ) -> bool {
        let own = self.owner.is_none_or(|owner| owner == viewer);
        if is_private_hint(&self.key) && !own {
            return false;
        }
        if is_enemy_mine_key(&self.key) && !own {
            return match self.mine {
                Some(id) => mines.any(|m| m.id == id && m.is_visible_to(viewer)),
                None => false,
            };
        }
        true
    }
}

/// Newest-first history capped at [`GameConfig::MAX_LOG_ENTRIES`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogHistory {
    entries: VecDeque<LogEntry>,
}

impl LogHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry at the front. Returns false when a once-per-turn key was
    /// already written for the same owner, turn and window.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        if is_once_per_turn(&entry.key)
            && self.entries.iter().any(|e| {
                e.key == entry.key
                    && e.owner == entry.owner
                    && e.turn == entry.turn
                    && e.window == entry.window
            })
        {
            return false;
        }
        self.entries.push_front(entry);
        self.entries.truncate(GameConfig::MAX_LOG_ENTRIES);
        true
    }

    /// Adds `entry` unless an entry with the same key and turn already exists.
    pub fn push_once_this_turn(&mut self, entry: LogEntry) -> bool {
        if self
            .entries
            .iter()
            .any(|e| e.key == entry.key && e.turn == entry.turn)
        {
            return false;
        }
        self.push(entry)
    }

    /// Replaces any prior entry with the same key and owner.
    pub fn upsert(&mut self, entry: LogEntry) {
        self.entries
            .retain(|e| !(e.key == entry.key && e.owner == entry.owner));
        self.push(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn visible_to<'a>(
        &'a self,
        viewer: PlayerId,
        mines: &'a [Mine],
    ) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.is_visible_to(viewer, mines.iter()))
    }

    /// Drops later duplicates of the same entry, keeping the newest copy.
    pub fn dedupe(&mut self) {
        let mut seen = HashSet::new();
        self.entries.retain(|e| seen.insert(e.clone()));
    }

    /// Folds entries received from a peer into this history.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = LogEntry>) {
        let mut incoming: Vec<_> = incoming.into_iter().collect();
        // Oldest first so the newest ends up at the front.
        incoming.reverse();
        for entry in incoming {
            self.entries.push_front(entry);
        }
        self.dedupe();
        self.entries.truncate(GameConfig::MAX_LOG_ENTRIES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MineType, Position};

    fn entry(key: &str, owner: PlayerId) -> LogEntry {
        LogEntry::new(3, 1, key, LogKind::Error).owned_by(owner)
    }

    #[test]
    fn once_per_turn_keys_dedupe_within_window() {
        let mut logs = LogHistory::new();
        assert!(logs.push(entry("log_energy_cap", PlayerId::P1).with("cap", 6u32)));
        assert!(!logs.push(entry("log_energy_cap", PlayerId::P1).with("cap", 6u32)));
        assert!(logs.push(entry("log_energy_cap", PlayerId::P2)));
        assert!(logs.push(entry("log_out_of_range", PlayerId::P1)));
        assert!(logs.push(entry("log_out_of_range", PlayerId::P1)));
        assert_eq!(logs.len(), 4);
    }

    #[test]
    fn history_is_capped_newest_first() {
        let mut logs = LogHistory::new();
        for turn in 0..150 {
            logs.push(LogEntry::new(turn, 0, "log_round_start", LogKind::Info));
        }
        assert_eq!(logs.len(), GameConfig::MAX_LOG_ENTRIES);
        assert_eq!(logs.latest().map(|e| e.turn), Some(149));
    }

    #[test]
    fn private_hints_hidden_from_opponent() {
        let mut logs = LogHistory::new();
        logs.push(entry("log_out_of_range", PlayerId::P1));
        logs.push(LogEntry::new(3, 1, "log_attack_hit", LogKind::Combat).owned_by(PlayerId::P1));
        assert_eq!(logs.visible_to(PlayerId::P1, &[]).count(), 2);
        assert_eq!(logs.visible_to(PlayerId::P2, &[]).count(), 1);
    }

    #[test]
    fn enemy_mine_logs_follow_reveal_list() {
        let mut mine = Mine::new(MineId(1), PlayerId::P1, MineType::Normal, Position::new(2, 4));
        let mut logs = LogHistory::new();
        logs.push(
            LogEntry::new(1, 0, "log_mine_placed", LogKind::Mine)
                .owned_by(PlayerId::P1)
                .about_mine(mine.id),
        );
        assert_eq!(logs.visible_to(PlayerId::P2, std::slice::from_ref(&mine)).count(), 0);
        mine.reveal_to(PlayerId::P2);
        assert_eq!(logs.visible_to(PlayerId::P2, std::slice::from_ref(&mine)).count(), 1);
        assert_eq!(logs.visible_to(PlayerId::P2, &[]).count(), 0);
    }

    #[test]
    fn upsert_replaces_placement_summary() {
        let mut logs = LogHistory::new();
        logs.upsert(entry("log_placement_units", PlayerId::P1).with("count", 5u32));
        logs.upsert(entry("log_placement_units", PlayerId::P1).with("count", 4u32));
        logs.upsert(entry("log_placement_units", PlayerId::P2).with("count", 5u32));
        assert_eq!(logs.len(), 2);
        assert_eq!(
            logs.iter()
                .find(|e| e.owner == Some(PlayerId::P1))
                .and_then(|e| e.param("count")),
            Some(&LogValue::Number(4))
        );
    }

    #[test]
    fn merge_drops_duplicates() {
        let mut logs = LogHistory::new();
        let a = LogEntry::new(1, 0, "log_round_start", LogKind::Info).with("round", 1u32);
        let b = LogEntry::new(1, 1, "log_action_phase", LogKind::Info);
        logs.push(a.clone());
        logs.merge([b.clone(), a]);
        assert_eq!(logs.len(), 2);
        assert_eq!(logs.latest(), Some(&b));
    }
}
