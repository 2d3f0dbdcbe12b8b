//! Decaying model of what the opponent has been doing.
//!
//! Updated once per observed state change. The scalars feed intent selection
//! and score biases; the hotspot map marks cells the enemy keeps visiting.
//! Nothing here gates legality.

use std::collections::BTreeMap;

use minefront_core::{GameState, PlayerId, Position};

const DECAY: f64 = 0.8;
const HOTSPOT_DECAY: f64 = 0.86;
const HOTSPOT_FLOOR: f64 = 0.35;
const HOTSPOT_CEILING: f64 = 12.0;
const SCALAR_CEILING: f64 = 10.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpponentModel {
    /// Damage and kills recently taken.
    pub aggression: f64,
    /// Enemy movement toward the AI flag.
    pub flag_rush: f64,
    /// New enemy mines.
    pub mine_pressure: f64,
    pub hotspots: BTreeMap<Position, f64>,
    pub samples: u32,
}

impl OpponentModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the transition `prev` → `next` into the model, seen from `ai`.
    pub fn update(&mut self, prev: &GameState, next: &GameState, ai: PlayerId) {
        let enemy = ai.opponent();
        let ai_flag = next.players[ai].flag_position;

        let toward_flag = next.players[enemy]
            .living()
            .filter(|unit| {
                prev.unit(unit.id).is_some_and(|before| {
                    before.is_alive()
                        && unit.position.manhattan(ai_flag) < before.position.manhattan(ai_flag)
                })
            })
            .count();
        let enemy_carrier = next.players[enemy].carrier().is_some();

        let enemy_mines = |s: &GameState| s.mines.iter().filter(|m| m.owner == enemy).count();
        let mine_delta = enemy_mines(next).saturating_sub(enemy_mines(prev));

        let mut hp_lost = 0u32;
        let mut deaths = 0u32;
        for unit in next.players[ai].units.iter() {
            if let Some(before) = prev.unit(unit.id) {
                hp_lost += before.hp.saturating_sub(unit.hp);
                if !before.is_dead && unit.is_dead {
                    deaths += 1;
                }
            }
        }

        let aggression_gain = f64::from(hp_lost) * 0.08 + f64::from(deaths) * 1.5;
        let flag_rush_gain = toward_flag as f64 * 0.9 + if enemy_carrier { 1.7 } else { 0.0 };
        let mine_gain = mine_delta as f64 * 1.4;

        self.aggression = (self.aggression * DECAY + aggression_gain).clamp(0.0, SCALAR_CEILING);
        self.flag_rush = (self.flag_rush * DECAY + flag_rush_gain).clamp(0.0, SCALAR_CEILING);
        self.mine_pressure = (self.mine_pressure * DECAY + mine_gain).clamp(0.0, SCALAR_CEILING);

        self.hotspots.retain(|_, heat| {
            *heat *= HOTSPOT_DECAY;
            *heat >= HOTSPOT_FLOOR
        });
        for unit in next.players[enemy].living() {
            let gain = if unit.has_flag { 2.4 } else { 1.2 };
            let heat = self.hotspots.entry(unit.position).or_insert(0.0);
            *heat = (*heat + gain).clamp(0.0, HOTSPOT_CEILING);
        }
        self.samples += 1;
    }

    /// Hottest cells first; ties keep board order.
    pub fn top_hotspots(&self, limit: usize) -> Vec<(Position, f64)> {
        let mut cells: Vec<_> = self.hotspots.iter().map(|(p, h)| (*p, *h)).collect();
        cells.sort_by(|a, b| b.1.total_cmp(&a.1));
        cells.truncate(limit);
        cells
    }
}
