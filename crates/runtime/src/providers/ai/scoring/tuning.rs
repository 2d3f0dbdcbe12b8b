//! Profile-driven bias on top of the difficulty weights.
//!
//! A profile nudges each raw score component by a fixed factor and shifts the
//! energy reserve. [`TuningProfile::Balanced`] is the identity.

use crate::providers::ai::types::{ScoreBreakdown, TuningProfile};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct UnitBias {
    attack: f64,
    flag: f64,
    safety: f64,
    energy: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct ActionBias {
    attack: f64,
    flag: f64,
    safety: f64,
    utility: f64,
    energy: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct TuningBias {
    unit: UnitBias,
    action: ActionBias,
    reserve_delta: i32,
}

fn bias(profile: TuningProfile) -> TuningBias {
    match profile {
        TuningProfile::Aggressive => TuningBias {
            unit: UnitBias {
                attack: 1.8,
                flag: 1.1,
                safety: -1.1,
                energy: -0.2,
            },
            action: ActionBias {
                attack: 2.4,
                flag: 1.2,
                safety: -1.5,
                utility: 0.4,
                energy: -0.2,
            },
            reserve_delta: -2,
        },
        TuningProfile::Balanced => TuningBias::default(),
        TuningProfile::Conservative => TuningBias {
            unit: UnitBias {
                attack: -0.8,
                flag: -0.2,
                safety: 1.7,
                energy: 0.8,
            },
            action: ActionBias {
                attack: -1.1,
                flag: -0.3,
                safety: 2.3,
                utility: 0.6,
                energy: 0.8,
            },
            reserve_delta: 2,
        },
    }
}

/// Adds the profile bias to a unit priority score.
pub fn tune_unit(score: &mut ScoreBreakdown, profile: TuningProfile) {
    let b = bias(profile).unit;
    score.total +=
        score.attack * b.attack + score.flag * b.flag + score.safety * b.safety + score.energy * b.energy;
}

/// Adds the profile bias to an action score.
pub fn tune_action(score: &mut ScoreBreakdown, profile: TuningProfile) {
    let b = bias(profile).action;
    score.total += score.attack * b.attack
        + score.flag * b.flag
        + score.safety * b.safety
        + score.utility * b.utility
        + score.energy * b.energy;
}

/// Shifts the energy reserve by the profile delta, never below zero.
pub fn adjust_reserve(reserve: u32, profile: TuningProfile) -> u32 {
    reserve.saturating_add_signed(bias(profile).reserve_delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScoreBreakdown {
        ScoreBreakdown {
            attack: 2.0,
            flag: 1.0,
            safety: 4.0,
            utility: 3.0,
            energy: 5.0,
            total: 10.0,
            ..ScoreBreakdown::default()
        }
    }

    #[test]
    fn balanced_is_identity() {
        let mut score = sample();
        tune_action(&mut score, TuningProfile::Balanced);
        tune_unit(&mut score, TuningProfile::Balanced);
        assert_eq!(score.total, 10.0);
        assert_eq!(adjust_reserve(6, TuningProfile::Balanced), 6);
    }

    #[test]
    fn profiles_pull_in_opposite_directions() {
        let mut bold = sample();
        tune_action(&mut bold, TuningProfile::Aggressive);
        let mut careful = sample();
        tune_action(&mut careful, TuningProfile::Conservative);
        assert!((bold.total - 10.0).abs() > 0.0);
        assert!(careful.total > bold.total);

        assert_eq!(adjust_reserve(1, TuningProfile::Aggressive), 0);
        assert_eq!(adjust_reserve(6, TuningProfile::Conservative), 8);
    }
}
