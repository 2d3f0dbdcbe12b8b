//! Final ordering of scored units and actions.
//!
//! Ordering is by total score, then by [`CandidateKind::priority`] so that
//! equal scores resolve toward the more decisive action. Action selection
//! also honours the planning reserve: a costly candidate that would leave
//! less energy than the reserve is skipped unless nothing else remains.

use std::cmp::Ordering;

use crate::providers::ai::types::{Candidate, CandidateKind, UnitCandidate};

/// Highest-scoring unit. The earliest wins a tie.
pub fn best_unit(candidates: &[UnitCandidate]) -> Option<UnitCandidate> {
    candidates
        .iter()
        .copied()
        .reduce(|best, next| if next.total() > best.total() { next } else { best })
}

fn by_score_then_priority(a: &Candidate, b: &Candidate) -> Ordering {
    b.total()
        .total_cmp(&a.total())
        .then_with(|| b.kind.priority().cmp(&a.kind.priority()))
}

/// Candidates best first.
pub fn sort_actions(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(by_score_then_priority);
    candidates
}

/// True when paying for `candidate` keeps at least `reserve` energy.
fn respects_reserve(candidate: &Candidate, energy: u32, reserve: u32) -> bool {
    candidate.kind == CandidateKind::EndTurn
        || candidate.cost == 0
        || energy.checked_sub(candidate.cost).is_some_and(|left| left >= reserve)
}

/// Best candidate after the reserve filter.
///
/// When only ending the turn survives the filter, the reserve is dropped and
/// the full list is ranked instead.
pub fn select_action(candidates: Vec<Candidate>, energy: u32, reserve: u32) -> Option<Candidate> {
    let (kept, held_back): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| respects_reserve(c, energy, reserve));

    let only_end_turn = kept.iter().all(|c| c.kind == CandidateKind::EndTurn);
    let pool = if only_end_turn && !held_back.is_empty() {
        tracing::debug!(
            held_back = held_back.len(),
            reserve,
            "reserve leaves nothing but end turn; ignoring it"
        );
        kept.into_iter().chain(held_back).collect()
    } else {
        kept
    };
    sort_actions(pool).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ai::types::{ScoreBreakdown, Target};
    use minefront_core::{
        EndTurnAction, PlayerId, Position, ScanAction, UnitId, UnitType,
    };

    fn scored(kind: CandidateKind, cost: u32, total: f64) -> Candidate {
        let id = UnitId::new(PlayerId::P2, UnitType::Sweeper);
        let action = match kind {
            CandidateKind::EndTurn => EndTurnAction::for_unit(id).into(),
            _ => minefront_core::Action::from(ScanAction {
                unit: id,
                target: Position::new(3, 12),
            }),
        };
        let mut candidate = Candidate::new(id, kind, action, cost).at(Target::Cell(Position::new(3, 12)));
        candidate.score.total = total;
        candidate
    }

    #[test]
    fn ties_break_on_priority() {
        let sorted = sort_actions(vec![
            scored(CandidateKind::Move, 2, 10.0),
            scored(CandidateKind::Attack, 8, 10.0),
            scored(CandidateKind::Scan, 3, 12.0),
        ]);
        let kinds: Vec<_> = sorted.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, [CandidateKind::Scan, CandidateKind::Attack, CandidateKind::Move]);
    }

    #[test]
    fn reserve_filters_expensive_actions() {
        let picked = select_action(
            vec![
                scored(CandidateKind::Attack, 8, 30.0),
                scored(CandidateKind::Scan, 3, 12.0),
                scored(CandidateKind::EndTurn, 0, 1.0),
            ],
            12,
            6,
        );
        assert_eq!(picked.map(|c| c.kind), Some(CandidateKind::Scan));
    }

    #[test]
    fn reserve_is_dropped_when_only_end_turn_survives() {
        let picked = select_action(
            vec![
                scored(CandidateKind::Attack, 8, 30.0),
                scored(CandidateKind::EndTurn, 0, 1.0),
            ],
            10,
            6,
        );
        assert_eq!(picked.map(|c| c.kind), Some(CandidateKind::Attack));
        assert!(select_action(Vec::new(), 10, 6).is_none());
    }

    #[test]
    fn first_unit_wins_a_tie() {
        let unit = |kind, total| UnitCandidate {
            unit: UnitId::new(PlayerId::P1, kind),
            score: ScoreBreakdown {
                total,
                ..ScoreBreakdown::default()
            },
        };
        let best = best_unit(&[
            unit(UnitType::Ranger, 4.0),
            unit(UnitType::Maker, 4.0),
            unit(UnitType::General, 3.0),
        ]);
        assert_eq!(best.map(|c| c.unit.kind), Some(UnitType::Ranger));
    }
}
