use std::cmp::Ordering;

use crate::selector::Selector;
use crate::types::{BenchmarkQuery, BranchStanding};

/// Ranks branches by staffing pressure, descending: biggest headcount gap
/// first, ties broken by higher demand (more volume behind the same gap),
/// then by lower productivity (less efficient branches surface first).
pub struct GapRankSelector {
    pub top_n: usize,
}

impl Default for GapRankSelector {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

fn desc(a: f64, b: f64) -> Ordering {
    // Descending with NaN pushed last, mirroring the default selector sort.
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

impl Selector<BenchmarkQuery, BranchStanding> for GapRankSelector {
    fn score(&self, candidate: &BranchStanding) -> f64 {
        candidate.headcount_gap.unwrap_or(f64::NEG_INFINITY)
    }

    fn sort(&self, candidates: Vec<BranchStanding>) -> Vec<BranchStanding> {
        let mut sorted = candidates;
        sorted.sort_by(|a, b| {
            desc(self.score(a), self.score(b))
                .then_with(|| desc(a.demand_used, b.demand_used))
                // lower productivity ranks first, so compare ascending
                .then_with(|| desc(b.productivity_used, a.productivity_used))
        });
        sorted
    }

    fn size(&self) -> Option<usize> {
        Some(self.top_n)
    }
}
