use async_trait::async_trait;

use crate::scorer::Scorer;
use crate::types::{BenchmarkQuery, BranchStanding};

/// Computes the understaffing signals for each branch:
/// `headcount_gap = recommended - historical average headcount` (zero
/// history counts as zero headcount) and `gap_ratio = gap / max(history, 1)`.
/// A positive gap means the sales-driven requirement exceeds what the branch
/// has historically fielded for the shift.
pub struct HeadcountGapScorer;

#[async_trait]
impl Scorer<BenchmarkQuery, BranchStanding> for HeadcountGapScorer {
    async fn score(
        &self,
        _query: &BenchmarkQuery,
        candidates: &[BranchStanding],
    ) -> Result<Vec<BranchStanding>, String> {
        let scored = candidates
            .iter()
            .map(|standing| {
                let historical = standing.historical_headcount.unwrap_or(0.0);
                let gap = standing.recommended_staff as f64 - historical;
                BranchStanding {
                    headcount_gap: Some(gap),
                    gap_ratio: Some(gap / historical.max(1.0)),
                    ..BranchStanding::default()
                }
            })
            .collect();
        Ok(scored)
    }

    fn update(&self, candidate: &mut BranchStanding, scored: BranchStanding) {
        candidate.headcount_gap = scored.headcount_gap;
        candidate.gap_ratio = scored.gap_ratio;
    }
}
