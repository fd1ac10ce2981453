use async_trait::async_trait;
use std::sync::Arc;

use crewline_core::StaffingEngine;

use crate::source::Source;
use crate::types::{BenchmarkQuery, BranchStanding};

/// Runs the staffing estimator once per branch in the query's universe and
/// emits one standing per branch. Every branch sees identical parameters,
/// so standings are directly comparable.
///
/// A per-branch estimate failure fails the whole fetch: the reachable
/// failures are chain-wide data absences, and a ranking computed around a
/// hole would be misleading.
pub struct BranchEstimateSource {
    engine: Arc<StaffingEngine>,
}

impl BranchEstimateSource {
    pub fn new(engine: Arc<StaffingEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Source<BenchmarkQuery, BranchStanding> for BranchEstimateSource {
    fn enable(&self, _query: &BenchmarkQuery) -> bool {
        !self.engine.branches().is_empty()
    }

    async fn get_candidates(&self, query: &BenchmarkQuery) -> Result<Vec<BranchStanding>, String> {
        let mut standings = Vec::with_capacity(query.branches.len());
        for branch in &query.branches {
            let estimate = self
                .engine
                .estimate(&query.staffing_request(branch))
                .map_err(|err| format!("branch '{}': {}", branch, err))?;
            standings.push(BranchStanding::from_estimate(&estimate));
        }
        Ok(standings)
    }
}
