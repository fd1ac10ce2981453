use async_trait::async_trait;
use std::sync::Arc;

use crewline_core::StaffingEngine;

use crate::query_hydrator::QueryHydrator;
use crate::types::BenchmarkQuery;

/// Fills the query's branch universe from the attendance feed when the
/// caller left it empty. The universe is every branch seen in the raw feed,
/// sorted, so benchmark runs are deterministic.
pub struct BranchUniverseHydrator {
    engine: Arc<StaffingEngine>,
}

impl BranchUniverseHydrator {
    pub fn new(engine: Arc<StaffingEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl QueryHydrator<BenchmarkQuery> for BranchUniverseHydrator {
    async fn hydrate(&self, query: &BenchmarkQuery) -> Result<BenchmarkQuery, String> {
        if !query.branches.is_empty() {
            return Ok(query.clone());
        }
        Ok(BenchmarkQuery {
            branches: self.engine.branches().to_vec(),
            ..query.clone()
        })
    }

    fn update(&self, query: &mut BenchmarkQuery, hydrated: BenchmarkQuery) {
        query.branches = hydrated.branches;
    }
}
