use async_trait::async_trait;
use std::sync::Arc;

use crate::side_effect::{SideEffect, SideEffectInput};
use crate::types::{BenchmarkQuery, BranchStanding};

/// Logs the completed ranking. The gateway's activity log records the tool
/// invocation itself; this is the pipeline-level trace for operators.
pub struct BenchmarkLogSideEffect;

#[async_trait]
impl SideEffect<BenchmarkQuery, BranchStanding> for BenchmarkLogSideEffect {
    async fn run(
        &self,
        input: Arc<SideEffectInput<BenchmarkQuery, BranchStanding>>,
    ) -> Result<(), String> {
        log::info!(
            "request_id={} ranked {} branches for shift {}",
            input.query.request_id,
            input.selected_candidates.len(),
            input.query.shift_name,
        );
        Ok(())
    }
}
