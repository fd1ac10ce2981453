use async_trait::async_trait;
use std::sync::Arc;

use crewline_core::{StaffingEngine, StaffingError, StaffingResult};

use crate::candidate_pipeline::{CandidatePipeline, PipelineResult};
use crate::components::benchmark_log_side_effect::BenchmarkLogSideEffect;
use crate::components::branch_estimate_source::BranchEstimateSource;
use crate::components::branch_scope_filter::BranchScopeFilter;
use crate::components::branch_universe_hydrator::BranchUniverseHydrator;
use crate::components::gap_rank_selector::GapRankSelector;
use crate::components::headcount_gap_scorer::HeadcountGapScorer;
use crate::filter::Filter;
use crate::hydrator::Hydrator;
use crate::query_hydrator::QueryHydrator;
use crate::scorer::Scorer;
use crate::selector::Selector;
use crate::side_effect::SideEffect;
use crate::source::Source;
use crate::types::{BenchmarkQuery, BenchmarkReport, BranchStanding};

/// The cross-branch staffing pressure pipeline.
///
/// Stage wiring:
/// 1. BranchUniverseHydrator fills the branch universe from attendance
/// 2. BranchEstimateSource produces one standing per branch
/// 3. BranchScopeFilter applies the optional branch restriction
/// 4. HeadcountGapScorer computes gap and gap ratio
/// 5. GapRankSelector orders by (gap, demand, -productivity) and cuts to N
/// 6. BenchmarkLogSideEffect logs the completed ranking
pub struct StaffingBenchmarkPipeline {
    query_hydrators: Vec<Box<dyn QueryHydrator<BenchmarkQuery>>>,
    sources: Vec<Box<dyn Source<BenchmarkQuery, BranchStanding>>>,
    hydrators: Vec<Box<dyn Hydrator<BenchmarkQuery, BranchStanding>>>,
    filters: Vec<Box<dyn Filter<BenchmarkQuery, BranchStanding>>>,
    scorers: Vec<Box<dyn Scorer<BenchmarkQuery, BranchStanding>>>,
    selector: GapRankSelector,
    post_selection_hydrators: Vec<Box<dyn Hydrator<BenchmarkQuery, BranchStanding>>>,
    post_selection_filters: Vec<Box<dyn Filter<BenchmarkQuery, BranchStanding>>>,
    side_effects: Arc<Vec<Box<dyn SideEffect<BenchmarkQuery, BranchStanding>>>>,
    result_size: usize,
}

impl StaffingBenchmarkPipeline {
    /// Wire the pipeline against one materialized engine snapshot.
    pub fn new(engine: Arc<StaffingEngine>, top_n: usize) -> Self {
        let query_hydrators: Vec<Box<dyn QueryHydrator<BenchmarkQuery>>> =
            vec![Box::new(BranchUniverseHydrator::new(Arc::clone(&engine)))];

        let sources: Vec<Box<dyn Source<BenchmarkQuery, BranchStanding>>> =
            vec![Box::new(BranchEstimateSource::new(engine))];

        let filters: Vec<Box<dyn Filter<BenchmarkQuery, BranchStanding>>> =
            vec![Box::new(BranchScopeFilter)];

        let scorers: Vec<Box<dyn Scorer<BenchmarkQuery, BranchStanding>>> =
            vec![Box::new(HeadcountGapScorer)];

        let side_effects: Arc<Vec<Box<dyn SideEffect<BenchmarkQuery, BranchStanding>>>> =
            Arc::new(vec![Box::new(BenchmarkLogSideEffect)]);

        Self {
            query_hydrators,
            sources,
            hydrators: Vec::new(),
            filters,
            scorers,
            selector: GapRankSelector { top_n },
            post_selection_hydrators: Vec::new(),
            post_selection_filters: Vec::new(),
            side_effects,
            result_size: top_n,
        }
    }
}

#[async_trait]
impl CandidatePipeline<BenchmarkQuery, BranchStanding> for StaffingBenchmarkPipeline {
    fn query_hydrators(&self) -> &[Box<dyn QueryHydrator<BenchmarkQuery>>] {
        &self.query_hydrators
    }

    fn sources(&self) -> &[Box<dyn Source<BenchmarkQuery, BranchStanding>>] {
        &self.sources
    }

    fn hydrators(&self) -> &[Box<dyn Hydrator<BenchmarkQuery, BranchStanding>>] {
        &self.hydrators
    }

    fn filters(&self) -> &[Box<dyn Filter<BenchmarkQuery, BranchStanding>>] {
        &self.filters
    }

    fn scorers(&self) -> &[Box<dyn Scorer<BenchmarkQuery, BranchStanding>>] {
        &self.scorers
    }

    fn selector(&self) -> &dyn Selector<BenchmarkQuery, BranchStanding> {
        &self.selector
    }

    fn post_selection_hydrators(&self) -> &[Box<dyn Hydrator<BenchmarkQuery, BranchStanding>>] {
        &self.post_selection_hydrators
    }

    fn post_selection_filters(&self) -> &[Box<dyn Filter<BenchmarkQuery, BranchStanding>>] {
        &self.post_selection_filters
    }

    fn side_effects(&self) -> Arc<Vec<Box<dyn SideEffect<BenchmarkQuery, BranchStanding>>>> {
        Arc::clone(&self.side_effects)
    }

    fn result_size(&self) -> usize {
        self.result_size
    }
}

/// Run a benchmark query end to end and shape the result into a report.
///
/// Fails up front with `NoAttendanceData` when the feed has no branches at
/// all; stage failures surface as `Benchmark` errors with the failing stage
/// named.
pub async fn run_benchmark(
    engine: Arc<StaffingEngine>,
    query: BenchmarkQuery,
) -> StaffingResult<BenchmarkReport> {
    if engine.branches().is_empty() {
        return Err(StaffingError::NoAttendanceData);
    }

    let pipeline = StaffingBenchmarkPipeline::new(engine, query.top_n);
    let result: PipelineResult<BenchmarkQuery, BranchStanding> = pipeline
        .execute(query)
        .await
        .map_err(StaffingError::Benchmark)?;

    let fallbacks = result
        .retrieved_candidates
        .iter()
        .filter(|standing| standing.used_global_productivity)
        .count();

    let query = result.query;
    Ok(BenchmarkReport {
        shift_name: query.shift_name,
        target_period: query.target_period,
        day_of_week: query.day_of_week,
        branches_evaluated: result.retrieved_candidates.len(),
        branches_excluded: result.filtered_candidates.len(),
        top_n: query.top_n,
        buffer_pct: query.buffer_pct,
        demand_override_used: query.demand_override.is_some(),
        global_productivity_fallbacks: fallbacks,
        rankings: result.selected_candidates,
        assumptions: vec![
            "Branches are ranked by the gap between recommended staff and historical average \
             headcount for the requested shift."
                .to_string(),
            "A positive headcount gap indicates the branch is likely understaffed relative to \
             its sales-driven labor requirement."
                .to_string(),
            "Sales figures are scaled units, so the ranking reflects relative staffing \
             pressure rather than absolute labor cost."
                .to_string(),
        ],
    })
}
