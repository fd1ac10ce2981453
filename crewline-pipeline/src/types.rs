use chrono::Weekday;
use serde::Serialize;

use crewline_core::types::serialize_weekday_opt;
use crewline_core::{Period, ShiftName, StaffingEstimate, StaffingRequest};

use crate::candidate_pipeline::HasRequestId;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// A cross-branch staffing benchmark query. The staffing parameters apply
/// identically to every branch so the ranking compares like with like.
#[derive(Clone, Debug)]
pub struct BenchmarkQuery {
    pub request_id: String,
    pub shift_name: ShiftName,
    pub target_period: Option<Period>,
    pub day_of_week: Option<Weekday>,
    pub shift_hours: f64,
    pub buffer_pct: f64,
    pub demand_override: Option<f64>,
    pub top_n: usize,
    /// Optional restriction to a subset of branches (free-text names,
    /// resolved fuzzily). `None` benchmarks the whole chain.
    pub branch_scope: Option<Vec<String>>,
    /// The resolved branch universe. Left empty by the caller and filled by
    /// the universe hydrator.
    pub branches: Vec<String>,
}

impl BenchmarkQuery {
    pub fn new(request_id: impl Into<String>, shift_name: ShiftName) -> BenchmarkQuery {
        BenchmarkQuery {
            request_id: request_id.into(),
            shift_name,
            target_period: None,
            day_of_week: None,
            shift_hours: crewline_core::types::DEFAULT_SHIFT_HOURS,
            buffer_pct: crewline_core::types::DEFAULT_BUFFER_PCT,
            demand_override: None,
            top_n: 5,
            branch_scope: None,
            branches: Vec::new(),
        }
    }

    /// The per-branch estimate request carrying this query's parameters.
    pub fn staffing_request(&self, branch: &str) -> StaffingRequest {
        StaffingRequest {
            branch: branch.to_string(),
            shift_name: self.shift_name,
            shift_hours: self.shift_hours,
            buffer_pct: self.buffer_pct,
            target_period: self.target_period,
            day_of_week: self.day_of_week,
            demand_override: self.demand_override,
        }
    }
}

impl HasRequestId for BenchmarkQuery {
    fn request_id(&self) -> &str {
        &self.request_id
    }
}

// ---------------------------------------------------------------------------
// Candidate types
// ---------------------------------------------------------------------------

/// One branch's standing in the benchmark: its staffing estimate condensed
/// to the ranking signals, plus the scorer-populated gap fields.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BranchStanding {
    pub branch: String,
    pub recommended_staff: u32,
    /// Historical average headcount for the benchmarked shift, when the
    /// branch has any history for it.
    pub historical_headcount: Option<f64>,
    pub demand_used: f64,
    pub productivity_used: f64,
    pub required_labor_hours: f64,
    pub sales_period_used: Option<Period>,
    pub productivity_period_used: Option<Period>,
    /// Whether this branch needed the chain-wide productivity fallback.
    pub used_global_productivity: bool,

    // Scoring fields (populated by scorers)
    pub headcount_gap: Option<f64>,
    pub gap_ratio: Option<f64>,
}

impl BranchStanding {
    /// Condense a full estimate into its benchmark standing.
    pub fn from_estimate(estimate: &StaffingEstimate) -> BranchStanding {
        BranchStanding {
            branch: estimate.branch.clone(),
            recommended_staff: estimate.recommended_staff,
            historical_headcount: estimate.evidence.historical_avg_headcount,
            demand_used: estimate.demand_used,
            productivity_used: estimate.productivity_used,
            required_labor_hours: estimate.required_labor_hours,
            sales_period_used: estimate.evidence.sales_period_used,
            productivity_period_used: estimate.evidence.productivity_period_used,
            used_global_productivity: estimate.evidence.productivity_source
                == crewline_core::ProductivitySource::Global,
            headcount_gap: None,
            gap_ratio: None,
        }
    }
}

/// The benchmark answer: the ranked standings plus the data-quality signals
/// a caller needs to judge how much to trust the ranking.
#[derive(Clone, Debug, Serialize)]
pub struct BenchmarkReport {
    pub shift_name: ShiftName,
    pub target_period: Option<Period>,
    #[serde(serialize_with = "serialize_weekday_opt")]
    pub day_of_week: Option<Weekday>,
    pub rankings: Vec<BranchStanding>,
    pub branches_evaluated: usize,
    pub branches_excluded: usize,
    pub top_n: usize,
    pub buffer_pct: f64,
    pub demand_override_used: bool,
    /// How many evaluated branches leaned on the chain-wide productivity
    /// fallback. A high count weakens the whole ranking.
    pub global_productivity_fallbacks: usize,
    pub assumptions: Vec<String>,
}
