//! Tool operations.
//!
//! The operations an agent gateway may invoke, as a tagged enum with typed
//! parameter blocks. This is where loose agent-supplied text turns into the
//! core's validated request types: shift names, weekdays, and period keys
//! are parsed here and rejected with a named parameter error before any
//! table work happens.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crewline_core::{
    ForecastRequest, Period, ShiftLengthRequest, ShiftName, StaffingRequest,
};
use crewline_pipeline::BenchmarkQuery;

use crate::error::{BridgeError, BridgeResult};

fn default_shift_hours() -> f64 {
    crewline_core::types::DEFAULT_SHIFT_HOURS
}

fn default_buffer_pct() -> f64 {
    crewline_core::types::DEFAULT_BUFFER_PCT
}

fn default_top_n() -> usize {
    5
}

fn default_months_ahead() -> usize {
    3
}

fn default_activity_limit() -> usize {
    25
}

/// Parameters for a single-branch staffing estimate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaffingParams {
    pub branch: String,
    pub shift_name: String,
    #[serde(default = "default_shift_hours")]
    pub shift_hours: f64,
    #[serde(default = "default_buffer_pct")]
    pub buffer_pct: f64,
    #[serde(default)]
    pub target_period: Option<String>,
    #[serde(default)]
    pub day_of_week: Option<String>,
    #[serde(default)]
    pub demand_override: Option<f64>,
}

/// Parameters for the cross-branch benchmark.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkParams {
    #[serde(default = "default_benchmark_shift")]
    pub shift_name: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_shift_hours")]
    pub shift_hours: f64,
    #[serde(default = "default_buffer_pct")]
    pub buffer_pct: f64,
    #[serde(default)]
    pub target_period: Option<String>,
    #[serde(default)]
    pub day_of_week: Option<String>,
    #[serde(default)]
    pub demand_override: Option<f64>,
    /// Optional restriction to a branch subset.
    #[serde(default)]
    pub branches: Option<Vec<String>>,
}

fn default_benchmark_shift() -> String {
    "evening".to_string()
}

/// Parameters for the shift-length summary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShiftLengthParams {
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub shift_name: Option<String>,
    #[serde(default)]
    pub day_of_week: Option<String>,
}

/// Parameters for the demand forecast.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForecastParams {
    pub branch: String,
    #[serde(default = "default_months_ahead")]
    pub months_ahead: usize,
}

/// Every tool the gateway can dispatch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolOperation {
    EstimateStaffing(StaffingParams),
    BenchmarkStaffing(BenchmarkParams),
    SummarizeShiftLengths(ShiftLengthParams),
    ForecastDemand(ForecastParams),
    ListActivity {
        #[serde(default = "default_activity_limit")]
        limit: usize,
    },
}

impl ToolOperation {
    /// Stable tool name for logs and the activity record.
    pub fn name(&self) -> &'static str {
        match self {
            ToolOperation::EstimateStaffing(_) => "estimate_staffing",
            ToolOperation::BenchmarkStaffing(_) => "benchmark_staffing",
            ToolOperation::SummarizeShiftLengths(_) => "summarize_shift_lengths",
            ToolOperation::ForecastDemand(_) => "forecast_demand",
            ToolOperation::ListActivity { .. } => "list_activity",
        }
    }

    /// Validate parameters without executing. Every conversion the dispatch
    /// would perform runs here, so a request that parses and validates
    /// cannot fail later on a malformed field.
    pub fn validate(&self) -> BridgeResult<()> {
        match self {
            ToolOperation::EstimateStaffing(params) => params.to_request().map(|_| ()),
            ToolOperation::BenchmarkStaffing(params) => {
                params.to_query("validate").map(|_| ())
            }
            ToolOperation::SummarizeShiftLengths(params) => params.to_request().map(|_| ()),
            ToolOperation::ForecastDemand(params) => params.to_request().map(|_| ()),
            ToolOperation::ListActivity { .. } => Ok(()),
        }
    }
}

impl StaffingParams {
    pub fn to_request(&self) -> BridgeResult<StaffingRequest> {
        let request = StaffingRequest {
            branch: self.branch.clone(),
            shift_name: parse_shift("estimate_staffing", &self.shift_name)?,
            shift_hours: self.shift_hours,
            buffer_pct: self.buffer_pct,
            target_period: parse_period_opt("estimate_staffing", self.target_period.as_deref())?,
            day_of_week: parse_weekday_opt("estimate_staffing", self.day_of_week.as_deref())?,
            demand_override: self.demand_override,
        };
        request
            .validate()
            .map_err(|err| invalid("estimate_staffing", err))?;
        Ok(request)
    }
}

impl BenchmarkParams {
    pub fn to_query(&self, request_id: &str) -> BridgeResult<BenchmarkQuery> {
        const OP: &str = "benchmark_staffing";
        if self.top_n == 0 || self.top_n > 20 {
            return Err(BridgeError::InvalidParameter {
                op: OP,
                reason: format!("top_n {} is outside [1, 20]", self.top_n),
            });
        }
        let mut query = BenchmarkQuery::new(request_id, parse_shift(OP, &self.shift_name)?);
        query.target_period = parse_period_opt(OP, self.target_period.as_deref())?;
        query.day_of_week = parse_weekday_opt(OP, self.day_of_week.as_deref())?;
        query.shift_hours = self.shift_hours;
        query.buffer_pct = self.buffer_pct;
        query.demand_override = self.demand_override;
        query.top_n = self.top_n;
        query.branch_scope = self.branches.clone();

        // The shared staffing parameters get the same range checks as a
        // single-branch request.
        query
            .staffing_request("validate")
            .validate()
            .map_err(|err| invalid(OP, err))?;
        Ok(query)
    }
}

impl ShiftLengthParams {
    pub fn to_request(&self) -> BridgeResult<ShiftLengthRequest> {
        const OP: &str = "summarize_shift_lengths";
        Ok(ShiftLengthRequest {
            branch: self.branch.clone(),
            shift_name: match self.shift_name.as_deref() {
                Some(raw) => Some(parse_shift(OP, raw)?),
                None => None,
            },
            day_of_week: parse_weekday_opt(OP, self.day_of_week.as_deref())?,
        })
    }
}

impl ForecastParams {
    pub fn to_request(&self) -> BridgeResult<ForecastRequest> {
        let request = ForecastRequest {
            branch: self.branch.clone(),
            months_ahead: self.months_ahead,
        };
        request
            .validate()
            .map_err(|err| invalid("forecast_demand", err))?;
        Ok(request)
    }
}

fn invalid(op: &'static str, err: crewline_core::StaffingError) -> BridgeError {
    BridgeError::InvalidParameter {
        op,
        reason: err.to_string(),
    }
}

fn parse_shift(op: &'static str, raw: &str) -> BridgeResult<ShiftName> {
    raw.parse::<ShiftName>().map_err(|err| invalid(op, err))
}

fn parse_period_opt(op: &'static str, raw: Option<&str>) -> BridgeResult<Option<Period>> {
    match raw {
        Some(text) => text
            .parse::<Period>()
            .map(Some)
            .map_err(|err| invalid(op, err)),
        None => Ok(None),
    }
}

fn parse_weekday_opt(op: &'static str, raw: Option<&str>) -> BridgeResult<Option<Weekday>> {
    match raw {
        Some(text) => text
            .parse::<Weekday>()
            .map(Some)
            .map_err(|_| BridgeError::InvalidParameter {
                op,
                reason: format!("'{}' is not a day of week", text),
            }),
        None => Ok(None),
    }
}
