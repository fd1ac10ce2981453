use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{StaffingError, StaffingResult};

/// Days of the week in feed order. Useful for deterministic iteration,
/// since `chrono::Weekday` itself is not `Ord`.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

// ---------------------------------------------------------------------------
// Shift buckets
// ---------------------------------------------------------------------------

/// One of the four fixed shift buckets, assigned purely from punch-in hour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftName {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl ShiftName {
    /// All four buckets, in day order.
    pub const ALL: [ShiftName; 4] = [
        ShiftName::Morning,
        ShiftName::Afternoon,
        ShiftName::Evening,
        ShiftName::Night,
    ];

    /// Bucket boundaries: morning 06:00-11:59, afternoon 12:00-17:59,
    /// evening 18:00-23:59, night 00:00-05:59.
    pub fn from_hour(hour: u32) -> ShiftName {
        match hour {
            6..=11 => ShiftName::Morning,
            12..=17 => ShiftName::Afternoon,
            18..=23 => ShiftName::Evening,
            _ => ShiftName::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftName::Morning => "morning",
            ShiftName::Afternoon => "afternoon",
            ShiftName::Evening => "evening",
            ShiftName::Night => "night",
        }
    }
}

impl fmt::Display for ShiftName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShiftName {
    type Err = StaffingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "morning" => Ok(ShiftName::Morning),
            "afternoon" => Ok(ShiftName::Afternoon),
            "evening" => Ok(ShiftName::Evening),
            "night" => Ok(ShiftName::Night),
            other => Err(StaffingError::InvalidRequest {
                field: "shift_name",
                reason: format!("'{}' is not one of morning|afternoon|evening|night", other),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

/// A `YYYY-MM` calendar month key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Period> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Period { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Period {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> NaiveDate {
        // Safe: construction validated year/month.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The following month, rolling the year over in December.
    pub fn next(&self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Actual number of calendar days in the month.
    pub fn day_count(&self) -> u32 {
        (self.next().first_day() - self.first_day()).num_days() as u32
    }

    /// Absolute distance in days between the first days of two periods.
    pub fn day_distance(&self, other: &Period) -> i64 {
        (self.first_day() - other.first_day()).num_days().abs()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = StaffingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StaffingError::InvalidRequest {
            field: "period",
            reason: format!("'{}' is not a YYYY-MM month key", s),
        };
        let (year_text, month_text) = s.trim().split_once('-').ok_or_else(|| invalid())?;
        let year: i32 = year_text.parse().map_err(|_| invalid())?;
        let month: u32 = month_text.parse().map_err(|_| invalid())?;
        Period::new(year, month).ok_or_else(|| invalid())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Day scoping
// ---------------------------------------------------------------------------

/// Either one specific day of the week or the day-insensitive "All" scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayScope {
    All,
    Day(Weekday),
}

impl fmt::Display for DayScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayScope::All => f.write_str("All"),
            DayScope::Day(day) => write!(f, "{}", day),
        }
    }
}

impl Serialize for DayScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Serialize an optional weekday as its three-letter code.
pub fn serialize_weekday_opt<S: Serializer>(
    day: &Option<Weekday>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match day {
        Some(day) => serializer.serialize_some(&day.to_string()),
        None => serializer.serialize_none(),
    }
}

// ---------------------------------------------------------------------------
// Feed rows
// ---------------------------------------------------------------------------

/// One raw attendance punch as delivered by the attendance feed.
///
/// Timestamps that failed to parse upstream arrive as `None` and are
/// dropped (and counted) by the normalizer, never retained as nulls.
#[derive(Clone, Debug)]
pub struct AttendancePunch {
    pub employee_id: String,
    pub employee_name: String,
    pub branch: String,
    pub punch_in: Option<NaiveDateTime>,
    pub punch_out: Option<NaiveDateTime>,
    /// Precomputed duration from the feed, preferred when positive.
    pub work_duration_hours: Option<f64>,
}

/// A validated attendance row with all derived fields populated.
#[derive(Clone, Debug)]
pub struct NormalizedPunch {
    pub employee_id: String,
    pub employee_name: String,
    pub branch: String,
    pub punch_in: NaiveDateTime,
    pub punch_out: NaiveDateTime,
    pub work_duration_hours: f64,
    pub date_in: NaiveDate,
    pub hour_in: u32,
    pub day_of_week: Weekday,
    pub shift_name: ShiftName,
    pub period_key: Period,
}

/// One raw monthly-sales row as delivered by the sales feed. Rows without a
/// resolvable period are discarded during aggregation.
#[derive(Clone, Debug)]
pub struct RawSalesRow {
    pub branch_name: String,
    pub period: Option<Period>,
    pub total_sales: f64,
    pub source_file: Option<String>,
}

/// Aggregated sales for one branch-month. Duplicate feed rows for the same
/// branch and period have already been summed.
#[derive(Clone, Debug, Serialize)]
pub struct MonthlySalesRecord {
    pub branch_name: String,
    pub period: Period,
    pub monthly_sales: f64,
    pub source_file: Option<String>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Default shift length in hours per employee.
pub const DEFAULT_SHIFT_HOURS: f64 = 8.0;
/// Default safety buffer applied on top of the raw staff requirement.
pub const DEFAULT_BUFFER_PCT: f64 = 0.15;

/// A staffing estimate request. Parameter ranges are enforced by
/// [`StaffingRequest::validate`], which every entry point calls before any
/// table work happens.
#[derive(Clone, Debug)]
pub struct StaffingRequest {
    pub branch: String,
    pub shift_name: ShiftName,
    pub shift_hours: f64,
    pub buffer_pct: f64,
    pub target_period: Option<Period>,
    pub day_of_week: Option<Weekday>,
    pub demand_override: Option<f64>,
}

impl StaffingRequest {
    pub fn new(branch: impl Into<String>, shift_name: ShiftName) -> StaffingRequest {
        StaffingRequest {
            branch: branch.into(),
            shift_name,
            shift_hours: DEFAULT_SHIFT_HOURS,
            buffer_pct: DEFAULT_BUFFER_PCT,
            target_period: None,
            day_of_week: None,
            demand_override: None,
        }
    }

    /// Check parameter ranges: `shift_hours` in (0, 24], `buffer_pct` in
    /// [0, 1], `demand_override` non-negative.
    pub fn validate(&self) -> StaffingResult<()> {
        if !(self.shift_hours > 0.0 && self.shift_hours <= 24.0) {
            return Err(StaffingError::InvalidRequest {
                field: "shift_hours",
                reason: format!("{} is outside (0, 24]", self.shift_hours),
            });
        }
        if !(0.0..=1.0).contains(&self.buffer_pct) {
            return Err(StaffingError::InvalidRequest {
                field: "buffer_pct",
                reason: format!("{} is outside [0, 1]", self.buffer_pct),
            });
        }
        if let Some(demand) = self.demand_override {
            if !(demand >= 0.0) {
                return Err(StaffingError::InvalidRequest {
                    field: "demand_override",
                    reason: format!("{} is negative or not a number", demand),
                });
            }
        }
        Ok(())
    }
}

/// Filters for a shift-length summary. All filters are optional; an empty
/// request summarizes the whole chain.
#[derive(Clone, Debug, Default)]
pub struct ShiftLengthRequest {
    pub branch: Option<String>,
    pub shift_name: Option<ShiftName>,
    pub day_of_week: Option<Weekday>,
}

/// A demand forecast request.
#[derive(Clone, Debug)]
pub struct ForecastRequest {
    pub branch: String,
    pub months_ahead: usize,
}

impl ForecastRequest {
    pub fn new(branch: impl Into<String>) -> ForecastRequest {
        ForecastRequest {
            branch: branch.into(),
            months_ahead: 3,
        }
    }

    pub fn validate(&self) -> StaffingResult<()> {
        if self.months_ahead == 0 || self.months_ahead > 12 {
            return Err(StaffingError::InvalidRequest {
                field: "months_ahead",
                reason: format!("{} is outside [1, 12]", self.months_ahead),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Resolution evidence
// ---------------------------------------------------------------------------

/// Which path produced the demand figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandSource {
    /// Caller-supplied override; the sales table was not consulted.
    Override,
    /// Exact branch sales record for the requested period.
    BranchExact,
    /// Nearest branch sales period by day distance.
    BranchNearest,
    /// Latest branch sales period (no target period requested).
    BranchLatest,
    /// Latest sales record across all branches; the branch has no history.
    GlobalLatest,
}

/// Which path produced the productivity figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductivitySource {
    BranchExact,
    BranchNearest,
    BranchLatest,
    /// Network-wide hours-weighted fallback.
    Global,
}

/// Which path produced the shift share.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftShareSource {
    DaySpecific,
    AllDays,
    /// No usable shift history; fixed equal split across the four shifts.
    EqualSplit,
}

/// Where the days-in-period figure came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DaysSource {
    Calendar,
    AssumedThirty,
}

/// A resolved value together with the tag of the path that produced it and
/// an optional human-readable note about the fallback taken.
#[derive(Clone, Debug)]
pub struct Resolved<T, S> {
    pub value: T,
    pub source: S,
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The full audit trail behind one staffing estimate: every resolved period,
/// every source tag, every fallback note. Silent fallback is forbidden, so
/// anything that was not the happy path shows up here.
#[derive(Clone, Debug, Serialize)]
pub struct StaffingEvidence {
    pub demand_source: DemandSource,
    pub sales_period_used: Option<Period>,
    pub productivity_source: ProductivitySource,
    pub productivity_period_used: Option<Period>,
    pub day_scope_used: DayScope,
    pub shift_share_source: ShiftShareSource,
    pub shift_share_used: f64,
    pub days_source: DaysSource,
    pub days_in_period_used: u32,
    pub historical_avg_labor_hours: Option<f64>,
    pub historical_avg_headcount: Option<f64>,
    pub historical_p50_labor_hours: Option<f64>,
    pub historical_p90_labor_hours: Option<f64>,
    pub historical_observed_days: u32,
    pub required_labor_hours_month: f64,
    pub required_labor_hours_per_day: f64,
    pub required_staff_raw: f64,
    pub buffer_pct_used: f64,
    pub fallback_notes: Vec<String>,
}

/// How much of each feed actually backed the estimate.
#[derive(Clone, Debug, Serialize)]
pub struct DataCoverage {
    pub attendance_rows_loaded: usize,
    pub attendance_rows_dropped: usize,
    pub attendance_rows_for_branch: usize,
    pub attendance_date_min: Option<NaiveDate>,
    pub attendance_date_max: Option<NaiveDate>,
    pub feature_rows_for_branch: usize,
    pub sales_records: usize,
    pub sales_period_min: Option<Period>,
    pub sales_period_max: Option<Period>,
    pub productivity_rows_for_branch: usize,
    pub global_productivity_available: bool,
}

/// One staffing recommendation.
#[derive(Clone, Debug, Serialize)]
pub struct StaffingEstimate {
    pub branch: String,
    pub shift_name: ShiftName,
    pub recommended_staff: u32,
    pub required_labor_hours: f64,
    pub productivity_used: f64,
    pub demand_used: f64,
    pub evidence: StaffingEvidence,
    pub assumptions: Vec<String>,
    pub coverage: DataCoverage,
}

/// Per-branch shift-length statistics.
#[derive(Clone, Debug, Serialize)]
pub struct BranchShiftLengths {
    pub branch: String,
    pub average_hours: f64,
    pub median_hours: f64,
    pub p90_hours: f64,
    pub shift_count: usize,
    pub unique_employees: usize,
}

/// Chain-wide and per-branch shift-length summary.
#[derive(Clone, Debug, Serialize)]
pub struct ShiftLengthSummary {
    pub branch_filter: Option<String>,
    pub shift_filter: Option<ShiftName>,
    #[serde(serialize_with = "serialize_weekday_opt")]
    pub day_filter: Option<Weekday>,
    pub average_hours: f64,
    pub median_hours: f64,
    pub p90_hours: f64,
    pub shift_count: usize,
    pub unique_employees: usize,
    pub per_branch: Vec<BranchShiftLengths>,
}

/// One projected month of sales.
#[derive(Clone, Debug, Serialize)]
pub struct ForecastPoint {
    pub period: Period,
    pub projected_sales: f64,
}

/// Weighted-moving-average sales projection for one branch.
#[derive(Clone, Debug, Serialize)]
pub struct DemandForecast {
    pub branch: String,
    pub projections: Vec<ForecastPoint>,
    pub history_months_used: usize,
    pub latest_period_used: Period,
    pub latest_sales: f64,
    pub weights: [f64; 3],
    pub assumptions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_bucket_boundaries() {
        assert_eq!(ShiftName::from_hour(0), ShiftName::Night);
        assert_eq!(ShiftName::from_hour(5), ShiftName::Night);
        assert_eq!(ShiftName::from_hour(6), ShiftName::Morning);
        assert_eq!(ShiftName::from_hour(11), ShiftName::Morning);
        assert_eq!(ShiftName::from_hour(12), ShiftName::Afternoon);
        assert_eq!(ShiftName::from_hour(17), ShiftName::Afternoon);
        assert_eq!(ShiftName::from_hour(18), ShiftName::Evening);
        assert_eq!(ShiftName::from_hour(23), ShiftName::Evening);
    }

    #[test]
    fn shift_name_round_trips_through_strings() {
        for shift in ShiftName::ALL {
            assert_eq!(shift.as_str().parse::<ShiftName>().unwrap(), shift);
        }
        assert!("brunch".parse::<ShiftName>().is_err());
    }

    #[test]
    fn period_parse_and_display() {
        let period: Period = "2025-03".parse().unwrap();
        assert_eq!(period.year(), 2025);
        assert_eq!(period.month(), 3);
        assert_eq!(period.to_string(), "2025-03");
        assert!("2025-13".parse::<Period>().is_err());
        assert!("march".parse::<Period>().is_err());
    }

    #[test]
    fn period_day_counts_handle_leap_years() {
        assert_eq!("2024-02".parse::<Period>().unwrap().day_count(), 29);
        assert_eq!("2025-02".parse::<Period>().unwrap().day_count(), 28);
        assert_eq!("2025-07".parse::<Period>().unwrap().day_count(), 31);
    }

    #[test]
    fn period_next_rolls_the_year() {
        let december: Period = "2024-12".parse().unwrap();
        assert_eq!(december.next().to_string(), "2025-01");
    }

    #[test]
    fn request_validation_rejects_out_of_range_parameters() {
        let mut request = StaffingRequest::new("Jnah", ShiftName::Evening);
        assert!(request.validate().is_ok());

        request.shift_hours = 0.0;
        assert!(request.validate().is_err());
        request.shift_hours = 25.0;
        assert!(request.validate().is_err());
        request.shift_hours = 8.0;

        request.buffer_pct = -0.1;
        assert!(request.validate().is_err());
        request.buffer_pct = 1.5;
        assert!(request.validate().is_err());
        request.buffer_pct = 0.15;

        request.demand_override = Some(-10.0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn forecast_request_bounds_months_ahead() {
        let mut request = ForecastRequest::new("Jnah");
        assert!(request.validate().is_ok());
        request.months_ahead = 0;
        assert!(request.validate().is_err());
        request.months_ahead = 13;
        assert!(request.validate().is_err());
    }

    #[test]
    fn period_serializes_as_month_key() {
        let period: Period = "2025-03".parse().unwrap();
        assert_eq!(serde_json::to_string(&period).unwrap(), "\"2025-03\"");
    }
}
