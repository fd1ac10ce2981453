//! Demand-driven staffing estimation.
//!
//! The estimator resolves four independent inputs (demand, productivity,
//! days in period, and shift share), each through its own documented
//! fallback chain, then converts them into a headcount recommendation:
//!
//! ```text
//! required_labor_hours_month     = demand / productivity
//! required_labor_hours_per_day   = required_labor_hours_month / days_in_period
//! required_labor_hours_for_shift = required_labor_hours_per_day * shift_share
//! required_staff_raw             = required_labor_hours_for_shift / shift_hours
//! recommended_staff              = max(1, ceil(required_staff_raw * (1 + buffer_pct)))
//! ```
//!
//! Every resolution step returns a value tagged with the path that produced
//! it; the tags and notes end up in the result's evidence bundle so a caller
//! can always explain why a number came out. A fallback may fire, but never
//! silently.

use chrono::Weekday;

use crate::attendance::{self, NormalizedAttendance};
use crate::error::{StaffingError, StaffingResult};
use crate::features::{self, ShiftFeatureRow, ShiftFeatureTable};
use crate::forecast;
use crate::productivity::{self, ProductivityRow, ProductivityTable};
use crate::resolve::{branch_key, days_in_period, nearest_by_period, resolve_branch};
use crate::sales;
use crate::summary;
use crate::types::{
    AttendancePunch, DataCoverage, DayScope, DaysSource, DemandForecast, DemandSource,
    ForecastRequest, MonthlySalesRecord, Period, ProductivitySource, RawSalesRow, Resolved,
    ShiftLengthRequest, ShiftLengthSummary, ShiftName, ShiftShareSource, StaffingEstimate,
    StaffingEvidence, StaffingRequest,
};

/// Share assumed for a shift with no usable history. The four shifts split
/// the day evenly under this assumption.
pub const EQUAL_SHIFT_SHARE: f64 = 0.25;

/// All derived tables materialized from one snapshot of the two feeds.
///
/// The engine is rebuilt from the feeds on every request, so it never holds
/// stale derived state and is safe to share read-only across tasks.
#[derive(Clone, Debug)]
pub struct StaffingEngine {
    pub attendance: NormalizedAttendance,
    pub sales: Vec<MonthlySalesRecord>,
    pub features: ShiftFeatureTable,
    pub productivity: ProductivityTable,
}

impl StaffingEngine {
    /// Materialize every derived table from the raw feeds.
    pub fn from_feeds(punches: &[AttendancePunch], sales_rows: &[RawSalesRow]) -> StaffingEngine {
        let attendance = attendance::normalize(punches);
        let sales = sales::aggregate_monthly_sales(sales_rows);
        let features = features::build_shift_features(&attendance);
        let productivity = productivity::build_branch_productivity(&attendance, &sales);
        StaffingEngine {
            attendance,
            sales,
            features,
            productivity,
        }
    }

    /// Branch universe as seen in the raw attendance feed.
    pub fn branches(&self) -> &[String] {
        &self.attendance.branches
    }

    /// Estimate recommended headcount for one branch and shift.
    pub fn estimate(&self, request: &StaffingRequest) -> StaffingResult<StaffingEstimate> {
        request.validate()?;

        let branch = resolve_branch(&request.branch, &self.attendance.branches)?;
        let branch_features = self.features.rows_for_branch(&branch);
        if branch_features.is_empty() {
            return Err(StaffingError::NoValidAttendance(branch));
        }

        let mut assumptions = vec![
            "Sales figures are scaled units, so recommendations reflect relative staffing \
             pressure rather than absolute labor cost."
                .to_string(),
            "Monthly sales granularity limits precision for shift-level staffing decisions."
                .to_string(),
            "Shift buckets are assigned from punch-in time: morning 06:00-11:59, afternoon \
             12:00-17:59, evening 18:00-23:59, night 00:00-05:59."
                .to_string(),
        ];
        let mut fallback_notes = Vec::new();

        let branch_sales = sales::records_for_branch(&self.sales, &branch);
        let (demand, sales_period_used) =
            resolve_demand(request, &branch, &branch_sales, &self.sales)?;
        push_note(
            &mut assumptions,
            &mut fallback_notes,
            demand.note.clone(),
            demand.source == DemandSource::GlobalLatest,
        );

        let branch_productivity = self.productivity.rows_for_branch(&branch);
        let (productivity_used, productivity_period_used) = resolve_productivity(
            request,
            &branch,
            &branch_productivity,
            self.productivity.global_productivity,
        )?;
        push_note(
            &mut assumptions,
            &mut fallback_notes,
            productivity_used.note.clone(),
            productivity_used.source == ProductivitySource::Global,
        );

        let period_for_days = request
            .target_period
            .or(sales_period_used)
            .or(productivity_period_used);
        let (days, days_source) = days_in_period(period_for_days);
        if days_source == DaysSource::AssumedThirty {
            assumptions.push(
                "A 30-day month was assumed because no requested or inferred period was \
                 available."
                    .to_string(),
            );
        }

        let share = resolve_shift_share(
            &branch_features,
            request.day_of_week,
            request.shift_name,
            &branch,
        );
        push_note(&mut assumptions, &mut fallback_notes, share.scope_note.clone(), true);
        push_note(&mut assumptions, &mut fallback_notes, share.share.note.clone(), true);

        let required_labor_hours_month = demand.value / productivity_used.value;
        let required_labor_hours_per_day = required_labor_hours_month / days as f64;
        let required_labor_hours = required_labor_hours_per_day * share.share.value;
        let required_staff_raw = required_labor_hours / request.shift_hours;
        let buffered = required_staff_raw * (1.0 + request.buffer_pct);
        let recommended_staff = (buffered.ceil() as i64).max(1) as u32;

        log::debug!(
            "estimate branch={} shift={} demand={:?} productivity={:?} share={:?} staff={}",
            branch,
            request.shift_name,
            demand.source,
            productivity_used.source,
            share.share.source,
            recommended_staff,
        );

        let evidence = StaffingEvidence {
            demand_source: demand.source,
            sales_period_used,
            productivity_source: productivity_used.source,
            productivity_period_used,
            day_scope_used: share.day_scope,
            shift_share_source: share.share.source,
            shift_share_used: share.share.value,
            days_source,
            days_in_period_used: days,
            historical_avg_labor_hours: share.history.map(|row| row.avg_labor_hours),
            historical_avg_headcount: share.history.map(|row| row.avg_headcount),
            historical_p50_labor_hours: share.history.map(|row| row.p50_labor_hours),
            historical_p90_labor_hours: share.history.map(|row| row.p90_labor_hours),
            historical_observed_days: share.history.map_or(0, |row| row.observed_days),
            required_labor_hours_month,
            required_labor_hours_per_day,
            required_staff_raw,
            buffer_pct_used: request.buffer_pct,
            fallback_notes,
        };

        Ok(StaffingEstimate {
            coverage: self.coverage_for(&branch, branch_features.len(), branch_productivity.len()),
            branch,
            shift_name: request.shift_name,
            recommended_staff,
            required_labor_hours,
            productivity_used: productivity_used.value,
            demand_used: demand.value,
            evidence,
            assumptions,
        })
    }

    /// Descriptive shift-length statistics over the cleaned attendance rows.
    pub fn summarize_shift_lengths(
        &self,
        request: &ShiftLengthRequest,
    ) -> StaffingResult<ShiftLengthSummary> {
        summary::summarize_shift_lengths(&self.attendance, request)
    }

    /// Weighted-moving-average sales projection for one branch.
    pub fn forecast_demand(&self, request: &ForecastRequest) -> StaffingResult<DemandForecast> {
        forecast::forecast_demand(&self.sales, request)
    }

    fn coverage_for(
        &self,
        branch: &str,
        feature_rows: usize,
        productivity_rows: usize,
    ) -> DataCoverage {
        let key = branch_key(branch);
        DataCoverage {
            attendance_rows_loaded: self.attendance.rows_loaded,
            attendance_rows_dropped: self.attendance.rows_dropped,
            attendance_rows_for_branch: self
                .attendance
                .rows
                .iter()
                .filter(|row| branch_key(&row.branch) == key)
                .count(),
            attendance_date_min: self.attendance.date_min,
            attendance_date_max: self.attendance.date_max,
            feature_rows_for_branch: feature_rows,
            sales_records: self.sales.len(),
            sales_period_min: self.sales.iter().map(|record| record.period).min(),
            sales_period_max: self.sales.iter().map(|record| record.period).max(),
            productivity_rows_for_branch: productivity_rows,
            global_productivity_available: self.productivity.global_productivity.is_some(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution steps
// ---------------------------------------------------------------------------

fn push_note(
    assumptions: &mut Vec<String>,
    fallback_notes: &mut Vec<String>,
    note: Option<String>,
    prominent: bool,
) {
    if let Some(note) = note {
        if prominent {
            assumptions.push(note);
        } else {
            fallback_notes.push(note);
        }
    }
}

fn resolve_demand(
    request: &StaffingRequest,
    branch: &str,
    branch_sales: &[&MonthlySalesRecord],
    all_sales: &[MonthlySalesRecord],
) -> StaffingResult<(Resolved<f64, DemandSource>, Option<Period>)> {
    if let Some(demand) = request.demand_override {
        let period = request
            .target_period
            .or_else(|| branch_sales.iter().map(|record| record.period).max());
        return Ok((
            Resolved {
                value: demand,
                source: DemandSource::Override,
                note: Some(
                    "Demand override was provided, so monthly sales were not used to set demand."
                        .to_string(),
                ),
            },
            period,
        ));
    }

    if let Some(target) = request.target_period {
        if let Some(exact) = branch_sales.iter().find(|record| record.period == target) {
            return Ok((
                Resolved {
                    value: exact.monthly_sales,
                    source: DemandSource::BranchExact,
                    note: None,
                },
                Some(exact.period),
            ));
        }
        if let Some(nearest) = nearest_by_period(branch_sales, target, |record| record.period) {
            return Ok((
                Resolved {
                    value: nearest.monthly_sales,
                    source: DemandSource::BranchNearest,
                    note: Some(format!(
                        "Requested period '{}' has no sales record; used closest sales period '{}'.",
                        target, nearest.period,
                    )),
                },
                Some(nearest.period),
            ));
        }
    } else if let Some(latest) = branch_sales.iter().max_by_key(|record| record.period) {
        return Ok((
            Resolved {
                value: latest.monthly_sales,
                source: DemandSource::BranchLatest,
                note: Some(format!(
                    "No target period provided; used latest branch sales period '{}'.",
                    latest.period,
                )),
            },
            Some(latest.period),
        ));
    }

    if let Some(global) = sales::latest_record(all_sales) {
        return Ok((
            Resolved {
                value: global.monthly_sales,
                source: DemandSource::GlobalLatest,
                note: Some(format!(
                    "No monthly sales were found for branch '{}', so the latest chain-wide \
                     sales period '{}' was used as the demand proxy.",
                    branch, global.period,
                )),
            },
            Some(global.period),
        ));
    }

    Err(StaffingError::NoDemandData)
}

fn resolve_productivity(
    request: &StaffingRequest,
    branch: &str,
    branch_rows: &[&ProductivityRow],
    global: Option<f64>,
) -> StaffingResult<(Resolved<f64, ProductivitySource>, Option<Period>)> {
    // A zero or negative throughput cannot drive the headcount division, so
    // such rows never participate in selection.
    let valid: Vec<&ProductivityRow> = branch_rows
        .iter()
        .filter(|row| row.productivity.is_some_and(|value| value > 0.0))
        .copied()
        .collect();

    if let Some(target) = request.target_period {
        if let Some(exact) = valid.iter().find(|row| row.labor_period == target) {
            return Ok((
                Resolved {
                    value: exact.productivity.unwrap_or(0.0),
                    source: ProductivitySource::BranchExact,
                    note: None,
                },
                Some(exact.labor_period),
            ));
        }
        if let Some(nearest) = nearest_by_period(&valid, target, |row| row.labor_period) {
            return Ok((
                Resolved {
                    value: nearest.productivity.unwrap_or(0.0),
                    source: ProductivitySource::BranchNearest,
                    note: Some(format!(
                        "Requested period '{}' has no productivity row; used closest labor \
                         period '{}'.",
                        target, nearest.labor_period,
                    )),
                },
                Some(nearest.labor_period),
            ));
        }
    } else if let Some(latest) = valid.iter().max_by_key(|row| row.labor_period) {
        return Ok((
            Resolved {
                value: latest.productivity.unwrap_or(0.0),
                source: ProductivitySource::BranchLatest,
                note: Some(format!(
                    "No target period provided; used latest branch productivity period '{}'.",
                    latest.labor_period,
                )),
            },
            Some(latest.labor_period),
        ));
    }

    match global {
        Some(value) if value > 0.0 => Ok((
            Resolved {
                value,
                source: ProductivitySource::Global,
                note: Some(format!(
                    "Branch-specific productivity was unavailable for '{}', so the chain-wide \
                     hours-weighted productivity was used.",
                    branch,
                )),
            },
            None,
        )),
        _ => Err(StaffingError::NoProductivityData),
    }
}

struct ShareResolution<'a> {
    share: Resolved<f64, ShiftShareSource>,
    day_scope: DayScope,
    scope_note: Option<String>,
    history: Option<&'a ShiftFeatureRow>,
}

fn resolve_shift_share<'a>(
    branch_features: &[&'a ShiftFeatureRow],
    day_of_week: Option<Weekday>,
    shift_name: ShiftName,
    branch: &str,
) -> ShareResolution<'a> {
    let all_rows = |rows: &[&'a ShiftFeatureRow]| -> Vec<&'a ShiftFeatureRow> {
        rows.iter()
            .filter(|row| row.day_scope == DayScope::All)
            .copied()
            .collect()
    };

    let (scoped, day_scope, scope_note) = match day_of_week {
        Some(day) => {
            let specific: Vec<&ShiftFeatureRow> = branch_features
                .iter()
                .filter(|row| row.day_scope == DayScope::Day(day))
                .copied()
                .collect();
            if specific.is_empty() {
                (
                    all_rows(branch_features),
                    DayScope::All,
                    Some(format!(
                        "No attendance history was available for day of week '{}', so all-day \
                         shift averages were used.",
                        day,
                    )),
                )
            } else {
                (specific, DayScope::Day(day), None)
            }
        }
        None => (all_rows(branch_features), DayScope::All, None),
    };

    let requested = scoped.iter().find(|row| row.shift_name == shift_name).copied();
    let share = match requested {
        None => Resolved {
            value: EQUAL_SHIFT_SHARE,
            source: ShiftShareSource::EqualSplit,
            note: Some(format!(
                "No attendance history was available for branch '{}' and shift '{}', so an \
                 equal 25% shift split was used.",
                branch, shift_name,
            )),
        },
        Some(row) => {
            let total: f64 = scoped.iter().map(|row| row.avg_labor_hours).sum();
            if total > 0.0 {
                Resolved {
                    value: row.avg_labor_hours / total,
                    source: match day_scope {
                        DayScope::All => ShiftShareSource::AllDays,
                        DayScope::Day(_) => ShiftShareSource::DaySpecific,
                    },
                    note: None,
                }
            } else {
                Resolved {
                    value: EQUAL_SHIFT_SHARE,
                    source: ShiftShareSource::EqualSplit,
                    note: Some(
                        "Historical shift labor totals were zero, so an equal 25% shift split \
                         was used."
                            .to_string(),
                    ),
                }
            }
        }
    };

    ShareResolution {
        share,
        day_scope,
        scope_note,
        history: requested,
    }
}
