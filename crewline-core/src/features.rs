//! Shift feature aggregation.
//!
//! Rolls normalized attendance into per-branch, per-shift, per-day-of-week
//! statistics. The aggregation runs in two passes: first collapse punches to
//! one row per (branch, calendar date, shift), summing labor hours and
//! counting distinct employees for that day; then aggregate those daily rows
//! by day of week, plus a day-insensitive "All" row per (branch, shift) that
//! serves as the fallback when a specific weekday has no history.

use std::collections::{BTreeMap, HashSet};

use chrono::{NaiveDate, Weekday};

use crate::attendance::NormalizedAttendance;
use crate::resolve::branch_key;
use crate::types::{DayScope, ShiftName, WEEK};

/// Aggregated history for one (branch, shift, day-scope) cell.
#[derive(Clone, Debug)]
pub struct ShiftFeatureRow {
    pub branch: String,
    pub shift_name: ShiftName,
    pub day_scope: DayScope,
    /// Mean labor hours worked in this shift on an observed day.
    pub avg_labor_hours: f64,
    /// Mean distinct employees punching into this shift on an observed day.
    pub avg_headcount: f64,
    pub p50_labor_hours: f64,
    pub p90_labor_hours: f64,
    /// Distinct calendar days backing this aggregate.
    pub observed_days: u32,
}

/// The full feature set. A (branch, shift) combination with zero observed
/// days simply has no row; consumers fall back to an equal-split assumption.
#[derive(Clone, Debug, Default)]
pub struct ShiftFeatureTable {
    pub rows: Vec<ShiftFeatureRow>,
}

impl ShiftFeatureTable {
    /// All rows for a branch, matched by canonical name.
    pub fn rows_for_branch<'a>(&'a self, branch: &str) -> Vec<&'a ShiftFeatureRow> {
        let key = branch_key(branch);
        self.rows
            .iter()
            .filter(|row| branch_key(&row.branch) == key)
            .collect()
    }
}

#[derive(Default)]
struct DailyCell {
    labor_hours: f64,
    employees: HashSet<String>,
    weekday_index: u32,
}

#[derive(Default)]
struct ScopeAccumulator {
    day_labor_hours: Vec<f64>,
    day_headcounts: Vec<f64>,
}

impl ScopeAccumulator {
    fn push(&mut self, cell: &DailyCell) {
        self.day_labor_hours.push(cell.labor_hours);
        self.day_headcounts.push(cell.employees.len() as f64);
    }

    fn into_row(self, branch: String, shift_name: ShiftName, day_scope: DayScope) -> ShiftFeatureRow {
        let observed_days = self.day_labor_hours.len() as u32;
        ShiftFeatureRow {
            branch,
            shift_name,
            day_scope,
            avg_labor_hours: mean(&self.day_labor_hours),
            avg_headcount: mean(&self.day_headcounts),
            p50_labor_hours: quantile(&self.day_labor_hours, 0.5),
            p90_labor_hours: quantile(&self.day_labor_hours, 0.9),
            observed_days,
        }
    }
}

/// Build the feature table from cleaned attendance.
pub fn build_shift_features(attendance: &NormalizedAttendance) -> ShiftFeatureTable {
    if attendance.is_empty() {
        return ShiftFeatureTable::default();
    }

    // Pass 1: one cell per (branch, date, shift).
    let mut daily: BTreeMap<(String, NaiveDate, ShiftName), DailyCell> = BTreeMap::new();
    for row in &attendance.rows {
        let cell = daily
            .entry((row.branch.clone(), row.date_in, row.shift_name))
            .or_default();
        cell.labor_hours += row.work_duration_hours;
        cell.employees.insert(row.employee_id.clone());
        cell.weekday_index = row.day_of_week.num_days_from_monday();
    }

    // Pass 2: aggregate daily cells per weekday and over all days.
    let mut by_weekday: BTreeMap<(String, ShiftName, u32), ScopeAccumulator> = BTreeMap::new();
    let mut all_days: BTreeMap<(String, ShiftName), ScopeAccumulator> = BTreeMap::new();
    for ((branch, _date, shift), cell) in &daily {
        by_weekday
            .entry((branch.clone(), *shift, cell.weekday_index))
            .or_default()
            .push(cell);
        all_days
            .entry((branch.clone(), *shift))
            .or_default()
            .push(cell);
    }

    let mut rows = Vec::with_capacity(all_days.len() + by_weekday.len());
    for ((branch, shift), accumulator) in all_days {
        rows.push(accumulator.into_row(branch, shift, DayScope::All));
    }
    for ((branch, shift, weekday_index), accumulator) in by_weekday {
        let weekday = weekday_from_index(weekday_index);
        rows.push(accumulator.into_row(branch, shift, DayScope::Day(weekday)));
    }

    ShiftFeatureTable { rows }
}

fn weekday_from_index(index: u32) -> Weekday {
    WEEK[(index as usize).min(WEEK.len() - 1)]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Empirical quantile with linear interpolation between order statistics.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
    }
}
