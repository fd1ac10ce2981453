//! Attendance normalization.
//!
//! Turns raw punch records into validated rows with derived shift fields.
//! Rows that cannot be trusted (unparseable timestamps, non-positive or
//! missing durations) are dropped outright and counted, never retained with
//! nulls, so every downstream aggregate sees only clean rows.

use chrono::{Datelike, NaiveDate, Timelike};

use crate::resolve::branch_key;
use crate::types::{AttendancePunch, NormalizedPunch, Period, ShiftName};

/// The cleaned attendance table plus the counters that make the cleaning
/// auditable: `rows_loaded == rows.len() + rows_dropped` always holds.
#[derive(Clone, Debug, Default)]
pub struct NormalizedAttendance {
    pub rows: Vec<NormalizedPunch>,
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
    /// Sorted, deduplicated branch names as they appear in the raw feed.
    /// Kept from the raw rows (not the cleaned ones) so a branch whose rows
    /// were all dropped still resolves and can fail with a precise error.
    pub branches: Vec<String>,
}

impl NormalizedAttendance {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cleaned rows belonging to the given canonical branch name.
    pub fn rows_for_branch<'a>(
        &'a self,
        branch: &str,
    ) -> impl Iterator<Item = &'a NormalizedPunch> {
        let key = branch_key(branch);
        self.rows
            .iter()
            .filter(move |row| branch_key(&row.branch) == key)
    }
}

/// Normalize a batch of raw punches. An empty input produces an empty table
/// with zeroed counters; it is a valid low-information state, not an error.
pub fn normalize(punches: &[AttendancePunch]) -> NormalizedAttendance {
    let mut branches: Vec<String> = punches
        .iter()
        .map(|punch| punch.branch.clone())
        .filter(|branch| !branch.trim().is_empty())
        .collect();
    branches.sort();
    branches.dedup();

    let mut rows = Vec::with_capacity(punches.len());
    let mut dropped = 0usize;

    for punch in punches {
        let (Some(punch_in), Some(punch_out)) = (punch.punch_in, punch.punch_out) else {
            dropped += 1;
            continue;
        };
        let computed_hours = (punch_out - punch_in).num_seconds() as f64 / 3600.0;
        let duration = match punch.work_duration_hours {
            Some(explicit) if explicit > 0.0 => explicit,
            _ => computed_hours,
        };
        if !(duration > 0.0) {
            dropped += 1;
            continue;
        }

        let date_in = punch_in.date();
        let hour_in = punch_in.hour();
        rows.push(NormalizedPunch {
            employee_id: punch.employee_id.clone(),
            employee_name: punch.employee_name.clone(),
            branch: punch.branch.clone(),
            punch_in,
            punch_out,
            work_duration_hours: duration,
            date_in,
            hour_in,
            day_of_week: punch_in.weekday(),
            shift_name: ShiftName::from_hour(hour_in),
            period_key: Period::from_date(date_in),
        });
    }

    let date_min = rows.iter().map(|row| row.date_in).min();
    let date_max = rows.iter().map(|row| row.date_in).max();

    NormalizedAttendance {
        rows,
        rows_loaded: punches.len(),
        rows_dropped: dropped,
        date_min,
        date_max,
        branches,
    }
}
