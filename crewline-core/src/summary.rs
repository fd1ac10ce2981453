//! Descriptive shift-length summaries.
//!
//! Plain statistics over cleaned attendance durations, optionally filtered
//! by branch, shift bucket, or day of week. No modeling here.

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::attendance::NormalizedAttendance;
use crate::error::{StaffingError, StaffingResult};
use crate::features::quantile;
use crate::resolve::{branch_key, resolve_branch};
use crate::types::{BranchShiftLengths, NormalizedPunch, ShiftLengthRequest, ShiftLengthSummary};

/// Summarize shift lengths across the chain or one branch.
pub fn summarize_shift_lengths(
    attendance: &NormalizedAttendance,
    request: &ShiftLengthRequest,
) -> StaffingResult<ShiftLengthSummary> {
    if attendance.is_empty() {
        return Err(StaffingError::NoAttendanceData);
    }

    let branch_filter = match &request.branch {
        Some(requested) => Some(resolve_branch(requested, &attendance.branches)?),
        None => None,
    };

    let rows: Vec<&NormalizedPunch> = attendance
        .rows
        .iter()
        .filter(|row| match &branch_filter {
            Some(branch) => branch_key(&row.branch) == branch_key(branch),
            None => true,
        })
        .filter(|row| request.shift_name.map_or(true, |shift| row.shift_name == shift))
        .filter(|row| request.day_of_week.map_or(true, |day| row.day_of_week == day))
        .collect();

    if rows.is_empty() {
        return Err(StaffingError::NoMatchingRows);
    }

    let durations: Vec<f64> = rows.iter().map(|row| row.work_duration_hours).collect();
    let unique_employees: HashSet<&str> =
        rows.iter().map(|row| row.employee_id.as_str()).collect();

    let mut per_branch_rows: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut per_branch_employees: BTreeMap<String, HashSet<&str>> = BTreeMap::new();
    for row in &rows {
        per_branch_rows
            .entry(row.branch.clone())
            .or_default()
            .push(row.work_duration_hours);
        per_branch_employees
            .entry(row.branch.clone())
            .or_default()
            .insert(row.employee_id.as_str());
    }

    let mut per_branch: Vec<BranchShiftLengths> = per_branch_rows
        .into_iter()
        .map(|(branch, hours)| {
            let employees = per_branch_employees
                .get(&branch)
                .map_or(0, |set| set.len());
            BranchShiftLengths {
                average_hours: hours.iter().sum::<f64>() / hours.len() as f64,
                median_hours: quantile(&hours, 0.5),
                p90_hours: quantile(&hours, 0.9),
                shift_count: hours.len(),
                unique_employees: employees,
                branch,
            }
        })
        .collect();
    per_branch.sort_by(|a, b| {
        b.average_hours
            .partial_cmp(&a.average_hours)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(ShiftLengthSummary {
        branch_filter,
        shift_filter: request.shift_name,
        day_filter: request.day_of_week,
        average_hours: durations.iter().sum::<f64>() / durations.len() as f64,
        median_hours: quantile(&durations, 0.5),
        p90_hours: quantile(&durations, 0.9),
        shift_count: durations.len(),
        unique_employees: unique_employees.len(),
        per_branch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::normalize;
    use crate::types::{AttendancePunch, ShiftName};
    use chrono::{NaiveDateTime, Weekday};

    fn punch(employee: &str, branch: &str, punch_in: &str, hours: i64) -> AttendancePunch {
        let start = NaiveDateTime::parse_from_str(punch_in, "%Y-%m-%d %H:%M:%S").unwrap();
        AttendancePunch {
            employee_id: employee.to_string(),
            employee_name: format!("Employee {}", employee),
            branch: branch.to_string(),
            punch_in: Some(start),
            punch_out: Some(start + chrono::Duration::hours(hours)),
            work_duration_hours: None,
        }
    }

    fn sample() -> NormalizedAttendance {
        normalize(&[
            punch("e1", "Jnah", "2025-03-07 18:00:00", 10),
            punch("e2", "Jnah", "2025-03-07 18:30:00", 6),
            punch("e3", "Tripoli", "2025-03-07 08:00:00", 4),
            punch("e3", "Tripoli", "2025-03-08 08:00:00", 4),
        ])
    }

    #[test]
    fn chain_wide_summary_covers_all_branches() {
        let summary = summarize_shift_lengths(&sample(), &ShiftLengthRequest::default()).unwrap();
        assert_eq!(summary.shift_count, 4);
        assert_eq!(summary.unique_employees, 3);
        assert!((summary.average_hours - 6.0).abs() < 1e-9);
        // Longest average shifts first.
        assert_eq!(summary.per_branch[0].branch, "Jnah");
        assert!((summary.per_branch[0].average_hours - 8.0).abs() < 1e-9);
        assert_eq!(summary.per_branch[1].unique_employees, 1);
    }

    #[test]
    fn filters_compose() {
        let request = ShiftLengthRequest {
            branch: Some("jnah".to_string()),
            shift_name: Some(ShiftName::Evening),
            day_of_week: Some(Weekday::Fri),
        };
        let summary = summarize_shift_lengths(&sample(), &request).unwrap();
        assert_eq!(summary.branch_filter.as_deref(), Some("Jnah"));
        assert_eq!(summary.shift_count, 2);
    }

    #[test]
    fn empty_filter_result_is_distinct_from_empty_feed() {
        let request = ShiftLengthRequest {
            branch: None,
            shift_name: Some(ShiftName::Night),
            day_of_week: None,
        };
        assert!(matches!(
            summarize_shift_lengths(&sample(), &request),
            Err(StaffingError::NoMatchingRows)
        ));
        assert!(matches!(
            summarize_shift_lengths(&normalize(&[]), &ShiftLengthRequest::default()),
            Err(StaffingError::NoAttendanceData)
        ));
    }

    #[test]
    fn unknown_branch_filter_fails_resolution() {
        let request = ShiftLengthRequest {
            branch: Some("Saida".to_string()),
            shift_name: None,
            day_of_week: None,
        };
        assert!(matches!(
            summarize_shift_lengths(&sample(), &request),
            Err(StaffingError::BranchNotFound(_))
        ));
    }
}
