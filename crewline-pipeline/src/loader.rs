//! CSV feed loaders.
//!
//! Parses the cleaned attendance and monthly-sales exports into the core's
//! feed row types. The loaders are deliberately forgiving about field-level
//! mess (unparseable timestamps, blank numerics, month names instead of
//! numbers): such values become `None` and the core drops or skips the row
//! with its counters intact. A missing file is an empty feed, not an error;
//! downstream tools degrade with explicit flags instead of failing early.
//!
//! Attendance columns:
//!   employee_id, employee_name, branch, punch_in_timestamp,
//!   punch_out_timestamp[, work_duration_hours]
//! Sales columns:
//!   branch_name, total_sales (or monthly_sales), and either period_key or
//!   year + month (numeric or English month name)

use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

use crewline_core::{AttendancePunch, Period, RawSalesRow};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Attendance CSV record, one per punch.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceCsvRecord {
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: String,
    pub branch: String,
    #[serde(default)]
    pub punch_in_timestamp: String,
    #[serde(default)]
    pub punch_out_timestamp: String,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub work_duration_hours: Option<f64>,
}

impl AttendanceCsvRecord {
    /// Convert to a feed punch. Unparseable timestamps become `None` so the
    /// normalizer can drop and count the row.
    pub fn to_punch(&self) -> AttendancePunch {
        AttendancePunch {
            employee_id: self.employee_id.clone(),
            employee_name: self.employee_name.clone(),
            branch: self.branch.clone(),
            punch_in: parse_timestamp(&self.punch_in_timestamp),
            punch_out: parse_timestamp(&self.punch_out_timestamp),
            work_duration_hours: self.work_duration_hours,
        }
    }
}

/// Monthly sales CSV record. Period information may arrive as a `period_key`
/// column or as separate year/month columns.
#[derive(Debug, Clone, Deserialize)]
pub struct SalesCsvRecord {
    pub branch_name: String,
    #[serde(default)]
    pub period_key: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i32")]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default, alias = "monthly_sales", deserialize_with = "de_opt_f64")]
    pub total_sales: Option<f64>,
    #[serde(default)]
    pub source_file: Option<String>,
}

impl SalesCsvRecord {
    /// Convert to a feed row, resolving the period from whichever columns
    /// are populated. Missing sales figures become zero, matching how the
    /// upstream cleaning scripts emit empty cells.
    pub fn to_raw_row(&self) -> RawSalesRow {
        let period = self
            .period_key
            .as_deref()
            .and_then(|key| key.trim().parse::<Period>().ok())
            .or_else(|| match (self.year, month_to_number(self.month.as_deref())) {
                (Some(year), Some(month)) => Period::new(year, month),
                _ => None,
            });
        RawSalesRow {
            branch_name: self.branch_name.clone(),
            period,
            total_sales: self.total_sales.unwrap_or(0.0),
            source_file: self.source_file.clone(),
        }
    }
}

/// Load attendance punches from a CSV reader.
pub fn load_attendance<R: Read>(reader: R) -> Result<Vec<AttendancePunch>, String> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut punches = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: AttendanceCsvRecord =
            result.map_err(|e| format!("attendance CSV parse error at line {}: {}", line_num + 2, e))?;
        punches.push(record.to_punch());
    }
    Ok(punches)
}

/// Load attendance punches from a file. A missing file is an empty feed.
pub fn load_attendance_file(path: impl AsRef<Path>) -> Result<Vec<AttendancePunch>, String> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!("attendance feed {} is missing, treating as empty", path.display());
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)
        .map_err(|e| format!("failed to open '{}': {}", path.display(), e))?;
    load_attendance(file)
}

/// Load raw monthly sales rows from a CSV reader.
pub fn load_monthly_sales<R: Read>(reader: R) -> Result<Vec<RawSalesRow>, String> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line_num, result) in csv_reader.deserialize().enumerate() {
        let record: SalesCsvRecord =
            result.map_err(|e| format!("sales CSV parse error at line {}: {}", line_num + 2, e))?;
        rows.push(record.to_raw_row());
    }
    Ok(rows)
}

/// Load raw monthly sales rows from a file. A missing file is an empty feed.
pub fn load_monthly_sales_file(path: impl AsRef<Path>) -> Result<Vec<RawSalesRow>, String> {
    let path = path.as_ref();
    if !path.exists() {
        log::warn!("sales feed {} is missing, treating as empty", path.display());
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)
        .map_err(|e| format!("failed to open '{}': {}", path.display(), e))?;
    load_monthly_sales(file)
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// Interpret a month cell: a 1-12 number (possibly float-formatted) or an
/// English month name or abbreviation.
fn month_to_number(raw: Option<&str>) -> Option<u32> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(numeric) = text.parse::<f64>() {
        let month = numeric as u32;
        return (1..=12).contains(&month).then_some(month);
    }
    let prefix = text.get(..3)?.to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Treat blank or malformed numeric cells as absent instead of failing the
/// whole row.
fn de_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse::<f64>().ok()))
}

fn de_opt_i32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse::<f64>().ok().map(|v| v as i32)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewline_core::attendance::normalize;
    use crewline_core::sales::aggregate_monthly_sales;

    const SAMPLE_ATTENDANCE: &str = "\
employee_id,employee_name,branch,punch_in_timestamp,punch_out_timestamp,work_duration_hours
E001,Rami K,Jnah,2025-03-07 18:00:00,2025-03-08 02:00:00,8.0
E002,Lina T,Jnah,2025-03-07T19:00:00,2025-03-08T01:00:00,
E003,Omar S,Tripoli,not a timestamp,2025-03-07 16:00:00,7.5
E004,Dana H,Tripoli,2025-03-07 09:00,2025-03-07 17:00,
";

    const SAMPLE_SALES: &str = "\
branch_name,year,month,total_sales,source_file
Jnah,2025,3,120000,sales_export.csv
Jnah,2025,March,30000,sales_export.csv
Tripoli,2025,Apr,90000,sales_export.csv
Tripoli,,,1000,sales_export.csv
";

    #[test]
    fn attendance_loader_keeps_unparseable_rows_for_the_normalizer() {
        let punches = load_attendance(SAMPLE_ATTENDANCE.as_bytes()).unwrap();
        assert_eq!(punches.len(), 4);
        assert!(punches[0].punch_in.is_some());
        assert_eq!(punches[0].work_duration_hours, Some(8.0));
        assert!(punches[1].work_duration_hours.is_none());
        // bad timestamp arrives as None; dropping it is the normalizer's job
        assert!(punches[2].punch_in.is_none());
        // minute-precision timestamps parse too
        assert!(punches[3].punch_in.is_some());

        let table = normalize(&punches);
        assert_eq!(table.rows_loaded, 4);
        assert_eq!(table.rows_dropped, 1);
    }

    #[test]
    fn sales_loader_resolves_month_names_and_numbers() {
        let rows = load_monthly_sales(SAMPLE_SALES.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].period.unwrap().to_string(), "2025-03");
        assert_eq!(rows[1].period.unwrap().to_string(), "2025-03");
        assert_eq!(rows[2].period.unwrap().to_string(), "2025-04");
        assert!(rows[3].period.is_none());

        // duplicate branch-periods collapse in aggregation
        let records = aggregate_monthly_sales(&rows);
        assert_eq!(records.len(), 2);
        assert!((records[0].monthly_sales - 150_000.0).abs() < 1e-9);
    }

    #[test]
    fn sales_loader_accepts_period_key_column() {
        let csv_data = "\
branch_name,period_key,monthly_sales
Jnah,2025-03,5000
";
        let rows = load_monthly_sales(csv_data.as_bytes()).unwrap();
        assert_eq!(rows[0].period.unwrap().to_string(), "2025-03");
        assert!((rows[0].total_sales - 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn missing_files_are_empty_feeds() {
        assert!(load_attendance_file("/nonexistent/attendance.csv")
            .unwrap()
            .is_empty());
        assert!(load_monthly_sales_file("/nonexistent/sales.csv")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn month_cells_parse_flexibly() {
        assert_eq!(month_to_number(Some("3")), Some(3));
        assert_eq!(month_to_number(Some("3.0")), Some(3));
        assert_eq!(month_to_number(Some("November")), Some(11));
        assert_eq!(month_to_number(Some("dec")), Some(12));
        assert_eq!(month_to_number(Some("13")), None);
        assert_eq!(month_to_number(Some("")), None);
        assert_eq!(month_to_number(None), None);
    }
}
