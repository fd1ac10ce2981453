//! Monthly sales aggregation.
//!
//! The sales feed can contain several raw rows for one branch-month (one per
//! register export, typically); they are summed into a single record here.
//! Rows without a resolvable branch or period are discarded.

use std::collections::BTreeMap;

use crate::resolve::branch_key;
use crate::types::{MonthlySalesRecord, Period, RawSalesRow};

/// Collapse raw sales rows into one record per (branch, period), summing the
/// sales figures. Output is sorted by branch then period.
pub fn aggregate_monthly_sales(rows: &[RawSalesRow]) -> Vec<MonthlySalesRecord> {
    let mut grouped: BTreeMap<(String, Period), MonthlySalesRecord> = BTreeMap::new();

    for row in rows {
        let Some(period) = row.period else { continue };
        if row.branch_name.trim().is_empty() {
            continue;
        }
        grouped
            .entry((row.branch_name.clone(), period))
            .and_modify(|record| record.monthly_sales += row.total_sales)
            .or_insert_with(|| MonthlySalesRecord {
                branch_name: row.branch_name.clone(),
                period,
                monthly_sales: row.total_sales,
                source_file: row.source_file.clone(),
            });
    }

    grouped.into_values().collect()
}

/// Records for one branch, matched by canonical name, in period order.
pub fn records_for_branch<'a>(
    records: &'a [MonthlySalesRecord],
    branch: &str,
) -> Vec<&'a MonthlySalesRecord> {
    let key = branch_key(branch);
    records
        .iter()
        .filter(|record| branch_key(&record.branch_name) == key)
        .collect()
}

/// The most recent record across all branches, by period.
pub fn latest_record(records: &[MonthlySalesRecord]) -> Option<&MonthlySalesRecord> {
    records.iter().max_by_key(|record| record.period)
}

/// Sorted, deduplicated branch names present in the sales feed.
pub fn branch_names(records: &[MonthlySalesRecord]) -> Vec<String> {
    let mut names: Vec<String> = records
        .iter()
        .map(|record| record.branch_name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(branch: &str, period: Option<&str>, sales: f64) -> RawSalesRow {
        RawSalesRow {
            branch_name: branch.to_string(),
            period: period.map(|p| p.parse().unwrap()),
            total_sales: sales,
            source_file: Some("sales_export.csv".to_string()),
        }
    }

    #[test]
    fn duplicate_branch_periods_are_summed() {
        let records = aggregate_monthly_sales(&[
            raw("Jnah", Some("2025-03"), 120_000.0),
            raw("Jnah", Some("2025-03"), 80_000.0),
            raw("Jnah", Some("2025-04"), 90_000.0),
        ]);
        assert_eq!(records.len(), 2);
        assert!((records[0].monthly_sales - 200_000.0).abs() < 1e-9);
        assert_eq!(records[0].period.to_string(), "2025-03");
    }

    #[test]
    fn rows_without_branch_or_period_are_dropped() {
        let records = aggregate_monthly_sales(&[
            raw("Jnah", None, 50_000.0),
            raw("  ", Some("2025-03"), 50_000.0),
            raw("Jnah", Some("2025-03"), 70_000.0),
        ]);
        assert_eq!(records.len(), 1);
        assert!((records[0].monthly_sales - 70_000.0).abs() < 1e-9);
    }

    #[test]
    fn branch_lookup_uses_canonical_names() {
        let records = aggregate_monthly_sales(&[
            raw("Hamra Main", Some("2025-03"), 10.0),
            raw("Jnah", Some("2025-03"), 20.0),
        ]);
        assert_eq!(records_for_branch(&records, "hamra   main").len(), 1);
        assert_eq!(records_for_branch(&records, "Verdun").len(), 0);
    }

    #[test]
    fn latest_record_spans_all_branches() {
        let records = aggregate_monthly_sales(&[
            raw("Jnah", Some("2025-02"), 10.0),
            raw("Tripoli", Some("2025-04"), 20.0),
        ]);
        assert_eq!(latest_record(&records).unwrap().branch_name, "Tripoli");
    }
}
