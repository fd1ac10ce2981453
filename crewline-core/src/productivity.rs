//! Branch productivity modeling.
//!
//! Joins monthly labor-hour totals (from attendance) with monthly sales
//! totals per branch to derive sales-per-labor-hour. Pairing prefers an
//! exact period match and otherwise takes the nearest sales period by day
//! distance, recording which one was used. The network-wide fallback is the
//! hours-weighted average (total sales over total hours), not the mean of
//! per-branch productivities, so branches with more history weigh more.

use std::collections::BTreeMap;

use crate::attendance::NormalizedAttendance;
use crate::resolve::{branch_key, nearest_by_period};
use crate::sales::records_for_branch;
use crate::types::{MonthlySalesRecord, Period};

/// Productivity for one branch-month of labor.
#[derive(Clone, Debug)]
pub struct ProductivityRow {
    pub branch: String,
    pub labor_period: Period,
    pub total_labor_hours: f64,
    /// The sales period actually paired with this labor month.
    pub sales_period_used: Option<Period>,
    pub monthly_sales: Option<f64>,
    /// `monthly_sales / total_labor_hours`, present only when hours are
    /// positive and a sales record was found.
    pub productivity: Option<f64>,
    pub exact_period_match: bool,
}

/// The productivity rows plus the network-wide fallback scalar.
#[derive(Clone, Debug, Default)]
pub struct ProductivityTable {
    pub rows: Vec<ProductivityRow>,
    /// `Σ monthly_sales / Σ total_labor_hours` across all valid rows, or
    /// `None` when no branch-month has both positive hours and a sales match.
    pub global_productivity: Option<f64>,
}

impl ProductivityTable {
    /// Rows for one branch, matched by canonical name, in period order.
    pub fn rows_for_branch<'a>(&'a self, branch: &str) -> Vec<&'a ProductivityRow> {
        let key = branch_key(branch);
        self.rows
            .iter()
            .filter(|row| branch_key(&row.branch) == key)
            .collect()
    }
}

/// Derive per-branch-month productivity from attendance and sales.
pub fn build_branch_productivity(
    attendance: &NormalizedAttendance,
    sales: &[MonthlySalesRecord],
) -> ProductivityTable {
    if attendance.is_empty() {
        return ProductivityTable::default();
    }

    // Labor hours per (branch, period), keyed on the raw branch spelling the
    // attendance rows carry.
    let mut labor: BTreeMap<(String, Period), f64> = BTreeMap::new();
    for row in &attendance.rows {
        *labor
            .entry((row.branch.clone(), row.period_key))
            .or_insert(0.0) += row.work_duration_hours;
    }

    let mut rows = Vec::with_capacity(labor.len());
    for ((branch, labor_period), total_labor_hours) in labor {
        let branch_sales = records_for_branch(sales, &branch);
        let selected = branch_sales
            .iter()
            .find(|record| record.period == labor_period)
            .copied()
            .or_else(|| nearest_by_period(&branch_sales, labor_period, |record| record.period));

        let monthly_sales = selected.map(|record| record.monthly_sales);
        let productivity = match monthly_sales {
            Some(sales_value) if total_labor_hours > 0.0 => Some(sales_value / total_labor_hours),
            _ => None,
        };
        rows.push(ProductivityRow {
            branch,
            labor_period,
            total_labor_hours,
            sales_period_used: selected.map(|record| record.period),
            monthly_sales,
            productivity,
            exact_period_match: selected.is_some_and(|record| record.period == labor_period),
        });
    }

    let mut total_sales = 0.0;
    let mut total_hours = 0.0;
    for row in rows.iter().filter(|row| row.productivity.is_some()) {
        total_sales += row.monthly_sales.unwrap_or(0.0);
        total_hours += row.total_labor_hours;
    }
    let global_productivity = if total_hours > 0.0 {
        Some(total_sales / total_hours)
    } else {
        None
    };

    ProductivityTable {
        rows,
        global_productivity,
    }
}
