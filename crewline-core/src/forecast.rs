//! Weighted-moving-average demand forecasting.
//!
//! Projects a branch's monthly sales forward with a three-month WMA. Each
//! projected month is appended to the window, so later projections lean on
//! earlier ones. A deliberately simple model: the point is a defensible
//! near-term demand figure, not seasonality capture.

use crate::error::{StaffingError, StaffingResult};
use crate::resolve::resolve_branch;
use crate::sales::{branch_names, records_for_branch};
use crate::types::{DemandForecast, ForecastPoint, ForecastRequest, MonthlySalesRecord};

/// WMA weights, oldest to newest. The most recent month dominates.
pub const WMA_WEIGHTS: [f64; 3] = [0.2, 0.3, 0.5];

/// Months of history required before projecting.
pub const MIN_HISTORY_MONTHS: usize = WMA_WEIGHTS.len();

/// Project monthly sales for one branch.
pub fn forecast_demand(
    sales: &[MonthlySalesRecord],
    request: &ForecastRequest,
) -> StaffingResult<DemandForecast> {
    request.validate()?;
    if sales.is_empty() {
        return Err(StaffingError::NoDemandData);
    }

    let branch = resolve_branch(&request.branch, &branch_names(sales))?;
    let mut history = records_for_branch(sales, &branch);
    history.sort_by_key(|record| record.period);
    if history.len() < MIN_HISTORY_MONTHS {
        return Err(StaffingError::InsufficientHistory {
            branch,
            available: history.len(),
            required: MIN_HISTORY_MONTHS,
        });
    }

    let latest = history[history.len() - 1];
    let mut window: Vec<f64> = history[history.len() - MIN_HISTORY_MONTHS..]
        .iter()
        .map(|record| record.monthly_sales)
        .collect();
    let mut period = latest.period;

    let mut projections = Vec::with_capacity(request.months_ahead);
    for _ in 0..request.months_ahead {
        let projected: f64 = WMA_WEIGHTS
            .iter()
            .zip(&window)
            .map(|(weight, value)| weight * value)
            .sum();
        period = period.next();
        projections.push(ForecastPoint {
            period,
            projected_sales: projected,
        });
        window.remove(0);
        window.push(projected);
    }

    Ok(DemandForecast {
        history_months_used: history.len(),
        latest_period_used: latest.period,
        latest_sales: latest.monthly_sales,
        branch,
        projections,
        weights: WMA_WEIGHTS,
        assumptions: vec![
            "Projections weight the three most recent months 0.2/0.3/0.5 and roll each \
             projection back into the window."
                .to_string(),
            "Sales figures are scaled units; projections track relative demand, not revenue."
                .to_string(),
        ],
    })
}
