//! Crewline staffing analytics engine.
//!
//! Everything in this crate is synchronous and pure: two feed snapshots go
//! in (attendance punches, monthly sales rows), derived tables and staffing
//! answers come out. The crate performs no I/O and holds no shared state, so
//! each request operates on an independently materialized snapshot.
//!
//! Pipeline, leaf first:
//! 1. [`attendance`] cleans raw punches into validated rows,
//! 2. [`features`] rolls them into per-branch shift statistics,
//! 3. [`productivity`] joins labor hours with monthly sales,
//! 4. [`estimator`] resolves demand, productivity, days, and shift share
//!    through documented fallback chains and recommends headcount,
//! 5. [`summary`] and [`forecast`] answer the descriptive and projection
//!    tools from the same tables.

pub mod attendance;
pub mod error;
pub mod estimator;
pub mod features;
pub mod forecast;
pub mod productivity;
pub mod resolve;
pub mod sales;
pub mod summary;
pub mod types;

pub use error::{StaffingError, StaffingResult};
pub use estimator::{StaffingEngine, EQUAL_SHIFT_SHARE};
pub use types::{
    AttendancePunch, DataCoverage, DayScope, DaysSource, DemandForecast, DemandSource,
    ForecastRequest, MonthlySalesRecord, Period, ProductivitySource, RawSalesRow,
    ShiftLengthRequest, ShiftLengthSummary, ShiftName, ShiftShareSource, StaffingEstimate,
    StaffingEvidence, StaffingRequest,
};
