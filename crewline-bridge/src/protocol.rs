//! Tool request parsing, execution, and response formatting.
//!
//! The gateway is the constraint-enforcement point between a conversational
//! agent and the analytics core:
//! 1. agent JSON -> parse into a [`ToolRequest`] (reject if malformed)
//! 2. validate parameters (reject if out of bounds)
//! 3. materialize fresh tables from the feeds
//! 4. execute the operation
//! 5. record the invocation in the activity log
//! 6. answer with the typed result and timing
//!
//! Tables are rebuilt from the feeds on every call, so a request always sees
//! the feeds as they are on disk right now; nothing derived is cached.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crewline_core::{
    AttendancePunch, DemandForecast, RawSalesRow, ShiftLengthSummary, StaffingEngine,
    StaffingEstimate,
};
use crewline_pipeline::{loader, run_benchmark, BenchmarkReport};

use crate::activity::{ActivityEvent, ActivityLog};
use crate::error::{BridgeError, BridgeResult};
use crate::ops::ToolOperation;

/// A tool invocation from the agent gateway.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolRequest {
    /// The operation to perform.
    #[serde(flatten)]
    pub operation: ToolOperation,

    /// Request id for tracing; echoed back in the response.
    pub request_id: String,

    /// Optional caller context: why the agent is asking.
    #[serde(default)]
    pub context: Option<String>,
}

/// The typed result of one tool invocation.
#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Estimate(StaffingEstimate),
    Benchmark(BenchmarkReport),
    ShiftLengths(ShiftLengthSummary),
    Forecast(DemandForecast),
    Activity(Vec<ActivityEvent>),
}

/// The response envelope: result plus tracing fields.
#[derive(Clone, Debug, Serialize)]
pub struct ToolResponse {
    pub request_id: String,
    pub tool: &'static str,
    pub result: ToolOutput,
    pub elapsed_ms: u128,
}

enum FeedSource {
    Paths {
        attendance: PathBuf,
        sales: PathBuf,
    },
    Memory {
        punches: Vec<AttendancePunch>,
        sales: Vec<RawSalesRow>,
    },
}

/// The tool gateway. Owns the feed locations and the injected activity log.
pub struct Gateway {
    feeds: FeedSource,
    activity: Arc<dyn ActivityLog>,
}

impl Gateway {
    /// Gateway over feed files. Missing files degrade to empty feeds.
    pub fn from_paths(
        attendance: impl Into<PathBuf>,
        sales: impl Into<PathBuf>,
        activity: Arc<dyn ActivityLog>,
    ) -> Gateway {
        Gateway {
            feeds: FeedSource::Paths {
                attendance: attendance.into(),
                sales: sales.into(),
            },
            activity,
        }
    }

    /// Gateway over an in-memory snapshot of the feeds.
    pub fn with_feeds(
        punches: Vec<AttendancePunch>,
        sales: Vec<RawSalesRow>,
        activity: Arc<dyn ActivityLog>,
    ) -> Gateway {
        Gateway {
            feeds: FeedSource::Memory { punches, sales },
            activity,
        }
    }

    /// Parse raw agent JSON into a validated request. Anything that fails
    /// here never reaches the data.
    pub fn parse_request(&self, raw_json: &str) -> BridgeResult<ToolRequest> {
        let request: ToolRequest = serde_json::from_str(raw_json)
            .map_err(|err| BridgeError::MalformedRequest(err.to_string()))?;
        request.operation.validate()?;
        Ok(request)
    }

    /// Execute one request end to end and record it in the activity log,
    /// success or failure.
    pub async fn execute(&self, request: &ToolRequest) -> BridgeResult<ToolResponse> {
        let started = Instant::now();
        request.operation.validate()?;

        let outcome = self.dispatch(request).await;
        let tool = request.operation.name();
        match outcome {
            Ok(result) => {
                self.activity.record(
                    tool,
                    &request.request_id,
                    true,
                    &describe_output(&result),
                );
                Ok(ToolResponse {
                    request_id: request.request_id.clone(),
                    tool,
                    result,
                    elapsed_ms: started.elapsed().as_millis(),
                })
            }
            Err(err) => {
                self.activity
                    .record(tool, &request.request_id, false, &err.to_string());
                Err(err)
            }
        }
    }

    async fn dispatch(&self, request: &ToolRequest) -> BridgeResult<ToolOutput> {
        if let ToolOperation::ListActivity { limit } = &request.operation {
            return Ok(ToolOutput::Activity(self.activity.list(*limit)));
        }

        let engine = self.materialize()?;
        match &request.operation {
            ToolOperation::EstimateStaffing(params) => {
                let estimate = engine.estimate(&params.to_request()?)?;
                Ok(ToolOutput::Estimate(estimate))
            }
            ToolOperation::BenchmarkStaffing(params) => {
                let query = params.to_query(&request.request_id)?;
                let report = run_benchmark(Arc::new(engine), query).await?;
                Ok(ToolOutput::Benchmark(report))
            }
            ToolOperation::SummarizeShiftLengths(params) => {
                let summary = engine.summarize_shift_lengths(&params.to_request()?)?;
                Ok(ToolOutput::ShiftLengths(summary))
            }
            ToolOperation::ForecastDemand(params) => {
                let forecast = engine.forecast_demand(&params.to_request()?)?;
                Ok(ToolOutput::Forecast(forecast))
            }
            ToolOperation::ListActivity { .. } => unreachable!("handled above"),
        }
    }

    fn materialize(&self) -> BridgeResult<StaffingEngine> {
        match &self.feeds {
            FeedSource::Paths { attendance, sales } => {
                let punches =
                    loader::load_attendance_file(attendance).map_err(BridgeError::FeedError)?;
                let sales_rows =
                    loader::load_monthly_sales_file(sales).map_err(BridgeError::FeedError)?;
                Ok(StaffingEngine::from_feeds(&punches, &sales_rows))
            }
            FeedSource::Memory { punches, sales } => {
                Ok(StaffingEngine::from_feeds(punches, sales))
            }
        }
    }
}

/// One-line result summary for the activity record.
fn describe_output(output: &ToolOutput) -> String {
    match output {
        ToolOutput::Estimate(estimate) => format!(
            "branch={} shift={} recommended_staff={}",
            estimate.branch, estimate.shift_name, estimate.recommended_staff,
        ),
        ToolOutput::Benchmark(report) => format!(
            "shift={} ranked={} evaluated={} fallbacks={}",
            report.shift_name,
            report.rankings.len(),
            report.branches_evaluated,
            report.global_productivity_fallbacks,
        ),
        ToolOutput::ShiftLengths(summary) => format!(
            "branches={} shift_count={} avg_hours={:.2}",
            summary.per_branch.len(),
            summary.shift_count,
            summary.average_hours,
        ),
        ToolOutput::Forecast(forecast) => format!(
            "branch={} months={} latest_period={}",
            forecast.branch,
            forecast.projections.len(),
            forecast.latest_period_used,
        ),
        ToolOutput::Activity(events) => format!("events={}", events.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::BoundedActivityLog;
    use crate::error::ResponseClass;
    use chrono::NaiveDateTime;

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

    fn sales(branch: &str, period: &str, amount: f64) -> RawSalesRow {
        RawSalesRow {
            branch_name: branch.to_string(),
            period: Some(period.parse().unwrap()),
            total_sales: amount,
            source_file: None,
        }
    }

    fn gateway() -> Gateway {
        let punches = vec![
            punch("m1", "Jnah", "2025-03-03 07:00:00", 8),
            punch("v1", "Jnah", "2025-03-03 18:00:00", 8),
        ];
        let sales_rows = vec![
            sales("Jnah", "2025-01", 150.0),
            sales("Jnah", "2025-02", 155.0),
            sales("Jnah", "2025-03", 160.0),
        ];
        Gateway::with_feeds(punches, sales_rows, Arc::new(BoundedActivityLog::default()))
    }

    #[tokio::test]
    async fn estimate_round_trips_through_the_gateway() {
        let gateway = gateway();
        let request = gateway
            .parse_request(
                r#"{"tool":"estimate_staffing","branch":"jnah","shift_name":"evening","request_id":"r1"}"#,
            )
            .unwrap();
        let response = gateway.execute(&request).await.unwrap();
        assert_eq!(response.tool, "estimate_staffing");
        match response.result {
            ToolOutput::Estimate(estimate) => {
                assert_eq!(estimate.branch, "Jnah");
                assert!(estimate.recommended_staff >= 1);
            }
            other => panic!("wrong output: {:?}", other),
        }
    }

    #[tokio::test]
    async fn activity_log_sees_successes_and_failures() {
        let gateway = gateway();
        let ok = gateway
            .parse_request(
                r#"{"tool":"forecast_demand","branch":"Jnah","request_id":"r1"}"#,
            )
            .unwrap();
        gateway.execute(&ok).await.unwrap();

        let missing: ToolRequest = serde_json::from_str(
            r#"{"tool":"estimate_staffing","branch":"Saida","shift_name":"evening","request_id":"r2"}"#,
        )
        .unwrap();
        let err = gateway.execute(&missing).await.unwrap_err();
        assert_eq!(err.response_class(), ResponseClass::NotFound);

        let listing = gateway
            .parse_request(r#"{"tool":"list_activity","request_id":"r3"}"#)
            .unwrap();
        let response = gateway.execute(&listing).await.unwrap();
        match response.result {
            ToolOutput::Activity(events) => {
                assert_eq!(events.len(), 2);
                assert_eq!(events[0].request_id, "r2");
                assert!(!events[0].success);
                assert!(events[1].success);
            }
            other => panic!("wrong output: {:?}", other),
        }
    }

    #[tokio::test]
    async fn benchmark_dispatch_reaches_the_pipeline() {
        let gateway = gateway();
        let request = gateway
            .parse_request(
                r#"{"tool":"benchmark_staffing","shift_name":"evening","top_n":2,"request_id":"r1"}"#,
            )
            .unwrap();
        let response = gateway.execute(&request).await.unwrap();
        match response.result {
            ToolOutput::Benchmark(report) => {
                assert_eq!(report.branches_evaluated, 1);
                assert_eq!(report.rankings[0].branch, "Jnah");
            }
            other => panic!("wrong output: {:?}", other),
        }
    }

    #[test]
    fn malformed_and_invalid_requests_never_execute() {
        let gateway = gateway();
        assert!(matches!(
            gateway.parse_request("not json at all"),
            Err(BridgeError::MalformedRequest(_))
        ));
        assert!(matches!(
            gateway.parse_request(r#"{"tool":"close_the_store","request_id":"r1"}"#),
            Err(BridgeError::MalformedRequest(_))
        ));
        assert!(matches!(
            gateway.parse_request(
                r#"{"tool":"estimate_staffing","branch":"Jnah","shift_name":"evening","buffer_pct":7.0,"request_id":"r1"}"#,
            ),
            Err(BridgeError::InvalidParameter { .. })
        ));
    }

    #[tokio::test]
    async fn empty_feeds_fail_with_data_errors_not_panics() {
        let gateway = Gateway::with_feeds(vec![], vec![], Arc::new(BoundedActivityLog::default()));
        let request = gateway
            .parse_request(
                r#"{"tool":"estimate_staffing","branch":"Jnah","shift_name":"evening","request_id":"r1"}"#,
            )
            .unwrap();
        let err = gateway.execute(&request).await.unwrap_err();
        assert_eq!(err.response_class(), ResponseClass::NotFound);
    }
}
