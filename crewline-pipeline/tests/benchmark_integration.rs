use std::sync::Arc;

use chrono::NaiveDateTime;

use crewline_core::{AttendancePunch, RawSalesRow, ShiftName, StaffingEngine, StaffingError};
use crewline_pipeline::components::branch_estimate_source::BranchEstimateSource;
use crewline_pipeline::components::branch_scope_filter::BranchScopeFilter;
use crewline_pipeline::components::branch_universe_hydrator::BranchUniverseHydrator;
use crewline_pipeline::components::gap_rank_selector::GapRankSelector;
use crewline_pipeline::components::headcount_gap_scorer::HeadcountGapScorer;
use crewline_pipeline::filter::{Filter, FilterResult};
use crewline_pipeline::query_hydrator::QueryHydrator;
use crewline_pipeline::scorer::Scorer;
use crewline_pipeline::selector::Selector;
use crewline_pipeline::source::Source;
use crewline_pipeline::{run_benchmark, BenchmarkQuery, BranchStanding};

// ---------------------------------------------------------------------------
// Test data fixtures
// ---------------------------------------------------------------------------

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

/// Three branches, one observed day each, evening share 0.5 everywhere.
/// Productivities 10/20/40 and evening headcounts 1/2/3, so a shared demand
/// override produces distinct staffing gaps per branch.
fn chain_engine() -> Arc<StaffingEngine> {
    let mut punches = Vec::new();
    // Jnah: 8h morning + 8h evening, 1 evening employee, productivity 10.
    punches.push(punch("j-m1", "Jnah", "2025-03-03 07:00:00", 8));
    punches.push(punch("j-v1", "Jnah", "2025-03-03 18:00:00", 8));
    // Tripoli: 16h morning + 16h evening, 2 evening employees, productivity 20.
    for i in 1..=2 {
        punches.push(punch(&format!("t-m{}", i), "Tripoli", "2025-03-03 07:00:00", 8));
        punches.push(punch(&format!("t-v{}", i), "Tripoli", "2025-03-03 18:00:00", 8));
    }
    // Verdun: 24h morning + 24h evening, 3 evening employees, productivity 40.
    for i in 1..=3 {
        punches.push(punch(&format!("v-m{}", i), "Verdun", "2025-03-03 07:00:00", 8));
        punches.push(punch(&format!("v-v{}", i), "Verdun", "2025-03-03 18:00:00", 8));
    }

    let sales_rows = vec![
        sales("Jnah", "2025-03", 160.0),
        sales("Tripoli", "2025-03", 640.0),
        sales("Verdun", "2025-03", 1_920.0),
    ];
    Arc::new(StaffingEngine::from_feeds(&punches, &sales_rows))
}

fn benchmark_query(top_n: usize) -> BenchmarkQuery {
    let mut query = BenchmarkQuery::new("bench-001", ShiftName::Evening);
    query.target_period = Some("2025-03".parse().unwrap());
    query.demand_override = Some(20_000.0);
    query.top_n = top_n;
    query
}

fn standing(branch: &str, gap: Option<f64>, demand: f64, productivity: f64) -> BranchStanding {
    BranchStanding {
        branch: branch.to_string(),
        headcount_gap: gap,
        demand_used: demand,
        productivity_used: productivity,
        ..BranchStanding::default()
    }
}

// ---------------------------------------------------------------------------
// Stage tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn universe_hydrator_fills_empty_branch_list() {
    let hydrator = BranchUniverseHydrator::new(chain_engine());
    let query = benchmark_query(5);
    assert!(query.branches.is_empty());
    let hydrated = hydrator.hydrate(&query).await.unwrap();
    assert_eq!(hydrated.branches, vec!["Jnah", "Tripoli", "Verdun"]);

    // A pre-filled universe is left alone.
    let mut preset = benchmark_query(5);
    preset.branches = vec!["Jnah".to_string()];
    let hydrated = hydrator.hydrate(&preset).await.unwrap();
    assert_eq!(hydrated.branches, vec!["Jnah"]);
}

#[tokio::test]
async fn estimate_source_produces_one_standing_per_branch() {
    let engine = chain_engine();
    let source = BranchEstimateSource::new(Arc::clone(&engine));
    let mut query = benchmark_query(5);
    query.branches = engine.branches().to_vec();

    let standings = source.get_candidates(&query).await.unwrap();
    assert_eq!(standings.len(), 3);
    let jnah = standings.iter().find(|s| s.branch == "Jnah").unwrap();
    assert_eq!(jnah.recommended_staff, 5);
    assert!((jnah.historical_headcount.unwrap() - 1.0).abs() < 1e-9);
    assert!(!jnah.used_global_productivity);
}

#[tokio::test]
async fn estimate_source_disabled_without_attendance() {
    let engine = Arc::new(StaffingEngine::from_feeds(&[], &[]));
    let source = BranchEstimateSource::new(engine);
    assert!(!source.enable(&benchmark_query(5)));
}

#[tokio::test]
async fn scope_filter_keeps_only_requested_branches() {
    let mut query = benchmark_query(5);
    query.branches = vec!["Jnah".to_string(), "Tripoli".to_string(), "Verdun".to_string()];
    query.branch_scope = Some(vec!["tripo".to_string()]);

    let candidates = vec![
        standing("Jnah", None, 0.0, 0.0),
        standing("Tripoli", None, 0.0, 0.0),
        standing("Verdun", None, 0.0, 0.0),
    ];
    let FilterResult { kept, removed } =
        BranchScopeFilter.filter(&query, candidates).await.unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].branch, "Tripoli");
    assert_eq!(removed.len(), 2);
}

#[tokio::test]
async fn scope_filter_rejects_unresolvable_names() {
    let mut query = benchmark_query(5);
    query.branches = vec!["Jnah".to_string()];
    query.branch_scope = Some(vec!["Saida".to_string()]);
    let result = BranchScopeFilter
        .filter(&query, vec![standing("Jnah", None, 0.0, 0.0)])
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn gap_scorer_computes_gap_and_ratio() {
    let query = benchmark_query(5);
    let candidates = vec![
        BranchStanding {
            branch: "Jnah".to_string(),
            recommended_staff: 5,
            historical_headcount: Some(2.0),
            ..BranchStanding::default()
        },
        BranchStanding {
            branch: "Fresh".to_string(),
            recommended_staff: 5,
            historical_headcount: None,
            ..BranchStanding::default()
        },
    ];
    let scored = HeadcountGapScorer.score(&query, &candidates).await.unwrap();
    assert!((scored[0].headcount_gap.unwrap() - 3.0).abs() < 1e-9);
    assert!((scored[0].gap_ratio.unwrap() - 1.5).abs() < 1e-9);
    // No history counts as zero headcount, divided by the floor of one.
    assert!((scored[1].headcount_gap.unwrap() - 5.0).abs() < 1e-9);
    assert!((scored[1].gap_ratio.unwrap() - 5.0).abs() < 1e-9);
}

#[test]
fn selector_orders_by_gap_then_demand_then_low_productivity() {
    let selector = GapRankSelector { top_n: 10 };
    let candidates = vec![
        standing("small-gap", Some(1.0), 900.0, 5.0),
        standing("tie-low-demand", Some(3.0), 100.0, 5.0),
        standing("tie-high-demand", Some(3.0), 500.0, 5.0),
        standing("tie-inefficient", Some(3.0), 500.0, 2.0),
        standing("no-gap", None, 999.0, 1.0),
    ];
    let query = benchmark_query(5);
    let sorted = selector.select(&query, candidates);
    let order: Vec<&str> = sorted.iter().map(|s| s.branch.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "tie-inefficient",
            "tie-high-demand",
            "tie-low-demand",
            "small-gap",
            "no-gap",
        ]
    );
}

#[test]
fn selector_truncates_to_top_n() {
    let selector = GapRankSelector { top_n: 2 };
    let query = benchmark_query(2);
    let sorted = selector.select(
        &query,
        vec![
            standing("a", Some(1.0), 0.0, 1.0),
            standing("b", Some(3.0), 0.0, 1.0),
            standing("c", Some(2.0), 0.0, 1.0),
        ],
    );
    assert_eq!(sorted.len(), 2);
    assert_eq!(sorted[0].branch, "b");
    assert_eq!(sorted[1].branch, "c");
}

// ---------------------------------------------------------------------------
// End-to-end benchmark
// ---------------------------------------------------------------------------

#[tokio::test]
async fn benchmark_ranks_by_staffing_pressure() {
    let report = run_benchmark(chain_engine(), benchmark_query(5)).await.unwrap();

    assert_eq!(report.branches_evaluated, 3);
    assert_eq!(report.branches_excluded, 0);
    assert_eq!(report.global_productivity_fallbacks, 0);
    assert!(report.demand_override_used);

    let order: Vec<&str> = report.rankings.iter().map(|s| s.branch.as_str()).collect();
    assert_eq!(order, vec!["Jnah", "Tripoli", "Verdun"]);
    // Gap falls as productivity and historical staffing rise.
    assert!((report.rankings[0].headcount_gap.unwrap() - 4.0).abs() < 1e-9);
    assert!((report.rankings[1].headcount_gap.unwrap() - 1.0).abs() < 1e-9);
    assert!((report.rankings[2].headcount_gap.unwrap() + 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn benchmark_truncates_but_still_counts_everyone() {
    let report = run_benchmark(chain_engine(), benchmark_query(1)).await.unwrap();
    assert_eq!(report.rankings.len(), 1);
    assert_eq!(report.rankings[0].branch, "Jnah");
    assert_eq!(report.branches_evaluated, 3);
}

#[tokio::test]
async fn single_branch_scope_matches_direct_estimate() {
    let engine = chain_engine();
    let mut query = benchmark_query(1);
    query.branch_scope = Some(vec!["Tripoli".to_string()]);
    let report = run_benchmark(Arc::clone(&engine), query).await.unwrap();

    let direct = engine
        .estimate(&benchmark_query(1).staffing_request("Tripoli"))
        .unwrap();
    assert_eq!(report.rankings.len(), 1);
    assert_eq!(report.rankings[0].branch, direct.branch);
    assert_eq!(report.rankings[0].recommended_staff, direct.recommended_staff);
    assert_eq!(report.branches_excluded, 2);
}

#[tokio::test]
async fn branches_without_sales_count_as_fallbacks() {
    // Badaro has attendance but no sales of its own.
    let mut punches = vec![
        punch("j-m1", "Jnah", "2025-03-03 07:00:00", 8),
        punch("j-v1", "Jnah", "2025-03-03 18:00:00", 8),
    ];
    punches.push(punch("b-v1", "Badaro", "2025-03-03 18:00:00", 8));
    let engine = Arc::new(StaffingEngine::from_feeds(
        &punches,
        &[sales("Jnah", "2025-03", 160.0)],
    ));

    let report = run_benchmark(engine, benchmark_query(5)).await.unwrap();
    assert_eq!(report.branches_evaluated, 2);
    assert_eq!(report.global_productivity_fallbacks, 1);
    let badaro = report
        .rankings
        .iter()
        .find(|s| s.branch == "Badaro")
        .unwrap();
    assert!(badaro.used_global_productivity);
}

#[tokio::test]
async fn empty_attendance_fails_the_benchmark() {
    let engine = Arc::new(StaffingEngine::from_feeds(&[], &[]));
    assert!(matches!(
        run_benchmark(engine, benchmark_query(5)).await,
        Err(StaffingError::NoAttendanceData)
    ));
}
