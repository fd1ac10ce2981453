use std::env;
use std::process;
use std::sync::Arc;

use crewline_bridge::ops::{
    BenchmarkParams, ForecastParams, ShiftLengthParams, StaffingParams, ToolOperation,
};
use crewline_bridge::{BoundedActivityLog, Gateway, ToolOutput, ToolRequest};

fn usage() -> ! {
    eprintln!("Usage: crewline-server <attendance.csv> <sales.csv> <tool> [options]");
    eprintln!();
    eprintln!("Tools:");
    eprintln!("  estimate       --branch NAME --shift SHIFT");
    eprintln!("  benchmark      [--shift SHIFT] [--top N] [--branches a,b,...]");
    eprintln!("  shift-lengths  [--branch NAME] [--shift SHIFT] [--day DAY]");
    eprintln!("  forecast       --branch NAME [--months N]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --branch    Branch name (fuzzy-matched against the attendance feed)");
    eprintln!("  --shift     morning | afternoon | evening | night");
    eprintln!("  --period    Target month as YYYY-MM");
    eprintln!("  --day       Day of week (Mon..Sun)");
    eprintln!("  --hours     Shift length in hours (default 8)");
    eprintln!("  --buffer    Safety buffer fraction (default 0.15)");
    eprintln!("  --demand    Demand override in scaled sales units");
    eprintln!("  --top       Number of branches to rank (default 5)");
    eprintln!("  --months    Months ahead to forecast (default 3)");
    eprintln!("  --json      Output as JSON instead of formatted text");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  crewline-server fixtures/attendance_sample.csv fixtures/monthly_sales_sample.csv \\");
    eprintln!("      estimate --branch Jnah --shift evening --period 2025-03");
    process::exit(1);
}

#[derive(Default)]
struct Flags {
    branch: Option<String>,
    shift: Option<String>,
    period: Option<String>,
    day: Option<String>,
    hours: Option<f64>,
    buffer: Option<f64>,
    demand: Option<f64>,
    top: Option<usize>,
    months: Option<usize>,
    branches: Option<Vec<String>>,
    json: bool,
}

fn value_of(args: &[String], index: usize, flag: &str) -> String {
    if index + 1 >= args.len() {
        eprintln!("Error: {} requires a value", flag);
        process::exit(1);
    }
    args[index + 1].clone()
}

fn parse_flags(args: &[String]) -> Flags {
    let mut flags = Flags::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "--json" {
            flags.json = true;
            i += 1;
            continue;
        }
        let value = value_of(args, i, flag);
        match flag {
            "--branch" => flags.branch = Some(value),
            "--shift" => flags.shift = Some(value),
            "--period" => flags.period = Some(value),
            "--day" => flags.day = Some(value),
            "--hours" => flags.hours = Some(parse_number(flag, &value)),
            "--buffer" => flags.buffer = Some(parse_number(flag, &value)),
            "--demand" => flags.demand = Some(parse_number(flag, &value)),
            "--top" => flags.top = Some(parse_number(flag, &value) as usize),
            "--months" => flags.months = Some(parse_number(flag, &value) as usize),
            "--branches" => {
                flags.branches = Some(
                    value
                        .split(',')
                        .map(|name| name.trim().to_string())
                        .filter(|name| !name.is_empty())
                        .collect(),
                )
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 2;
    }
    flags
}

fn parse_number(flag: &str, raw: &str) -> f64 {
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Error: {} requires a number, got '{}'", flag, raw);
        process::exit(1);
    })
}

fn require(value: Option<String>, flag: &str, tool: &str) -> String {
    value.unwrap_or_else(|| {
        eprintln!("Error: {} requires {}", tool, flag);
        process::exit(1);
    })
}

fn build_operation(tool: &str, flags: &Flags) -> ToolOperation {
    match tool {
        "estimate" => ToolOperation::EstimateStaffing(StaffingParams {
            branch: require(flags.branch.clone(), "--branch", "estimate"),
            shift_name: require(flags.shift.clone(), "--shift", "estimate"),
            shift_hours: flags.hours.unwrap_or(8.0),
            buffer_pct: flags.buffer.unwrap_or(0.15),
            target_period: flags.period.clone(),
            day_of_week: flags.day.clone(),
            demand_override: flags.demand,
        }),
        "benchmark" => ToolOperation::BenchmarkStaffing(BenchmarkParams {
            shift_name: flags.shift.clone().unwrap_or_else(|| "evening".to_string()),
            top_n: flags.top.unwrap_or(5),
            shift_hours: flags.hours.unwrap_or(8.0),
            buffer_pct: flags.buffer.unwrap_or(0.15),
            target_period: flags.period.clone(),
            day_of_week: flags.day.clone(),
            demand_override: flags.demand,
            branches: flags.branches.clone(),
        }),
        "shift-lengths" => ToolOperation::SummarizeShiftLengths(ShiftLengthParams {
            branch: flags.branch.clone(),
            shift_name: flags.shift.clone(),
            day_of_week: flags.day.clone(),
        }),
        "forecast" => ToolOperation::ForecastDemand(ForecastParams {
            branch: require(flags.branch.clone(), "--branch", "forecast"),
            months_ahead: flags.months.unwrap_or(3),
        }),
        other => {
            eprintln!("Unknown tool: {}", other);
            usage();
        }
    }
}

// ---------------------------------------------------------------------------
// Human-readable output
// ---------------------------------------------------------------------------

fn print_header(title: &str) {
    println!();
    println!("  {:=<64}", "");
    println!("  CREWLINE \u{2014} {}", title);
    println!("  {:=<64}", "");
    println!();
}

fn print_human(output: &ToolOutput) {
    match output {
        ToolOutput::Estimate(estimate) => {
            print_header("Staffing Estimate");
            println!(
                "  {} \u{00b7} {} shift \u{00b7} recommended staff: {}",
                estimate.branch, estimate.shift_name, estimate.recommended_staff,
            );
            println!(
                "  required labor: {:.2}h per shift-day \u{00b7} demand {:.2} \u{00b7} productivity {:.2}/h",
                estimate.required_labor_hours, estimate.demand_used, estimate.productivity_used,
            );
            let evidence = &estimate.evidence;
            println!(
                "  shift share {:.4} ({:?}) \u{00b7} {} days in period \u{00b7} demand via {:?}",
                evidence.shift_share_used,
                evidence.shift_share_source,
                evidence.days_in_period_used,
                evidence.demand_source,
            );
            if !evidence.fallback_notes.is_empty() {
                println!();
                for note in &evidence.fallback_notes {
                    println!("  note: {}", note);
                }
            }
            println!();
            for assumption in &estimate.assumptions {
                println!("  - {}", assumption);
            }
            println!();
        }
        ToolOutput::Benchmark(report) => {
            print_header("Staffing Pressure Ranking");
            println!(
                "  shift {} \u{00b7} {} branches evaluated \u{00b7} top {} shown \u{00b7} {} on global fallback",
                report.shift_name,
                report.branches_evaluated,
                report.rankings.len(),
                report.global_productivity_fallbacks,
            );
            println!();
            for (rank, standing) in report.rankings.iter().enumerate() {
                let gap = standing.headcount_gap.unwrap_or(0.0);
                let marker = if gap >= 2.0 {
                    "!!"
                } else if gap >= 1.0 {
                    "! "
                } else {
                    "  "
                };
                println!(
                    "  {} {}. {:16} staff {:>2}  history {:>5.2}  gap {:>6.2}  demand {:>12.2}",
                    marker,
                    rank + 1,
                    standing.branch,
                    standing.recommended_staff,
                    standing.historical_headcount.unwrap_or(0.0),
                    gap,
                    standing.demand_used,
                );
            }
            println!();
        }
        ToolOutput::ShiftLengths(summary) => {
            print_header("Shift Length Summary");
            println!(
                "  {} punches \u{00b7} {} employees \u{00b7} avg {:.2}h \u{00b7} median {:.2}h \u{00b7} p90 {:.2}h",
                summary.shift_count,
                summary.unique_employees,
                summary.average_hours,
                summary.median_hours,
                summary.p90_hours,
            );
            println!();
            for branch in &summary.per_branch {
                println!(
                    "  {:16} avg {:>5.2}h  median {:>5.2}h  p90 {:>5.2}h  ({} punches, {} employees)",
                    branch.branch,
                    branch.average_hours,
                    branch.median_hours,
                    branch.p90_hours,
                    branch.shift_count,
                    branch.unique_employees,
                );
            }
            println!();
        }
        ToolOutput::Forecast(forecast) => {
            print_header("Demand Forecast");
            println!(
                "  {} \u{00b7} latest observed {} at {:.2}",
                forecast.branch, forecast.latest_period_used, forecast.latest_sales,
            );
            println!();
            for point in &forecast.projections {
                println!("  {}  {:>12.2}", point.period, point.projected_sales);
            }
            println!();
        }
        ToolOutput::Activity(events) => {
            print_header("Tool Activity");
            for event in events {
                println!(
                    "  #{:<4} {}  {:24} {}  {}",
                    event.event_id,
                    if event.success { "ok " } else { "ERR" },
                    event.tool_name,
                    event.request_id,
                    event.detail,
                );
            }
            println!();
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        usage();
    }
    let attendance_path = &args[1];
    let sales_path = &args[2];
    let tool = args[3].as_str();
    let flags = parse_flags(&args[4..]);
    let operation = build_operation(tool, &flags);

    let gateway = Gateway::from_paths(
        attendance_path,
        sales_path,
        Arc::new(BoundedActivityLog::default()),
    );
    let request = ToolRequest {
        operation,
        request_id: format!("cli-{}", process::id()),
        context: None,
    };

    match gateway.execute(&request).await {
        Ok(response) => {
            if flags.json {
                match serde_json::to_string_pretty(&response) {
                    Ok(body) => println!("{}", body),
                    Err(err) => {
                        eprintln!("Error serializing response: {}", err);
                        process::exit(1);
                    }
                }
            } else {
                print_human(&response.result);
                log::info!("{} completed in {}ms", response.tool, response.elapsed_ms);
            }
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}
