//! Mine a synthetic order-handling log
//!
//! Builds a few hundred cases across four variants, mines them and prints the
//! Pareto variants, the edge table and where one case sits among the rest.
//!
//! Usage:
//!   cargo run --example mine_synthetic [target_coverage]
//!
//! Example:
//!   RUST_LOG=debug cargo run --example mine_synthetic 0.8

use chrono::{Duration, TimeZone, Utc};
use event_log_miner::{Event, GraphParams, Miner, MinerConfig, TimeUnit};
use std::env;

const VARIANTS: &[(&[&str], usize)] = &[
    (&["receive", "check", "pack", "ship"], 120),
    (&["receive", "check", "reject"], 40),
    (&["receive", "pack", "ship"], 25),
    (&["receive", "check", "check", "pack", "ship"], 15),
];

fn synthetic_log() -> Vec<Event> {
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    let mut events = Vec::new();
    let mut case_no = 0;

    for (path, count) in VARIANTS {
        for _ in 0..*count {
            case_no += 1;
            let case_id = format!("order-{:04}", case_no);
            let mut ts = t0 + Duration::minutes(case_no as i64 * 7);
            for (step, activity) in path.iter().enumerate() {
                events.push(Event::new(case_id.as_str(), *activity, ts));
                ts += Duration::minutes(30 + ((case_no * 13 + step * 17) % 240) as i64);
            }
        }
    }
    events
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let target = env::args()
        .nth(1)
        .map(|arg| arg.parse::<f64>())
        .transpose()?
        .unwrap_or(0.95);

    let events = synthetic_log();
    let miner = Miner::new(MinerConfig::new().with_target_coverage(target));
    let model = miner.mine(&events)?;

    println!("=== VARIANTS (target coverage {:.0}%) ===", target * 100.0);
    for v in model.pareto() {
        println!(
            "{:>4} cases  {:>6.2}%  cum {:.3}  {}",
            v.frequency,
            v.percentage,
            v.cumulative_coverage,
            v.path.join(" > ")
        );
    }

    println!("\n=== EDGES BY CASES ===");
    for e in &model.edges {
        println!("{:<8} -> {:<8} {:>5}  mean {}", e.source, e.target, e.edge_label, e.tooltip_mean);
    }

    println!("\n=== EDGES BY MEAN TIME ===");
    let hourly = GraphParams::new().weighted_by_mean_time(TimeUnit::Hours);
    let by_time = miner.rebuild_graph(&model, &hourly)?;
    for e in &by_time {
        println!("{:<8} -> {:<8} {}", e.source, e.target, e.edge_label);
    }

    println!("\nStart: {}", model.start_activities.join(", "));
    println!("End:   {}", model.end_activities.join(", "));

    if let Some(case) = miner.locate_case(&events, "order-0150", true)?.found() {
        println!(
            "\norder-0150: {} in {:.0}s, percentile {:?}",
            case.activities.join(" > "),
            case.total_duration,
            case.percentile
        );
    }

    Ok(())
}
