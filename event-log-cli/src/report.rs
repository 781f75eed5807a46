//! Report generation
//!
//! Renders mining results as JSON or as a plain-text report.

use crate::config::OutputFormat;
use anyhow::Result;
use event_log_miner::records::{edge_records, variant_records};
use event_log_miner::{CaseLookup, EdgeStatistics, GlobalStatistics, Histogram, ProcessModel};
use serde_json::json;
use std::fmt::Write;

/// One result produced by a CLI command
#[derive(Debug)]
pub enum Report {
    Model(ProcessModel),
    Statistics(GlobalStatistics),
    Edge(EdgeStatistics),
    Case(CaseLookup),
}

/// Render a report in the requested format
pub fn render(report: &Report, format: OutputFormat, legacy_columns: bool) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(report, legacy_columns),
        OutputFormat::Txt => Ok(render_txt(report)),
    }
}

fn render_json(report: &Report, legacy_columns: bool) -> Result<String> {
    let value = match report {
        Report::Model(model) if legacy_columns => json!({
            "variants": variant_records(&model.variants),
            "pareto_len": model.pareto_len,
            "start_activities": model.start_activities,
            "end_activities": model.end_activities,
            "edges": edge_records(&model.edges),
            "metrics": model.metrics,
        }),
        Report::Model(model) => serde_json::to_value(model)?,
        Report::Statistics(stats) => serde_json::to_value(stats)?,
        Report::Edge(stats) => serde_json::to_value(stats)?,
        Report::Case(lookup) => serde_json::to_value(lookup)?,
    };
    Ok(serde_json::to_string_pretty(&value)?)
}

fn render_txt(report: &Report) -> String {
    let mut out = String::new();
    // Writing into a String never fails
    let _ = match report {
        Report::Model(model) => write_model(&mut out, model),
        Report::Statistics(stats) => {
            write_histogram(&mut out, "Case duration (seconds)", &stats.total_time)
                .and_then(|_| write_histogram(&mut out, "Case length (events)", &stats.steps))
        }
        Report::Edge(stats) => write_histogram(
            &mut out,
            &format!("Transition {} -> {} (seconds)", stats.source, stats.target),
            &stats.histogram,
        ),
        Report::Case(lookup) => write_case(&mut out, lookup),
    };
    out
}

fn section(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", "=".repeat(title.chars().count()))
}

fn write_model(out: &mut String, model: &ProcessModel) -> std::fmt::Result {
    section(out, "Process Model")?;
    if model.is_empty() {
        writeln!(out, "No case with more than one activity.")?;
        return Ok(());
    }

    let m = &model.metrics;
    writeln!(out, "Events:   {} read, {} retained", m.input_events, m.enriched_events)?;
    writeln!(out, "Cases:    {}", m.cases)?;
    writeln!(
        out,
        "Variants: {} ({} covering {:.0}%)",
        m.variants,
        model.pareto_len,
        model.target_coverage * 100.0
    )?;
    if m.discarded_sequences > 0 {
        writeln!(out, "Discarded timing sequences: {}", m.discarded_sequences)?;
    }
    writeln!(out)?;

    section(out, "Variants")?;
    writeln!(out, "{:>4}  {:>6}  {:>7}  {:>6}  Path", "#", "Cases", "Share", "Cum")?;
    for (i, v) in model.pareto().iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {:>6}  {:>6.2}%  {:>6.3}  {}",
            i + 1,
            v.frequency,
            v.percentage,
            v.cumulative_coverage,
            v.path.join(" > ")
        )?;
    }
    writeln!(out)?;

    section(out, "Edges")?;
    for e in &model.edges {
        writeln!(
            out,
            "{} -> {}  [{}]  cases={}  mean={}",
            e.source, e.target, e.edge_label, e.case_count, e.tooltip_mean
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Start activities: {}", model.start_activities.join(", "))?;
    writeln!(out, "End activities:   {}", model.end_activities.join(", "))
}

fn write_histogram(out: &mut String, title: &str, histogram: &Histogram) -> std::fmt::Result {
    section(out, title)?;
    if histogram.is_empty() {
        writeln!(out, "(no data)")?;
        return writeln!(out);
    }

    let peak = histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    for (count, edges) in histogram.counts.iter().zip(histogram.bin_edges.windows(2)) {
        let bar = "#".repeat((*count * 40 / peak) as usize);
        writeln!(
            out,
            "[{:>12.2}, {:>12.2})  {:>6}  {}",
            edges[0], edges[1], count, bar
        )?;
    }
    writeln!(out)
}

fn write_case(out: &mut String, lookup: &CaseLookup) -> std::fmt::Result {
    match lookup {
        CaseLookup::NotFound { case_id } => writeln!(out, "Case {} not found", case_id),
        CaseLookup::Found(case) => {
            section(out, &format!("Case {}", case.case_id))?;
            writeln!(out, "Activities: {}", case.activities.join(" > "))?;
            writeln!(out, "Total duration: {:.2} s", case.total_duration)?;
            for (pair, duration) in case.activities.windows(2).zip(&case.edge_durations) {
                writeln!(out, "  {} -> {}: {:.2} s", pair[0], pair[1], duration)?;
            }
            if let Some(p) = case.percentile {
                writeln!(out, "Duration percentile: {:.2}", p)?;
            }
            if let Some(slower) = case.is_slower_than_average {
                writeln!(
                    out,
                    "Slower than average: {}",
                    if slower { "yes" } else { "no" }
                )?;
            }
            Ok(())
        }
    }
}
