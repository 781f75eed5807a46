//! Distribution statistics
//!
//! Histograms for case durations, case lengths and single-edge durations.
//! Binning follows the usual equal-width convention: every bin is half-open
//! except the last, which also includes its right edge.
//!
//! A failing histogram never aborts anything. [`calculate_histogram`] reports
//! the failure through the sink and returns an empty histogram.

use crate::config::HistogramConfig;
use crate::enrich::EnrichedLog;
use crate::observe::{EventSink, StageEvent};
use crate::types::{seconds_between, Histogram, MinerError, Result};
use serde::Serialize;

/// Case duration and case length distributions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalStatistics {
    pub total_time: Histogram,
    pub steps: Histogram,
}

/// Duration distribution of one directly-follows transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeStatistics {
    pub source: String,
    pub target: String,
    pub histogram: Histogram,
}

/// `bins + 1` evenly spaced edges from `lo` to `hi`
fn linspace(lo: f64, hi: f64, bins: usize) -> Vec<f64> {
    let step = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| lo + i as f64 * step).collect();
    edges.push(hi);
    edges
}

/// Equal-width edges over the data range, widened by half a unit if it is empty
fn range_edges(min: f64, max: f64, bins: usize) -> Vec<f64> {
    if min == max {
        linspace(min - 0.5, max + 0.5, bins)
    } else {
        linspace(min, max, bins)
    }
}

fn bin_edges(min: f64, max: f64, bins: usize, is_integer: bool) -> Vec<f64> {
    if is_integer {
        let min_v = min.trunc() as i64;
        let max_v = max.trunc() as i64;
        let span = max_v - min_v + 1;

        if span < bins as i64 {
            (min_v..=max_v + 1).map(|v| v as f64).collect()
        } else {
            let mut edges: Vec<f64> = range_edges(min, max, bins)
                .into_iter()
                .map(f64::round_ties_even)
                .collect();
            edges.dedup();
            edges
        }
    } else if min == max {
        if min == 0.0 {
            linspace(-1.0, 1.0, bins)
        } else {
            let (a, b) = (min * 0.9, min * 1.1);
            linspace(a.min(b), a.max(b), bins)
        }
    } else {
        linspace(min, max, bins)
    }
}

/// Count each value into the bins delimited by `edges`
fn count_into(values: &[f64], edges: &[f64]) -> Vec<u64> {
    let bins = edges.len() - 1;
    let (first, last) = (edges[0], edges[bins]);
    let mut counts = vec![0u64; bins];

    for &v in values {
        if v < first || v > last {
            continue;
        }
        let idx = if v == last {
            bins - 1
        } else {
            edges.partition_point(|e| *e <= v) - 1
        };
        counts[idx] += 1;
    }
    counts
}

/// Histogram of `values`, failing on unusable input
pub fn try_histogram(values: &[f64], bins: usize, is_integer: bool) -> Result<Histogram> {
    if values.is_empty() {
        return Ok(Histogram::empty());
    }
    if bins == 0 {
        return Err(MinerError::Compute("bin count must be positive".to_string()));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(MinerError::Compute(format!("non-finite sample {}", bad)));
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let edges = bin_edges(min, max, bins, is_integer);
    if edges.len() < 2 {
        return Err(MinerError::Compute(format!(
            "degenerate bin edges for range [{}, {}]",
            min, max
        )));
    }

    let counts = count_into(values, &edges);
    Ok(Histogram {
        bin_edges: edges,
        counts,
    })
}

/// Histogram of `values`; failures degrade to an empty histogram
pub fn calculate_histogram(
    values: &[f64],
    bins: usize,
    is_integer: bool,
    sink: &dyn EventSink,
) -> Histogram {
    match try_histogram(values, bins, is_integer) {
        Ok(histogram) => histogram,
        Err(e) => {
            sink.record(&StageEvent::HistogramDegraded {
                reason: e.to_string(),
            });
            Histogram::empty()
        }
    }
}

/// Duration and length histograms over every case with more than one event
pub fn global_statistics(
    log: &EnrichedLog,
    config: &HistogramConfig,
    sink: &dyn EventSink,
) -> GlobalStatistics {
    let mut durations = Vec::new();
    let mut lengths = Vec::new();

    for case in log.case_slices() {
        if case.len() < 2 {
            continue;
        }
        let first = case[0].timestamp;
        let last = case[case.len() - 1].timestamp;
        durations.push(seconds_between(first, last));
        lengths.push(case.len() as f64);
    }

    GlobalStatistics {
        total_time: calculate_histogram(&durations, config.duration_bins, false, sink),
        steps: calculate_histogram(&lengths, config.length_bins, true, sink),
    }
}

/// Per-case mean durations of every `source -> target` transition
pub fn edge_durations(log: &EnrichedLog, source: &str, target: &str) -> Vec<f64> {
    log.case_slices()
        .into_iter()
        .filter_map(|case| {
            let durations: Vec<f64> = case
                .windows(2)
                .filter(|pair| pair[0].activity == source && pair[1].activity == target)
                .map(|pair| seconds_between(pair[0].timestamp, pair[1].timestamp))
                .collect();
            (!durations.is_empty()).then(|| durations.iter().sum::<f64>() / durations.len() as f64)
        })
        .collect()
}

/// Duration distribution of a single edge
pub fn edge_statistics(
    log: &EnrichedLog,
    source: &str,
    target: &str,
    config: &HistogramConfig,
    sink: &dyn EventSink,
) -> EdgeStatistics {
    let durations = edge_durations(log, source, target);
    EdgeStatistics {
        source: source.to_string(),
        target: target.to_string(),
        histogram: calculate_histogram(&durations, config.edge_bins, false, sink),
    }
}
