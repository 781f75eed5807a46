//! Directly-follows graph synthesis
//!
//! Every variant of length `L` contributes `L - 1` edge occurrences, each weighted
//! by the variant frequency. The duration of an occurrence is the difference of
//! the variant's average elapsed times at the two positions.

use crate::config::{GraphParams, Locale, WeightMetric};
use crate::observe::{EventSink, StageEvent};
use crate::types::{round2, Edge, MinerError, Result, VariantStats};
use std::collections::BTreeMap;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Format a duration in days for tooltips
///
/// Zero seconds gets the locale's zero label and a missing value formats as an
/// empty string.
pub fn format_days(seconds: Option<f64>, locale: Locale) -> String {
    match seconds {
        None => String::new(),
        Some(s) if s == 0.0 => locale.zero_label().to_string(),
        Some(s) if !s.is_finite() => String::new(),
        Some(s) => locale.day_tooltip(round2(s / SECONDS_PER_DAY)),
    }
}

/// Running totals for one `(source, target)` pair
#[derive(Debug, Default, Clone, Copy)]
struct EdgeAcc {
    case_count: usize,
    total_duration_seconds: f64,
}

/// Check that every variant has one average timing per activity
pub fn check_consistency(variants: &[VariantStats]) -> Result<()> {
    match variants.iter().find(|v| v.path.len() != v.avg_timings.len()) {
        Some(v) => Err(MinerError::GraphConsistency {
            path: v.path.clone(),
            path_len: v.path.len(),
            timings_len: v.avg_timings.len(),
        }),
        None => Ok(()),
    }
}

/// Build the weighted edge table for a variant subset
///
/// Edges come out ordered by `(source, target)`. Running this twice on the same
/// input yields identical tables.
pub fn synthesize_graph(
    variants: &[VariantStats],
    params: &GraphParams,
    locale: Locale,
    sink: &dyn EventSink,
) -> Result<Vec<Edge>> {
    check_consistency(variants)?;

    let mut acc: BTreeMap<(&str, &str), EdgeAcc> = BTreeMap::new();
    for variant in variants {
        let weight = variant.frequency;
        for (pair, times) in variant.path.windows(2).zip(variant.avg_timings.windows(2)) {
            let duration = times[1] - times[0];
            let entry = acc.entry((pair[0].as_str(), pair[1].as_str())).or_default();
            entry.case_count += weight;
            entry.total_duration_seconds += duration * weight as f64;
        }
    }

    let edges_before_filter = acc.len();
    let edges: Vec<Edge> = acc
        .into_iter()
        .map(|((source, target), e)| build_edge(source, target, e, params, locale))
        .filter(|edge| params.accepts(edge.case_count, edge.mean_duration_seconds))
        .collect();

    sink.record(&StageEvent::GraphSynthesized {
        variants: variants.len(),
        edges_before_filter,
        edges: edges.len(),
    });

    Ok(edges)
}

fn build_edge(
    source: &str,
    target: &str,
    acc: EdgeAcc,
    params: &GraphParams,
    locale: Locale,
) -> Edge {
    let mean_duration_seconds = acc.total_duration_seconds / acc.case_count as f64;

    let (weight_value, edge_label) = match params.weight_metric {
        WeightMetric::Cases => (acc.case_count as f64, acc.case_count.to_string()),
        WeightMetric::MeanTime => {
            let value = mean_duration_seconds / params.time_unit.divisor();
            let label = format!(
                "{} {}",
                locale.format_number(round2(value)),
                locale.unit_label(params.time_unit)
            );
            (value, label)
        }
    };

    Edge {
        source: source.to_string(),
        target: target.to_string(),
        case_count: acc.case_count,
        total_duration_seconds: acc.total_duration_seconds,
        mean_duration_seconds,
        weight_value,
        edge_label,
        tooltip_total: format_days(Some(acc.total_duration_seconds), locale),
        tooltip_mean: format_days(Some(mean_duration_seconds), locale),
    }
}
