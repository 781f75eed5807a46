//! Dominant start and end activities

use crate::observe::{EventSink, StageEvent};
use crate::types::{NodePosition, VariantStats};
use std::collections::HashMap;

/// Select the activities that cover `coverage` of the true start (or end) counts
///
/// Nodes are taken in descending count order while the coverage accumulated
/// before them is still below the threshold, so the node that crosses it is
/// kept. Equal counts are ordered by activity name.
pub fn extract_nodes(
    variants: &[VariantStats],
    position: NodePosition,
    coverage: f64,
    sink: &dyn EventSink,
) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for variant in variants {
        let count = match position {
            NodePosition::Start => variant.true_start_count,
            NodePosition::End => variant.true_end_count,
        };
        if count == 0 {
            continue;
        }
        let node = match position {
            NodePosition::Start => variant.path.first(),
            NodePosition::End => variant.path.last(),
        };
        if let Some(node) = node {
            *counts.entry(node.as_str()).or_default() += count;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total: usize = ranked.iter().map(|(_, c)| c).sum();
    let mut selected: Vec<String> = Vec::new();
    if total > 0 {
        let mut running = 0usize;
        for (node, count) in &ranked {
            if !selected.is_empty() && (running as f64 / total as f64) >= coverage {
                break;
            }
            running += count;
            selected.push(node.to_string());
        }
    }

    sink.record(&StageEvent::NodesSelected {
        position,
        candidates: ranked.len(),
        selected: selected.len(),
    });
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::MemorySink;

    fn stats(path: &[&str], starts: usize, ends: usize) -> VariantStats {
        VariantStats {
            path: path.iter().map(|s| s.to_string()).collect(),
            frequency: starts.max(ends),
            percentage: 0.0,
            cumulative_coverage: 0.0,
            true_start_count: starts,
            true_end_count: ends,
            avg_timings: vec![0.0; path.len()],
            total_timings: vec![0.0; path.len()],
        }
    }

    #[test]
    fn test_crossing_node_is_included() {
        let variants = vec![
            stats(&["a", "x"], 90, 0),
            stats(&["b", "x"], 8, 0),
            stats(&["c", "x"], 2, 0),
        ];
        let nodes = extract_nodes(&variants, NodePosition::Start, 0.95, &MemorySink::new());
        assert_eq!(nodes, vec!["a", "b"]);
    }

    #[test]
    fn test_counts_are_summed_per_node() {
        let variants = vec![
            stats(&["s", "a", "end1"], 0, 3),
            stats(&["s", "b", "end2"], 0, 2),
            stats(&["s", "c", "end2"], 0, 2),
        ];
        let nodes = extract_nodes(&variants, NodePosition::End, 0.5, &MemorySink::new());
        assert_eq!(nodes, vec!["end2"]);
    }

    #[test]
    fn test_zero_counts_yield_nothing() {
        let variants = vec![stats(&["a", "b"], 0, 0)];
        assert!(extract_nodes(&variants, NodePosition::Start, 0.95, &MemorySink::new()).is_empty());
        assert!(extract_nodes(&[], NodePosition::End, 0.95, &MemorySink::new()).is_empty());
    }

    #[test]
    fn test_at_least_one_node_when_counts_exist() {
        let variants = vec![stats(&["a", "b"], 1, 1)];
        let nodes = extract_nodes(&variants, NodePosition::End, 0.0001, &MemorySink::new());
        assert_eq!(nodes, vec!["b"]);

        let nodes = extract_nodes(&variants, NodePosition::Start, 0.0, &MemorySink::new());
        assert_eq!(nodes, vec!["a"]);
    }
}
