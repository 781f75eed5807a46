//! Variant aggregation and coverage ranking
//!
//! Cases sharing an identical activity path collapse into one [`Variant`].
//! Variants are then ranked by frequency and annotated with their share of
//! cases, from which the Pareto subset is cut.
//!
//! Equal frequencies are ordered by ascending path (lexicographic over the
//! activity names), so the ranking never depends on hashing or thread timing.

use crate::observe::{EventSink, StageEvent};
use crate::types::{Case, Variant, VariantStats};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Per-path accumulator; timings carry the case index to restore case order
#[derive(Debug, Default)]
struct VariantAcc {
    frequency: usize,
    timings: Vec<(usize, Vec<f64>)>,
    true_start_count: usize,
    true_end_count: usize,
}

impl VariantAcc {
    fn add(&mut self, index: usize, case: &Case) {
        self.frequency += 1;
        self.timings.push((index, case.elapsed.clone()));
        self.true_start_count += usize::from(case.is_true_start);
        self.true_end_count += usize::from(case.is_true_end);
    }

    fn merge(&mut self, other: VariantAcc) {
        self.frequency += other.frequency;
        self.timings.extend(other.timings);
        self.true_start_count += other.true_start_count;
        self.true_end_count += other.true_end_count;
    }

    fn into_variant(mut self, path: Vec<String>) -> Variant {
        self.timings.sort_by_key(|(index, _)| *index);
        Variant {
            path,
            frequency: self.frequency,
            timings: self.timings.into_iter().map(|(_, t)| t).collect(),
            true_start_count: self.true_start_count,
            true_end_count: self.true_end_count,
        }
    }
}

type Groups = HashMap<Vec<String>, VariantAcc>;

fn merge_groups(mut left: Groups, right: Groups) -> Groups {
    for (path, acc) in right {
        left.entry(path).or_default().merge(acc);
    }
    left
}

/// Group cases by exact path; variants with a single activity are dropped
///
/// The result is ordered by path. An empty result means no case had more
/// than one activity.
pub fn aggregate_variants(cases: &[Case], parallel: bool, sink: &dyn EventSink) -> Vec<Variant> {
    let groups: Groups = if parallel {
        cases
            .par_iter()
            .enumerate()
            .fold(Groups::new, |mut groups, (index, case)| {
                groups.entry(case.path.clone()).or_default().add(index, case);
                groups
            })
            .reduce(Groups::new, merge_groups)
    } else {
        let mut groups = Groups::new();
        for (index, case) in cases.iter().enumerate() {
            groups.entry(case.path.clone()).or_default().add(index, case);
        }
        groups
    };

    let distinct = groups.len();
    let mut variants: Vec<Variant> = groups
        .into_iter()
        .filter(|(path, _)| path.len() > 1)
        .map(|(path, acc)| acc.into_variant(path))
        .collect();
    variants.sort_unstable_by(|a, b| a.path.cmp(&b.path));

    sink.record(&StageEvent::VariantsAggregated {
        distinct,
        single_activity_dropped: distinct - variants.len(),
        retained: variants.len(),
    });
    if variants.is_empty() {
        sink.record(&StageEvent::EmptyDataset);
    }

    variants
}

/// A variant with its coverage figures, before timing aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct RankedVariant {
    pub variant: Variant,
    pub percentage: f64,
    pub cumulative_coverage: f64,
}

/// Frequency-descending order with the path as tie-break
fn coverage_order(a: &Variant, b: &Variant) -> Ordering {
    b.frequency
        .cmp(&a.frequency)
        .then_with(|| a.path.cmp(&b.path))
}

/// Sort variants by frequency and compute percentage and cumulative coverage
pub fn rank_by_coverage(mut variants: Vec<Variant>) -> Vec<RankedVariant> {
    variants.sort_by(coverage_order);
    let total: usize = variants.iter().map(|v| v.frequency).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut running = 0.0;
    variants
        .into_iter()
        .map(|variant| {
            let percentage = variant.frequency as f64 / total as f64 * 100.0;
            running += percentage;
            RankedVariant {
                variant,
                percentage,
                cumulative_coverage: running / 100.0,
            }
        })
        .collect()
}

/// Length of the Pareto prefix for a cumulative-coverage sequence
///
/// The first row reaching `target` fixes the cutoff; every row whose coverage
/// does not exceed that cutoff is kept. When no row reaches the target the
/// whole sequence is kept.
pub fn pareto_len<I>(cumulative: I, target: f64) -> usize
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: Clone,
{
    let iter = cumulative.into_iter();
    match iter.clone().find(|c| *c >= target) {
        Some(limit) => iter.take_while(|c| *c <= limit).count(),
        None => iter.count(),
    }
}

/// Pareto prefix of a ranked variant table
pub fn pareto_subset(variants: &[VariantStats], target: f64) -> &[VariantStats] {
    let len = pareto_len(variants.iter().map(|v| v.cumulative_coverage), target);
    &variants[..len]
}
