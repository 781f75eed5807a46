//! Timing aggregation
//!
//! Each variant carries one elapsed-time sequence per contributing case. They
//! should all have the variant's path length, but nothing upstream of the
//! miner guarantees it. Only sequences of the modal length take part in the
//! element-wise mean and sum; the others are dropped and reported.

use crate::observe::{EventSink, StageEvent};
use crate::types::{round2, VariantStats};
use crate::variants::RankedVariant;

/// Element-wise statistics over the sequences of the modal length
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingSummary {
    pub modal_length: usize,
    pub retained: usize,
    pub discarded: usize,
    pub avg_timings: Vec<f64>,
    pub total_timings: Vec<f64>,
}

/// Most frequent sequence length; ties go to the length seen first
pub fn modal_length(sequences: &[Vec<f64>]) -> Option<usize> {
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for seq in sequences {
        match counts.iter_mut().find(|(len, _)| *len == seq.len()) {
            Some((_, count)) => *count += 1,
            None => counts.push((seq.len(), 1)),
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (len, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((len, count));
        }
    }
    best.map(|(len, _)| len)
}

/// Mean and sum per position, each rounded to two decimals
pub fn summarize_timings(sequences: &[Vec<f64>]) -> TimingSummary {
    let Some(length) = modal_length(sequences) else {
        return TimingSummary::default();
    };

    let retained: Vec<&Vec<f64>> = sequences.iter().filter(|s| s.len() == length).collect();
    let mut sums = vec![0.0; length];
    for seq in &retained {
        for (sum, value) in sums.iter_mut().zip(seq.iter()) {
            *sum += value;
        }
    }

    let n = retained.len() as f64;
    TimingSummary {
        modal_length: length,
        retained: retained.len(),
        discarded: sequences.len() - retained.len(),
        avg_timings: sums.iter().map(|s| round2(s / n)).collect(),
        total_timings: sums.iter().map(|s| round2(*s)).collect(),
    }
}

/// Ranked variants with timings, plus the number of sequences dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimedVariants {
    pub variants: Vec<VariantStats>,
    pub discarded_sequences: usize,
}

/// Attach avg/total timings to every ranked variant, keeping the ranking order
pub fn aggregate_timings(ranked: Vec<RankedVariant>, sink: &dyn EventSink) -> TimedVariants {
    let mut discarded_sequences = 0;

    let variants: Vec<VariantStats> = ranked
        .into_iter()
        .map(|row| {
            let summary = summarize_timings(&row.variant.timings);
            if summary.discarded > 0 {
                discarded_sequences += summary.discarded;
                sink.record(&StageEvent::RaggedTimings {
                    path: row.variant.path.clone(),
                    modal_length: summary.modal_length,
                    discarded: summary.discarded,
                    retained: summary.retained,
                });
            }

            VariantStats {
                path: row.variant.path,
                frequency: row.variant.frequency,
                percentage: row.percentage,
                cumulative_coverage: row.cumulative_coverage,
                true_start_count: row.variant.true_start_count,
                true_end_count: row.variant.true_end_count,
                avg_timings: summary.avg_timings,
                total_timings: summary.total_timings,
            }
        })
        .collect();

    sink.record(&StageEvent::TimingsAggregated {
        variants: variants.len(),
        discarded_sequences,
    });

    TimedVariants {
        variants,
        discarded_sequences,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::MemorySink;
    use crate::types::Variant;

    #[test]
    fn test_mean_rounds_half_to_even() {
        let summary = summarize_timings(&[vec![0.0, 0.25], vec![0.0, 0.0]]);
        assert_eq!(summary.avg_timings, vec![0.0, 0.12]);
        assert_eq!(summary.total_timings, vec![0.0, 0.25]);
    }

    #[test]
    fn test_single_case_is_passed_through() {
        let summary = summarize_timings(&[vec![0.0, 12.5, 40.25]]);
        assert_eq!(summary.avg_timings, vec![0.0, 12.5, 40.25]);
        assert_eq!(summary.total_timings, vec![0.0, 12.5, 40.25]);
        assert_eq!(summary.discarded, 0);
    }

    #[test]
    fn test_mean_and_sum_are_rounded() {
        let summary = summarize_timings(&[vec![0.0, 1.0], vec![0.0, 2.0], vec![0.0, 2.0]]);
        assert_eq!(summary.avg_timings, vec![0.0, 1.67]);
        assert_eq!(summary.total_timings, vec![0.0, 5.0]);
    }

    #[test]
    fn test_ragged_sequences_use_modal_length() {
        let summary = summarize_timings(&[
            vec![0.0, 10.0, 20.0],
            vec![0.0, 5.0],
            vec![0.0, 30.0, 40.0],
            vec![0.0],
        ]);
        assert_eq!(summary.modal_length, 3);
        assert_eq!(summary.retained, 2);
        assert_eq!(summary.discarded, 2);
        assert_eq!(summary.avg_timings, vec![0.0, 20.0, 30.0]);
        assert_eq!(summary.total_timings, vec![0.0, 40.0, 60.0]);
    }

    #[test]
    fn test_modal_tie_goes_to_first_seen() {
        assert_eq!(modal_length(&[vec![1.0, 2.0], vec![1.0, 2.0, 3.0]]), Some(2));
        assert_eq!(modal_length(&[vec![1.0], vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0]]), Some(1));
        assert_eq!(modal_length(&[]), None);
    }

    #[test]
    fn test_no_sequences_yields_empty_timings() {
        let summary = summarize_timings(&[]);
        assert!(summary.avg_timings.is_empty());
        assert!(summary.total_timings.is_empty());
    }

    #[test]
    fn test_ragged_variant_is_reported() {
        let ranked = vec![RankedVariant {
            variant: Variant {
                path: vec!["a".into(), "b".into()],
                frequency: 3,
                timings: vec![vec![0.0, 4.0], vec![0.0, 6.0], vec![0.0, 1.0, 2.0]],
                true_start_count: 3,
                true_end_count: 3,
            },
            percentage: 100.0,
            cumulative_coverage: 1.0,
        }];
        let sink = MemorySink::new();
        let timed = aggregate_timings(ranked, &sink);

        assert_eq!(timed.discarded_sequences, 1);
        assert_eq!(timed.variants[0].avg_timings, vec![0.0, 5.0]);
        assert_eq!(timed.variants[0].total_timings, vec![0.0, 10.0]);
        assert_eq!(timed.variants[0].frequency, 3);
        assert_eq!(
            sink.warnings(),
            vec![StageEvent::RaggedTimings {
                path: vec!["a".into(), "b".into()],
                modal_length: 2,
                discarded: 1,
                retained: 2,
            }]
        );
    }
}
