//! Case aggregation
//!
//! Folds each case's ranked events into its activity path and the aligned
//! elapsed-time sequence.

use crate::enrich::EnrichedLog;
use crate::observe::{EventSink, StageEvent};
use crate::types::{Case, EnrichedEvent};
use rayon::prelude::*;

/// Fold one case's events (already in rank order) into a [`Case`]
pub fn fold_case(events: &[EnrichedEvent]) -> Option<Case> {
    let first = events.first()?;
    let last = events.last()?;

    Some(Case {
        case_id: first.case_id.clone(),
        path: events.iter().map(|e| e.activity.clone()).collect(),
        elapsed: events.iter().map(|e| e.elapsed_seconds).collect(),
        is_true_start: first.rank == 1,
        is_true_end: last.rank == last.max_rank,
    })
}

/// Aggregate every case of the log, in case id order
pub fn aggregate_cases(log: &EnrichedLog, parallel: bool, sink: &dyn EventSink) -> Vec<Case> {
    let slices = log.case_slices();

    let cases: Vec<Case> = if parallel {
        slices.par_iter().filter_map(|s| fold_case(s)).collect()
    } else {
        slices.iter().filter_map(|s| fold_case(s)).collect()
    };

    sink.record(&StageEvent::CasesAggregated { cases: cases.len() });
    cases
}
