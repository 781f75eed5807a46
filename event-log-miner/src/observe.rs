//! Per-stage observability events
//!
//! Stages never log directly. They report what they did through an [`EventSink`]
//! owned by the caller, so two concurrent runs never share logging state.

use crate::types::NodePosition;
use std::sync::Mutex;

/// Something a pipeline stage wants to report
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    Enriched {
        input_rows: usize,
        null_timestamps: usize,
        out_of_range: usize,
        output_rows: usize,
        cases: usize,
    },
    CasesAggregated {
        cases: usize,
    },
    VariantsAggregated {
        distinct: usize,
        single_activity_dropped: usize,
        retained: usize,
    },
    EmptyDataset,
    CoverageComputed {
        variants: usize,
        total_cases: usize,
        pareto_len: usize,
    },
    /// Per-case timing sequences whose length differed from the modal length
    RaggedTimings {
        path: Vec<String>,
        modal_length: usize,
        discarded: usize,
        retained: usize,
    },
    TimingsAggregated {
        variants: usize,
        discarded_sequences: usize,
    },
    GraphSynthesized {
        variants: usize,
        edges_before_filter: usize,
        edges: usize,
    },
    NodesSelected {
        position: NodePosition,
        candidates: usize,
        selected: usize,
    },
    HistogramDegraded {
        reason: String,
    },
    CaseLocated {
        case_id: String,
        events: usize,
    },
    CaseNotFound {
        case_id: String,
    },
}

impl StageEvent {
    /// True for data-integrity warnings and degraded computations
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            StageEvent::RaggedTimings { .. }
                | StageEvent::HistogramDegraded { .. }
                | StageEvent::EmptyDataset
        )
    }
}

/// Receiver of stage events
pub trait EventSink: Send + Sync {
    fn record(&self, event: &StageEvent);
}

/// Forwards every event to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &StageEvent) {
        match event {
            StageEvent::Enriched {
                input_rows,
                null_timestamps,
                out_of_range,
                output_rows,
                cases,
            } => log::info!(
                "Enriched {} of {} events across {} cases ({} null timestamps, {} outside date range)",
                output_rows,
                input_rows,
                cases,
                null_timestamps,
                out_of_range
            ),
            StageEvent::CasesAggregated { cases } => {
                log::info!("Aggregated {} cases", cases)
            }
            StageEvent::VariantsAggregated {
                distinct,
                single_activity_dropped,
                retained,
            } => log::info!(
                "Found {} distinct variants, kept {} ({} single-activity variants dropped)",
                distinct,
                retained,
                single_activity_dropped
            ),
            StageEvent::EmptyDataset => {
                log::warn!("No variant with more than one activity remains")
            }
            StageEvent::CoverageComputed {
                variants,
                total_cases,
                pareto_len,
            } => log::info!(
                "Coverage computed over {} cases: {} variants, {} in Pareto subset",
                total_cases,
                variants,
                pareto_len
            ),
            StageEvent::RaggedTimings {
                path,
                modal_length,
                discarded,
                retained,
            } => log::warn!(
                "Ragged timings for variant {:?}: kept {} sequences of length {}, discarded {}",
                path,
                retained,
                modal_length,
                discarded
            ),
            StageEvent::TimingsAggregated {
                variants,
                discarded_sequences,
            } => log::debug!(
                "Aggregated timings for {} variants ({} sequences discarded)",
                variants,
                discarded_sequences
            ),
            StageEvent::GraphSynthesized {
                variants,
                edges_before_filter,
                edges,
            } => log::info!(
                "Synthesized {} edges from {} variants ({} before filters)",
                edges,
                variants,
                edges_before_filter
            ),
            StageEvent::NodesSelected {
                position,
                candidates,
                selected,
            } => log::debug!(
                "Selected {} of {} {} activities",
                selected,
                candidates,
                position
            ),
            StageEvent::HistogramDegraded { reason } => {
                log::warn!("Histogram degraded to empty: {}", reason)
            }
            StageEvent::CaseLocated { case_id, events } => {
                log::debug!("Located case {} with {} events", case_id, events)
            }
            StageEvent::CaseNotFound { case_id } => log::info!("Case {} not found", case_id),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<StageEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    pub fn events(&self) -> Vec<StageEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn warnings(&self) -> Vec<StageEvent> {
        self.events().into_iter().filter(StageEvent::is_warning).collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &StageEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
