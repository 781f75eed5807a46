//! Main miner API
//!
//! This module provides the primary interface for the library. A [`Miner`] holds
//! the configuration, the event sink and the caller's cancellation signals, and
//! runs the stages in order, checking for cancellation between them.

use crate::cancel::{CancelToken, StageGuard};
use crate::cases::aggregate_cases;
use crate::config::{GraphParams, MinerConfig};
use crate::enrich::{enrich_events, EnrichedLog};
use crate::graph::synthesize_graph;
use crate::locator::locate_case;
use crate::nodes::extract_nodes;
use crate::observe::{EventSink, LogSink, StageEvent};
use crate::schema::{ingest_table, RawTable, SchemaMapping};
use crate::stats::{edge_statistics, global_statistics, EdgeStatistics, GlobalStatistics};
use crate::timing::aggregate_timings;
use crate::types::{CaseLookup, Edge, Event, MinerError, NodePosition, Result, VariantStats};
use crate::variants::{aggregate_variants, pareto_subset, rank_by_coverage};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Counters collected while mining
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineMetrics {
    pub input_events: usize,
    pub enriched_events: usize,
    pub cases: usize,
    pub variants: usize,
    pub discarded_sequences: usize,
    pub edges: usize,
}

/// Condensed behavioural model of one event log
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessModel {
    /// Every variant, ranked by frequency
    pub variants: Vec<VariantStats>,
    /// Length of the Pareto prefix of `variants`
    pub pareto_len: usize,
    pub start_activities: Vec<String>,
    pub end_activities: Vec<String>,
    /// Edges synthesized from the Pareto subset
    pub edges: Vec<Edge>,
    pub target_coverage: f64,
    pub metrics: PipelineMetrics,
}

impl ProcessModel {
    /// Model of a log without any multi-activity case
    pub fn empty(target_coverage: f64, metrics: PipelineMetrics) -> Self {
        Self {
            target_coverage,
            metrics,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The Pareto subset, a prefix of `variants`
    pub fn pareto(&self) -> &[VariantStats] {
        &self.variants[..self.pareto_len]
    }
}

/// The main miner struct - entry point for all mining operations
pub struct Miner {
    config: MinerConfig,
    sink: Arc<dyn EventSink>,
    guard: StageGuard,
    cancel: Option<CancelToken>,
    deadline: Option<Instant>,
}

impl Miner {
    /// Create a miner that reports through the `log` facade
    pub fn new(config: MinerConfig) -> Self {
        Self {
            config,
            sink: Arc::new(LogSink),
            guard: StageGuard::default(),
            cancel: None,
            deadline: None,
        }
    }

    /// Builder method: report stage events to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builder method: stop between stages once `token` is cancelled
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self.guard = StageGuard::new(self.cancel.clone(), self.deadline);
        self
    }

    /// Builder method: stop between stages once `deadline` has passed
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self.guard = StageGuard::new(self.cancel.clone(), self.deadline);
        self
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    fn validate(&self) -> Result<()> {
        let check = |name: &str, value: f64| {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(MinerError::InvalidConfig(format!(
                    "{} must lie in [0, 1], got {}",
                    name, value
                )))
            }
        };
        check("target_coverage", self.config.target_coverage)?;
        check("node_coverage", self.config.node_coverage)
    }

    /// Enrich raw events with ranks and elapsed times
    pub fn enrich(&self, events: &[Event]) -> Result<EnrichedLog> {
        self.guard.check("enrich")?;
        Ok(enrich_events(
            events,
            &self.config.date_range,
            self.config.parallel,
            self.sink.as_ref(),
        ))
    }

    /// Run the full pipeline over raw events
    ///
    /// A log without any case of two or more activities yields an empty model,
    /// not an error.
    pub fn mine(&self, events: &[Event]) -> Result<ProcessModel> {
        self.validate()?;
        let sink = self.sink.as_ref();
        let parallel = self.config.parallel;
        log::debug!("Mining {} events", events.len());

        let log = self.enrich(events)?;
        let mut metrics = PipelineMetrics {
            input_events: events.len(),
            enriched_events: log.len(),
            ..PipelineMetrics::default()
        };

        self.guard.check("cases")?;
        let cases = aggregate_cases(&log, parallel, sink);
        metrics.cases = cases.len();

        self.guard.check("variants")?;
        let variants = aggregate_variants(&cases, parallel, sink);
        drop(cases);
        if variants.is_empty() {
            return Ok(ProcessModel::empty(self.config.target_coverage, metrics));
        }

        self.guard.check("coverage")?;
        let ranked = rank_by_coverage(variants);

        self.guard.check("timings")?;
        let timed = aggregate_timings(ranked, sink);
        metrics.variants = timed.variants.len();
        metrics.discarded_sequences = timed.discarded_sequences;

        let pareto = pareto_subset(&timed.variants, self.config.target_coverage);
        let pareto_len = pareto.len();
        let total_cases: usize = timed.variants.iter().map(|v| v.frequency).sum();
        sink.record(&StageEvent::CoverageComputed {
            variants: timed.variants.len(),
            total_cases,
            pareto_len,
        });

        self.guard.check("graph")?;
        let edges = synthesize_graph(pareto, &self.config.graph, self.config.locale, sink)?;
        metrics.edges = edges.len();

        self.guard.check("nodes")?;
        let coverage = self.config.node_coverage;
        let start_activities = extract_nodes(pareto, NodePosition::Start, coverage, sink);
        let end_activities = extract_nodes(pareto, NodePosition::End, coverage, sink);

        Ok(ProcessModel {
            variants: timed.variants,
            pareto_len,
            start_activities,
            end_activities,
            edges,
            target_coverage: self.config.target_coverage,
            metrics,
        })
    }

    /// Resolve `mapping` against `table`, ingest its rows and mine them
    pub fn mine_table(&self, table: &RawTable, mapping: &SchemaMapping) -> Result<ProcessModel> {
        let events = ingest_table(table, mapping)?;
        self.mine(&events)
    }

    /// Re-weight or re-filter the edges of an existing model
    pub fn rebuild_graph(&self, model: &ProcessModel, params: &GraphParams) -> Result<Vec<Edge>> {
        self.guard.check("graph")?;
        synthesize_graph(model.pareto(), params, self.config.locale, self.sink.as_ref())
    }

    /// Case duration and case length histograms
    pub fn global_statistics(&self, events: &[Event]) -> Result<GlobalStatistics> {
        let log = self.enrich(events)?;
        self.guard.check("statistics")?;
        Ok(global_statistics(&log, &self.config.histograms, self.sink.as_ref()))
    }

    /// Duration histogram of one `source -> target` transition
    pub fn edge_statistics(
        &self,
        events: &[Event],
        source: &str,
        target: &str,
    ) -> Result<EdgeStatistics> {
        let log = self.enrich(events)?;
        self.guard.check("statistics")?;
        Ok(edge_statistics(
            &log,
            source,
            target,
            &self.config.histograms,
            self.sink.as_ref(),
        ))
    }

    /// Look up one case, optionally ranking it against every case of the log
    pub fn locate_case(
        &self,
        events: &[Event],
        case_id: &str,
        include_global: bool,
    ) -> Result<CaseLookup> {
        let log = self.enrich(events)?;
        self.guard.check("locate")?;
        let global = include_global.then_some(&log);
        Ok(locate_case(&log, case_id, global, self.sink.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::MemorySink;
    use crate::types::Timestamp;
    use chrono::{Duration, TimeZone, Utc};

    fn t(seconds: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn test_empty_log_gives_empty_model() {
        let sink = Arc::new(MemorySink::new());
        let miner = Miner::new(MinerConfig::default()).with_sink(sink.clone());
        let model = miner.mine(&[]).unwrap();

        assert!(model.is_empty());
        assert!(model.pareto().is_empty());
        assert!(model.edges.is_empty());
        assert!(model.start_activities.is_empty());
        assert!(model.end_activities.is_empty());
        assert!(sink.events().contains(&StageEvent::EmptyDataset));
    }

    #[test]
    fn test_invalid_coverage_is_rejected() {
        let miner = Miner::new(MinerConfig::default().with_target_coverage(1.5));
        assert!(matches!(
            miner.mine(&[]),
            Err(MinerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let miner = Miner::new(MinerConfig::default()).with_cancel(token);
        let events = vec![Event::new("1", "a", t(0)), Event::new("1", "b", t(1))];
        assert!(matches!(miner.mine(&events), Err(MinerError::Cancelled)));
        assert!(matches!(
            miner.global_statistics(&events),
            Err(MinerError::Cancelled)
        ));
    }

    #[test]
    fn test_deadline_keeps_token() {
        let token = CancelToken::new();
        let miner = Miner::new(MinerConfig::default())
            .with_cancel(token.clone())
            .with_deadline(Instant::now() + std::time::Duration::from_secs(3600));
        token.cancel();
        assert!(matches!(miner.mine(&[]), Err(MinerError::Cancelled)));
    }

    #[test]
    fn test_rebuild_graph_reweights() {
        let events = vec![
            Event::new("1", "a", t(0)),
            Event::new("1", "b", t(7200)),
            Event::new("2", "a", t(0)),
            Event::new("2", "b", t(3600)),
        ];
        let miner = Miner::new(MinerConfig::default()).with_sink(Arc::new(MemorySink::new()));
        let model = miner.mine(&events).unwrap();
        assert_eq!(model.edges[0].weight_value, 2.0);

        let params = GraphParams::new().weighted_by_mean_time(crate::config::TimeUnit::Hours);
        let edges = miner.rebuild_graph(&model, &params).unwrap();
        assert_eq!(edges[0].weight_value, 1.5);
        assert_eq!(edges[0].edge_label, "1.5 h");
    }

    #[test]
    fn test_mine_table_rejects_short_schema() {
        let table = RawTable::new(vec!["case_id".into(), "activity".into()]);
        let miner = Miner::new(MinerConfig::default());
        assert!(matches!(
            miner.mine_table(&table, &SchemaMapping::Positional),
            Err(MinerError::Schema(_))
        ));
    }
}
