// End-to-end checks of the mining pipeline through the public API
use chrono::{Duration, TimeZone, Utc};
use event_log_miner::{
    CancelToken, CaseLookup, DateRange, Event, EventSink, GraphParams, MemorySink, Miner,
    MinerConfig, MinerError, RawTable, SchemaMapping, StageEvent, Timestamp,
};
use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

fn t(seconds: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap() + Duration::seconds(seconds)
}

fn case(id: &str, steps: &[(&str, i64)]) -> Vec<Event> {
    steps
        .iter()
        .map(|(activity, offset)| Event::new(id, *activity, t(*offset)))
        .collect()
}

/// Three cases x,y,z at 0/10/20 and one case x,y at 0/5
fn two_variant_log() -> Vec<Event> {
    let mut events = Vec::new();
    for id in ["c1", "c2", "c3"] {
        events.extend(case(id, &[("x", 0), ("y", 10), ("z", 20)]));
    }
    events.extend(case("c4", &[("x", 0), ("y", 5)]));
    events
}

fn quiet_miner(config: MinerConfig) -> (Miner, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (Miner::new(config).with_sink(sink.clone()), sink)
}

#[test]
fn test_two_variant_scenario() {
    let (miner, _) = quiet_miner(MinerConfig::default());
    let model = miner.mine(&two_variant_log()).unwrap();

    assert_eq!(model.variants.len(), 2);
    assert_eq!(model.variants[0].path, vec!["x", "y", "z"]);
    assert_eq!(model.variants[0].frequency, 3);
    assert_eq!(model.variants[0].percentage, 75.0);
    assert_eq!(model.variants[1].percentage, 25.0);
    assert_eq!(model.variants[0].cumulative_coverage, 0.75);
    assert_eq!(model.variants[1].cumulative_coverage, 1.0);
    assert_eq!(model.pareto().len(), 2);

    let xy = &model.edges[0];
    assert_eq!((xy.source.as_str(), xy.target.as_str()), ("x", "y"));
    assert_eq!(xy.case_count, 4);
    assert_eq!(xy.total_duration_seconds, 35.0);
    assert_eq!(xy.mean_duration_seconds, 8.75);
    assert_eq!(xy.edge_label, "4");

    let yz = &model.edges[1];
    assert_eq!((yz.source.as_str(), yz.target.as_str()), ("y", "z"));
    assert_eq!(yz.case_count, 3);
    assert_eq!(yz.total_duration_seconds, 30.0);
    assert_eq!(yz.mean_duration_seconds, 10.0);

    assert_eq!(model.start_activities, vec!["x"]);
    // z ends 3 of 4 cases; below 0.95 so y is taken too
    assert_eq!(model.end_activities, vec!["z", "y"]);
}

#[test]
fn test_variant_invariants() {
    let mut events = two_variant_log();
    events.extend(case("c5", &[("y", 0), ("x", 30)]));
    events.extend(case("c6", &[("solo", 0)]));
    events.extend(case("c7", &[("x", 0), ("y", 7)]));

    let (miner, _) = quiet_miner(MinerConfig::default());
    let model = miner.mine(&events).unwrap();

    for v in &model.variants {
        assert_eq!(v.path.len(), v.avg_timings.len());
        assert_eq!(v.path.len(), v.total_timings.len());
    }

    // c6 has a single activity and is not counted
    let total: usize = model.variants.iter().map(|v| v.frequency).sum();
    assert_eq!(total, 6);

    let freqs: Vec<usize> = model.variants.iter().map(|v| v.frequency).collect();
    assert!(freqs.windows(2).all(|w| w[0] >= w[1]));
    let cum: Vec<f64> = model.variants.iter().map(|v| v.cumulative_coverage).collect();
    assert!(cum.windows(2).all(|w| w[0] <= w[1]));
    assert!((cum.last().unwrap() - 1.0).abs() < 1e-6);
}

#[test]
fn test_pareto_subset_is_prefix() {
    let mut events = Vec::new();
    for i in 0..8 {
        events.extend(case(&format!("a{}", i), &[("a", 0), ("b", 60)]));
    }
    events.extend(case("c0", &[("a", 0), ("c", 60)]));
    events.extend(case("d0", &[("a", 0), ("d", 60)]));

    let (miner, _) = quiet_miner(MinerConfig::default().with_target_coverage(0.8));
    let model = miner.mine(&events).unwrap();

    assert_eq!(model.pareto_len, 1);
    assert_eq!(model.pareto(), &model.variants[..1]);
    assert_eq!(model.edges.len(), 1);
    assert_eq!(model.edges[0].target, "b");
}

#[test]
fn test_single_case_variant_keeps_raw_timings() {
    let events = case("only", &[("a", 0), ("b", 12), ("c", 40)]);
    let (miner, _) = quiet_miner(MinerConfig::default());
    let model = miner.mine(&events).unwrap();

    assert_eq!(model.variants[0].avg_timings, vec![0.0, 12.0, 40.0]);
    assert_eq!(model.variants[0].total_timings, vec![0.0, 12.0, 40.0]);
}

#[test]
fn test_graph_is_idempotent() {
    let (miner, _) = quiet_miner(MinerConfig::default());
    let model = miner.mine(&two_variant_log()).unwrap();
    let params = GraphParams::new().with_case_bounds(Some(1), None);

    let first = miner.rebuild_graph(&model, &params).unwrap();
    let second = miner.rebuild_graph(&model, &params).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parallel_matches_sequential() {
    let mut events = two_variant_log();
    for i in 0..50 {
        let offset = (i % 7) * 11;
        events.extend(case(
            &format!("p{:02}", i),
            &[("x", 0), ("w", 3 + offset), ("z", 90 + offset)],
        ));
    }

    let (parallel, _) = quiet_miner(MinerConfig::default().with_parallel(true));
    let (sequential, _) = quiet_miner(MinerConfig::default().with_parallel(false));
    assert_eq!(
        parallel.mine(&events).unwrap(),
        sequential.mine(&events).unwrap()
    );
}

#[test]
fn test_empty_input() {
    let (miner, sink) = quiet_miner(MinerConfig::default());
    let model = miner.mine(&[]).unwrap();

    assert!(model.variants.is_empty());
    assert!(model.edges.is_empty());
    assert!(model.start_activities.is_empty());
    assert!(model.end_activities.is_empty());
    assert!(sink.warnings().contains(&StageEvent::EmptyDataset));
}

#[test]
fn test_date_range_clears_true_start() {
    let events = case("c1", &[("a", 0), ("b", 100), ("c", 200)]);
    let range = DateRange::between(Some(t(50)), None);
    let (miner, _) = quiet_miner(MinerConfig::default().with_date_range(range));
    let model = miner.mine(&events).unwrap();

    let variant = &model.variants[0];
    assert_eq!(variant.path, vec!["b", "c"]);
    assert_eq!(variant.true_start_count, 0);
    assert_eq!(variant.true_end_count, 1);
    assert_eq!(variant.avg_timings, vec![0.0, 100.0]);
    assert!(model.start_activities.is_empty());
    assert_eq!(model.end_activities, vec!["c"]);
}

#[test]
fn test_null_timestamps_are_dropped() {
    let mut events = case("c1", &[("a", 0), ("b", 10)]);
    events.push(Event::without_timestamp("c1", "ghost"));

    let (miner, _) = quiet_miner(MinerConfig::default());
    let model = miner.mine(&events).unwrap();
    assert_eq!(model.variants[0].path, vec!["a", "b"]);
    assert_eq!(model.metrics.input_events, 3);
    assert_eq!(model.metrics.enriched_events, 2);
}

#[test]
fn test_mine_table_from_named_columns() {
    let table = RawTable::new(vec![
        "Activity".to_string(),
        "CaseID".to_string(),
        "Timestamp".to_string(),
    ])
    .with_row(&["start", "1", "2024-01-01T00:00:00Z"])
    .with_row(&["finish", "1", "2024-01-01T02:00:00Z"]);

    let (miner, _) = quiet_miner(MinerConfig::default());
    let model = miner.mine_table(&table, &SchemaMapping::default()).unwrap();
    assert_eq!(model.variants[0].path, vec!["start", "finish"]);
    assert_eq!(model.edges[0].mean_duration_seconds, 7200.0);
}

#[test]
fn test_malformed_timestamp_is_rejected() {
    let table = RawTable::new(vec![
        "case_id".to_string(),
        "activity".to_string(),
        "timestamp".to_string(),
    ])
    .with_row(&["1", "a", "not a time"]);

    let (miner, _) = quiet_miner(MinerConfig::default());
    let err = miner
        .mine_table(&table, &SchemaMapping::default())
        .unwrap_err();
    assert!(matches!(err, MinerError::Input { row: 0, .. }));
}

#[test]
fn test_locate_case() {
    let (miner, _) = quiet_miner(MinerConfig::default());
    let events = two_variant_log();

    let missing = miner.locate_case(&events, "nope", true).unwrap();
    assert_eq!(missing, CaseLookup::NotFound { case_id: "nope".into() });

    let found = miner.locate_case(&events, "c4", true).unwrap().found().unwrap();
    assert_eq!(found.activities, vec!["x", "y"]);
    assert_eq!(found.edge_durations, vec![5.0]);
    assert_eq!(found.total_duration, 5.0);
    assert_eq!(found.percentile, Some(0.0));
    assert_eq!(found.is_slower_than_average, Some(false));
}

#[test]
fn test_statistics() {
    let (miner, _) = quiet_miner(MinerConfig::default());
    let events = two_variant_log();

    let global = miner.global_statistics(&events).unwrap();
    assert_eq!(global.total_time.total(), 4);
    assert_eq!(global.steps.bin_edges, vec![2.0, 3.0, 4.0]);
    assert_eq!(global.steps.counts, vec![1, 3]);

    let edge = miner.edge_statistics(&events, "y", "z").unwrap();
    assert_eq!(edge.histogram.total(), 3);
    assert!((edge.histogram.bin_edges[0] - 9.0).abs() < 1e-9);
}

#[test]
fn test_cancellation_between_stages() {
    let token = CancelToken::new();
    let (miner, sink) = quiet_miner(MinerConfig::default());
    let miner = miner.with_cancel(token.clone());

    assert!(miner.mine(&two_variant_log()).is_ok());
    token.cancel();
    assert!(matches!(
        miner.mine(&two_variant_log()),
        Err(MinerError::Cancelled)
    ));
    assert!(!sink.events().is_empty());
}

/// Cancels its token as soon as cases have been aggregated
struct CancelAfterCases {
    token: CancelToken,
}

impl EventSink for CancelAfterCases {
    fn record(&self, event: &StageEvent) {
        if matches!(event, StageEvent::CasesAggregated { .. }) {
            self.token.cancel();
        }
    }
}

/// Stalls the pipeline once cases have been aggregated
struct SlowAfterCases {
    pause: StdDuration,
}

impl EventSink for SlowAfterCases {
    fn record(&self, event: &StageEvent) {
        if matches!(event, StageEvent::CasesAggregated { .. }) {
            std::thread::sleep(self.pause);
        }
    }
}

#[test]
fn test_cancel_during_run_stops_before_variants() {
    let token = CancelToken::new();
    let sink = CancelAfterCases {
        token: token.clone(),
    };
    let miner = Miner::new(MinerConfig::default())
        .with_sink(Arc::new(sink))
        .with_cancel(token.clone());

    assert!(!token.is_cancelled());
    assert!(matches!(
        miner.mine(&two_variant_log()),
        Err(MinerError::Cancelled)
    ));
    assert!(token.is_cancelled());
}

#[test]
fn test_deadline_expires_during_run() {
    let sink = SlowAfterCases {
        pause: StdDuration::from_millis(300),
    };
    let miner = Miner::new(MinerConfig::default())
        .with_sink(Arc::new(sink))
        .with_deadline(Instant::now() + StdDuration::from_millis(100));

    assert!(matches!(
        miner.mine(&two_variant_log()),
        Err(MinerError::DeadlineExceeded)
    ));
}
