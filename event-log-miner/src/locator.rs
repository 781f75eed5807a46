//! Single-case lookup
//!
//! Returns one case's path with its transition durations and, when a global
//! context is given, where its total duration falls among all cases.

use crate::enrich::EnrichedLog;
use crate::observe::{EventSink, StageEvent};
use crate::types::{round2, seconds_between, CaseLookup, CaseLookupResult, PositionStats};

/// Total duration of every case with more than one event
pub fn case_durations(log: &EnrichedLog) -> Vec<f64> {
    log.case_slices()
        .into_iter()
        .filter(|case| case.len() > 1)
        .map(|case| seconds_between(case[0].timestamp, case[case.len() - 1].timestamp))
        .collect()
}

/// Percentile of `duration` in `all` (share of strictly shorter cases) and
/// whether it exceeds the mean
pub fn position_in(duration: f64, all: &[f64]) -> PositionStats {
    if all.is_empty() {
        return PositionStats {
            duration_percentile: 0.0,
            is_slower_than_average: false,
        };
    }

    let mut sorted = all.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = sorted.partition_point(|d| *d < duration);
    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

    PositionStats {
        duration_percentile: round2(idx as f64 / sorted.len() as f64 * 100.0),
        is_slower_than_average: duration > mean,
    }
}

/// Look up one case; `global` is the log the case is compared against
pub fn locate_case(
    log: &EnrichedLog,
    case_id: &str,
    global: Option<&EnrichedLog>,
    sink: &dyn EventSink,
) -> CaseLookup {
    let Some(events) = log.case(case_id) else {
        sink.record(&StageEvent::CaseNotFound {
            case_id: case_id.to_string(),
        });
        return CaseLookup::NotFound {
            case_id: case_id.to_string(),
        };
    };

    let activities: Vec<String> = events.iter().map(|e| e.activity.clone()).collect();
    let edge_durations: Vec<f64> = events
        .windows(2)
        .map(|pair| seconds_between(pair[0].timestamp, pair[1].timestamp))
        .collect();
    let total_duration = match (events.first(), events.last()) {
        (Some(first), Some(last)) if events.len() > 1 => {
            seconds_between(first.timestamp, last.timestamp)
        }
        _ => 0.0,
    };

    let position = global.map(|context| position_in(total_duration, &case_durations(context)));

    sink.record(&StageEvent::CaseLocated {
        case_id: case_id.to_string(),
        events: events.len(),
    });

    CaseLookup::Found(CaseLookupResult {
        case_id: case_id.to_string(),
        activities,
        edge_durations,
        total_duration,
        percentile: position.map(|p| p.duration_percentile),
        is_slower_than_average: position.map(|p| p.is_slower_than_average),
        position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DateRange;
    use crate::enrich::enrich_events;
    use crate::observe::MemorySink;
    use crate::types::{Event, Timestamp};
    use chrono::{Duration, TimeZone, Utc};

    fn t(seconds: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn sample_log() -> EnrichedLog {
        let events = vec![
            Event::new("1", "a", t(0)),
            Event::new("1", "b", t(100)),
            Event::new("2", "a", t(0)),
            Event::new("2", "c", t(30)),
            Event::new("2", "b", t(300)),
            Event::new("3", "a", t(0)),
            Event::new("3", "b", t(200)),
            Event::new("4", "a", t(50)),
        ];
        enrich_events(&events, &DateRange::all(), false, &MemorySink::new())
    }

    #[test]
    fn test_absent_case_is_not_found() {
        let sink = MemorySink::new();
        let lookup = locate_case(&sample_log(), "99", None, &sink);
        assert_eq!(lookup, CaseLookup::NotFound { case_id: "99".into() });
        assert_eq!(
            sink.events(),
            vec![StageEvent::CaseNotFound { case_id: "99".into() }]
        );
    }

    #[test]
    fn test_path_and_durations() {
        let result = locate_case(&sample_log(), "2", None, &MemorySink::new())
            .found()
            .unwrap();
        assert_eq!(result.activities, vec!["a", "c", "b"]);
        assert_eq!(result.edge_durations, vec![30.0, 270.0]);
        assert_eq!(result.total_duration, 300.0);
        assert!(result.position.is_none());
        assert!(result.percentile.is_none());
    }

    #[test]
    fn test_single_event_case() {
        let result = locate_case(&sample_log(), "4", None, &MemorySink::new())
            .found()
            .unwrap();
        assert_eq!(result.activities, vec!["a"]);
        assert!(result.edge_durations.is_empty());
        assert_eq!(result.total_duration, 0.0);
    }

    #[test]
    fn test_position_against_global_context() {
        let log = sample_log();
        let result = locate_case(&log, "3", Some(&log), &MemorySink::new())
            .found()
            .unwrap();

        // Durations of multi-event cases: 100, 200, 300
        assert_eq!(result.percentile, Some(33.33));
        assert_eq!(result.is_slower_than_average, Some(false));

        let slowest = locate_case(&log, "2", Some(&log), &MemorySink::new())
            .found()
            .unwrap();
        assert_eq!(slowest.percentile, Some(66.67));
        assert_eq!(slowest.is_slower_than_average, Some(true));
    }

    #[test]
    fn test_position_with_empty_distribution() {
        let position = position_in(10.0, &[]);
        assert_eq!(position.duration_percentile, 0.0);
        assert!(!position.is_slower_than_average);
    }
}
