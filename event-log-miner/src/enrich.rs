//! Event log enrichment
//!
//! Orders each case's events in time and annotates them with their rank, the
//! case start time and the seconds elapsed since that start.
//!
//! Ranks and the per-case maximum rank are assigned over every event with a
//! timestamp, before the date range is applied. The start time and elapsed
//! seconds are computed over the retained events only. A case whose first
//! retained event does not carry rank 1 therefore started before the window,
//! which is what the true-start/true-end flags downstream detect.

use crate::config::DateRange;
use crate::observe::{EventSink, StageEvent};
use crate::types::{seconds_between, EnrichedEvent, Event, Timestamp};
use rayon::prelude::*;
use std::collections::HashMap;

/// Enriched events ordered by case id, then rank
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedLog {
    events: Vec<EnrichedEvent>,
}

impl EnrichedLog {
    /// Wrap events that are already ordered by case id and rank
    pub fn from_sorted(events: Vec<EnrichedEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[EnrichedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Contiguous per-case slices, in case id order
    pub fn case_slices(&self) -> Vec<&[EnrichedEvent]> {
        let mut slices = Vec::new();
        let mut start = 0;
        for i in 1..=self.events.len() {
            if i == self.events.len() || self.events[i].case_id != self.events[start].case_id {
                slices.push(&self.events[start..i]);
                start = i;
            }
        }
        slices
    }

    /// Events of one case in rank order
    pub fn case(&self, case_id: &str) -> Option<&[EnrichedEvent]> {
        let start = self
            .events
            .partition_point(|e| e.case_id.as_str() < case_id);
        let end = self
            .events
            .partition_point(|e| e.case_id.as_str() <= case_id);
        (start < end).then(|| &self.events[start..end])
    }
}

/// Enrich raw events, dropping null timestamps and events outside `range`
pub fn enrich_events(
    events: &[Event],
    range: &DateRange,
    parallel: bool,
    sink: &dyn EventSink,
) -> EnrichedLog {
    let mut null_timestamps = 0;
    let mut groups: HashMap<&str, Vec<(&Event, Timestamp)>> = HashMap::new();

    // Arrival order within each group is kept for the stable sort below
    for event in events {
        match event.timestamp {
            Some(ts) => groups
                .entry(event.case_id.as_str())
                .or_default()
                .push((event, ts)),
            None => null_timestamps += 1,
        }
    }

    let mut groups: Vec<(&str, Vec<(&Event, Timestamp)>)> = groups.into_iter().collect();
    groups.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let enrich_case = |(_, rows): &mut (&str, Vec<(&Event, Timestamp)>)| -> Vec<EnrichedEvent> {
        rows.sort_by_key(|(_, ts)| *ts);
        let max_rank = rows.len();
        let ranked: Vec<(usize, &Event, Timestamp)> = rows
            .iter()
            .enumerate()
            .map(|(i, (event, ts))| (i + 1, *event, *ts))
            .filter(|(_, _, ts)| range.contains(*ts))
            .collect();

        let Some(case_start_time) = ranked.first().map(|(_, _, ts)| *ts) else {
            return Vec::new();
        };

        ranked
            .into_iter()
            .map(|(rank, event, ts)| EnrichedEvent {
                case_id: event.case_id.clone(),
                activity: event.activity.clone(),
                timestamp: ts,
                rank,
                case_start_time,
                elapsed_seconds: seconds_between(case_start_time, ts),
                max_rank,
            })
            .collect()
    };

    let per_case: Vec<Vec<EnrichedEvent>> = if parallel {
        groups.par_iter_mut().map(enrich_case).collect()
    } else {
        groups.iter_mut().map(enrich_case).collect()
    };

    let with_timestamp = events.len() - null_timestamps;
    let cases = per_case.iter().filter(|rows| !rows.is_empty()).count();
    let enriched: Vec<EnrichedEvent> = per_case.into_iter().flatten().collect();

    sink.record(&StageEvent::Enriched {
        input_rows: events.len(),
        null_timestamps,
        out_of_range: with_timestamp - enriched.len(),
        output_rows: enriched.len(),
        cases,
    });

    EnrichedLog::from_sorted(enriched)
}
