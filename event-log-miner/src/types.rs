//! Core types for the event log miner library
//!
//! This module defines the value objects that flow through the mining pipeline.
//! Every stage consumes the output of the previous one and produces a new value;
//! nothing is mutated after construction and nothing outlives one invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type used throughout the miner
pub type Timestamp = DateTime<Utc>;

/// Result type for miner operations
pub type Result<T> = std::result::Result<T, MinerError>;

/// Seconds between two timestamps, with millisecond resolution
pub fn seconds_between(from: Timestamp, to: Timestamp) -> f64 {
    (to - from).num_milliseconds() as f64 / 1_000.0
}

/// Round to two decimal places, ties to even
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Errors that can occur while mining an event log
#[derive(Debug, thiserror::Error)]
pub enum MinerError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid input at row {row}: {reason}")]
    Input { row: usize, reason: String },

    #[error(
        "Graph consistency violated for variant {path:?}: path has {path_len} activities but {timings_len} timings"
    )]
    GraphConsistency {
        path: Vec<String>,
        path_len: usize,
        timings_len: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Computation failed: {0}")]
    Compute(String),

    #[error("Mining cancelled")]
    Cancelled,

    #[error("Mining deadline exceeded")]
    DeadlineExceeded,
}

/// One raw event from the source log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub case_id: String,
    pub activity: String,
    /// Null timestamps are kept at ingestion and dropped by the enricher
    pub timestamp: Option<Timestamp>,
}

impl Event {
    /// Create an event with a known timestamp
    pub fn new(
        case_id: impl Into<String>,
        activity: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            activity: activity.into(),
            timestamp: Some(timestamp),
        }
    }

    /// Create an event whose timestamp is missing
    pub fn without_timestamp(case_id: impl Into<String>, activity: impl Into<String>) -> Self {
        Self {
            case_id: case_id.into(),
            activity: activity.into(),
            timestamp: None,
        }
    }
}

/// An event with its position and timing inside its case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedEvent {
    pub case_id: String,
    pub activity: String,
    pub timestamp: Timestamp,
    /// 1-based position within the case
    pub rank: usize,
    /// Earliest retained timestamp of the case
    pub case_start_time: Timestamp,
    /// Seconds since `case_start_time`, never negative
    pub elapsed_seconds: f64,
    /// Highest rank of the case
    pub max_rank: usize,
}

/// One process instance folded into its activity path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Case {
    pub case_id: String,
    pub path: Vec<String>,
    /// Elapsed seconds aligned 1:1 with `path`
    pub elapsed: Vec<f64>,
    pub is_true_start: bool,
    pub is_true_end: bool,
}

impl Case {
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// A distinct activity path shared by one or more cases
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub path: Vec<String>,
    pub frequency: usize,
    /// Elapsed sequences of the contributing cases, in case order
    pub timings: Vec<Vec<f64>>,
    pub true_start_count: usize,
    pub true_end_count: usize,
}

/// A variant ranked by coverage and enriched with aggregated timings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantStats {
    pub path: Vec<String>,
    pub frequency: usize,
    pub percentage: f64,
    pub cumulative_coverage: f64,
    pub true_start_count: usize,
    pub true_end_count: usize,
    pub avg_timings: Vec<f64>,
    pub total_timings: Vec<f64>,
}

/// One weighted directly-follows edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub case_count: usize,
    pub total_duration_seconds: f64,
    pub mean_duration_seconds: f64,
    pub weight_value: f64,
    pub edge_label: String,
    pub tooltip_total: String,
    pub tooltip_mean: String,
}

/// Histogram with ascending bin edges and one count per bin
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Histogram {
    pub bin_edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of samples that fell inside the bins
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Where a case sits in the global duration distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionStats {
    pub duration_percentile: f64,
    pub is_slower_than_average: bool,
}

/// Path and timings of one located case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseLookupResult {
    pub case_id: String,
    pub activities: Vec<String>,
    pub edge_durations: Vec<f64>,
    pub total_duration: f64,
    pub percentile: Option<f64>,
    pub is_slower_than_average: Option<bool>,
    pub position: Option<PositionStats>,
}

/// Outcome of a case lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseLookup {
    Found(CaseLookupResult),
    NotFound { case_id: String },
}

impl CaseLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, CaseLookup::Found(_))
    }

    /// The located case, if any
    pub fn found(self) -> Option<CaseLookupResult> {
        match self {
            CaseLookup::Found(result) => Some(result),
            CaseLookup::NotFound { .. } => None,
        }
    }
}

/// Which end of a path a node selection looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodePosition {
    Start,
    End,
}

impl fmt::Display for NodePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodePosition::Start => write!(f, "start"),
            NodePosition::End => write!(f, "end"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_seconds_between() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 30).unwrap();
        assert_eq!(seconds_between(a, b), 90.0);
        assert_eq!(seconds_between(b, a), -90.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(8.756), 8.76);
        assert_eq!(round2(10.0), 10.0);
        assert_eq!(round2(-1.234), -1.23);
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn test_case_lookup_accessors() {
        let missing = CaseLookup::NotFound { case_id: "42".into() };
        assert!(!missing.is_found());
        assert!(missing.found().is_none());
    }

    #[test]
    fn test_node_position_display() {
        assert_eq!(format!("{}", NodePosition::Start), "start");
        assert_eq!(format!("{}", NodePosition::End), "end");
    }
}
