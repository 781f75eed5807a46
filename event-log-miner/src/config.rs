//! Miner configuration types
//!
//! This module defines the parameters of one mining invocation. Everything has a
//! serde default so a partially written configuration file is still valid.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for one mining run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Cumulative share of cases the Pareto subset must reach
    #[serde(default = "default_coverage")]
    pub target_coverage: f64,

    /// Cumulative share of start/end counts covered by the selected nodes
    #[serde(default = "default_coverage")]
    pub node_coverage: f64,

    /// Optional timestamp bounds applied before aggregation
    #[serde(default)]
    pub date_range: DateRange,

    /// Edge weighting and filtering
    #[serde(default)]
    pub graph: GraphParams,

    /// Bin counts for the statistics engine
    #[serde(default)]
    pub histograms: HistogramConfig,

    /// Language of tooltip and edge-label suffixes
    #[serde(default)]
    pub locale: Locale,

    /// Use the rayon thread pool for case and variant aggregation
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_coverage() -> f64 {
    0.95
}

fn default_true() -> bool {
    true
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            target_coverage: default_coverage(),
            node_coverage: default_coverage(),
            date_range: DateRange::default(),
            graph: GraphParams::default(),
            histograms: HistogramConfig::default(),
            locale: Locale::default(),
            parallel: true,
        }
    }
}

impl MinerConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the Pareto coverage target
    pub fn with_target_coverage(mut self, coverage: f64) -> Self {
        self.target_coverage = coverage;
        self
    }

    /// Builder method: set the start/end node coverage threshold
    pub fn with_node_coverage(mut self, coverage: f64) -> Self {
        self.node_coverage = coverage;
        self
    }

    /// Builder method: restrict events to a timestamp window
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    /// Builder method: set graph weighting and filters
    pub fn with_graph_params(mut self, params: GraphParams) -> Self {
        self.graph = params;
        self
    }

    /// Builder method: set histogram bin counts
    pub fn with_histograms(mut self, histograms: HistogramConfig) -> Self {
        self.histograms = histograms;
        self
    }

    /// Builder method: set label language
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Builder method: enable or disable parallel aggregation
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }
}

/// Timestamp window; the start is always inclusive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<Timestamp>,
    #[serde(default)]
    pub end: Option<Timestamp>,
    #[serde(default = "default_true")]
    pub end_inclusive: bool,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            end_inclusive: true,
        }
    }
}

impl DateRange {
    /// Unbounded range
    pub fn all() -> Self {
        Self::default()
    }

    /// Range between two optional bounds, both inclusive
    pub fn between(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        Self {
            start,
            end,
            end_inclusive: true,
        }
    }

    /// Builder method: make the end bound exclusive
    pub fn with_exclusive_end(mut self) -> Self {
        self.end_inclusive = false;
        self
    }

    /// Check if a timestamp lies inside the window
    pub fn contains(&self, ts: Timestamp) -> bool {
        if let Some(start) = self.start {
            if ts < start {
                return false;
            }
        }
        match self.end {
            Some(end) if self.end_inclusive => ts <= end,
            Some(end) => ts < end,
            None => true,
        }
    }
}

/// How edges are weighted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightMetric {
    #[default]
    Cases,
    MeanTime,
}

/// Unit used when weighting edges by mean time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "m")]
    Minutes,
    #[serde(rename = "h")]
    Hours,
    #[default]
    #[serde(rename = "d")]
    Days,
    #[serde(rename = "w")]
    Weeks,
}

impl TimeUnit {
    /// Seconds per unit
    pub fn divisor(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Days => 86_400.0,
            TimeUnit::Weeks => 604_800.0,
        }
    }

    /// Parse the one-letter code used on the command line
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "s" => Some(TimeUnit::Seconds),
            "m" => Some(TimeUnit::Minutes),
            "h" => Some(TimeUnit::Hours),
            "d" => Some(TimeUnit::Days),
            "w" => Some(TimeUnit::Weeks),
            _ => None,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
        };
        write!(f, "{}", code)
    }
}

/// Edge weighting plus optional inclusive range filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphParams {
    #[serde(default)]
    pub weight_metric: WeightMetric,
    #[serde(default)]
    pub time_unit: TimeUnit,
    #[serde(default)]
    pub min_cases: Option<usize>,
    #[serde(default)]
    pub max_cases: Option<usize>,
    /// Seconds
    #[serde(default)]
    pub min_mean_time: Option<f64>,
    /// Seconds
    #[serde(default)]
    pub max_mean_time: Option<f64>,
}

impl GraphParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: weight edges by mean duration in `unit`
    pub fn weighted_by_mean_time(mut self, unit: TimeUnit) -> Self {
        self.weight_metric = WeightMetric::MeanTime;
        self.time_unit = unit;
        self
    }

    /// Builder method: keep edges whose case count lies in the bounds
    pub fn with_case_bounds(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_cases = min;
        self.max_cases = max;
        self
    }

    /// Builder method: keep edges whose mean duration (seconds) lies in the bounds
    pub fn with_mean_time_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_mean_time = min;
        self.max_mean_time = max;
        self
    }

    /// Check if an aggregated edge passes every supplied bound
    pub fn accepts(&self, case_count: usize, mean_duration_seconds: f64) -> bool {
        self.min_cases.map_or(true, |min| case_count >= min)
            && self.max_cases.map_or(true, |max| case_count <= max)
            && self.min_mean_time.map_or(true, |min| mean_duration_seconds >= min)
            && self.max_mean_time.map_or(true, |max| mean_duration_seconds <= max)
    }
}

/// Bin counts for the distributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramConfig {
    #[serde(default = "default_wide_bins")]
    pub duration_bins: usize,
    #[serde(default = "default_wide_bins")]
    pub length_bins: usize,
    #[serde(default = "default_edge_bins")]
    pub edge_bins: usize,
}

fn default_wide_bins() -> usize {
    40
}

fn default_edge_bins() -> usize {
    30
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            duration_bins: default_wide_bins(),
            length_bins: default_wide_bins(),
            edge_bins: default_edge_bins(),
        }
    }
}

/// Language of the human-readable labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fa,
}

impl Locale {
    /// Suffix appended to a mean-time edge label
    pub fn unit_label(self, unit: TimeUnit) -> &'static str {
        match (self, unit) {
            (Locale::En, TimeUnit::Seconds) => "s",
            (Locale::En, TimeUnit::Minutes) => "min",
            (Locale::En, TimeUnit::Hours) => "h",
            (Locale::En, TimeUnit::Days) => "days",
            (Locale::En, TimeUnit::Weeks) => "weeks",
            (Locale::Fa, TimeUnit::Seconds) => "ثانیه",
            (Locale::Fa, TimeUnit::Minutes) => "دقیقه",
            (Locale::Fa, TimeUnit::Hours) => "ساعت",
            (Locale::Fa, TimeUnit::Days) => "روز",
            (Locale::Fa, TimeUnit::Weeks) => "هفته",
        }
    }

    /// Label used for an exactly-zero duration
    pub fn zero_label(self) -> &'static str {
        "0s"
    }

    /// Render a number for a label
    ///
    /// `Fa` keeps one decimal on whole numbers (`2.0`).
    pub fn format_number(self, value: f64) -> String {
        match self {
            Locale::Fa if value.is_finite() && value.fract() == 0.0 => format!("{:.1}", value),
            _ => format!("{}", value),
        }
    }

    /// Tooltip text for a duration already converted to days
    pub fn day_tooltip(self, days: f64) -> String {
        let number = self.format_number(days);
        match self {
            Locale::En => format!("{} {}", number, self.unit_label(TimeUnit::Days)),
            Locale::Fa => format!("{} {} ", number, self.unit_label(TimeUnit::Days)),
        }
    }
}
