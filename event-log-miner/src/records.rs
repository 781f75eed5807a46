//! Flat record output
//!
//! Some consumers still expect one record per row with the historical column
//! names. These records are built from the canonical tables and carry no logic
//! of their own.

use crate::types::{Edge, VariantStats};
use serde::Serialize;

/// One variant row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantRecord {
    #[serde(rename = "Variant_Path")]
    pub variant_path: Vec<String>,
    #[serde(rename = "Frequency")]
    pub frequency: usize,
    #[serde(rename = "True_Start_Count")]
    pub true_start_count: usize,
    #[serde(rename = "True_End_Count")]
    pub true_end_count: usize,
    #[serde(rename = "Percentage")]
    pub percentage: f64,
    #[serde(rename = "cum_coverage")]
    pub cum_coverage: f64,
    #[serde(rename = "Avg_Timings")]
    pub avg_timings: Vec<f64>,
    #[serde(rename = "Total_Timings")]
    pub total_timings: Vec<f64>,
}

/// One edge row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeRecord {
    #[serde(rename = "Source_Activity")]
    pub source_activity: String,
    #[serde(rename = "Target_Activity")]
    pub target_activity: String,
    #[serde(rename = "Mean_Duration_Seconds")]
    pub mean_duration_seconds: f64,
    #[serde(rename = "Tooltip_Total_Time")]
    pub tooltip_total_time: String,
    #[serde(rename = "Tooltip_Mean_Time")]
    pub tooltip_mean_time: String,
    #[serde(rename = "Weight_Value")]
    pub weight_value: f64,
    #[serde(rename = "Edge_Label")]
    pub edge_label: String,
    #[serde(rename = "Case_Count")]
    pub case_count: usize,
}

impl From<&VariantStats> for VariantRecord {
    fn from(v: &VariantStats) -> Self {
        Self {
            variant_path: v.path.clone(),
            frequency: v.frequency,
            true_start_count: v.true_start_count,
            true_end_count: v.true_end_count,
            percentage: v.percentage,
            cum_coverage: v.cumulative_coverage,
            avg_timings: v.avg_timings.clone(),
            total_timings: v.total_timings.clone(),
        }
    }
}

impl From<&Edge> for EdgeRecord {
    fn from(e: &Edge) -> Self {
        Self {
            source_activity: e.source.clone(),
            target_activity: e.target.clone(),
            mean_duration_seconds: e.mean_duration_seconds,
            tooltip_total_time: e.tooltip_total.clone(),
            tooltip_mean_time: e.tooltip_mean.clone(),
            weight_value: e.weight_value,
            edge_label: e.edge_label.clone(),
            case_count: e.case_count,
        }
    }
}

pub fn variant_records(variants: &[VariantStats]) -> Vec<VariantRecord> {
    variants.iter().map(VariantRecord::from).collect()
}

pub fn edge_records(edges: &[Edge]) -> Vec<EdgeRecord> {
    edges.iter().map(EdgeRecord::from).collect()
}
