//! Event Log Miner Library
//!
//! A stateless, reusable library that condenses a raw event log (case id,
//! activity, timestamp) into a process model: ranked variants, a Pareto subset,
//! a weighted directly-follows graph and start/end activities.
//!
//! # Architecture
//!
//! The pipeline is a chain of pure stages, each consuming the output of the
//! previous one:
//! - Enrich events with rank, case start and elapsed time
//! - Fold events into cases, then cases into variants
//! - Rank variants by frequency and select the Pareto subset
//! - Average per-variant timings and synthesize the edge table
//! - Extract start and end activities
//!
//! The library does NOT:
//! - Read files or databases
//! - Cache results between invocations
//! - Render graphs
//!
//! File input, caching and rendering belong to the application layer (event-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use event_log_miner::{Event, Miner, MinerConfig};
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let events = vec![
//!     Event::new("order-1", "receive", now),
//!     Event::new("order-1", "ship", now + chrono::Duration::hours(4)),
//! ];
//!
//! let config = MinerConfig::new()
//!     .with_target_coverage(0.9)
//!     .with_node_coverage(0.95);
//!
//! let model = Miner::new(config).mine(&events).unwrap();
//!
//! for edge in &model.edges {
//!     println!("{} -> {} ({})", edge.source, edge.target, edge.edge_label);
//! }
//! ```

// Public modules
pub mod cancel;
pub mod config;
pub mod miner;
pub mod observe;
pub mod records;
pub mod schema;
pub mod stats;
pub mod types;

// Pipeline stages
pub mod cases;
pub mod enrich;
pub mod graph;
pub mod locator;
pub mod nodes;
pub mod timing;
pub mod variants;

// Re-export main types for convenience
pub use cancel::CancelToken;
pub use config::{
    DateRange, GraphParams, HistogramConfig, Locale, MinerConfig, TimeUnit, WeightMetric,
};
pub use enrich::EnrichedLog;
pub use miner::{Miner, PipelineMetrics, ProcessModel};
pub use observe::{EventSink, LogSink, MemorySink, StageEvent};
pub use schema::{RawTable, SchemaMapping};
pub use stats::{EdgeStatistics, GlobalStatistics};
pub use types::{
    Case, CaseLookup, CaseLookupResult, Edge, EnrichedEvent, Event, Histogram,
    MinerError, NodePosition, PositionStats, Result, Timestamp, Variant, VariantStats,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
