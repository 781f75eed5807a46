//! Event Log Miner CLI Application
//!
//! This is the command-line interface for the event log miner.
//! It uses the event-log-miner library and adds:
//! - CSV loading
//! - TOML configuration with command-line overrides
//! - JSON and text reports

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use event_log_miner::{Event, Miner, Timestamp, TimeUnit, WeightMetric};
use std::path::PathBuf;
use std::time::{Duration, Instant};

mod config;
mod input;
mod report;

use config::{AppConfig, OutputFormat};
use report::Report;

/// Event Log Miner - Variants and directly-follows graphs from event logs
#[derive(Parser, Debug)]
#[command(name = "event-log-cli")]
#[command(about = "Mine variants, edges and statistics from a CSV event log", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to CSV event log (overrides [input] path)
    #[arg(short, long, value_name = "FILE", global = true)]
    input: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Keep events at or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE", global = true)]
    from: Option<String>,

    /// Keep events at or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long, value_name = "DATE", global = true)]
    to: Option<String>,

    /// Abort if mining takes longer than this many seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Variants, Pareto subset, edges and start/end activities
    Model {
        /// Target cumulative coverage of the Pareto subset (0-1)
        #[arg(long)]
        coverage: Option<f64>,

        /// Coverage of the start/end activity selection (0-1)
        #[arg(long)]
        node_coverage: Option<f64>,

        /// Weight edges by mean time in this unit (s, m, h, d, w)
        #[arg(long, value_name = "UNIT")]
        mean_time: Option<String>,

        /// Drop edges with fewer cases
        #[arg(long)]
        min_cases: Option<usize>,

        /// Drop edges with more cases
        #[arg(long)]
        max_cases: Option<usize>,

        /// Drop edges whose mean duration is shorter (seconds)
        #[arg(long, value_name = "SECS")]
        min_mean_time: Option<f64>,

        /// Drop edges whose mean duration is longer (seconds)
        #[arg(long, value_name = "SECS")]
        max_mean_time: Option<f64>,

        /// Emit rows with the historical column names
        #[arg(long)]
        legacy_columns: bool,
    },
    /// Case duration and case length histograms
    Stats,
    /// Duration histogram of one transition
    Edge { source: String, target: String },
    /// Path and timings of one case
    Case {
        case_id: String,

        /// Skip the comparison against all other cases
        #[arg(long)]
        no_global: bool,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Event Log Miner CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using miner library v{}", event_log_miner::VERSION);

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &args)?;

    let path = config
        .input
        .path
        .clone()
        .context("No input specified: pass --input <FILE> or set [input] path")?;
    let table = input::read_table(&path, config.input.delimiter)?;
    let events = event_log_miner::schema::ingest_table(&table, &config.input.schema_mapping())?;

    let report = run(&args.command, &config, &events, args.timeout)?;
    let rendered = report::render(&report, config.output.format, config.output.legacy_columns)?;

    match &config.output.path {
        Some(out) => {
            std::fs::write(out, rendered)
                .with_context(|| format!("Failed to write report: {:?}", out))?;
            log::info!("Report written to {:?}", out);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Run one command against the loaded events
fn run(
    command: &Command,
    config: &AppConfig,
    events: &[Event],
    timeout: Option<u64>,
) -> Result<Report> {
    let mut miner = Miner::new(config.mining.clone());
    if let Some(secs) = timeout {
        miner = miner.with_deadline(Instant::now() + Duration::from_secs(secs));
    }

    let report = match command {
        Command::Model { .. } => Report::Model(miner.mine(events)?),
        Command::Stats => Report::Statistics(miner.global_statistics(events)?),
        Command::Edge { source, target } => {
            Report::Edge(miner.edge_statistics(events, source, target)?)
        }
        Command::Case { case_id, no_global } => {
            Report::Case(miner.locate_case(events, case_id, !no_global)?)
        }
    };
    Ok(report)
}

/// Apply command-line flags on top of the file configuration
fn apply_overrides(config: &mut AppConfig, args: &Args) -> Result<()> {
    if let Some(path) = &args.input {
        config.input.path = Some(path.clone());
    }
    if let Some(path) = &args.output {
        config.output.path = Some(path.clone());
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(from) = &args.from {
        config.mining.date_range.start = Some(parse_date(from)?);
    }
    if let Some(to) = &args.to {
        config.mining.date_range.end = Some(parse_date(to)?);
    }

    if let Command::Model {
        coverage,
        node_coverage,
        mean_time,
        min_cases,
        max_cases,
        min_mean_time,
        max_mean_time,
        legacy_columns,
    } = &args.command
    {
        let mining = &mut config.mining;
        if let Some(c) = coverage {
            mining.target_coverage = *c;
        }
        if let Some(c) = node_coverage {
            mining.node_coverage = *c;
        }
        if let Some(code) = mean_time {
            let Some(unit) = TimeUnit::from_code(code) else {
                bail!("Unknown time unit '{}' (expected s, m, h, d or w)", code);
            };
            mining.graph.weight_metric = WeightMetric::MeanTime;
            mining.graph.time_unit = unit;
        }
        if min_cases.is_some() {
            mining.graph.min_cases = *min_cases;
        }
        if max_cases.is_some() {
            mining.graph.max_cases = *max_cases;
        }
        if min_mean_time.is_some() {
            mining.graph.min_mean_time = *min_mean_time;
        }
        if max_mean_time.is_some() {
            mining.graph.max_mean_time = *max_mean_time;
        }
        if *legacy_columns {
            config.output.legacy_columns = true;
        }
    }

    Ok(())
}

/// Parse a date bound given on the command line
fn parse_date(raw: &str) -> Result<Timestamp> {
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date: {}", raw))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("Invalid date")?;
    Ok(Utc.from_utc_datetime(&midnight))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}
