//! Row-table ingestion
//!
//! The caller hands over an already-loaded, row-oriented table. A [`SchemaMapping`]
//! says which columns carry the case id, the activity and the timestamp; it is
//! resolved once into column indices and then applied to every row.

use crate::types::{Event, MinerError, Result, Timestamp};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cell values that count as a missing timestamp
const NULL_TOKENS: &[&str] = &["", "null", "NULL", "None", "NaT", "nan", "NaN"];

/// Naive datetime layouts accepted besides RFC 3339, interpreted as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// A loaded table: header plus rows of optional cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builder method: append a row of present cells
    pub fn with_row<S: AsRef<str>>(mut self, cells: &[S]) -> Self {
        self.push_row(cells.iter().map(|c| Some(c.as_ref().to_string())).collect());
        self
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Which columns hold the event fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SchemaMapping {
    /// First three columns, in case/activity/timestamp order
    Positional,
    /// Columns looked up by header name
    Named {
        case_id: String,
        activity: String,
        timestamp: String,
    },
}

impl Default for SchemaMapping {
    fn default() -> Self {
        SchemaMapping::Named {
            case_id: "case_id".to_string(),
            activity: "activity".to_string(),
            timestamp: "timestamp".to_string(),
        }
    }
}

impl SchemaMapping {
    /// Mapping with explicit column names
    pub fn named(
        case_id: impl Into<String>,
        activity: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        SchemaMapping::Named {
            case_id: case_id.into(),
            activity: activity.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Mapping for XES-style exports
    pub fn xes() -> Self {
        Self::named("case:concept:name", "concept:name", "time:timestamp")
    }

    /// Resolve column names against a header
    pub fn resolve(&self, columns: &[String]) -> Result<ResolvedSchema> {
        if columns.len() < 3 {
            return Err(MinerError::Schema(format!(
                "expected at least 3 columns (case, activity, timestamp), found {}",
                columns.len()
            )));
        }

        match self {
            SchemaMapping::Positional => Ok(ResolvedSchema {
                case_idx: 0,
                activity_idx: 1,
                timestamp_idx: 2,
            }),
            SchemaMapping::Named {
                case_id,
                activity,
                timestamp,
            } => {
                let find = |name: &str, aliases: &[&str]| -> Result<usize> {
                    columns
                        .iter()
                        .position(|c| c.trim() == name)
                        .or_else(|| {
                            columns
                                .iter()
                                .position(|c| aliases.contains(&c.trim()))
                        })
                        .ok_or_else(|| {
                            MinerError::Schema(format!(
                                "column '{}' not found in {:?}",
                                name, columns
                            ))
                        })
                };

                Ok(ResolvedSchema {
                    case_idx: find(case_id, &["case:concept:name", "CaseID"])?,
                    activity_idx: find(activity, &["concept:name", "Activity"])?,
                    timestamp_idx: find(timestamp, &["time:timestamp", "Timestamp"])?,
                })
            }
        }
    }
}

/// Column indices of the three event fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub case_idx: usize,
    pub activity_idx: usize,
    pub timestamp_idx: usize,
}

impl ResolvedSchema {
    /// Iterate over the table's rows as events
    pub fn events<'a>(&'a self, table: &'a RawTable) -> impl Iterator<Item = Result<Event>> + 'a {
        table
            .rows
            .iter()
            .enumerate()
            .map(move |(row, cells)| self.event_from_row(row, cells))
    }

    /// Convert every row, stopping at the first malformed one
    pub fn ingest(&self, table: &RawTable) -> Result<Vec<Event>> {
        let events = self.events(table).collect::<Result<Vec<_>>>()?;
        log::debug!("Ingested {} events", events.len());
        Ok(events)
    }

    fn event_from_row(&self, row: usize, cells: &[Option<String>]) -> Result<Event> {
        let required = |idx: usize, field: &str| -> Result<String> {
            match cells.get(idx).and_then(|c| c.as_deref()).map(str::trim) {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => Err(MinerError::Input {
                    row,
                    reason: format!("missing {}", field),
                }),
            }
        };

        let case_id = required(self.case_idx, "case id")?;
        let activity = required(self.activity_idx, "activity")?;
        let timestamp = match cells.get(self.timestamp_idx).and_then(|c| c.as_deref()) {
            Some(raw) => parse_timestamp(raw).map_err(|reason| MinerError::Input { row, reason })?,
            None => None,
        };

        Ok(Event {
            case_id,
            activity,
            timestamp,
        })
    }
}

/// Resolve the mapping and convert the whole table in one step
pub fn ingest_table(table: &RawTable, mapping: &SchemaMapping) -> Result<Vec<Event>> {
    mapping.resolve(&table.columns)?.ingest(table)
}

/// Parse one timestamp cell; `Ok(None)` means the cell is a null
pub fn parse_timestamp(raw: &str) -> std::result::Result<Option<Timestamp>, String> {
    let value = raw.trim();
    if NULL_TOKENS.contains(&value) {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Some(naive.and_utc()));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Some(midnight.and_utc()));
        }
    }

    if let Ok(epoch) = value.parse::<i64>() {
        return DateTime::from_timestamp(epoch, 0)
            .map(Some)
            .ok_or_else(|| format!("epoch seconds out of range: {}", epoch));
    }

    Err(format!("unparseable timestamp '{}'", value))
}
