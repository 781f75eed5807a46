//! CSV event log loading

use anyhow::{Context, Result};
use event_log_miner::RawTable;
use std::io::Read;
use std::path::Path;

/// Read a headed CSV file into a raw table
pub fn read_table(path: &Path, delimiter: char) -> Result<RawTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open event log: {:?}", path))?;
    let table = read_table_from(file, delimiter)
        .with_context(|| format!("Failed to read event log: {:?}", path))?;
    log::info!("Loaded {} rows from {:?}", table.len(), path);
    Ok(table)
}

/// Read CSV from any reader; empty cells become nulls
pub fn read_table_from<R: Read>(reader: R, delimiter: char) -> Result<RawTable> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| {
            format!("Delimiter must be a single ASCII character, got {:?}", delimiter)
        })?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader
        .headers()
        .context("Missing header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = RawTable::new(columns);
    for (index, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record {}", index + 1))?;
        let row = record
            .iter()
            .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
            .collect();
        table.push_row(row);
    }

    Ok(table)
}
