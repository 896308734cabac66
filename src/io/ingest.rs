//! CSV ingest and validation.
//!
//! This module is responsible for turning an uploaded table into a clean list of
//! `Observation`s that are safe to estimate on.
//!
//! Design goals:
//! - **Strict schema** for required columns (`time`, `event`)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Raw rows kept** so the caller can show a preview of what was uploaded
//! - **Separation of concerns**: no estimation logic here
//!
//! Opening the file is an `AppError` (a usage problem); everything after that is
//! a `DataError` the pipeline recovers from.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::debug;

use crate::domain::Observation;
use crate::error::{AppError, DataError};

pub const TIME_COLUMN: &str = "time";
pub const EVENT_COLUMN: &str = "event";

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// The uploaded table as read, before any schema checks.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// `(line, record)` for every record that parsed as CSV.
    pub records: Vec<(usize, StringRecord)>,
    pub parse_errors: Vec<RowError>,
}

impl RawTable {
    pub fn rows_read(&self) -> usize {
        self.records.len() + self.parse_errors.len()
    }

    /// First `n` records as plain strings (for previews).
    pub fn preview(&self, n: usize) -> Vec<Vec<String>> {
        self.records
            .iter()
            .take(n)
            .map(|(_, r)| r.iter().map(str::to_string).collect())
            .collect()
    }
}

/// Ingest output: validated observations + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub observations: Vec<Observation>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Open a CSV file for reading.
pub fn open_table(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

/// Read every record of a CSV table.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| DataError::unreadable(format!("failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    let mut records = Vec::new();
    let mut parse_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header line, and lines are 1-based.
        let line = idx + 2;
        match result {
            Ok(record) => records.push((line, record)),
            Err(e) => parse_errors.push(RowError {
                line,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }

    Ok(RawTable {
        headers,
        records,
        parse_errors,
    })
}

/// Validate the schema and convert rows to observations.
pub fn extract_observations(table: &RawTable) -> Result<IngestedData, DataError> {
    let header_map = build_header_map(&table.headers);
    let time_idx = *header_map
        .get(TIME_COLUMN)
        .ok_or(DataError::MissingColumn { column: TIME_COLUMN })?;
    let event_idx = *header_map
        .get(EVENT_COLUMN)
        .ok_or(DataError::MissingColumn { column: EVENT_COLUMN })?;

    let mut observations = Vec::with_capacity(table.records.len());
    let mut row_errors = table.parse_errors.clone();

    for (line, record) in &table.records {
        match parse_row(record, time_idx, event_idx) {
            Ok(obs) => observations.push(obs),
            Err(message) => row_errors.push(RowError { line: *line, message }),
        }
    }
    row_errors.sort_by_key(|e| e.line);

    let rows_read = table.rows_read();
    let rows_used = observations.len();
    if rows_used == 0 {
        return Err(DataError::EmptyDataset { rows_read });
    }
    debug!("ingest: {rows_used}/{rows_read} rows usable, {} skipped", row_errors.len());

    Ok(IngestedData {
        observations,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn build_header_map(headers: &[String]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, time_idx: usize, event_idx: usize) -> Result<Observation, String> {
    let time_raw = get_required(record, time_idx, TIME_COLUMN)?;
    let event_raw = get_required(record, event_idx, EVENT_COLUMN)?;

    let duration = parse_duration(time_raw)?;
    let event_observed = parse_event(event_raw)?;
    Ok(Observation::new(duration, event_observed))
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_duration(s: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `time` '{s}' (expected a number)."))?;
    if !v.is_finite() {
        return Err(format!("Invalid `time` '{s}' (must be finite)."));
    }
    if v < 0.0 {
        return Err(format!("Invalid `time` '{s}' (must be >= 0)."));
    }
    Ok(v)
}

fn parse_event(s: &str) -> Result<bool, String> {
    if s.eq_ignore_ascii_case("true") {
        return Ok(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Ok(false);
    }
    match s.parse::<f64>() {
        Ok(v) if v == 1.0 => Ok(true),
        Ok(v) if v == 0.0 => Ok(false),
        _ => Err(format!("Invalid `event` '{s}' (expected 0 or 1).")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingest(text: &str) -> Result<IngestedData, DataError> {
        let table = read_table(text.as_bytes())?;
        extract_observations(&table)
    }

    #[test]
    fn reads_required_columns_and_ignores_extras() {
        let data = ingest("PatientID,time,event,arm\n1,5,1,A\n2,6,0,B\n3,6.5,1,A\n").unwrap();
        assert_eq!(data.rows_read, 3);
        assert_eq!(data.rows_used, 3);
        assert_eq!(data.observations[1], Observation::censored(6.0));
        assert_eq!(data.observations[2], Observation::event(6.5));
    }

    #[test]
    fn headers_are_case_insensitive_and_bom_tolerant() {
        let data = ingest("\u{feff}Time , EVENT\n3,1\n").unwrap();
        assert_eq!(data.observations, vec![Observation::event(3.0)]);
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let data = ingest("time,event\n5,1\nabc,1\n-2,0\n7,2\n8,\n9,0.0\n").unwrap();
        assert_eq!(data.rows_read, 6);
        assert_eq!(data.rows_used, 2);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6]);
        assert!(data.row_errors[0].message.contains("abc"));
    }

    #[test]
    fn missing_event_column_is_a_data_error() {
        let err = ingest("time,status\n5,1\n").unwrap_err();
        assert_eq!(err, DataError::MissingColumn { column: "event" });
    }

    #[test]
    fn all_rows_invalid_is_empty_dataset() {
        let err = ingest("time,event\nx,1\ny,0\n").unwrap_err();
        assert_eq!(err, DataError::EmptyDataset { rows_read: 2 });
    }

    #[test]
    fn preview_keeps_raw_rows() {
        let table = read_table("time,event,note\n1,1,a\n2,0,b\n3,1,c\n".as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["time", "event", "note"]);
        let preview = table.preview(2);
        assert_eq!(preview.len(), 2);
        assert_eq!(preview[1], vec!["2", "0", "b"]);
    }

    #[test]
    fn event_accepts_boolean_words() {
        assert_eq!(parse_event("TRUE"), Ok(true));
        assert_eq!(parse_event("false"), Ok(false));
        assert_eq!(parse_event("1.0"), Ok(true));
        assert!(parse_event("yes").is_err());
    }
}
