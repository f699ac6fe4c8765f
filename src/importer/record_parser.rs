//! Record dump parsing.
//!
//! A dump is a flat list of `NAME: VALUE` lines grouped into events by
//! `EVENT NUMBER` records and separated by `--` lines. Parsing turns it
//! into a wide table with one row per event and one column per field.

use crate::constants::{EVENT_NUMBER_FIELD, RECORD_SEPARATOR};
use crate::error::{MerError, Result};
use crate::schema::{drop_empty_columns, text_frame};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// One `NAME: VALUE` line with the event it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub name: String,
    pub value: Option<String>,
    pub event_number: i64,
}

/// Parse a dump file into an event table
pub fn parse_file(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    let records = read_records(BufReader::new(file)).map_err(|reason| MerError::ParseFailed {
        path: path.to_path_buf(),
        reason,
    })?;

    if records.is_empty() {
        return Err(MerError::ParseFailed {
            path: path.to_path_buf(),
            reason: format!("no {} record found", EVENT_NUMBER_FIELD),
        });
    }

    let table = events_to_table(records)?;
    debug!(
        "Parsed {}: {} events, {} fields",
        path.display(),
        table.height(),
        table.width()
    );
    Ok(table)
}

/// Split lines into records, carrying the current event number forward.
///
/// Lines before the first event and lines without a colon are skipped.
/// An event number that is not numeric fails the whole dump.
pub fn read_records(reader: impl BufRead) -> std::result::Result<Vec<RawRecord>, String> {
    let mut records = Vec::new();
    let mut current_event: Option<i64> = None;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("line {}: {}", line_num + 1, e))?;
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        let name = name.trim();
        if name == RECORD_SEPARATOR || name.is_empty() {
            continue;
        }
        let value = value.trim();

        if name.contains(EVENT_NUMBER_FIELD) {
            let number = parse_event_number(value).ok_or_else(|| {
                format!(
                    "line {}: invalid event number '{}'",
                    line_num + 1,
                    value
                )
            })?;
            current_event = Some(number);
        }

        if let Some(event_number) = current_event {
            records.push(RawRecord {
                name: name.to_string(),
                value: (!value.is_empty()).then(|| value.to_string()),
                event_number,
            });
        }
    }

    Ok(records)
}

fn parse_event_number(value: &str) -> Option<i64> {
    if let Ok(number) = value.parse::<i64>() {
        return Some(number);
    }
    let number = value.parse::<f64>().ok()?;
    (number.fract() == 0.0).then_some(number as i64)
}

/// Transpose records into one row per event.
///
/// Events are ordered by number; columns appear in first-seen order and
/// repeated field names within one event get `.1`, `.2`, ... suffixes.
pub fn events_to_table(records: Vec<RawRecord>) -> Result<DataFrame> {
    let mut events: BTreeMap<i64, Vec<(String, Option<String>)>> = BTreeMap::new();
    for record in records {
        events
            .entry(record.event_number)
            .or_default()
            .push((record.name, record.value));
    }

    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<(String, Option<String>)>> = Vec::with_capacity(events.len());

    for fields in events.into_values() {
        let names: Vec<String> = fields.iter().map(|(name, _)| name.clone()).collect();
        let unique = dedupe_names(&names);

        let row: Vec<(String, Option<String>)> = unique
            .into_iter()
            .zip(fields.into_iter().map(|(_, value)| value))
            .collect();

        for (name, _) in &row {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        rows.push(row);
    }

    let data = columns
        .iter()
        .map(|column| {
            let values = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .find(|(name, _)| name == column)
                        .and_then(|(_, value)| value.clone())
                })
                .collect();
            (column.clone(), values)
        })
        .collect();

    drop_empty_columns(&text_frame(data)?)
}

/// Suffix repeated names with the count of earlier occurrences
pub fn dedupe_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let earlier = names[..index].iter().filter(|n| *n == name).count();
            if earlier == 0 {
                name.clone()
            } else {
                format!("{}.{}", name, earlier)
            }
        })
        .collect()
}
