//! Event header clean-up.
//!
//! The dump splits every event timestamp over six header fields. They are
//! folded into a `DATE_` and a `TIME_` column at the front of the table.

use crate::constants::{
    DATE_COLUMN, EVENT_TIME_DAY, EVENT_TIME_HOUR, EVENT_TIME_MINUTE, EVENT_TIME_MONTH,
    EVENT_TIME_PREFIX, EVENT_TIME_SECOND, EVENT_TIME_YEAR, TIME_COLUMN,
};
use crate::error::Result;
use crate::schema::text_values;
use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use tracing::debug;

/// Replace the split header time fields with `DATE_` and `TIME_`
pub fn assemble_date_time(frame: &DataFrame) -> Result<DataFrame> {
    let mut cleaned = frame.clone();

    let date: Option<Vec<Option<String>>> =
        component_values(frame, [EVENT_TIME_YEAR, EVENT_TIME_MONTH, EVENT_TIME_DAY])?
            .map(|rows| rows.into_iter().map(|parts| parts.and_then(to_date)).collect());
    let time: Option<Vec<Option<String>>> =
        component_values(frame, [EVENT_TIME_HOUR, EVENT_TIME_MINUTE, EVENT_TIME_SECOND])?
            .map(|rows| rows.into_iter().map(|parts| parts.and_then(to_time)).collect());

    let raw: Vec<String> = frame
        .get_column_names()
        .into_iter()
        .filter(|name| name.starts_with(EVENT_TIME_PREFIX))
        .map(|name| name.to_string())
        .collect();
    for name in &raw {
        cleaned = cleaned.drop(name)?;
    }

    let mut position = 0;
    if let Some(dates) = date {
        cleaned.insert_column(position, Series::new(DATE_COLUMN.into(), dates))?;
        position += 1;
    }
    if let Some(times) = time {
        cleaned.insert_column(position, Series::new(TIME_COLUMN.into(), times))?;
    }

    debug!("Assembled date/time from {} header fields", raw.len());
    Ok(cleaned)
}

/// Per-row integer triples, or `None` when a component column is missing
fn component_values(frame: &DataFrame, names: [&str; 3]) -> Result<Option<Vec<Option<[i64; 3]>>>> {
    let mut columns = Vec::with_capacity(3);
    for name in names {
        if frame.column(name).is_err() {
            return Ok(None);
        }
        columns.push(text_values(frame, name)?);
    }

    let rows = (0..frame.height())
        .map(|row| {
            let mut parts = [0i64; 3];
            for (slot, column) in parts.iter_mut().zip(&columns) {
                *slot = parse_component(column[row].as_deref()?)?;
            }
            Some(parts)
        })
        .collect();
    Ok(Some(rows))
}

fn parse_component(value: &str) -> Option<i64> {
    let number = value.trim().parse::<f64>().ok()?;
    (number.fract() == 0.0 && number >= 0.0).then_some(number as i64)
}

/// Two-digit years pivot like `%y`: 69-99 are 19xx, 00-68 are 20xx
fn to_date([year, month, day]: [i64; 3]) -> Option<String> {
    let year = match year {
        0..=68 => 2000 + year,
        69..=99 => 1900 + year,
        _ => year,
    };
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)?;
    Some(date.format("%Y-%m-%d").to_string())
}

fn to_time([hour, minute, second]: [i64; 3]) -> Option<String> {
    let time = NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32)?;
    Some(time.format("%H:%M:%S").to_string())
}
