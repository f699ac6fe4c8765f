//! Sonic ping pairing.
//!
//! Dipping sonar events log a ping ON and a ping OFF as separate rows. Each
//! ON row is given the time of the OFF that closes it and the ping duration,
//! plus the fixed emission characteristics of the sonar.

use super::{ConversionContext, Converter, require_column, row_references};
use crate::constants::{SONIC, TIME_COLUMN, sonic};
use crate::error::Result;
use crate::schema::{text_values, with_series};
use chrono::NaiveTime;
use polars::prelude::*;

pub struct SonicConverter;

impl Converter for SonicConverter {
    fn name(&self) -> &'static str {
        "sonic"
    }

    fn convert(&self, table: &DataFrame, context: &ConversionContext<'_>) -> Result<DataFrame> {
        if context.category != SONIC {
            return Ok(table.clone());
        }
        for column in [TIME_COLUMN, sonic::PING_STATUS, sonic::EVENT_TYPE] {
            require_column(table, column)?;
        }

        let times = text_values(table, TIME_COLUMN)?;
        let statuses = text_values(table, sonic::PING_STATUS)?;
        let event_types = text_values(table, sonic::EVENT_TYPE)?;

        let pinging_with = |row: usize, status: &str| {
            statuses[row].as_deref() == Some(status)
                && event_types[row].as_deref() == Some(sonic::PINGING_EVENT)
        };
        let starts: Vec<Option<String>> = (0..table.height())
            .map(|row| times[row].clone().filter(|_| pinging_with(row, "ON")))
            .collect();
        let ends: Vec<Option<String>> = (0..table.height())
            .map(|row| times[row].clone().filter(|_| pinging_with(row, "OFF")))
            .collect();

        let (starts, ends) = pair_pings(starts, ends);
        let durations: Vec<Option<String>> = starts
            .iter()
            .zip(&ends)
            .map(|(start, end)| duration_between(start.as_deref()?, end.as_deref()?))
            .collect();

        let references = row_references(table)?;
        let mut latitudes = Vec::with_capacity(references.len());
        let mut longitudes = Vec::with_capacity(references.len());
        for reference in &references {
            let origin = context.origin_for(reference.as_deref())?;
            latitudes.push(origin.latitude);
            longitudes.push(origin.longitude);
        }

        let height = table.height();
        let mut converted = table.clone();
        for series in [
            Series::new(sonic::START_TIME.into(), starts),
            Series::new(sonic::END_TIME.into(), ends),
            Series::new(sonic::DURATION.into(), durations),
            Series::new(sonic::LATITUDE.into(), latitudes),
            Series::new(sonic::LONGITUDE.into(), longitudes),
            Series::new(sonic::RADIUS.into(), vec![sonic::RADIUS_NM; height]),
            Series::new(sonic::SOURCE_LEVEL.into(), vec![sonic::SOURCE_LEVEL_VALUE; height]),
            Series::new(sonic::FREQUENCY.into(), vec![sonic::FREQUENCY_VALUE; height]),
        ] {
            converted = with_series(&converted, series)?;
        }
        Ok(converted)
    }
}

/// Move every OFF time onto the ON row it closes.
///
/// An ON opens a ping unless one is already open; the next OFF closes it.
/// OFFs that close nothing are cleared, and ONs that are never closed
/// lose their start time.
pub fn pair_pings(
    starts: Vec<Option<String>>,
    mut ends: Vec<Option<String>>,
) -> (Vec<Option<String>>, Vec<Option<String>>) {
    let mut open: Option<usize> = None;

    for row in 0..starts.len() {
        match open {
            None if starts[row].is_some() => {
                open = Some(row);
                ends[row] = None;
            }
            Some(on_row) if ends[row].is_some() => {
                ends[on_row] = ends[row].take();
                open = None;
            }
            _ => ends[row] = None,
        }
    }

    let starts = starts
        .into_iter()
        .zip(&ends)
        .map(|(start, end)| start.filter(|_| end.is_some()))
        .collect();
    (starts, ends)
}

/// `HH:MM:SS` between two times of day, wrapping past midnight
pub fn duration_between(start: &str, end: &str) -> Option<String> {
    let start = NaiveTime::parse_from_str(start, "%H:%M:%S").ok()?;
    let end = NaiveTime::parse_from_str(end, "%H:%M:%S").ok()?;

    let mut seconds = (end - start).num_seconds();
    if seconds < 0 {
        seconds += 24 * 3600;
    }
    Some(format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    ))
}
