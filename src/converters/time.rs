use super::{ConversionContext, Converter};
use crate::constants::{SONOBUOY, sonobuoy};
use crate::error::Result;
use crate::schema::{f64_values, with_series};
use chrono::DateTime;
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

static TIME_COLUMN: LazyLock<Regex> = LazyLock::new(|| Regex::new("TIME").unwrap());

/// Epoch timestamps become times of day; sonobuoy life times become durations
pub struct TimeConverter;

impl Converter for TimeConverter {
    fn name(&self) -> &'static str {
        "time"
    }

    fn convert(&self, table: &DataFrame, context: &ConversionContext<'_>) -> Result<DataFrame> {
        if context.category == SONOBUOY {
            return convert_sonobuoy_durations(table);
        }

        let mut converted = table.clone();
        for name in context.numeric_matching(&TIME_COLUMN) {
            if name.contains("EVENT HEADER") {
                continue;
            }
            let values: Vec<Option<String>> = f64_values(table, &name)?
                .into_iter()
                .map(|value| value.and_then(epoch_to_time_of_day))
                .collect();
            converted = with_series(&converted, Series::new(name.as_str().into(), values))?;
        }
        Ok(converted)
    }
}

fn convert_sonobuoy_durations(table: &DataFrame) -> Result<DataFrame> {
    let mut converted = table.clone();

    for (name, scale) in [(sonobuoy::LIFE_TIME, 1.0), (sonobuoy::REMAINING_TIME, 1000.0)] {
        if table.column(name).is_err() {
            continue;
        }
        let values: Vec<Option<String>> = f64_values(table, name)?
            .into_iter()
            .map(|value| value.map(|v| format_duration(v / scale)))
            .collect();
        converted = with_series(&converted, Series::new(name.into(), values))?;
    }
    Ok(converted)
}

/// UTC time of day of an epoch timestamp in seconds, rounded to the second
pub fn epoch_to_time_of_day(seconds: f64) -> Option<String> {
    if !seconds.is_finite() {
        return None;
    }
    let timestamp = DateTime::from_timestamp(seconds.round() as i64, 0)?;
    Some(timestamp.format("%H:%M:%S").to_string())
}

/// `HH:MM:SS` of a second count; hours are not wrapped at 24
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.round().max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
