//! Column typing and table shape helpers.
//!
//! Handles the untyped text produced by the record parser: numeric
//! coercion, empty-column elimination, outer alignment of per-file
//! tables and the small set of value accessors the converters share.

use crate::error::Result;
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static SCIENTIFIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d*\.?\d+[eE][-+]?\d+$").unwrap());
static PLAIN_NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d*\.?\d+$").unwrap());

/// Whether a raw field value is a number this format writes
pub fn is_numeric_text(value: &str) -> bool {
    SCIENTIFIC.is_match(value) || PLAIN_NUMERIC.is_match(value)
}

/// Build a text frame from named columns of equal length
pub fn text_frame(columns: Vec<(String, Vec<Option<String>>)>) -> Result<DataFrame> {
    let columns = columns
        .into_iter()
        .map(|(name, values)| Series::new(name.into(), values).into_column())
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Drop every column with no value in any row
pub fn drop_empty_columns(frame: &DataFrame) -> Result<DataFrame> {
    let height = frame.height();
    let keep: Vec<String> = frame
        .get_columns()
        .iter()
        .filter(|column| column.null_count() < height)
        .map(|column| column.name().to_string())
        .collect();

    if keep.len() < frame.width() {
        debug!("Dropping {} empty columns", frame.width() - keep.len());
    }
    Ok(frame.select(keep)?)
}

/// Coerce text columns whose values are all numeric to `Float64`
pub fn coerce_numeric_columns(frame: &DataFrame, exclude: &[&str]) -> Result<DataFrame> {
    let mut coerced = frame.clone();

    for column in frame.get_columns() {
        let name = column.name().as_str();
        if exclude.contains(&name) || column.dtype() != &DataType::String {
            continue;
        }

        let values = column.as_materialized_series().str()?;
        let mut any_value = false;
        let mut all_numeric = true;
        for value in values.into_iter().flatten() {
            any_value = true;
            if !is_numeric_text(value.trim()) {
                all_numeric = false;
                break;
            }
        }
        if !any_value || !all_numeric {
            continue;
        }

        let numbers: Vec<Option<f64>> = values
            .into_iter()
            .map(|value| value.and_then(|v| v.trim().parse::<f64>().ok()))
            .collect();
        coerced.with_column(Series::new(name.into(), numbers))?;
    }

    Ok(coerced)
}

/// Names of the numeric columns of a frame, in column order
pub fn numeric_columns(frame: &DataFrame) -> Vec<String> {
    frame
        .get_columns()
        .iter()
        .filter(|column| {
            matches!(
                column.dtype(),
                DataType::Float64
                    | DataType::Float32
                    | DataType::Int64
                    | DataType::Int32
                    | DataType::UInt32
                    | DataType::UInt64
            )
        })
        .map(|column| column.name().to_string())
        .collect()
}

/// Values of a column as `f64`; text that does not parse becomes null
pub fn f64_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = frame.column(name)?;
    if column.dtype() == &DataType::String {
        let values = column.as_materialized_series().str()?;
        return Ok(values
            .into_iter()
            .map(|value| value.and_then(|v| v.trim().parse::<f64>().ok()))
            .collect());
    }

    let cast = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Values of a column as text
pub fn text_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = frame.column(name)?;
    if column.dtype() == &DataType::String {
        let values = column.as_materialized_series().str()?;
        return Ok(values.into_iter().map(|v| v.map(str::to_string)).collect());
    }

    let numbers = f64_values(frame, name)?;
    Ok(numbers
        .into_iter()
        .map(|value| value.map(format_number))
        .collect())
}

/// Render a number the way the dump writes it (`5.0` stays `5`)
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Keep the rows where `mask` is true
pub fn filter_rows(frame: &DataFrame, mask: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("mask".into(), mask);
    Ok(frame.filter(&mask)?)
}

/// Return a copy of `frame` with one column replaced or appended
pub fn with_series(frame: &DataFrame, series: Series) -> Result<DataFrame> {
    let mut updated = frame.clone();
    updated.with_column(series)?;
    Ok(updated)
}

/// Stack frames with differing columns.
///
/// Columns are aligned in first-seen order; a column missing from a
/// frame is null there, and a column whose type differs between frames
/// is stacked as text.
pub fn align_frames(frames: Vec<DataFrame>) -> Result<DataFrame> {
    let mut order: Vec<(String, DataType)> = Vec::new();
    for frame in &frames {
        for column in frame.get_columns() {
            let name = column.name().as_str();
            match order.iter_mut().find(|(known, _)| known == name) {
                Some((_, dtype)) if dtype != column.dtype() => *dtype = DataType::String,
                Some(_) => {}
                None => order.push((name.to_string(), column.dtype().clone())),
            }
        }
    }

    let mut stacked: Option<DataFrame> = None;
    for frame in frames {
        let height = frame.height();
        let mut columns = Vec::with_capacity(order.len());
        for (name, dtype) in &order {
            let series = match frame.column(name) {
                Ok(column) if column.dtype() == dtype => column.as_materialized_series().clone(),
                Ok(_) => {
                    let values = text_values(&frame, name)?;
                    Series::new(name.as_str().into(), values)
                }
                Err(_) => Series::full_null(name.as_str().into(), height, dtype),
            };
            columns.push(series.into_column());
        }

        let aligned = DataFrame::new(columns)?;
        match stacked.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&aligned)?;
            }
            None => stacked = Some(aligned),
        }
    }

    Ok(stacked.unwrap_or_default())
}
