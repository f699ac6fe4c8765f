use super::{ConversionContext, Converter};
use crate::error::Result;
use crate::schema::{f64_values, with_series};
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

static HEADING_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("ORIENT|HEADING|DIR|BRG|COURSE|ANGLE| ANG |BEARING|DOA|CRS").unwrap()
});

/// Raw degrees become zero-padded whole-degree headings in `[0, 360)`
pub struct HeadingConverter;

impl Converter for HeadingConverter {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn convert(&self, table: &DataFrame, context: &ConversionContext<'_>) -> Result<DataFrame> {
        let mut converted = table.clone();
        for name in context.numeric_matching(&HEADING_COLUMN) {
            let values: Vec<Option<String>> = f64_values(table, &name)?
                .into_iter()
                .map(|value| value.and_then(normalize_heading))
                .collect();
            converted = with_series(&converted, Series::new(name.as_str().into(), values))?;
        }
        Ok(converted)
    }
}

/// Round to the nearest degree (ties to even) and wrap into `[0, 360)`
pub fn normalize_heading(degrees: f64) -> Option<String> {
    if !degrees.is_finite() {
        return None;
    }
    let wrapped = (degrees.round_ties_even() as i64).rem_euclid(360);
    Some(format!("{:03}", wrapped))
}
