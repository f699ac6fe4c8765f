//! Unit converters applied to category tables.
//!
//! Each converter is a stateless transformation of one table. Converters
//! never edit their input; they return a new frame, or an error that
//! leaves the input as it was. A converter that does not apply to a
//! category returns the table unchanged.

pub mod coordinates;
pub mod distance;
pub mod geodesy;
pub mod heading;
pub mod reference;
pub mod sonic;
pub mod time;

pub use coordinates::{DegreesToCoordinatesConverter, YardsToCoordinatesConverter};
pub use distance::YardsToNauticalMilesConverter;
pub use heading::HeadingConverter;
pub use reference::ReferenceConverter;
pub use sonic::SonicConverter;
pub use time::TimeConverter;

use crate::constants::REFERENCE_COLUMN;
use crate::error::{MerError, Result};
use crate::models::Origin;
use crate::scenario::ScenarioOrigins;
use crate::schema::text_values;
use polars::prelude::*;
use regex::Regex;

/// Shared inputs of one converter run over one table
#[derive(Debug, Clone)]
pub struct ConversionContext<'a> {
    /// Category label of the table
    pub category: &'a str,
    /// Origins captured before any conversion ran
    pub origins: &'a ScenarioOrigins,
    /// Numeric columns of the table as it enters this converter
    pub numeric_columns: Vec<String>,
}

impl ConversionContext<'_> {
    /// Numeric columns whose name matches `pattern`
    pub fn numeric_matching(&self, pattern: &Regex) -> Vec<String> {
        self.numeric_columns
            .iter()
            .filter(|name| pattern.is_match(name))
            .cloned()
            .collect()
    }

    /// Origin of the source a row came from
    pub fn origin_for(&self, reference: Option<&str>) -> Result<Origin> {
        let reference = reference.unwrap_or_default();
        self.origins
            .get(reference)
            .ok_or_else(|| MerError::MissingTacticalScenario {
                references: vec![reference.to_string()],
            })
    }
}

/// One stage of the conversion chain
pub trait Converter: Send + Sync {
    /// Stable name used in logs and failure reports
    fn name(&self) -> &'static str;

    fn convert(&self, table: &DataFrame, context: &ConversionContext<'_>) -> Result<DataFrame>;
}

/// The fixed conversion order.
///
/// Time normalization runs before the sonic pairing that reads `TIME_`;
/// reference removal runs last since every origin lookup needs `REFERENCE`.
pub fn default_chain() -> Vec<Box<dyn Converter>> {
    vec![
        Box::new(TimeConverter),
        Box::new(SonicConverter),
        Box::new(HeadingConverter),
        Box::new(YardsToNauticalMilesConverter),
        Box::new(YardsToCoordinatesConverter),
        Box::new(DegreesToCoordinatesConverter),
        Box::new(ReferenceConverter),
    ]
}

/// `REFERENCE` values of a table, all null when the column is absent
pub(crate) fn row_references(table: &DataFrame) -> Result<Vec<Option<String>>> {
    if table.column(REFERENCE_COLUMN).is_err() {
        return Ok(vec![None; table.height()]);
    }
    text_values(table, REFERENCE_COLUMN)
}

/// Fail with a missing column error unless `name` exists
pub(crate) fn require_column(table: &DataFrame, name: &str) -> Result<()> {
    table
        .column(name)
        .map(|_| ())
        .map_err(|_| MerError::ColumnNotFound {
            column: name.to_string(),
        })
}
