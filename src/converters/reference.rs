use super::{ConversionContext, Converter};
use crate::constants::REFERENCE_COLUMN;
use crate::error::Result;
use polars::prelude::*;

/// Removes the `REFERENCE` column once no converter needs it
pub struct ReferenceConverter;

impl Converter for ReferenceConverter {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn convert(&self, table: &DataFrame, _context: &ConversionContext<'_>) -> Result<DataFrame> {
        if table.column(REFERENCE_COLUMN).is_err() {
            return Ok(table.clone());
        }
        Ok(table.drop(REFERENCE_COLUMN)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioOrigins;

    #[test]
    fn test_reference_removal_is_idempotent() {
        let table = DataFrame::new(vec![
            Series::new("A".into(), &[1.0]).into_column(),
            Series::new(REFERENCE_COLUMN.into(), &["R1"]).into_column(),
        ])
        .unwrap();
        let origins = ScenarioOrigins::default();
        let context = ConversionContext {
            category: "A",
            origins: &origins,
            numeric_columns: vec!["A".to_string()],
        };

        let once = ReferenceConverter.convert(&table, &context).unwrap();
        let twice = ReferenceConverter.convert(&once, &context).unwrap();

        assert_eq!(once.get_column_names(), vec!["A"]);
        assert!(once.equals_missing(&twice));
    }
}
