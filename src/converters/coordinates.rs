//! Coordinate pair converters.
//!
//! Pairs are found by column name: an X column is matched with the column
//! that has `Y` in place of the standalone `X` token, a LAT column with the
//! one that has `LONG` in place of `LAT`. A pair with a missing partner
//! fails the whole conversion.

use super::geodesy::{format_latitude, format_longitude, yards_to_degrees};
use super::{ConversionContext, Converter, row_references};
use crate::error::{MerError, Result};
use crate::schema::{f64_values, format_number, with_series};
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

static X_COLUMN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bX").unwrap());
static X_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bX\b").unwrap());
static LAT_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bLAT(ITUDE)?\b").unwrap());

/// Pair every candidate column with its partner
fn find_pairs(
    table: &DataFrame,
    candidates: Vec<String>,
    partner_of: impl Fn(&str) -> String,
) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(candidates.len());
    for column in candidates {
        let partner = partner_of(&column);
        if partner == column || table.column(&partner).is_err() {
            return Err(MerError::ColumnMismatch {
                column,
                expected: partner,
            });
        }
        pairs.push((column, partner));
    }
    Ok(pairs)
}

/// `POS1 X` -> `POS1 Y`, `X POS2` -> `Y POS2`
pub fn y_partner(x_column: &str) -> String {
    X_TOKEN.replace_all(x_column, "Y").into_owned()
}

/// `POS1 LAT` -> `POS1 LONG`, `LATITUDE` -> `LONGITUDE`
pub fn long_partner(lat_column: &str) -> String {
    LAT_TOKEN
        .replace_all(lat_column, |caps: &regex::Captures| {
            if caps.get(1).is_some() {
                "LONGITUDE".to_string()
            } else {
                "LONG".to_string()
            }
        })
        .into_owned()
}

/// Raw cell text for values that are not converted
fn passthrough(value: Option<f64>) -> Option<String> {
    value.map(format_number)
}

/// X/Y yard offsets become formatted coordinates around the row's origin
pub struct YardsToCoordinatesConverter;

impl Converter for YardsToCoordinatesConverter {
    fn name(&self) -> &'static str {
        "yards_to_coordinates"
    }

    fn convert(&self, table: &DataFrame, context: &ConversionContext<'_>) -> Result<DataFrame> {
        let pairs = find_pairs(table, context.numeric_matching(&X_COLUMN), y_partner)?;
        if pairs.is_empty() {
            return Ok(table.clone());
        }

        let references = row_references(table)?;
        let mut converted = table.clone();

        for (x_column, y_column) in pairs {
            let xs = f64_values(table, &x_column)?;
            let ys = f64_values(table, &y_column)?;

            let mut latitudes = Vec::with_capacity(xs.len());
            let mut longitudes = Vec::with_capacity(ys.len());
            for ((x, y), reference) in xs.into_iter().zip(ys).zip(&references) {
                let (Some(x_yards), Some(y_yards)) = (x, y) else {
                    latitudes.push(passthrough(x));
                    longitudes.push(passthrough(y));
                    continue;
                };
                if x_yards == 0.0 || y_yards == 0.0 {
                    latitudes.push(passthrough(x));
                    longitudes.push(passthrough(y));
                    continue;
                }

                let origin = context.origin_for(reference.as_deref())?;
                match yards_to_degrees(x_yards, y_yards, origin) {
                    Some((latitude, longitude)) => {
                        latitudes.push(Some(format_latitude(latitude)));
                        longitudes.push(Some(format_longitude(longitude)));
                    }
                    None => {
                        latitudes.push(passthrough(x));
                        longitudes.push(passthrough(y));
                    }
                }
            }

            converted = with_series(&converted, Series::new(x_column.as_str().into(), latitudes))?;
            converted = with_series(&converted, Series::new(y_column.as_str().into(), longitudes))?;
        }

        Ok(converted)
    }
}

/// Decimal-degree LAT/LONG pairs become formatted coordinates
pub struct DegreesToCoordinatesConverter;

impl Converter for DegreesToCoordinatesConverter {
    fn name(&self) -> &'static str {
        "degrees_to_coordinates"
    }

    fn convert(&self, table: &DataFrame, context: &ConversionContext<'_>) -> Result<DataFrame> {
        let pairs = find_pairs(table, context.numeric_matching(&LAT_TOKEN), long_partner)?;
        let mut converted = table.clone();

        for (lat_column, long_column) in pairs {
            let lats = f64_values(table, &lat_column)?;
            let longs = f64_values(table, &long_column)?;

            let (latitudes, longitudes): (Vec<Option<String>>, Vec<Option<String>>) = lats
                .into_iter()
                .zip(longs)
                .map(|pair| match pair {
                    (Some(lat), Some(long)) => {
                        (Some(format_latitude(lat)), Some(format_longitude(long)))
                    }
                    (lat, long) => (passthrough(lat), passthrough(long)),
                })
                .unzip();

            converted =
                with_series(&converted, Series::new(lat_column.as_str().into(), latitudes))?;
            converted =
                with_series(&converted, Series::new(long_column.as_str().into(), longitudes))?;
        }

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{GRID_CENTER_LAT, GRID_CENTER_LONG, REFERENCE_COLUMN};
    use crate::models::{IdentifierTable, Origin};
    use crate::scenario::ScenarioOrigins;
    use crate::schema::{numeric_columns, text_values};

    fn origins() -> ScenarioOrigins {
        let frame = DataFrame::new(vec![
            Series::new(GRID_CENTER_LAT.into(), &[50.08451]).into_column(),
            Series::new(GRID_CENTER_LONG.into(), &[-5.243314]).into_column(),
            Series::new(REFERENCE_COLUMN.into(), &["R1"]).into_column(),
        ])
        .unwrap();
        let origins = ScenarioOrigins::from_table(&IdentifierTable::new("TACTICAL_SCENARIO", frame))
            .unwrap();
        assert_eq!(origins.get("R1"), Some(Origin::new(50.08451, -5.243314)));
        origins
    }

    fn offsets() -> DataFrame {
        DataFrame::new(vec![
            Series::new("POS1 X".into(), &[36.94333]).into_column(),
            Series::new("POS1 Y".into(), &[-258.8558]).into_column(),
            Series::new("X POS2".into(), &[13.64571]).into_column(),
            Series::new("Y POS2".into(), &[-248.5793]).into_column(),
            Series::new("POS3X".into(), &[-793.2684]).into_column(),
            Series::new("POS3Y".into(), &[93.98272]).into_column(),
            Series::new(REFERENCE_COLUMN.into(), &["R1"]).into_column(),
        ])
        .unwrap()
    }

    fn text(frame: &DataFrame, name: &str) -> Option<String> {
        text_values(frame, name).unwrap()[0].clone()
    }

    #[test]
    fn test_partner_names() {
        assert_eq!(y_partner("POS1 X"), "POS1 Y");
        assert_eq!(y_partner("X POS2"), "Y POS2");
        assert_eq!(long_partner("POS1 LAT"), "POS1 LONG");
        assert_eq!(long_partner("LAT POS2"), "LONG POS2");
        assert_eq!(long_partner("LATITUDE"), "LONGITUDE");
    }

    #[test]
    fn test_yards_to_coordinates() {
        let table = offsets();
        let origins = origins();
        let context = ConversionContext {
            category: "OWN_HELO",
            origins: &origins,
            numeric_columns: numeric_columns(&table),
        };

        let converted = YardsToCoordinatesConverter.convert(&table, &context).unwrap();
        assert_eq!(text(&converted, "POS1 X").as_deref(), Some("N 50° 04.94'"));
        assert_eq!(text(&converted, "POS1 Y").as_deref(), Some("W 005° 14.57'"));
        assert_eq!(text(&converted, "X POS2").as_deref(), Some("N 50° 04.95'"));
        assert_eq!(text(&converted, "Y POS2").as_deref(), Some("W 005° 14.59'"));
        assert_eq!(
            f64_values(&converted, "POS3X").unwrap(),
            vec![Some(-793.2684)]
        );
        assert_eq!(converted.get_column_names(), table.get_column_names());
    }

    #[test]
    fn test_zero_and_null_offsets_pass_through() {
        let table = DataFrame::new(vec![
            Series::new("POS1 X".into(), &[Some(0.0), None]).into_column(),
            Series::new("POS1 Y".into(), &[Some(12.0), Some(3.0)]).into_column(),
            Series::new(REFERENCE_COLUMN.into(), &["R9", "R9"]).into_column(),
        ])
        .unwrap();
        let origins = ScenarioOrigins::default();
        let context = ConversionContext {
            category: "OWN_HELO",
            origins: &origins,
            numeric_columns: numeric_columns(&table),
        };

        let converted = YardsToCoordinatesConverter.convert(&table, &context).unwrap();
        assert_eq!(
            text_values(&converted, "POS1 X").unwrap(),
            vec![Some("0".to_string()), None]
        );
        assert_eq!(
            text_values(&converted, "POS1 Y").unwrap(),
            vec![Some("12".to_string()), Some("3".to_string())]
        );
    }

    #[test]
    fn test_mismatched_x_column_fails() {
        let mut table = offsets();
        table.rename("X POS2", "FAKE COL X".into()).unwrap();
        let origins = origins();
        let context = ConversionContext {
            category: "OWN_HELO",
            origins: &origins,
            numeric_columns: numeric_columns(&table),
        };

        match YardsToCoordinatesConverter.convert(&table, &context) {
            Err(MerError::ColumnMismatch { column, expected }) => {
                assert_eq!(column, "FAKE COL X");
                assert_eq!(expected, "FAKE COL Y");
            }
            other => panic!("Expected ColumnMismatch, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_degrees_to_coordinates() {
        let table = DataFrame::new(vec![
            Series::new("POS1 LAT".into(), &[53.12345]).into_column(),
            Series::new("POS1 LONG".into(), &[-8.12345]).into_column(),
            Series::new("LAT POS2".into(), &[48.12345]).into_column(),
            Series::new("LONG POS2".into(), &[-7.12345]).into_column(),
            Series::new("POS3LAT".into(), &[38.12345]).into_column(),
            Series::new("POS3LONG".into(), &[1.12345]).into_column(),
        ])
        .unwrap();
        let origins = ScenarioOrigins::default();
        let context = ConversionContext {
            category: "TRACK",
            origins: &origins,
            numeric_columns: numeric_columns(&table),
        };

        let converted = DegreesToCoordinatesConverter
            .convert(&table, &context)
            .unwrap();
        assert_eq!(text(&converted, "POS1 LAT").as_deref(), Some("N 53° 07.41'"));
        assert_eq!(text(&converted, "POS1 LONG").as_deref(), Some("W 008° 07.41'"));
        assert_eq!(text(&converted, "LAT POS2").as_deref(), Some("N 48° 07.41'"));
        assert_eq!(text(&converted, "LONG POS2").as_deref(), Some("W 007° 07.41'"));
        assert_eq!(f64_values(&converted, "POS3LAT").unwrap(), vec![Some(38.12345)]);
    }

    #[test]
    fn test_mismatched_lat_column_fails() {
        let table = DataFrame::new(vec![
            Series::new("FAKE COL LAT".into(), &[48.0]).into_column(),
            Series::new("LONG POS2".into(), &[-7.0]).into_column(),
        ])
        .unwrap();
        let origins = ScenarioOrigins::default();
        let context = ConversionContext {
            category: "TRACK",
            origins: &origins,
            numeric_columns: numeric_columns(&table),
        };
        assert!(matches!(
            DegreesToCoordinatesConverter.convert(&table, &context),
            Err(MerError::ColumnMismatch { .. })
        ));
    }
}
