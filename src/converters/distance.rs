use super::{ConversionContext, Converter};
use crate::error::Result;
use crate::schema::{f64_values, with_series};
use polars::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

static DISTANCE_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "LENGTH|RANGE|SECT RADIUS|DIST|STATION|JUMP|TSR|SIDE|AREA WIDTH|SPACE|MDR|PSR|SPACING",
    )
    .unwrap()
});
static NOT_A_DISTANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("MAST|MST|NS SIDE|EW SIDE").unwrap());

/// Distance units found in the dumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Yard,
    Metre,
    Kilometre,
    NauticalMile,
}

impl DistanceUnit {
    fn metres(self) -> f64 {
        match self {
            DistanceUnit::Yard => 0.9144,
            DistanceUnit::Metre => 1.0,
            DistanceUnit::Kilometre => 1000.0,
            DistanceUnit::NauticalMile => 1852.0,
        }
    }
}

pub fn convert_distance(value: f64, from: DistanceUnit, to: DistanceUnit) -> f64 {
    value * from.metres() / to.metres()
}

/// Yards to nautical miles, rounded to three decimals
pub fn yards_to_nautical_miles(yards: f64) -> f64 {
    let miles = convert_distance(yards, DistanceUnit::Yard, DistanceUnit::NauticalMile);
    (miles * 1000.0).round() / 1000.0
}

/// Range and length fields recorded in yards become nautical miles
pub struct YardsToNauticalMilesConverter;

impl Converter for YardsToNauticalMilesConverter {
    fn name(&self) -> &'static str {
        "yards_to_nm"
    }

    fn convert(&self, table: &DataFrame, context: &ConversionContext<'_>) -> Result<DataFrame> {
        let mut converted = table.clone();
        for name in context.numeric_matching(&DISTANCE_COLUMN) {
            if NOT_A_DISTANCE.is_match(&name) {
                continue;
            }
            let values: Vec<Option<f64>> = f64_values(table, &name)?
                .into_iter()
                .map(|value| value.map(yards_to_nautical_miles))
                .collect();
            converted = with_series(&converted, Series::new(name.as_str().into(), values))?;
        }
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioOrigins;
    use crate::schema::numeric_columns;

    #[test]
    fn test_yards_to_nautical_miles() {
        let cases = [
            (1.0, 0.0),
            (10.0, 0.005),
            (100.0, 0.049),
            (5000.0, 2.469),
            (6000.0, 2.962),
            (7000.0, 3.456),
            (8000.0, 3.95),
            (9000.0, 4.444),
        ];
        for (yards, miles) in cases {
            assert_eq!(yards_to_nautical_miles(yards), miles, "{} yd", yards);
        }
    }

    #[test]
    fn test_unit_table() {
        assert_eq!(
            convert_distance(1.0, DistanceUnit::NauticalMile, DistanceUnit::Metre),
            1852.0
        );
        assert_eq!(
            convert_distance(2.0, DistanceUnit::Kilometre, DistanceUnit::Metre),
            2000.0
        );
    }

    #[test]
    fn test_deny_list_is_respected() {
        let table = DataFrame::new(vec![
            Series::new("SONAR RANGE".into(), &[5000.0]).into_column(),
            Series::new("MAST LENGTH".into(), &[5000.0]).into_column(),
            Series::new("NS SIDE".into(), &[5000.0]).into_column(),
            Series::new("BOX SIDE".into(), &[5000.0]).into_column(),
            Series::new("DEPTH".into(), &[5000.0]).into_column(),
        ])
        .unwrap();
        let origins = ScenarioOrigins::default();
        let context = ConversionContext {
            category: "SONAR",
            origins: &origins,
            numeric_columns: numeric_columns(&table),
        };

        let converted = YardsToNauticalMilesConverter
            .convert(&table, &context)
            .unwrap();
        let value = |name: &str| f64_values(&converted, name).unwrap()[0];

        assert_eq!(value("SONAR RANGE"), Some(2.469));
        assert_eq!(value("BOX SIDE"), Some(2.469));
        assert_eq!(value("MAST LENGTH"), Some(5000.0));
        assert_eq!(value("NS SIDE"), Some(5000.0));
        assert_eq!(value("DEPTH"), Some(5000.0));
    }
}
