//! Tactical scenario resolution.
//!
//! Every reference of a batch needs one geodetic origin before offsets can
//! be converted. Origins come from the `TACTICAL_SCENARIO` category; missing
//! ones are mocked, skipped or reported depending on the caller's policy.

use crate::constants::{
    GRID_CENTER_LAT, GRID_CENTER_LONG, IDENTIFIER_COLUMN, REFERENCE_COLUMN, TACTICAL_SCENARIO,
};
use crate::error::{MerError, Result};
use crate::models::{IdentifierTable, MerData, Origin, ScenarioPolicy};
use crate::schema::{align_frames, f64_values, filter_rows, text_values};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Origins of a batch keyed by reference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioOrigins {
    origins: BTreeMap<String, Origin>,
}

impl ScenarioOrigins {
    /// Read origins from a `TACTICAL_SCENARIO` table; the first row of a
    /// reference wins
    pub fn from_table(table: &IdentifierTable) -> Result<Self> {
        let frame = table.frame();
        let mut origins = BTreeMap::new();

        if frame.column(REFERENCE_COLUMN).is_err()
            || frame.column(GRID_CENTER_LAT).is_err()
            || frame.column(GRID_CENTER_LONG).is_err()
        {
            return Ok(Self { origins });
        }

        let references = text_values(frame, REFERENCE_COLUMN)?;
        let latitudes = f64_values(frame, GRID_CENTER_LAT)?;
        let longitudes = f64_values(frame, GRID_CENTER_LONG)?;

        for ((reference, latitude), longitude) in references.into_iter().zip(latitudes).zip(longitudes)
        {
            let (Some(reference), Some(latitude), Some(longitude)) = (reference, latitude, longitude)
            else {
                continue;
            };
            if origins.contains_key(&reference) {
                warn!("Duplicate tactical scenario for {}, keeping the first", reference);
                continue;
            }
            origins.insert(reference, Origin::new(latitude, longitude));
        }

        Ok(Self { origins })
    }

    /// Origins of a partitioned batch; empty when it has no scenario table
    pub fn from_data(data: &MerData) -> Result<Self> {
        match data.get(TACTICAL_SCENARIO) {
            Some(table) => Self::from_table(table),
            None => Ok(Self::default()),
        }
    }

    pub fn get(&self, reference: &str) -> Option<Origin> {
        self.origins.get(reference).copied()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.origins.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Origin)> {
        self.origins.iter()
    }
}

/// Asks the user whether missing scenarios may be mocked
pub trait ScenarioConfirmation: Send + Sync {
    fn confirm_mock(&self, missing: &[String]) -> bool;
}

/// Policy chosen by a confirmation: mock when accepted, abort otherwise
pub fn policy_from_confirmation(
    confirmation: &dyn ScenarioConfirmation,
    missing: &[String],
) -> ScenarioPolicy {
    if confirmation.confirm_mock(missing) {
        ScenarioPolicy::Mock
    } else {
        ScenarioPolicy::Strict
    }
}

/// Outcome of resolving a batch
#[derive(Debug)]
pub struct Resolution {
    pub data: MerData,
    pub mocked: Vec<String>,
    pub skipped: Vec<String>,
}

/// References of the batch without an origin, in batch order
pub fn missing_references(data: &MerData, references: &[String]) -> Result<Vec<String>> {
    let origins = ScenarioOrigins::from_data(data)?;
    Ok(references
        .iter()
        .filter(|reference| !origins.contains(reference))
        .cloned()
        .collect())
}

/// Make sure every reference has exactly one origin
pub fn resolve(data: MerData, references: &[String], policy: ScenarioPolicy) -> Result<Resolution> {
    let missing = missing_references(&data, references)?;
    if missing.is_empty() {
        return Ok(Resolution {
            data,
            mocked: Vec::new(),
            skipped: Vec::new(),
        });
    }

    match policy {
        ScenarioPolicy::Mock => {
            warn!("Mocking tactical scenario for {}", missing.join(", "));
            Ok(Resolution {
                data: mock_scenarios(data, &missing)?,
                mocked: missing,
                skipped: Vec::new(),
            })
        }
        ScenarioPolicy::Skip => {
            warn!("Skipping references without tactical scenario: {}", missing.join(", "));
            Ok(Resolution {
                data: skip_references(data, &missing)?,
                mocked: Vec::new(),
                skipped: missing,
            })
        }
        ScenarioPolicy::Strict => Err(MerError::MissingTacticalScenario { references: missing }),
    }
}

/// Add a zero origin row for every missing reference
pub fn mock_scenarios(mut data: MerData, missing: &[String]) -> Result<MerData> {
    let count = missing.len();
    let mock = DataFrame::new(vec![
        Series::new(IDENTIFIER_COLUMN.into(), vec![TACTICAL_SCENARIO; count]).into_column(),
        Series::new(GRID_CENTER_LAT.into(), vec![0.0f64; count]).into_column(),
        Series::new(GRID_CENTER_LONG.into(), vec![0.0f64; count]).into_column(),
        Series::new(REFERENCE_COLUMN.into(), missing.to_vec()).into_column(),
    ])?;

    let table = match data.remove(TACTICAL_SCENARIO) {
        Some(existing) => {
            let merged = align_frames(vec![existing.frame().clone(), mock])?;
            existing.with_frame(merged)
        }
        None => IdentifierTable::new(TACTICAL_SCENARIO, mock),
    };
    data.insert(TACTICAL_SCENARIO.to_string(), table);
    Ok(data)
}

/// Drop every row of the given references
pub fn skip_references(data: MerData, missing: &[String]) -> Result<MerData> {
    let mut kept = MerData::new();

    for (name, table) in data {
        let frame = table.frame();
        if frame.column(REFERENCE_COLUMN).is_err() {
            kept.insert(name, table);
            continue;
        }

        let mask: Vec<bool> = text_values(frame, REFERENCE_COLUMN)?
            .iter()
            .map(|reference| {
                reference
                    .as_ref()
                    .is_none_or(|reference| !missing.contains(reference))
            })
            .collect();
        let filtered = filter_rows(frame, &mask)?;

        if filtered.height() == 0 {
            info!("Category {} has no rows left", name);
            continue;
        }
        let next = table.with_frame(filtered);
        kept.insert(name, next);
    }

    if kept.keys().all(|name| name == TACTICAL_SCENARIO) {
        return Err(MerError::NoValidData);
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, references: &[&str]) -> IdentifierTable {
        let frame = DataFrame::new(vec![
            Series::new(IDENTIFIER_COLUMN.into(), vec![name; references.len()]).into_column(),
            Series::new(REFERENCE_COLUMN.into(), references.to_vec()).into_column(),
        ])
        .unwrap();
        IdentifierTable::new(name, frame)
    }

    fn scenario(rows: &[(&str, f64, f64)]) -> IdentifierTable {
        let frame = DataFrame::new(vec![
            Series::new(IDENTIFIER_COLUMN.into(), vec![TACTICAL_SCENARIO; rows.len()])
                .into_column(),
            Series::new(
                GRID_CENTER_LAT.into(),
                rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            )
            .into_column(),
            Series::new(
                GRID_CENTER_LONG.into(),
                rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            )
            .into_column(),
            Series::new(
                REFERENCE_COLUMN.into(),
                rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            )
            .into_column(),
        ])
        .unwrap();
        IdentifierTable::new(TACTICAL_SCENARIO, frame)
    }

    fn batch(tables: Vec<IdentifierTable>) -> MerData {
        tables
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect()
    }

    fn refs(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    struct Answer(bool);

    impl ScenarioConfirmation for Answer {
        fn confirm_mock(&self, _missing: &[String]) -> bool {
            self.0
        }
    }

    #[test]
    fn test_mock_without_scenario_table() {
        let data = batch(vec![category("SONIC", &["R1", "R2"])]);
        let resolution = resolve(data, &refs(&["R1", "R2"]), ScenarioPolicy::Mock).unwrap();

        assert_eq!(resolution.mocked, refs(&["R1", "R2"]));
        let origins = ScenarioOrigins::from_data(&resolution.data).unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins.get("R1"), Some(Origin::zero()));
        assert_eq!(origins.get("R2"), Some(Origin::zero()));
        assert_eq!(resolution.data[TACTICAL_SCENARIO].height(), 2);
    }

    #[test]
    fn test_mock_only_adds_missing_references() {
        let data = batch(vec![
            category("SONIC", &["R1", "R2"]),
            scenario(&[("R1", 50.0, -5.0)]),
        ]);
        let resolution = resolve(data, &refs(&["R1", "R2"]), ScenarioPolicy::Mock).unwrap();

        let origins = ScenarioOrigins::from_data(&resolution.data).unwrap();
        assert_eq!(origins.get("R1"), Some(Origin::new(50.0, -5.0)));
        assert_eq!(origins.get("R2"), Some(Origin::zero()));
        assert_eq!(resolution.data[TACTICAL_SCENARIO].revision(), 1);
    }

    #[test]
    fn test_complete_batch_is_untouched() {
        let data = batch(vec![
            category("SONIC", &["R1"]),
            scenario(&[("R1", 50.0, -5.0)]),
        ]);
        let resolution = resolve(data, &refs(&["R1"]), ScenarioPolicy::Strict).unwrap();
        assert!(resolution.mocked.is_empty());
        assert!(resolution.skipped.is_empty());
        assert_eq!(resolution.data[TACTICAL_SCENARIO].revision(), 0);
    }

    #[test]
    fn test_strict_reports_missing_references() {
        let data = batch(vec![
            category("SONIC", &["R1", "R2"]),
            scenario(&[("R1", 50.0, -5.0)]),
        ]);
        match resolve(data, &refs(&["R1", "R2"]), ScenarioPolicy::Strict) {
            Err(MerError::MissingTacticalScenario { references }) => {
                assert_eq!(references, refs(&["R2"]))
            }
            other => panic!("Expected MissingTacticalScenario, got {:?}", other.map(|r| r.mocked)),
        }
    }

    #[test]
    fn test_skip_drops_rows_and_empty_categories() {
        let data = batch(vec![
            category("SONIC", &["R1", "R2"]),
            category("SONOBUOY", &["R2"]),
            scenario(&[("R1", 50.0, -5.0)]),
        ]);
        let resolution = resolve(data, &refs(&["R1", "R2"]), ScenarioPolicy::Skip).unwrap();

        assert_eq!(resolution.skipped, refs(&["R2"]));
        assert!(!resolution.data.contains_key("SONOBUOY"));
        assert_eq!(resolution.data["SONIC"].height(), 1);
        assert_eq!(resolution.data["SONIC"].references().unwrap(), refs(&["R1"]));
    }

    #[test]
    fn test_skip_everything_has_no_valid_data() {
        let data = batch(vec![category("SONIC", &["R1"])]);
        let result = resolve(data, &refs(&["R1"]), ScenarioPolicy::Skip);
        assert!(matches!(result, Err(MerError::NoValidData)));
    }

    #[test]
    fn test_duplicate_scenarios_keep_first() {
        let table = scenario(&[("R1", 1.0, 2.0), ("R1", 3.0, 4.0)]);
        let origins = ScenarioOrigins::from_table(&table).unwrap();
        assert_eq!(origins.len(), 1);
        assert_eq!(origins.get("R1"), Some(Origin::new(1.0, 2.0)));
    }

    #[test]
    fn test_confirmation_selects_policy() {
        let missing = refs(&["R1"]);
        assert_eq!(
            policy_from_confirmation(&Answer(true), &missing),
            ScenarioPolicy::Mock
        );
        assert_eq!(
            policy_from_confirmation(&Answer(false), &missing),
            ScenarioPolicy::Strict
        );
    }
}
