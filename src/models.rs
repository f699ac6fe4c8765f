//! Core data structures and types for MER processing.
//!
//! Defines category tables, tactical scenario origins, resolution
//! policies, session states and processing statistics used throughout
//! the library.

use crate::constants::REFERENCE_COLUMN;
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One category table of an import batch.
///
/// Tables are owned values: every pipeline stage returns a new table
/// with a bumped revision instead of editing a shared frame.
#[derive(Debug, Clone)]
pub struct IdentifierTable {
    name: String,
    frame: DataFrame,
    revision: u32,
}

impl IdentifierTable {
    pub fn new(name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            name: name.into(),
            frame,
            revision: 0,
        }
    }

    /// Category label, e.g. `SONIC`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of stage results this table has gone through
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Replace the frame, producing the next revision
    pub fn with_frame(&self, frame: DataFrame) -> Self {
        Self {
            name: self.name.clone(),
            frame,
            revision: self.revision + 1,
        }
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Distinct references in first-seen order
    pub fn references(&self) -> Result<Vec<String>> {
        let Ok(column) = self.frame.column(REFERENCE_COLUMN) else {
            return Ok(Vec::new());
        };
        let values = column.as_materialized_series().str()?;

        let mut seen = Vec::new();
        for value in values.into_iter().flatten() {
            if !seen.iter().any(|known: &String| known == value) {
                seen.push(value.to_string());
            }
        }
        Ok(seen)
    }
}

/// Category label → table, ordered by label
pub type MerData = BTreeMap<String, IdentifierTable>;

/// Geodetic origin of one reference, in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub latitude: f64,
    pub longitude: f64,
}

impl Origin {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Placeholder origin used for mocked scenarios
    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// What to do with references that have no tactical scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioPolicy {
    /// Synthesize a zero origin for every missing reference
    Mock,
    /// Drop every row whose reference has no origin
    Skip,
    /// Abort the import
    Strict,
}

impl fmt::Display for ScenarioPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScenarioPolicy::Mock => "mock",
            ScenarioPolicy::Skip => "skip",
            ScenarioPolicy::Strict => "strict",
        };
        f.write_str(label)
    }
}

/// Lifecycle of one import/convert/export session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Importing,
    PartitionedAwaitingScenario,
    Converting,
    Converted,
    Exporting,
    Done,
    Failed(String),
}

impl SessionState {
    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: &SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Importing)
                | (Importing, PartitionedAwaitingScenario)
                | (Importing, Failed(_))
                | (PartitionedAwaitingScenario, Converting)
                | (PartitionedAwaitingScenario, Failed(_))
                | (Converting, Converted)
                | (Converting, Failed(_))
                | (Converted, Idle)
                | (Converted, Exporting)
                | (Exporting, Done)
                | (Exporting, Failed(_))
                | (Failed(_), Idle)
                | (Done, Idle)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done | SessionState::Failed(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::Importing => f.write_str("importing"),
            SessionState::PartitionedAwaitingScenario => f.write_str("awaiting scenario"),
            SessionState::Converting => f.write_str("converting"),
            SessionState::Converted => f.write_str("converted"),
            SessionState::Exporting => f.write_str("exporting"),
            SessionState::Done => f.write_str("done"),
            SessionState::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Processing statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub total_rows: usize,
    pub categories: usize,
    pub mocked_references: Vec<String>,
    pub skipped_references: Vec<String>,
    pub conversion_failures: usize,
    pub output_path: Option<PathBuf>,
    pub processing_time_ms: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_references(values: &[Option<&str>]) -> IdentifierTable {
        let frame = DataFrame::new(vec![
            Series::new(REFERENCE_COLUMN.into(), values.to_vec()).into_column(),
        ])
        .unwrap();
        IdentifierTable::new("SONIC", frame)
    }

    #[test]
    fn test_references_are_distinct_in_order() {
        let table = table_with_references(&[Some("R2"), None, Some("R1"), Some("R2")]);
        assert_eq!(table.references().unwrap(), vec!["R2", "R1"]);
    }

    #[test]
    fn test_references_without_column() {
        let frame = DataFrame::new(vec![Series::new("A".into(), &[1.0]).into_column()]).unwrap();
        let table = IdentifierTable::new("A", frame);
        assert!(table.references().unwrap().is_empty());
    }

    #[test]
    fn test_with_frame_bumps_revision() {
        let table = table_with_references(&[Some("R1")]);
        let next = table.with_frame(table.frame().clone());
        assert_eq!(table.revision(), 0);
        assert_eq!(next.revision(), 1);
        assert_eq!(next.name(), "SONIC");
    }

    #[test]
    fn test_session_transitions() {
        assert!(SessionState::Idle.can_transition_to(&SessionState::Importing));
        assert!(
            SessionState::Importing.can_transition_to(&SessionState::Failed("x".to_string()))
        );
        assert!(SessionState::Converted.can_transition_to(&SessionState::Idle));
        assert!(!SessionState::Idle.can_transition_to(&SessionState::Converting));
        assert!(!SessionState::Converted.can_transition_to(&SessionState::Importing));
        assert!(SessionState::Done.is_terminal());
    }
}
