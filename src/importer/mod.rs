//! Import phase: dump files to category tables.
//!
//! Each file is parsed, stamped with its reference, cleaned and typed on
//! its own. Files that fail are logged and left out of the batch; the
//! surviving tables are merged and partitioned by identifier.

pub mod cleaning;
pub mod discovery;
pub mod partition;
pub mod record_parser;
pub mod reference;

pub use discovery::{
    discover_bulk_inputs, expand_inputs, is_valid_input, release_extraction_dir,
};
pub use partition::partition;
pub use reference::reference_for;

use crate::config::MerConfig;
use crate::constants::REFERENCE_COLUMN;
use crate::error::{MerError, Result};
use crate::models::MerData;
use crate::schema::{align_frames, coerce_numeric_columns, text_values};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Result of importing one batch of paths
#[derive(Debug)]
pub struct ImportedBatch {
    pub data: MerData,
    /// Distinct references of the batch in import order
    pub references: Vec<String>,
    pub files_imported: usize,
    pub failures: Vec<(PathBuf, String)>,
}

/// Parse one dump into a typed table stamped with its reference
pub fn import_file(path: &Path, config: &MerConfig) -> Result<DataFrame> {
    let table = record_parser::parse_file(path)?;
    let reference = reference_for(path, config.reference_prefix_len);
    let table = reference::stamp_reference(&table, &reference)?;
    let table = cleaning::assemble_date_time(&table)?;
    coerce_numeric_columns(&table, &partition::TEXT_COLUMNS)
}

/// Import every path of a batch.
///
/// `on_busy` receives a progress line per file. Fails with
/// [`MerError::NoValidData`] when no file yields data.
pub fn import_paths(
    paths: &[PathBuf],
    config: &MerConfig,
    mut on_busy: impl FnMut(String),
) -> Result<ImportedBatch> {
    let inputs = expand_inputs(paths, &config.extraction_dir)?;

    let mut frames = Vec::with_capacity(inputs.files.len());
    let mut failures = Vec::new();

    for path in &inputs.files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        on_busy(format!("Importing {}", name));

        match import_file(path, config) {
            Ok(frame) => frames.push(frame),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                failures.push((path.clone(), e.to_string()));
            }
        }
    }

    // Extracted files are no longer needed once parsed
    drop(inputs);

    if frames.is_empty() {
        return Err(MerError::NoValidData);
    }
    let files_imported = frames.len();

    let merged = align_frames(frames)?;
    let references = distinct_references(&merged)?;
    let data = partition(&merged)?;

    debug!(
        "Imported {} files, {} references, {} categories",
        files_imported,
        references.len(),
        data.len()
    );

    Ok(ImportedBatch {
        data,
        references,
        files_imported,
        failures,
    })
}

fn distinct_references(frame: &DataFrame) -> Result<Vec<String>> {
    let mut references: Vec<String> = Vec::new();
    for value in text_values(frame, REFERENCE_COLUMN)?.into_iter().flatten() {
        if !references.contains(&value) {
            references.push(value);
        }
    }
    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DATE_COLUMN, TIME_COLUMN};
    use crate::schema::f64_values;
    use std::fs;
    use tempfile::TempDir;

    const SONIC_DUMP: &str = "\
--
EVENT NUMBER: 1
EVENT HEADER - IDENTIFIER: SONIC
EVENT HEADER - TIME (YY): 19
EVENT HEADER - TIME (MM): 03
EVENT HEADER - TIME (DD): 05
EVENT HEADER - TIME (HH): 10
EVENT HEADER - TIME (MM): 15
EVENT HEADER - TIME (SS): 30
PING ON/OFF STAT: ON
RANGE: 5000
--
EVENT NUMBER: 2
EVENT HEADER - IDENTIFIER: TACTICAL_SCENARIO
GRID CENTER LAT: 50.08451
GRID CENTER LONG: -5.243314
--
";

    fn config(temp_dir: &TempDir) -> MerConfig {
        MerConfig::default().with_extraction_dir(temp_dir.path().join("extract"))
    }

    #[test]
    fn test_import_file_builds_typed_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("20190305_sortie.txt");
        fs::write(&path, SONIC_DUMP).unwrap();

        let table = import_file(&path, &config(&temp_dir)).unwrap();
        let names: Vec<String> = table
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();

        assert_eq!(names[0], DATE_COLUMN);
        assert_eq!(names[1], TIME_COLUMN);
        assert!(names.iter().all(|n| !n.starts_with("EVENT HEADER - TIME")));
        assert_eq!(
            text_values(&table, REFERENCE_COLUMN).unwrap(),
            vec![Some("20190305".to_string()), Some("20190305".to_string())]
        );
        assert_eq!(
            f64_values(&table, "RANGE").unwrap(),
            vec![Some(5000.0), None]
        );
        assert_eq!(table.column("RANGE").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_import_paths_skips_bad_files() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("20190305_good.txt");
        let bad = temp_dir.path().join("20190306_bad.txt");
        fs::write(&good, SONIC_DUMP).unwrap();
        fs::write(&bad, "no events in here\n").unwrap();

        let mut busy = Vec::new();
        let batch = import_paths(&[good, bad], &config(&temp_dir), |text| busy.push(text)).unwrap();

        assert_eq!(batch.files_imported, 1);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.references, vec!["20190305"]);
        assert_eq!(
            batch.data.keys().collect::<Vec<_>>(),
            vec!["SONIC", "TACTICAL_SCENARIO"]
        );
        assert_eq!(busy.len(), 2);
        assert!(busy[0].starts_with("Importing "));
    }

    #[test]
    fn test_import_paths_without_valid_files() {
        let temp_dir = TempDir::new().unwrap();
        let bad = temp_dir.path().join("bad.txt");
        fs::write(&bad, "").unwrap();

        let result = import_paths(&[bad], &config(&temp_dir), |_| {});
        assert!(matches!(result, Err(MerError::NoValidData)));
    }
}
