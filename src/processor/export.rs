//! Export phase: presets, identifier selection and workbook writing.
//!
//! A workbook is a destination that receives one sheet per category. The
//! bundled [`CsvSheetDirectory`] does not produce a single spreadsheet
//! file: it writes every sheet as `<category>.csv` into a directory.

use crate::constants::PRESET_EXTENSION;
use crate::error::{MerError, Result};
use crate::models::MerData;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ordered column selection per category
pub type Preset = BTreeMap<String, Vec<String>>;

/// What to export and how
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Preset name or path
    pub preset: Option<String>,
    /// Only export these categories
    pub identifiers: Option<Vec<String>>,
}

/// Path of a preset given by name or by path.
///
/// Anything that looks like a path (has a `.json` extension or a parent
/// directory) is used as is; a bare name resolves inside `preset_dir`.
pub fn preset_path(preset: &str, preset_dir: &Path) -> PathBuf {
    let candidate = Path::new(preset);
    let has_extension = candidate
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PRESET_EXTENSION));
    let has_parent = candidate
        .parent()
        .is_some_and(|parent| !parent.as_os_str().is_empty());

    if has_extension || has_parent {
        candidate.to_path_buf()
    } else {
        preset_dir.join(format!("{}.{}", preset, PRESET_EXTENSION))
    }
}

/// Read and parse a preset file
pub fn load_preset(preset: &str, preset_dir: &Path) -> Result<Preset> {
    let path = preset_path(preset, preset_dir);
    debug!("Loading preset from {}", path.display());
    let contents = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Keep only the preset's categories, each reduced to its preset columns
/// in preset order.
pub fn apply_preset(data: &MerData, preset: &Preset) -> Result<MerData> {
    let mut selected = MerData::new();

    for (identifier, columns) in preset {
        let table = data
            .get(identifier)
            .ok_or_else(|| MerError::IdentifierNotFound {
                identifier: identifier.clone(),
            })?;
        if let Some(missing) = columns
            .iter()
            .find(|column| table.frame().column(column.as_str()).is_err())
        {
            return Err(MerError::ColumnNotFound {
                column: missing.clone(),
            });
        }

        let frame = table.frame().select(columns.iter().map(String::as_str))?;
        selected.insert(identifier.clone(), table.with_frame(frame));
    }

    Ok(selected)
}

/// Restrict a batch to the chosen identifiers; at least one must exist
pub fn select_identifiers(data: &MerData, identifiers: &[String]) -> Result<MerData> {
    let selected: MerData = data
        .iter()
        .filter(|(name, _)| identifiers.contains(name))
        .map(|(name, table)| (name.clone(), table.clone()))
        .collect();

    if selected.is_empty() {
        return Err(MerError::Configuration {
            message: "Select at least 1 Identifier".to_string(),
        });
    }
    Ok(selected)
}

/// Destination receiving one sheet per category
pub trait WorkbookWriter: Send + Sync {
    /// Write one category table as a sheet named `sheet`
    fn write_sheet(&self, destination: &Path, sheet: &str, frame: &DataFrame) -> Result<()>;
}

/// Writes every sheet as a CSV file inside the destination directory.
///
/// Stands in for a spreadsheet writer; other formats plug in through
/// [`WorkbookWriter`].
#[derive(Debug, Clone, Default)]
pub struct CsvSheetDirectory;

impl CsvSheetDirectory {
    /// File a sheet is written to
    pub fn sheet_path(destination: &Path, sheet: &str) -> PathBuf {
        let file_name: String = sheet
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        destination.join(format!("{}.csv", file_name))
    }
}

impl WorkbookWriter for CsvSheetDirectory {
    fn write_sheet(&self, destination: &Path, sheet: &str, frame: &DataFrame) -> Result<()> {
        fs::create_dir_all(destination)?;
        let path = Self::sheet_path(destination, sheet);

        let mut file = File::create(&path)?;
        let mut frame = frame.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut frame)
            .map_err(|e| MerError::ExportFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}

/// Write every category of a batch; returns the number of rows written.
///
/// The batch is only read, so a failed export leaves it usable.
pub fn export(
    data: &MerData,
    destination: &Path,
    writer: &dyn WorkbookWriter,
    mut on_busy: impl FnMut(String),
) -> Result<usize> {
    on_busy("Start export".to_string());
    on_busy(format!("Exporting to {}", destination.display()));

    let mut rows = 0;
    for (name, table) in data {
        writer
            .write_sheet(destination, name, table.frame())
            .map_err(|e| match e {
                MerError::ExportFailed { .. } => e,
                other => MerError::ExportFailed {
                    path: destination.to_path_buf(),
                    reason: other.to_string(),
                },
            })?;
        debug!("Wrote sheet {} ({} rows)", name, table.height());
        rows += table.height();
    }

    info!(
        "Exported {} categories to {}",
        data.len(),
        destination.display()
    );
    on_busy("Export success".to_string());
    Ok(rows)
}
