//! Error handling for MER import and conversion operations.
//!
//! Provides error types with context for file parsing, tactical scenario
//! resolution, unit conversion, preset application and export failures.

use crate::constants::IMPORT_FAILED;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid preset format: {0}")]
    PresetFormat(#[from] serde_json::Error),

    #[error("Can only import .txt & .zip. Invalid file: {path}")]
    UnsupportedFile { path: PathBuf },

    #[error("Parsing failed for file: {path} - {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    #[error("No valid data found")]
    NoValidData,

    #[error("No tactical scenario found for references: {}", references.join(", "))]
    MissingTacticalScenario { references: Vec<String> },

    #[error("Conversion '{converter}' failed for {table}: {reason}")]
    ConversionFailed {
        converter: String,
        table: String,
        reason: String,
    },

    #[error("Columns do not match: '{column}' has no partner column '{expected}'")]
    ColumnMismatch { column: String, expected: String },

    #[error("Identifier {identifier} not found!")]
    IdentifierNotFound { identifier: String },

    #[error("Column {column} not found!")]
    ColumnNotFound { column: String },

    #[error("Export to {path} failed - {reason}")]
    ExportFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("{task} task aborted: {reason}")]
    TaskAborted { task: String, reason: String },
}

impl MerError {
    /// Short message reported to the caller of a session
    pub fn user_message(&self) -> String {
        match self {
            MerError::MissingTacticalScenario { .. } => IMPORT_FAILED.to_string(),
            MerError::PresetFormat(_) => {
                "The preset you've selected is not a valid JSON file.".to_string()
            }
            MerError::IdentifierNotFound { .. }
            | MerError::ColumnNotFound { .. }
            | MerError::NoValidData
            | MerError::UnsupportedFile { .. } => self.to_string(),
            MerError::Configuration { message } => message.clone(),
            MerError::ExportFailed { .. } => format!("Export failed: {}", self),
            other => format!("Something went wrong: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, MerError>;
