//! MER Keeper Library
//!
//! Imports Mission Event Record (MER) dumps and turns them into readable
//! per-category tables.
//!
//! This library provides tools for:
//! - Parsing colon-delimited record dumps, plain or zipped, into event tables
//! - Partitioning a batch into one table per event identifier
//! - Resolving the tactical scenario origin of every mission (mock, skip or abort)
//! - Converting yard offsets, headings, ranges and times with an ordered converter chain
//! - Applying column presets and exporting one sheet per category
//! - Running import, convert and export as chained background phases

pub mod config;
pub mod constants;
pub mod converters;
pub mod error;
pub mod importer;
pub mod models;
pub mod pipeline;
pub mod processor;
pub mod scenario;
pub mod schema;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::MerConfig;
pub use error::{MerError, Result};
pub use models::{IdentifierTable, MerData, Origin, ProcessingStats, ScenarioPolicy, SessionState};
pub use pipeline::{ConversionFailure, ConversionPipeline};
pub use processor::{ImportSession, ScenarioChoice, SessionEvent};
