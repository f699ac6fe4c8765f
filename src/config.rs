//! Configuration management and validation.
//!
//! Provides the session configuration shared by the import pipeline,
//! the bulk driver and the command line front-end.

use crate::constants::DEFAULT_REFERENCE_PREFIX_LEN;
use crate::error::{MerError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Global configuration for MER import sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerConfig {
    /// Number of file-name characters used as the reference key
    pub reference_prefix_len: usize,

    /// Shared scratch directory for extracted zip archives
    pub extraction_dir: PathBuf,

    /// Directory searched for named presets
    pub preset_dir: PathBuf,

    /// Maximum concurrent import sessions in bulk mode
    pub max_concurrent_sessions: usize,

    /// Show progress spinners on the terminal
    pub show_progress: bool,
}

impl Default for MerConfig {
    fn default() -> Self {
        let preset_dir = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("mer_keeper")
            .join("presets");

        Self {
            reference_prefix_len: DEFAULT_REFERENCE_PREFIX_LEN,
            extraction_dir: std::env::temp_dir().join("mer_keeper").join("extract"),
            preset_dir,
            max_concurrent_sessions: num_cpus::get(),
            show_progress: true,
        }
    }
}

impl MerConfig {
    /// Use a different reference prefix length
    pub fn with_reference_prefix_len(mut self, len: usize) -> Self {
        self.reference_prefix_len = len;
        self
    }

    /// Use a different zip extraction directory
    pub fn with_extraction_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extraction_dir = dir.into();
        self
    }

    /// Use a different preset directory
    pub fn with_preset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preset_dir = dir.into();
        self
    }

    /// Set maximum concurrent sessions
    pub fn with_max_concurrent_sessions(mut self, max_sessions: usize) -> Self {
        self.max_concurrent_sessions = max_sessions;
        self
    }

    /// Disable progress spinners
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Check the configuration before a session starts
    pub fn validate(&self) -> Result<()> {
        if self.reference_prefix_len == 0 {
            return Err(MerError::Configuration {
                message: "reference prefix length must be at least 1".to_string(),
            });
        }
        if self.max_concurrent_sessions == 0 {
            return Err(MerError::Configuration {
                message: "at least one concurrent session is required".to_string(),
            });
        }
        debug!(
            "Configuration: prefix {} chars, extraction dir {}, {} sessions",
            self.reference_prefix_len,
            self.extraction_dir.display(),
            self.max_concurrent_sessions
        );
        Ok(())
    }
}
