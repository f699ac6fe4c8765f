//! Command-line argument definitions for MER keeper
//!
//! Defines the CLI interface using the clap derive API.

use crate::config::MerConfig;
use crate::models::ScenarioPolicy;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the MER keeper
///
/// Imports Mission Event Record dumps, resolves the tactical scenario of
/// every mission and converts raw sensor units into readable tables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mer_keeper",
    version,
    about = "Import Mission Event Record dumps and convert them into readable tables",
    long_about = "Parses raw MER text dumps (or zip archives of dumps), splits them into one table \
                  per event identifier, resolves the tactical scenario origin of every mission and \
                  converts yard offsets, headings, ranges and times into readable values. The result \
                  can be exported as one CSV sheet per identifier."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable progress spinners
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Directory searched for named presets
    #[arg(long, global = true, value_name = "DIR")]
    pub preset_dir: Option<PathBuf>,

    /// Number of file-name characters used as mission reference
    #[arg(long, global = true, value_name = "N")]
    pub reference_prefix_len: Option<usize>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Import, convert and optionally export a set of dumps
    Import(ImportArgs),
    /// Convert and export every dump found below one or more directories
    Bulk(BulkArgs),
}

/// What to do when a mission has no tactical scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissingScenario {
    /// Ask on the terminal; yes mocks, no aborts
    Ask,
    /// Use a zero origin
    Mock,
    /// Leave the mission out
    Skip,
    /// Abort the import
    Abort,
}

impl MissingScenario {
    /// Fixed policy, or `None` when the user must be asked
    pub fn policy(self) -> Option<ScenarioPolicy> {
        match self {
            MissingScenario::Ask => None,
            MissingScenario::Mock => Some(ScenarioPolicy::Mock),
            MissingScenario::Skip => Some(ScenarioPolicy::Skip),
            MissingScenario::Abort => Some(ScenarioPolicy::Strict),
        }
    }
}

/// Arguments for the import command
#[derive(Debug, Clone, ClapArgs)]
pub struct ImportArgs {
    /// Dump files (.txt) or archives of dumps (.zip)
    #[arg(required = true, value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Export directory, one CSV file per category; nothing is exported when omitted
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Preset name (looked up in the preset directory) or path
    #[arg(long, value_name = "NAME|PATH")]
    pub preset: Option<String>,

    /// Policy for missions without tactical scenario
    #[arg(long, value_enum, default_value_t = MissingScenario::Ask)]
    pub on_missing_scenario: MissingScenario,

    /// Only export these identifiers (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "A,B")]
    pub identifiers: Option<Vec<String>>,
}

/// Arguments for the bulk command
#[derive(Debug, Clone, ClapArgs)]
pub struct BulkArgs {
    /// Directories searched recursively for .txt and .zip dumps
    #[arg(required = true, value_name = "SOURCE_DIR")]
    pub sources: Vec<PathBuf>,

    /// Export directory, one CSV file per category; with several sources each gets a subdirectory
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Preset name (looked up in the preset directory) or path
    #[arg(long, value_name = "NAME|PATH")]
    pub preset: Option<String>,

    /// Leave out missions without tactical scenario instead of mocking them
    #[arg(long)]
    pub skip_missing_scenario: bool,

    /// Maximum number of sources processed at once
    #[arg(short = 'j', long, value_name = "N")]
    pub max_sessions: Option<usize>,
}

impl Args {
    /// Log level from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Configuration with the global flags applied
    pub fn config(&self) -> MerConfig {
        let mut config = MerConfig::default();
        if let Some(dir) = &self.preset_dir {
            config = config.with_preset_dir(dir);
        }
        if let Some(len) = self.reference_prefix_len {
            config = config.with_reference_prefix_len(len);
        }
        if self.no_progress || self.quiet {
            config = config.without_progress();
        }
        config
    }
}
