//! Application constants for MER keeper
//!
//! Fixed field names of the Mission Event Record dump format and the
//! category labels that receive special treatment during conversion.

// =============================================================================
// Record dump format
// =============================================================================

/// Separator line between events in a raw dump
pub const RECORD_SEPARATOR: &str = "--";

/// Field that starts a new event; all following records belong to it
pub const EVENT_NUMBER_FIELD: &str = "EVENT NUMBER";

/// Field identifying the logical event type (category) of a row
pub const IDENTIFIER_COLUMN: &str = "EVENT HEADER - IDENTIFIER";

/// Prefix shared by the split date/time header fields
pub const EVENT_TIME_PREFIX: &str = "EVENT HEADER - TIME";

pub const EVENT_TIME_YEAR: &str = "EVENT HEADER - TIME (YY)";
pub const EVENT_TIME_MONTH: &str = "EVENT HEADER - TIME (MM)";
pub const EVENT_TIME_DAY: &str = "EVENT HEADER - TIME (DD)";
pub const EVENT_TIME_HOUR: &str = "EVENT HEADER - TIME (HH)";
/// Minutes share the `(MM)` label with the month and arrive deduplicated
pub const EVENT_TIME_MINUTE: &str = "EVENT HEADER - TIME (MM).1";
pub const EVENT_TIME_SECOND: &str = "EVENT HEADER - TIME (SS)";

/// Assembled date column (`YYYY-MM-DD`)
pub const DATE_COLUMN: &str = "DATE_";

/// Assembled time-of-day column (`HH:MM:SS`)
pub const TIME_COLUMN: &str = "TIME_";

// =============================================================================
// References and tactical scenarios
// =============================================================================

/// Column correlating every row to its source file
pub const REFERENCE_COLUMN: &str = "REFERENCE";

/// Default number of file-name characters used as reference
pub const DEFAULT_REFERENCE_PREFIX_LEN: usize = 8;

/// Category holding the geodetic origin of every reference
pub const TACTICAL_SCENARIO: &str = "TACTICAL_SCENARIO";

pub const GRID_CENTER_LAT: &str = "GRID CENTER LAT";
pub const GRID_CENTER_LONG: &str = "GRID CENTER LONG";

// =============================================================================
// Category specific conversions
// =============================================================================

pub const SONIC: &str = "SONIC";
pub const SONOBUOY: &str = "SONOBUOY";

pub mod sonic {
    pub const PING_STATUS: &str = "PING ON/OFF STAT";
    pub const EVENT_TYPE: &str = "EVENT TYPE";
    pub const PINGING_EVENT: &str = "SONIC_PINGING";
    pub const START_TIME: &str = "START TIME (Z)";
    pub const END_TIME: &str = "END TIME (Z)";
    pub const DURATION: &str = "DURATION";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const RADIUS: &str = "RADIUS (NM)";
    pub const SOURCE_LEVEL: &str = "SL";
    pub const FREQUENCY: &str = "FREQUENCY";

    pub const RADIUS_NM: f64 = 10.0;
    pub const SOURCE_LEVEL_VALUE: &str = "176-200 dB";
    pub const FREQUENCY_VALUE: &str = "<4kHz";
}

pub mod sonobuoy {
    /// Buoy life time in seconds
    pub const LIFE_TIME: &str = "LIFE TIME";
    /// Remaining life time in milliseconds
    pub const REMAINING_TIME: &str = "REMAINING TIME";
}

// =============================================================================
// Inputs and presets
// =============================================================================

/// Raw record dump extension
pub const TEXT_EXTENSION: &str = "txt";

/// Archive of raw record dumps
pub const ZIP_EXTENSION: &str = "zip";

/// Extension of preset files in the preset directory
pub const PRESET_EXTENSION: &str = "json";

/// Message shown when a session aborts because no scenario could be resolved
pub const IMPORT_FAILED: &str = "Import Failed";
