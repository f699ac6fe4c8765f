//! Integration tests for the processor module
//!
//! Runs whole sessions over small dump fixtures written to temporary
//! directories.


use crate::config::MerConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One mission with its tactical scenario, a helicopter fix and a ping
pub const MISSION_WITH_SCENARIO: &str = "\
--
EVENT NUMBER: 1
EVENT HEADER - IDENTIFIER: TACTICAL_SCENARIO
EVENT HEADER - TIME (YY): 19
EVENT HEADER - TIME (MM): 03
EVENT HEADER - TIME (DD): 05
EVENT HEADER - TIME (HH): 10
EVENT HEADER - TIME (MM): 00
EVENT HEADER - TIME (SS): 00
GRID CENTER LAT: 50.08451
GRID CENTER LONG: -5.243314
--
EVENT NUMBER: 2
EVENT HEADER - IDENTIFIER: OWN_HELO
EVENT HEADER - TIME (YY): 19
EVENT HEADER - TIME (MM): 03
EVENT HEADER - TIME (DD): 05
EVENT HEADER - TIME (HH): 10
EVENT HEADER - TIME (MM): 05
EVENT HEADER - TIME (SS): 00
POS1 X: 36.94333
POS1 Y: -258.8558
HEADING: -1
RANGE: 5000
--
EVENT NUMBER: 3
EVENT HEADER - IDENTIFIER: SONIC
EVENT HEADER - TIME (YY): 19
EVENT HEADER - TIME (MM): 03
EVENT HEADER - TIME (DD): 05
EVENT HEADER - TIME (HH): 10
EVENT HEADER - TIME (MM): 15
EVENT HEADER - TIME (SS): 30
PING ON/OFF STAT: ON
EVENT TYPE: SONIC_PINGING
--
EVENT NUMBER: 4
EVENT HEADER - IDENTIFIER: SONIC
EVENT HEADER - TIME (YY): 19
EVENT HEADER - TIME (MM): 03
EVENT HEADER - TIME (DD): 05
EVENT HEADER - TIME (HH): 10
EVENT HEADER - TIME (MM): 20
EVENT HEADER - TIME (SS): 00
PING ON/OFF STAT: OFF
EVENT TYPE: SONIC_PINGING
--
";

/// A mission that never logged its tactical scenario
pub const MISSION_WITHOUT_SCENARIO: &str = "\
--
EVENT NUMBER: 1
EVENT HEADER - IDENTIFIER: OWN_HELO
EVENT HEADER - TIME (YY): 19
EVENT HEADER - TIME (MM): 03
EVENT HEADER - TIME (DD): 06
EVENT HEADER - TIME (HH): 08
EVENT HEADER - TIME (MM): 30
EVENT HEADER - TIME (SS): 00
POS1 X: 100
POS1 Y: 200
HEADING: 361
RANGE: 6000
--
";

/// Name of the fixture whose reference has a scenario
pub const SCENARIO_FILE: &str = "20190305_mer.txt";
/// Name of the fixture whose reference lacks a scenario
pub const BARE_FILE: &str = "20190306_mer.txt";

pub fn write_dump(dir: &Path, name: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

pub fn test_config(temp_dir: &TempDir) -> MerConfig {
    MerConfig::default()
        .with_extraction_dir(temp_dir.path().join("extract"))
        .with_preset_dir(temp_dir.path().join("presets"))
        .with_max_concurrent_sessions(2)
        .without_progress()
}
