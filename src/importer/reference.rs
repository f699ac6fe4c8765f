//! Source references.
//!
//! Every row of an imported dump is stamped with the first characters of
//! the dump's file name. Dumps of one mission share that prefix and
//! therefore share one tactical scenario.

use crate::constants::REFERENCE_COLUMN;
use crate::error::Result;
use polars::prelude::*;
use std::path::Path;

/// Reference key of a source file
pub fn reference_for(path: &Path, prefix_len: usize) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    name.chars().take(prefix_len).collect()
}

/// Set `REFERENCE` on every row
pub fn stamp_reference(frame: &DataFrame, reference: &str) -> Result<DataFrame> {
    let mut stamped = frame.clone();
    let values = vec![reference; frame.height()];
    stamped.with_column(Series::new(REFERENCE_COLUMN.into(), values))?;
    Ok(stamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{text_frame, text_values};
    use std::path::PathBuf;

    #[test]
    fn test_reference_is_file_name_prefix() {
        let path = PathBuf::from("/data/missions/20190305_sortie_2.txt");
        assert_eq!(reference_for(&path, 8), "20190305");
        assert_eq!(reference_for(&path, 4), "2019");
    }

    #[test]
    fn test_short_names_keep_extension() {
        assert_eq!(reference_for(Path::new("a.txt"), 8), "a.txt");
    }

    #[test]
    fn test_stamp_reference_fills_every_row() {
        let frame = text_frame(vec![(
            "A".to_string(),
            vec![Some("1".to_string()), None],
        )])
        .unwrap();
        let stamped = stamp_reference(&frame, "R1").unwrap();

        assert_eq!(stamped.get_column_names(), vec!["A", "REFERENCE"]);
        assert_eq!(
            text_values(&stamped, REFERENCE_COLUMN).unwrap(),
            vec![Some("R1".to_string()), Some("R1".to_string())]
        );
    }
}
