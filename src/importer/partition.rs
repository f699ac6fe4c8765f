//! Category partitioning.
//!
//! Splits the merged batch table into one table per event identifier.

use crate::constants::{DATE_COLUMN, IDENTIFIER_COLUMN, REFERENCE_COLUMN, TIME_COLUMN};
use crate::error::{MerError, Result};
use crate::models::{IdentifierTable, MerData};
use crate::schema::{coerce_numeric_columns, drop_empty_columns, filter_rows, text_values};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Columns that stay text whatever they contain
pub const TEXT_COLUMNS: [&str; 4] = [REFERENCE_COLUMN, DATE_COLUMN, TIME_COLUMN, IDENTIFIER_COLUMN];

/// Group rows by `EVENT HEADER - IDENTIFIER`.
///
/// Rows without an identifier are dropped. Each category table loses the
/// columns it never fills and has its numeric columns re-detected.
pub fn partition(frame: &DataFrame) -> Result<MerData> {
    if frame.height() == 0 || frame.column(IDENTIFIER_COLUMN).is_err() {
        return Err(MerError::NoValidData);
    }

    let identifiers = text_values(frame, IDENTIFIER_COLUMN)?;
    let mut groups: BTreeMap<String, Vec<bool>> = BTreeMap::new();
    for (row, identifier) in identifiers.iter().enumerate() {
        let Some(identifier) = identifier else {
            continue;
        };
        groups
            .entry(identifier.clone())
            .or_insert_with(|| vec![false; identifiers.len()])[row] = true;
    }

    let unlabeled = identifiers.iter().filter(|value| value.is_none()).count();
    if unlabeled > 0 {
        warn!("Dropping {} rows without identifier", unlabeled);
    }

    let mut data = MerData::new();
    for (identifier, mask) in groups {
        let rows = filter_rows(frame, &mask)?;
        let rows = drop_empty_columns(&rows)?;
        let rows = coerce_numeric_columns(&rows, &TEXT_COLUMNS)?;
        debug!(
            "Category {}: {} rows, {} columns",
            identifier,
            rows.height(),
            rows.width()
        );
        data.insert(identifier.clone(), IdentifierTable::new(identifier, rows));
    }

    if data.is_empty() {
        return Err(MerError::NoValidData);
    }
    Ok(data)
}
