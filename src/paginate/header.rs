//! Header row detection and schema inference.
//!
//! Rows are scanned from the top. Each candidate row is paired with the row
//! right below it: the candidate supplies column names, the row below supplies
//! column types. The first candidate that yields a column is the header.

use crate::error::SheetPagerError;
use crate::paginate::coerce::coerce;
use crate::paginate::coerce::header_name;
use crate::paginate::schema::FieldType;
use crate::paginate::schema::Schema;
use crate::paginate::ExtractionError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::sheet::Row;
use crate::spreadsheet::sheet::SheetSource;
use std::cmp::min;
use tracing::debug;
use tracing::info;

/// Leading non-header cells tolerated before a candidate row is abandoned
pub(crate) const MAX_EMPTY_LEFTMOST_COLUMNS: usize = 100;

/// Infers the type of a column from the cell below its header cell.
pub(crate) trait TypeInference {
    fn infer(&self, sibling: &Cell) -> FieldType;
}

/// Uses the coerced type of the sibling cell as the column type
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct SiblingRowInference;

impl TypeInference for SiblingRowInference {
    fn infer(&self, sibling: &Cell) -> FieldType {
        coerce(&sibling.value).0
    }
}

/// Result of the header scan
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DetectedHeader {
    pub(crate) schema: Schema,
    /// Header row index, `None` when no row qualified
    pub(crate) header_row: Option<usize>,
    /// First row that holds data, clamped to the last row of the sheet
    pub(crate) first_data_row: usize,
    /// Columns before the first header cell, skipped in every row
    pub(crate) leading_skip: usize,
}

/// Scans the sheet for its header row.
///
/// A sibling row with fewer cells than the scanned part of its header
/// candidate is fatal (`ExtractionError::MalformedHeader`).
pub(crate) fn detect_header<S>(sheet: &mut S, inference: &dyn TypeInference) -> Result<DetectedHeader, SheetPagerError>
where
    S: SheetSource + ?Sized,
{
    let (first, last) = match (sheet.first_row_index(), sheet.last_row_index()) {
        (Some(first), Some(last)) if first <= last => (first, last),
        _ => {
            info!("sheet '{}' has no rows", sheet.name());
            return Ok(DetectedHeader {
                schema: Schema::default(),
                header_row: None,
                first_data_row: 0,
                leading_skip: 0,
            });
        }
    };

    for index in first..=last {
        sheet.discard_before(index);
        let Some(candidate) = sheet.row(index)? else {
            continue;
        };
        let sibling_index = min(index + 1, last);
        let Some(sibling) = sheet.row(sibling_index)? else {
            continue;
        };

        if let Some((schema, leading_skip)) = scan_candidate(&candidate, &sibling, inference)? {
            info!("header line found at {}", index + 1);
            return Ok(DetectedHeader {
                schema,
                header_row: Some(index),
                first_data_row: sibling_index,
                leading_skip,
            });
        }
    }

    info!("no header line found in sheet '{}'", sheet.name());
    Ok(DetectedHeader {
        schema: Schema::default(),
        header_row: None,
        first_data_row: first,
        leading_skip: 0,
    })
}

/// Walks a candidate row and its sibling in lockstep. Returns the fields and
/// the leading skip count when at least one header cell is accepted.
fn scan_candidate(
    candidate: &Row,
    sibling: &Row,
    inference: &dyn TypeInference,
) -> Result<Option<(Schema, usize)>, SheetPagerError> {
    let mut schema = Schema::default();
    let mut leading_skip = 0usize;
    let mut siblings = sibling.cells.iter();
    for cell in &candidate.cells {
        let sibling_cell = siblings
            .next()
            .ok_or(ExtractionError::MalformedHeader { row: candidate.index + 1 })?;
        match header_name(&cell.value) {
            Some(name) => {
                let kind = inference.infer(sibling_cell);
                debug!("column '{}' at {} is {}", name, cell.reference(), kind.as_str());
                schema.push(&name, kind);
            }
            // A non-header cell after the first column ends the header run
            None if !schema.is_empty() => break,
            None => {
                leading_skip += 1;
                if leading_skip > MAX_EMPTY_LEFTMOST_COLUMNS {
                    break;
                }
            }
        }
    }

    if schema.is_empty() {
        Ok(None)
    } else {
        Ok(Some((schema, leading_skip)))
    }
}
