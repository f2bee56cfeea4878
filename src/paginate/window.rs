//! Page windows relative to the detected header, and the conversion of the
//! rows inside a window to typed rows.

use crate::error::SheetPagerError;
use crate::paginate::coerce::coerce;
use crate::paginate::errors::ErrorCode;
use crate::paginate::errors::ErrorCollector;
use crate::paginate::header::DetectedHeader;
use crate::paginate::schema::TypedRow;
use crate::paginate::ExtractionError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::sheet::Row;
use crate::spreadsheet::sheet::SheetSource;
use std::cmp::min;

/// A validated zero-based page request
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct PageRequest {
    page: usize,
    page_size: usize,
}

impl PageRequest {
    pub(crate) fn new(page: usize, page_size: usize) -> Self {
        PageRequest { page, page_size }
    }

    /// Builds a request from signed inputs, rejecting negative values.
    pub(crate) fn try_new(page: i64, page_size: i64) -> Result<Self, ExtractionError> {
        let page = usize::try_from(page)
            .map_err(|_| ExtractionError::InvalidPage(format!("page must not be negative, got {page}")))?;
        let page_size = usize::try_from(page_size)
            .map_err(|_| ExtractionError::InvalidPage(format!("page size must not be negative, got {page_size}")))?;
        Ok(Self::new(page, page_size))
    }

    pub(crate) fn page(&self) -> usize {
        self.page
    }

    pub(crate) fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of data rows before this page
    pub(crate) fn offset(&self) -> Result<usize, ExtractionError> {
        self.page.checked_mul(self.page_size).ok_or_else(|| {
            ExtractionError::InvalidPage(format!("page {} of size {} is out of range", self.page, self.page_size))
        })
    }
}

/// Inclusive range of physical row indexes covered by one page
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Window {
    pub(crate) first: usize,
    pub(crate) last: usize,
}

impl Window {
    /// `first = first_data_row + offset`, `last = min(last_row, first + limit - 1)`.
    /// Returns `None` for an empty page.
    pub(crate) fn compute(first_data_row: usize, last_row: Option<usize>, offset: usize, limit: usize) -> Option<Window> {
        let last_row = last_row?;
        if limit == 0 {
            return None;
        }
        let first = first_data_row.checked_add(offset)?;
        if first > last_row {
            return None;
        }
        let last = min(last_row, first.saturating_add(limit - 1));
        Some(Window { first, last })
    }

    pub(crate) fn len(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Converts the rows of a window and hands each one to `emit`. Missing
/// physical rows are skipped. A decoder error stops the conversion, the rows
/// emitted before it stay valid.
pub(crate) fn convert_rows<S, F>(
    sheet: &mut S,
    header: &DetectedHeader,
    window: &Window,
    errors: &mut ErrorCollector,
    mut emit: F,
) -> Result<(), SheetPagerError>
where
    S: SheetSource + ?Sized,
    F: FnMut(TypedRow),
{
    for index in window.first..=window.last {
        sheet.discard_before(index);
        if let Some(row) = sheet.row(index)? {
            emit(convert_row(&row, header, errors));
        }
    }
    Ok(())
}

/// Converts one physical row. The leading skipped columns are dropped, and
/// values past the end of a short row stay null.
pub(crate) fn convert_row(row: &Row, header: &DetectedHeader, errors: &mut ErrorCollector) -> TypedRow {
    let fields = header.schema.fields();
    let mut values = vec![None; fields.len()];
    let cells = row.cells.iter().skip(header.leading_skip).take(fields.len());
    for (slot, (cell, field)) in cells.zip(fields).enumerate() {
        let (kind, value) = coerce(&cell.value);
        if kind == field.kind {
            values[slot] = value;
        } else if !matches!(cell.value, CellValue::Blank | CellValue::Error(_)) {
            errors.record(
                ErrorCode::TypeMismatch,
                Some(row.index),
                format!(
                    "Cell {} holds a {} value but column '{}' is {}",
                    cell.reference(),
                    kind.as_str(),
                    field.name,
                    field.kind.as_str()
                ),
            );
        }
    }
    TypedRow { row: row.index, values }
}
