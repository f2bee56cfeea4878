//! # Spreadsheet Decoding Module
//!
//! Reads Office Open XML workbooks (`.xlsx`, `.xlsm`, `.xlam`) and exposes
//! one selected sheet as rows of raw cells through the [`SheetSource`] seam.
//! Worksheets are decoded while they are read, so only the rows a caller still
//! needs are held in memory.
//!
//! [`SheetSource`]: sheet::SheetSource
use thiserror::Error;

pub(crate) mod cell;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

pub(crate) use xlsx::XlsxWorkbook as Workbook;

/// Errors raised while decoding a workbook
#[derive(Error, Debug)]
pub(crate) enum SpreadsheetError {
    /// A required part of the workbook package is missing
    #[error("Missing workbook part '{0}'")]
    FileError(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Spreadsheet '{0}' has no worksheets")]
    SpreadsheetEmptyError(String),

    /// Legacy binary workbooks and password protected packages
    #[error("'{0}' is a compound document, only unencrypted Office Open XML workbooks are supported")]
    CompoundFileError(String),

    /// (sheet name, cell reference, raw value)
    #[error("Invalid cell value '{2}' at '{0}'!{1}")]
    CellValueError(String, String, String),
}

/// Opens a workbook from a local path, a `file://` URL or a remote URL
pub(crate) fn open_workbook(locator: &str) -> Result<Workbook, crate::error::SheetPagerError> {
    Workbook::open(locator)
}
