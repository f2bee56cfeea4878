//! # Pagination Module
//!
//! Extracts one page of typed rows from a sheet whose layout is not known in
//! advance. Every call detects the header row again, derives the schema from
//! it, and converts only the rows inside the requested window.
//!
//! Fatal problems (unreadable file, unknown format or sheet, malformed header
//! row pair) end the call with an [`ExtractionError`]. Any other problem met
//! while reading rows is recorded in an [`ErrorCollector`] and the rows read
//! so far are still returned.
use crate::error::SheetPagerError;
use crate::paginate::errors::ErrorCode;
use crate::paginate::errors::ErrorCollector;
use crate::paginate::header::detect_header;
use crate::paginate::header::SiblingRowInference;
use crate::paginate::header::TypeInference;
use crate::paginate::schema::Schema;
use crate::paginate::schema::TypedRow;
use crate::paginate::window::convert_rows;
use crate::paginate::window::PageRequest;
use crate::paginate::window::Window;
use crate::spreadsheet::open_workbook;
use crate::spreadsheet::sheet::SheetSource;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use thiserror::Error;
use tracing::error;
use tracing::info;
use zip::result::ZipError;

pub(crate) mod coerce;
pub(crate) mod errors;
pub(crate) mod header;
pub(crate) mod schema;
pub(crate) mod window;

/// Errors that end an extraction call. Messages are safe to show to users,
/// the underlying cause is logged.
#[derive(Error, Debug, PartialEq)]
pub(crate) enum ExtractionError {
    #[error("Can't read your spreadsheet file.")]
    Unreadable,

    #[error("Invalid spreadsheet format.")]
    InvalidFormat,

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("No data exist after header line {row}. Expected a cell value for each header cell")]
    MalformedHeader { row: usize },

    #[error("Invalid page request: {0}")]
    InvalidPage(String),
}

/// Where to read pages from
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PaginatorConfig {
    /// Local path, `file://` URL or remote URL of the workbook
    pub(crate) path: String,
    /// Exact sheet name, the first sheet when absent
    pub(crate) sheet_name: Option<String>,
}

/// Schema and rows of one page
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Page {
    pub(crate) schema: Schema,
    pub(crate) rows: Vec<TypedRow>,
}

/// Reads one page of typed rows.
pub(crate) fn extract_page(
    config: &PaginatorConfig,
    request: &PageRequest,
    errors: &mut ErrorCollector,
) -> Result<Page, ExtractionError> {
    let (schema, rows) = extract_workbook(config, request, errors, |_, row| row)?;
    Ok(Page { schema, rows })
}

/// Reads one page and passes every typed row through `map`.
///
/// The workbook is opened for this call only and closed when it returns.
pub(crate) fn extract_workbook<T, F>(
    config: &PaginatorConfig,
    request: &PageRequest,
    errors: &mut ErrorCollector,
    map: F,
) -> Result<(Schema, Vec<T>), ExtractionError>
where
    F: FnMut(&Schema, TypedRow) -> T,
{
    let mut workbook = open_workbook(&config.path).map_err(|error| sanitize(&config.path, error))?;
    read_workbook(&mut workbook, config.sheet_name.as_deref(), request, errors, map)
}

/// Selects the sheet of an opened workbook and reads one page from it.
pub(crate) fn read_workbook<T, F>(
    workbook: &mut Workbook,
    sheet_name: Option<&str>,
    request: &PageRequest,
    errors: &mut ErrorCollector,
    map: F,
) -> Result<(Schema, Vec<T>), ExtractionError>
where
    F: FnMut(&Schema, TypedRow) -> T,
{
    let locator = workbook.name.to_owned();
    info!("Workbook has {} sheets", workbook.sheet_names().len());
    let mut sheet = workbook.open_sheet(sheet_name).map_err(|error| sanitize(&locator, error))?;
    info!("Sheet '{}' selected", sheet.name());
    extract_from_sheet(&mut sheet, request, errors, &SiblingRowInference, map)
}

/// Detects the header of `sheet` and converts the rows of the requested page.
pub(crate) fn extract_from_sheet<S, T, F>(
    sheet: &mut S,
    request: &PageRequest,
    errors: &mut ErrorCollector,
    inference: &dyn TypeInference,
    mut map: F,
) -> Result<(Schema, Vec<T>), ExtractionError>
where
    S: SheetSource + ?Sized,
    F: FnMut(&Schema, TypedRow) -> T,
{
    let offset = request.offset()?;
    let header = match detect_header(sheet, inference) {
        Ok(header) => header,
        Err(SheetPagerError::ExtractionError(error)) => return Err(error),
        Err(error) => {
            errors.record(ErrorCode::Decode, None, error.to_string());
            return Ok((Schema::default(), Vec::new()));
        }
    };

    let mut rows = Vec::new();
    let window = Window::compute(header.first_data_row, sheet.last_row_index(), offset, request.page_size());
    match window {
        Some(window) => {
            let header_line = header.header_row.map(|row| row + 1);
            info!("Header line: {:?}, First row: {}, Last row: {} ({} rows)", header_line, window.first + 1, window.last + 1, window.len());
            let schema = &header.schema;
            let result = convert_rows(sheet, &header, &window, errors, |row| rows.push(map(schema, row)));
            if let Err(error) = result {
                errors.record(ErrorCode::Decode, None, error.to_string());
            }
        }
        None => info!("page {} is past the last row", request.page()),
    }
    Ok((header.schema, rows))
}

/// Replaces a decoder error by a message fit for users and logs the cause
fn sanitize(locator: &str, cause: SheetPagerError) -> ExtractionError {
    error!("failed to open '{}': {}", locator, cause);
    match cause {
        SheetPagerError::SpreadsheetError(SpreadsheetError::SheetNotFound(name)) => ExtractionError::SheetNotFound(name),
        SheetPagerError::IoError(_)
        | SheetPagerError::DuckDBError(_)
        | SheetPagerError::UnifiedReaderError(_)
        | SheetPagerError::ZipError(ZipError::Io(_)) => ExtractionError::Unreadable,
        _ => ExtractionError::InvalidFormat,
    }
}

/// Page by page reader over one configured sheet.
/// The schema of the latest page is kept for callers that need it.
pub(crate) struct Paginator {
    config: PaginatorConfig,
    schema: Option<Schema>,
    errors: ErrorCollector,
}

impl Paginator {
    pub(crate) fn new(config: PaginatorConfig) -> Self {
        Paginator {
            config,
            schema: None,
            errors: ErrorCollector::new(),
        }
    }

    /// Reads the rows of `page`, detecting the schema again for this page.
    pub(crate) fn iterate_rows(&mut self, page: usize, page_size: usize) -> Result<Vec<TypedRow>, ExtractionError> {
        let request = PageRequest::new(page, page_size);
        let page = extract_page(&self.config, &request, &mut self.errors)?;
        self.schema = Some(page.schema);
        Ok(page.rows)
    }

    /// Schema of the latest page, `None` before the first one
    pub(crate) fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub(crate) fn errors(&self) -> &ErrorCollector {
        &self.errors
    }
}
