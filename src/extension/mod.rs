//! # Extension Module
//!
//! SQL surface of the extension: the `read_sheet_page` and `analyze_sheet`
//! table functions plus the parameter handling they share.
use crate::error::SheetPagerError;
use crate::extension::ExtensionError::InvalidParameter;
use crate::paginate::errors::ErrorCode;
use crate::paginate::errors::ErrorCollector;
use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use thiserror::Error;

pub(crate) mod analyze_sheet;
pub(crate) mod read_sheet_page;
mod writer;

/// Default number of rows per page
pub(crate) const DEFAULT_PAGE_SIZE: i64 = 100;

#[derive(Error, Debug)]
pub(crate) enum ExtensionError {
    /// Invalid parameter provided to a table function
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// A table function needs at least one result column
    #[error("No header row found in sheet")]
    EmptySchemaError,

    /// The sheet could not be decoded far enough to find its header
    #[error("Can't decode sheet: {0}")]
    SheetDecodeError(String),
}

/// Turns a decoder failure recorded while detecting the header into an
/// error, so that an empty schema is not mistaken for a sheet without header.
pub(crate) fn check_decoded(errors: &ErrorCollector) -> Result<(), ExtensionError> {
    match errors.first(ErrorCode::Decode) {
        Some(error) => Err(ExtensionError::SheetDecodeError(error.message.to_owned())),
        None => Ok(()),
    }
}

/// Positional parameter of a table function
pub(crate) trait Param<T> {
    fn kind() -> LogicalTypeHandle;

    fn read(bind: &BindInfo, index: u64) -> Result<T, SheetPagerError>;
}

/// Named parameter of a table function
pub(crate) trait NamedParam<T> {
    /// Returns the parameter name as used in SQL
    fn name() -> &'static str;

    /// Returns the DuckDB logical type for this parameter
    fn kind() -> LogicalTypeHandle;

    /// Returns the complete parameter definition (name and type)
    fn definition() -> (String, LogicalTypeHandle) {
        (Self::name().to_string(), Self::kind())
    }

    /// Extracts the parameter value, `None` when it was not given
    fn read(bind: &BindInfo) -> Result<Option<T>, SheetPagerError>;
}

/// Workbook locator, the first positional parameter
pub(crate) struct FileParam;

/// Exact sheet name
pub(crate) struct SheetNameParam;

/// Zero-based page number
pub(crate) struct PageParam;

/// Rows per page
pub(crate) struct PageSizeParam;

impl Param<String> for FileParam {
    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo, index: u64) -> Result<String, SheetPagerError> {
        let file_name = bind.get_parameter(index).to_string();
        if file_name.is_empty() {
            Err(InvalidParameter {
                name: "file".to_owned(),
                message: "file name must not be empty".to_owned(),
            })?;
        }
        Ok(file_name)
    }
}

impl NamedParam<String> for SheetNameParam {
    fn name() -> &'static str {
        "sheet_name"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo) -> Result<Option<String>, SheetPagerError> {
        Ok(bind.get_named_parameter(Self::name()).map(|value| value.to_string()))
    }
}

impl NamedParam<i64> for PageParam {
    fn name() -> &'static str {
        "page"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<i64>, SheetPagerError> {
        read_non_negative(bind, Self::name())
    }
}

impl NamedParam<i64> for PageSizeParam {
    fn name() -> &'static str {
        "page_size"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<i64>, SheetPagerError> {
        read_non_negative(bind, Self::name())
    }
}

fn read_non_negative(bind: &BindInfo, name: &str) -> Result<Option<i64>, SheetPagerError> {
    match bind.get_named_parameter(name).map(|value| value.to_int64()) {
        Some(value) => Ok(Some(check_non_negative(name, value)?)),
        None => Ok(None),
    }
}

fn check_non_negative(name: &str, value: i64) -> Result<i64, ExtensionError> {
    if value < 0 {
        Err(InvalidParameter {
            name: name.to_owned(),
            message: format!("must not be negative, got {value}"),
        })
    } else {
        Ok(value)
    }
}
