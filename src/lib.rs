//! # DuckDB Sheet Pager Extension
//!
//! A DuckDB extension that reads one page at a time from a spreadsheet sheet
//! whose layout is not known in advance. The header row is found by scanning
//! from the top and using the row below each candidate as a type oracle, so
//! leading blank rows, decorative leading columns and trailing noise columns
//! need no configuration.
//!
//! ## Table Functions
//!
//! - `read_sheet_page`: Reads one page of typed rows, with the detected
//!   header as result columns
//! - `analyze_sheet`: Returns the detected column names and types
//!
//! ## Logging
//!
//! Log output goes to stderr, filtered by the `SHEET_PAGER_LOG` environment
//! variable (default `warn`). A subscriber installed by the host wins.
extern crate duckdb;
extern crate duckdb_loadable_macros;
extern crate libduckdb_sys;

mod error;
mod extension;
mod helpers;
mod paginate;
mod spreadsheet;

use crate::extension::analyze_sheet::AnalyzeSheetTableFunction;
use crate::extension::read_sheet_page::ReadSheetPageTableFunction;
use anyhow::{Context, Result};
use duckdb::Connection;
use duckdb_loadable_macros::duckdb_entrypoint_c_api;
use libduckdb_sys as ffi;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the log filter directives
const LOG_ENV: &str = "SHEET_PAGER_LOG";

/// Installs the stderr log subscriber unless one is already set.
fn init_logging() {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _tracing = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .try_init();
}

/// Extension entry point for DuckDB.
///
/// Registers the `read_sheet_page` and `analyze_sheet` table functions.
#[duckdb_entrypoint_c_api()]
pub unsafe fn extension_entrypoint(connection: Connection) -> Result<()> {
    init_logging();
    connection
        .register_table_function::<AnalyzeSheetTableFunction>("analyze_sheet")
        .context("Failed to register analyze_sheet table function")?;
    connection
        .register_table_function::<ReadSheetPageTableFunction>("read_sheet_page")
        .context("Failed to register read_sheet_page table function")?;
    Ok(())
}
