use crate::error::ResultMessage;
use crate::error::SheetPagerError;
use crate::extension::check_decoded;
use crate::extension::writer::write_to_vector;
use crate::extension::ExtensionError;
use crate::extension::FileParam;
use crate::extension::NamedParam;
use crate::extension::PageParam;
use crate::extension::PageSizeParam;
use crate::extension::Param;
use crate::extension::SheetNameParam;
use crate::extension::DEFAULT_PAGE_SIZE;
use crate::paginate::schema::Schema;
use crate::paginate::schema::TypedRow;
use crate::paginate::window::PageRequest;
use crate::paginate::Paginator;
use crate::paginate::PaginatorConfig;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tracing::info;

/// Rows written per output chunk
const CHUNK_SIZE: usize = 2048;

/// Parameters for reading one page of a sheet.
struct ReadSheetPageParameters {
    /// Path or URL of the workbook
    file_name: String,
    /// Exact sheet name, the first sheet when absent
    sheet_name: Option<String>,
    /// Zero-based page number (default: 0)
    page: Option<i64>,
    /// Rows per page (default: 100)
    page_size: Option<i64>,
}

impl TryFrom<&BindInfo> for ReadSheetPageParameters {
    type Error = SheetPagerError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        Ok(ReadSheetPageParameters {
            file_name: FileParam::read(bind, 0)?,
            sheet_name: SheetNameParam::read(bind)?,
            page: PageParam::read(bind)?,
            page_size: PageSizeParam::read(bind)?,
        })
    }
}

#[repr(C)]
/// Detected schema and the converted rows of the requested page.
pub(crate) struct ReadSheetPageBindData {
    schema: Schema,
    rows: Vec<TypedRow>,
}

impl TryFrom<&ReadSheetPageParameters> for ReadSheetPageBindData {
    type Error = SheetPagerError;

    fn try_from(parameters: &ReadSheetPageParameters) -> Result<Self, Self::Error> {
        let request = PageRequest::try_new(
            parameters.page.unwrap_or(0),
            parameters.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )?;
        let mut paginator = Paginator::new(PaginatorConfig {
            path: parameters.file_name.to_owned(),
            sheet_name: parameters.sheet_name.to_owned(),
        });
        let rows = paginator.iterate_rows(request.page(), request.page_size())?;
        let schema = paginator.schema().cloned().unwrap_or_default();
        if schema.is_empty() {
            check_decoded(paginator.errors())?;
            Err(ExtensionError::EmptySchemaError)?;
        }
        info!(
            "page {} of '{}': {} rows, {} recorded errors",
            request.page(),
            parameters.file_name,
            rows.len(),
            paginator.errors().errors().len()
        );
        Ok(ReadSheetPageBindData { schema, rows })
    }
}

#[repr(C)]
/// Iteration state of one scan.
pub(crate) struct ReadSheetPageInitData {
    /// Index of the next row to emit
    index: AtomicUsize,
    /// Column indices that should be projected
    projections: Vec<usize>,
}

/// `read_sheet_page(file, sheet_name := ..., page := 0, page_size := 100)`
pub(crate) struct ReadSheetPageTableFunction;

impl VTab for ReadSheetPageTableFunction {
    type InitData = ReadSheetPageInitData;
    type BindData = ReadSheetPageBindData;

    /// Reads the page and registers one result column per detected field.
    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = ReadSheetPageParameters::try_from(bind)?;
        let data = ReadSheetPageBindData::try_from(&parameters).with_prefix(parameters.file_name.as_str())?;
        for field in data.schema.fields() {
            bind.add_result_column(field.name.as_str(), LogicalTypeHandle::from(field.kind.to_logical_type_id()));
        }
        Ok(data)
    }

    fn init(init: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        let projections = init.get_column_indices()
            .into_iter()
            .map(|index| index as usize)
            .collect::<Vec<_>>();
        Ok(ReadSheetPageInitData {
            index: AtomicUsize::new(0),
            projections,
        })
    }

    /// Emits the page rows in chunks until all of them are written.
    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn Error>> {
        let bind = func.get_bind_data();
        let init = func.get_init_data();
        let lower = init.index.fetch_add(CHUNK_SIZE, Ordering::Relaxed);
        let upper = bind.rows.len().min(lower.saturating_add(CHUNK_SIZE));
        if lower < upper {
            let mut vectors: Vec<_> = (0..init.projections.len()).map(|index| output.flat_vector(index)).collect();
            for (row, record) in bind.rows[lower..upper].iter().enumerate() {
                for (index, col) in init.projections.iter().enumerate() {
                    let value = record.values.get(*col).and_then(|value| value.as_ref());
                    write_to_vector(&mut vectors[index], row, value);
                }
            }
            output.set_len(upper - lower);
        } else {
            output.set_len(0);
        }
        Ok(())
    }

    fn supports_pushdown() -> bool {
        true
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![
            FileParam::kind(),
        ])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![
            SheetNameParam::definition(),
            PageParam::definition(),
            PageSizeParam::definition(),
        ])
    }
}
