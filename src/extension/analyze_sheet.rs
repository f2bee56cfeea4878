use crate::error::ResultMessage;
use crate::error::SheetPagerError;
use crate::extension::check_decoded;
use crate::extension::FileParam;
use crate::extension::NamedParam;
use crate::extension::Param;
use crate::extension::SheetNameParam;
use crate::paginate::errors::ErrorCollector;
use crate::paginate::extract_page;
use crate::paginate::window::PageRequest;
use crate::paginate::PaginatorConfig;
use duckdb::core::DataChunkHandle;
use duckdb::core::Inserter;
use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// Parameters for the analyze_sheet table function
struct AnalyzeSheetParameters {
    /// Path to the spreadsheet file
    file_name: String,
    /// Exact sheet name, the first sheet when absent
    sheet_name: Option<String>,
}

impl TryFrom<&BindInfo> for AnalyzeSheetParameters {
    type Error = SheetPagerError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        Ok(AnalyzeSheetParameters {
            file_name: FileParam::read(bind, 0)?,
            sheet_name: SheetNameParam::read(bind)?,
        })
    }
}

#[repr(C)]
/// Bind data for the analyze_sheet table function containing the detected columns
pub(crate) struct AnalyzeSheetBindData {
    /// Vector of (column_name, column_type) pairs
    columns: Vec<(String, String)>,
}

impl TryFrom<&AnalyzeSheetParameters> for AnalyzeSheetBindData {
    type Error = SheetPagerError;

    /// Detects the header of the sheet without converting any data row
    fn try_from(parameters: &AnalyzeSheetParameters) -> Result<Self, Self::Error> {
        let config = PaginatorConfig {
            path: parameters.file_name.to_owned(),
            sheet_name: parameters.sheet_name.to_owned(),
        };
        let mut errors = ErrorCollector::new();
        let page = extract_page(&config, &PageRequest::new(0, 0), &mut errors)?;
        if page.schema.is_empty() {
            check_decoded(&errors)?;
        }
        let columns = page.schema
            .fields()
            .iter()
            .map(|field| (field.name.to_owned(), field.kind.as_str().to_owned()))
            .collect();
        Ok(AnalyzeSheetBindData { columns })
    }
}

#[repr(C)]
/// Init data for the analyze_sheet table function tracking iteration state
pub(crate) struct AnalyzeSheetInitData {
    /// Atomic counter tracking the current processing index
    index: AtomicUsize,
}

/// Table function reporting the columns `read_sheet_page` would return
pub(crate) struct AnalyzeSheetTableFunction;

impl VTab for AnalyzeSheetTableFunction {
    type InitData = AnalyzeSheetInitData;
    type BindData = AnalyzeSheetBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = AnalyzeSheetParameters::try_from(bind)?;
        let data = AnalyzeSheetBindData::try_from(&parameters).with_prefix(parameters.file_name.as_str())?;
        bind.add_result_column(
            "column_name",
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        );
        bind.add_result_column(
            "column_type",
            LogicalTypeHandle::from(LogicalTypeId::Varchar),
        );
        Ok(data)
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(AnalyzeSheetInitData {
            index: AtomicUsize::new(0),
        })
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn Error>> {
        let init = func.get_init_data();
        let bind = func.get_bind_data();
        let lower = init.index.fetch_add(2048, Ordering::Relaxed);
        let upper = bind.columns.len().min(lower + 2048);
        if lower < upper {
            let columns = output.flat_vector(0);
            let kinds = output.flat_vector(1);
            for index in lower..upper {
                let (column_name, kind_name) = &bind.columns[index];
                columns.insert(index - lower, column_name.as_str());
                kinds.insert(index - lower, kind_name.as_str());
            }
            output.set_len(upper - lower);
        } else {
            output.set_len(0);
        }
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![
            FileParam::kind(),
        ])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![
            SheetNameParam::definition(),
        ])
    }
}
