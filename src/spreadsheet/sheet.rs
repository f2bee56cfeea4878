use crate::error::SheetPagerError;
use crate::spreadsheet::cell::Cell;
#[cfg(test)]
use crate::spreadsheet::cell::CellValue;
#[cfg(test)]
use std::collections::BTreeMap;

/// One physical row. Cells are dense from column A up to the last defined cell,
/// with gaps filled by blank cells.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Row {
    /// Row index (0-based)
    pub(crate) index: usize,
    pub(crate) cells: Vec<Cell>,
}

impl Row {
    pub(crate) fn new(index: usize) -> Self {
        Row { index, cells: Vec::new() }
    }

    /// Places a cell at its column, padding any gap with blanks.
    /// A later cell at an already filled column replaces the earlier one.
    pub(crate) fn put(&mut self, cell: Cell) {
        let col = cell.col;
        if col < self.cells.len() {
            self.cells[col] = cell;
        } else {
            while self.cells.len() < col {
                let blank = Cell::blank(self.index, self.cells.len());
                self.cells.push(blank);
            }
            self.cells.push(cell);
        }
    }

    /// Builds a row from raw values starting at column A.
    #[cfg(test)]
    pub(crate) fn from_values(index: usize, values: Vec<CellValue>) -> Self {
        let cells = values
            .into_iter()
            .enumerate()
            .map(|(col, value)| Cell::new(index, col, value))
            .collect();
        Row { index, cells }
    }
}

/// Read access to one selected sheet, the seam between the decoder and the pager.
///
/// Rows are usually requested in ascending order. Sources may stream, so a
/// row below the last `discard_before` watermark is not guaranteed to be kept.
pub(crate) trait SheetSource {
    /// Sheet name
    fn name(&self) -> &str;

    /// Index of the first row, `None` for a sheet without rows
    fn first_row_index(&self) -> Option<usize>;

    /// Index of the last row, `None` for a sheet without rows
    fn last_row_index(&self) -> Option<usize>;

    /// Returns the physical row at `index`, or `None` when it does not exist.
    fn row(&mut self, index: usize) -> Result<Option<Row>, SheetPagerError>;

    /// Tells the source that rows before `index` will not be requested again.
    fn discard_before(&mut self, _index: usize) {}
}

/// Sheet whose rows are already in memory, used to drive the pager in tests.
#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub(crate) struct GridSheet {
    name: String,
    rows: BTreeMap<usize, Row>,
}

#[cfg(test)]
impl GridSheet {
    pub(crate) fn new(name: &str) -> Self {
        GridSheet {
            name: name.to_owned(),
            rows: BTreeMap::new(),
        }
    }

    /// Adds a row; row indexes may leave gaps for missing rows.
    pub(crate) fn push(&mut self, row: Row) {
        self.rows.insert(row.index, row);
    }

    /// Builds a sheet from consecutive rows of values starting at row `first`.
    pub(crate) fn from_rows(name: &str, first: usize, rows: Vec<Vec<CellValue>>) -> Self {
        let mut sheet = GridSheet::new(name);
        for (offset, values) in rows.into_iter().enumerate() {
            sheet.push(Row::from_values(first + offset, values));
        }
        sheet
    }
}

#[cfg(test)]
impl SheetSource for GridSheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn first_row_index(&self) -> Option<usize> {
        self.rows.keys().next().copied()
    }

    fn last_row_index(&self) -> Option<usize> {
        self.rows.keys().next_back().copied()
    }

    fn row(&mut self, index: usize) -> Result<Option<Row>, SheetPagerError> {
        Ok(self.rows.get(&index).cloned())
    }
}
