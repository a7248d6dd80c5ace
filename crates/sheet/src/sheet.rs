use crate::cell::CellValue;

/// One worksheet row. Cells are indexed by absolute column; a column with
/// nothing stored in it is absent rather than blank.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<Option<CellValue>>,
}

impl Row {
    /// Get the cell at an absolute column, if present
    #[must_use]
    pub fn cell(&self, col: usize) -> Option<&CellValue> {
        self.cells.get(col).and_then(Option::as_ref)
    }

    /// Column of the first present cell
    #[must_use]
    pub fn first_col(&self) -> Option<usize> {
        self.cells.iter().position(Option::is_some)
    }

    /// Column of the last present cell
    #[must_use]
    pub fn last_col(&self) -> Option<usize> {
        self.cells.iter().rposition(Option::is_some)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    fn set(&mut self, col: usize, value: CellValue) {
        if self.cells.len() <= col {
            self.cells.resize(col + 1, None);
        }
        self.cells[col] = Some(value);
    }
}

/// Read view over the first worksheet of a workbook, addressed by absolute
/// 0-based `(row, col)` coordinates.
///
/// Rows that hold no cells are absent: `row()` returns `None` for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    name: String,
    rows: Vec<Option<Row>>,
}

impl Sheet {
    /// Create a new empty sheet with a name
    #[must_use]
    pub fn new(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    /// Create a sheet from a 2D vector of values anchored at `(0, 0)`.
    /// Blank values are stored as absent cells.
    #[must_use]
    pub fn from_data<T: Into<CellValue>>(data: Vec<Vec<T>>) -> Self {
        let mut sheet = Sheet::new("Sheet1");
        for (row, values) in data.into_iter().enumerate() {
            for (col, value) in values.into_iter().enumerate() {
                sheet.set_cell(row, col, value);
            }
        }
        sheet
    }

    /// Get the sheet name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a value at an absolute position. Blank values are ignored.
    pub fn set_cell<T: Into<CellValue>>(&mut self, row: usize, col: usize, value: T) {
        let value = value.into();
        if value.is_blank() {
            return;
        }
        if self.rows.len() <= row {
            self.rows.resize(row + 1, None);
        }
        self.rows[row].get_or_insert_with(Row::default).set(col, value);
    }

    /// Index of the last row holding any cell
    #[must_use]
    pub fn last_row(&self) -> Option<usize> {
        self.rows
            .iter()
            .rposition(|row| row.as_ref().is_some_and(|r| !r.is_empty()))
    }

    /// Leftmost column holding any cell
    #[must_use]
    pub fn first_col(&self) -> Option<usize> {
        self.rows.iter().flatten().filter_map(Row::first_col).min()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_row().is_none()
    }

    /// Get a row by absolute index, `None` if the row holds no cells
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows
            .get(index)
            .and_then(Option::as_ref)
            .filter(|row| !row.is_empty())
    }

    /// Get a cell by absolute position, `None` if absent
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.row(row).and_then(|r| r.cell(col))
    }

    /// Iterate present rows with their absolute indices, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = (usize, &Row)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(idx, row)| row.as_ref().filter(|r| !r.is_empty()).map(|r| (idx, r)))
    }
}
