use crate::cell::{CellValue, FormulaCell};
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use crate::table::Table;
use crate::template::{flatten, TemplateConfig};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook};
use std::io::Cursor;
use std::path::Path;

/// Name of the single sheet in an exported workbook.
pub const EXPORT_SHEET_NAME: &str = "Data";
/// Narrowest exported column, in character widths.
pub const MIN_COLUMN_WIDTH: f64 = 15.0;
/// Widest exported column, in character widths.
pub const MAX_COLUMN_WIDTH: f64 = 50.0;

// 25% grey
const HEADER_FILL: u32 = 0x00C0_C0C0;
// Extra room Excel's own autofit leaves around text
const AUTOFIT_PADDING: f64 = 2.0;

/// Convert calamine Data to CellValue, wrapping it as a formula result
/// when the cell also carries a formula.
fn data_to_cell_value(data: &Data, formula: Option<&str>) -> CellValue {
    let value = match data {
        Data::Empty => CellValue::Blank,
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::Int(i) => CellValue::number(*i as f64),
        Data::Float(f) => CellValue::number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Text(duration_text(dt.as_f64())),
        Data::DateTime(dt) => CellValue::date(dt.as_f64()),
        // Already textual timestamps/durations (ods)
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Unsupported,
    };

    let Some(source) = formula else {
        return value;
    };
    let cell = FormulaCell::new(source);
    let cell = match value {
        CellValue::Number { value, .. } => cell.with_number(value),
        CellValue::Text(text) => cell.with_text(text),
        CellValue::Boolean(b) => cell.with_text(b.to_string()),
        _ => cell,
    };
    CellValue::Formula(cell)
}

/// Elapsed time in days as `H:MM:SS`, hours not wrapping at 24.
fn duration_text(days: f64) -> String {
    let total = (days * 86_400.0).round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    format!("{sign}{}:{:02}:{:02}", total / 3600, total / 60 % 60, total % 60)
}

/// Build a sheet from calamine's value range and, when available, its
/// formula range. Both are addressed by absolute position.
fn sheet_from_ranges(name: &str, values: &Range<Data>, formulas: Option<&Range<String>>) -> Sheet {
    let mut sheet = Sheet::new(name);
    let (start_row, start_col) = values.start().unwrap_or((0, 0));

    for (row, col, data) in values.used_cells() {
        let row = start_row as usize + row;
        let col = start_col as usize + col;
        let formula = formulas
            .and_then(|f| f.get_value((row as u32, col as u32)))
            .map(String::as_str)
            .filter(|s| !s.is_empty());
        sheet.set_cell(row, col, data_to_cell_value(data, formula));
    }

    sheet
}

/// Open a workbook from memory and read its first sheet.
///
/// Any format calamine recognises is accepted. A workbook without sheets
/// reads as an empty sheet.
///
/// # Errors
///
/// Returns error if the bytes cannot be decoded as a workbook.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Sheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let Some(name) = workbook.sheet_names().first().cloned() else {
        return Ok(Sheet::new("Sheet1"));
    };

    let values = workbook.worksheet_range(&name)?;
    // Formula text is optional; without it cached values are used as-is.
    let formulas = workbook.worksheet_formula(&name).ok();

    Ok(sheet_from_ranges(&name, &values, formulas.as_ref()))
}

impl Table {
    /// Parse the first sheet of an uploaded workbook as a plain table.
    ///
    /// # Errors
    ///
    /// Returns error if the workbook cannot be opened or read.
    pub fn from_xlsx_bytes(bytes: &[u8], source_name: &str) -> Result<Self> {
        let sheet = read_first_sheet(bytes)?;
        Ok(Table::from_sheet(&sheet, source_name))
    }

    /// Flatten the first sheet of an uploaded template workbook.
    ///
    /// # Errors
    ///
    /// Returns error if the workbook cannot be opened or read.
    pub fn from_template_bytes(
        bytes: &[u8],
        config: &TemplateConfig,
        source_name: &str,
    ) -> Result<Self> {
        let sheet = read_first_sheet(bytes)?;
        Ok(flatten(&sheet, config, source_name))
    }

    /// Render the table as a single-sheet xlsx workbook.
    ///
    /// Every value is written as text. The header row is bold on a grey
    /// fill and header columns are sized to their content, clamped to
    /// [`MIN_COLUMN_WIDTH`]..=[`MAX_COLUMN_WIDTH`].
    ///
    /// # Errors
    ///
    /// Returns error if the workbook cannot be built or serialized.
    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(EXPORT_SHEET_NAME)?;

        let header_format = Format::new()
            .set_bold()
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(HEADER_FILL));

        for (col_idx, header) in self.headers().iter().enumerate() {
            worksheet.write_string_with_format(0, col_num(col_idx)?, header, &header_format)?;
        }

        for (row_idx, row) in self.rows().iter().enumerate() {
            let row_num = row_num(row_idx + 1)?;
            for (col_idx, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                worksheet.write_string(row_num, col_num(col_idx)?, value)?;
            }
        }

        for col_idx in 0..self.headers().len() {
            worksheet.set_column_width(col_num(col_idx)?, self.column_width(col_idx))?;
        }

        Ok(workbook.save_to_buffer()?)
    }

    /// Write the exported workbook to a file.
    ///
    /// # Errors
    ///
    /// Returns error if the workbook cannot be built or the file written.
    pub fn save_as_xlsx<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_xlsx_bytes()?)?;
        Ok(())
    }

    /// Fitted width of one column, clamped to the export limits.
    fn column_width(&self, col_idx: usize) -> f64 {
        let widest = self
            .headers()
            .get(col_idx)
            .into_iter()
            .chain(self.rows().iter().filter_map(|row| row.get(col_idx)))
            .map(|value| display_width(value))
            .max()
            .unwrap_or(0);

        (widest as f64 + AUTOFIT_PADDING).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
    }
}

/// Approximate rendered width: wide (non-ASCII) characters count double.
fn display_width(value: &str) -> usize {
    value.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

fn row_num(idx: usize) -> Result<u32> {
    u32::try_from(idx).map_err(|_| SheetError::Write("Row index overflow".to_string()))
}

fn col_num(idx: usize) -> Result<u16> {
    u16::try_from(idx).map_err(|_| SheetError::Write("Column index overflow".to_string()))
}
