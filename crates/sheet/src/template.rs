//! Flattening of "template" sheets.
//!
//! A template sheet carries two pivot values (a company and a code) at
//! fixed cells, followed by two fixed-width sub-tables placed side by side
//! that share one header row. Flattening turns every row pair into one wide
//! row prefixed with the pivot values.

use crate::cell::{coerce, is_blank_text};
use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// Header label of the code pivot column.
pub const CODE_HEADER: &str = "코드";
/// Header label of the company pivot column.
pub const COMPANY_HEADER: &str = "회사";

/// Geometry of a template sheet. All coordinates are 0-based.
///
/// The two sub-tables are assumed not to overlap; that is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub company_row: usize,
    pub company_col: usize,
    pub code_row: usize,
    pub code_col: usize,
    /// Row holding both sub-tables' header cells; data starts below it.
    pub data_start_row: usize,
    pub left_table_start_col: usize,
    pub right_table_start_col: usize,
    /// Columns per sub-table, the same for both.
    pub col_count: usize,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig {
            company_row: 0,
            company_col: 1,
            code_row: 1,
            code_col: 1,
            data_start_row: 3,
            left_table_start_col: 0,
            right_table_start_col: 4,
            col_count: 3,
        }
    }
}

impl TemplateConfig {
    /// Reject geometry that cannot describe a sub-table.
    pub fn validate(&self) -> Result<()> {
        if self.col_count == 0 {
            return Err(SheetError::InvalidConfig(
                "col_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of columns in a flattened row
    #[must_use]
    pub fn output_width(&self) -> usize {
        2 + 2 * self.col_count
    }
}

/// Flatten one template sheet into a table.
///
/// The header is `[코드, 회사]` followed by the left and right sub-table
/// headers. Data rows are read from `data_start_row + 1` downwards; absent
/// rows are skipped and the first row whose left sub-table is entirely
/// blank ends the data. The right sub-table is copied as-is.
#[must_use]
pub fn flatten(sheet: &Sheet, config: &TemplateConfig, source_name: &str) -> Table {
    let code = coerce(sheet.cell(config.code_row, config.code_col));
    let company = coerce(sheet.cell(config.company_row, config.company_col));
    tracing::info!(%code, %company, "Extracted pivot values");

    let mut headers = Vec::with_capacity(config.output_width());
    headers.push(CODE_HEADER.to_string());
    headers.push(COMPANY_HEADER.to_string());
    headers.extend(segment(sheet, config.data_start_row, config.left_table_start_col, config.col_count));
    headers.extend(segment(sheet, config.data_start_row, config.right_table_start_col, config.col_count));
    tracing::info!(?headers, "Synthesized template header");

    let mut rows = Vec::new();
    if let Some(last_row) = sheet.last_row() {
        for row_idx in (config.data_start_row + 1)..=last_row {
            if sheet.row(row_idx).is_none() {
                continue;
            }

            let left = segment(sheet, row_idx, config.left_table_start_col, config.col_count);
            if left.iter().all(|v| is_blank_text(v)) {
                break;
            }
            let right = segment(sheet, row_idx, config.right_table_start_col, config.col_count);

            let mut row = Vec::with_capacity(config.output_width());
            row.push(code.clone());
            row.push(company.clone());
            row.extend(left);
            row.extend(right);
            tracing::debug!(row = row_idx, values = ?row, "Flattened row");
            rows.push(row);
        }
    }

    tracing::info!(source = source_name, rows = rows.len(), "Flattened template sheet");
    Table::new(headers, rows, source_name)
}

/// `count` cells of one row starting at `start_col`; absent cells are `""`.
fn segment(sheet: &Sheet, row: usize, start_col: usize, count: usize) -> Vec<String> {
    (start_col..start_col + count)
        .map(|col| coerce(sheet.cell(row, col)))
        .collect()
}
