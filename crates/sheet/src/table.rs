use crate::cell::{coerce, is_blank_text};
use crate::sheet::{Row, Sheet};
use serde::{Deserialize, Serialize};

/// Source name given to tables replaced through an in-place edit.
pub const EDITED_SOURCE_NAME: &str = "merged_data";

/// A header row plus data rows, all as strings.
///
/// Tables are values: merging or editing produces a new `Table`.
/// Rows are not forced to the header's width; ragged rows from the
/// source sheet are kept as read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    source_name: String,
}

impl Table {
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, source_name: &str) -> Self {
        Table {
            headers,
            rows,
            source_name: source_name.to_string(),
        }
    }

    /// An empty table: no headers, no rows, no source.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the replacement table for a user edit.
    #[must_use]
    pub fn edited(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::new(headers, rows, EDITED_SOURCE_NAME)
    }

    /// Parse a sheet: the first present row is the header, every later
    /// row with at least one non-blank value is a data row.
    #[must_use]
    pub fn from_sheet(sheet: &Sheet, source_name: &str) -> Self {
        let first_col = sheet.first_col().unwrap_or(0);
        let mut rows = sheet.rows();

        let headers = rows
            .next()
            .map(|(_, row)| row_values(row, first_col, 0))
            .unwrap_or_default();

        let rows: Vec<Vec<String>> = rows
            .map(|(_, row)| row_values(row, first_col, headers.len()))
            .filter(|values| values.iter().any(|v| !is_blank_text(v)))
            .collect();

        tracing::info!(
            source = source_name,
            columns = headers.len(),
            rows = rows.len(),
            "Parsed sheet"
        );

        Self::new(headers, rows, source_name)
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows (the header is not counted)
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// True when there is no header (an empty sheet or no data yet).
    #[must_use]
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Check whether `other` can be merged into this table.
    #[must_use]
    pub fn headers_match(&self, other: &Table) -> bool {
        validate_headers(&self.headers, &other.headers)
    }

    /// Append `incoming`'s rows after this table's rows.
    ///
    /// The result keeps this table's headers and source name. Headers are
    /// not compared here; check with [`Table::headers_match`] first, or
    /// the appended rows may not line up with the header.
    #[must_use]
    pub fn merge(self, incoming: Table) -> Table {
        let mut rows = self.rows;
        rows.extend(incoming.rows);
        Table {
            headers: self.headers,
            rows,
            source_name: self.source_name,
        }
    }
}

/// Headers are compatible when they have the same length and every
/// position holds exactly the same name.
#[must_use]
pub fn validate_headers(base: &[String], incoming: &[String]) -> bool {
    base.len() == incoming.len() && base.iter().zip(incoming).all(|(a, b)| a == b)
}

/// Values from the sheet's leftmost used column up to the row's last
/// present cell, and at least `min_width` of them. Missing cells read
/// as `""` so every value stays under its header column.
fn row_values(row: &Row, first_col: usize, min_width: usize) -> Vec<String> {
    let width = row
        .last_col()
        .filter(|&last| last >= first_col)
        .map_or(0, |last| last - first_col + 1)
        .max(min_width);
    (first_col..first_col + width)
        .map(|col| coerce(row.cell(col)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn table(headers: &[&str], rows: &[&[&str]], source: &str) -> Table {
        Table::new(
            strings(headers),
            rows.iter().map(|r| strings(r)).collect(),
            source,
        )
    }

    #[test]
    fn test_validate_headers() {
        let h = strings(&["a", "b", "c"]);
        assert!(validate_headers(&h, &h));
        assert!(validate_headers(&[], &[]));
        assert!(!validate_headers(&h, &strings(&["a", "b"])));
        assert!(!validate_headers(&h, &strings(&["a", "c", "b"])));
        assert!(!validate_headers(&h, &strings(&["A", "b", "c"])));
        assert!(!validate_headers(&h, &strings(&["a ", "b", "c"])));
    }

    #[test]
    fn test_merge_appends_in_order() {
        let base = table(&["a", "b"], &[&["1", "2"], &["3", "4"]], "first.xlsx");
        let incoming = table(&["a", "b"], &[&["5", "6"]], "second.xlsx");

        let merged = base.merge(incoming);

        assert_eq!(merged.headers(), strings(&["a", "b"]).as_slice());
        assert_eq!(merged.row_count(), 3);
        assert_eq!(merged.rows()[0], strings(&["1", "2"]));
        assert_eq!(merged.rows()[2], strings(&["5", "6"]));
        assert_eq!(merged.source_name(), "first.xlsx");
    }

    #[test]
    fn test_merge_keeps_duplicates_and_base_headers() {
        let base = table(&["a"], &[&["x"]], "base");
        let incoming = table(&["other"], &[&["x"]], "incoming");

        let merged = base.merge(incoming);

        assert_eq!(merged.headers(), strings(&["a"]).as_slice());
        assert_eq!(merged.rows(), &[strings(&["x"]), strings(&["x"])]);
    }

    #[test]
    fn test_parse_skips_blank_rows_anywhere() {
        let sheet = Sheet::from_data(vec![
            vec![Some("name"), Some("qty")],
            vec![Some(""), Some("   ")],
            vec![Some("apple"), Some("3")],
            vec![None, None],
            vec![Some("pear"), None],
            vec![Some(" "), None],
        ]);

        let parsed = Table::from_sheet(&sheet, "fruit.xlsx");

        assert_eq!(parsed.headers(), strings(&["name", "qty"]).as_slice());
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.rows()[0], strings(&["apple", "3"]));
        assert_eq!(parsed.rows()[1], strings(&["pear", ""]));
        assert_eq!(parsed.source_name(), "fruit.xlsx");
    }

    #[test]
    fn test_parse_empty_sheet() {
        let parsed = Table::from_sheet(&Sheet::new("Sheet1"), "empty.xlsx");
        assert!(!parsed.has_headers());
        assert_eq!(parsed.row_count(), 0);
    }

    #[test]
    fn test_parse_coerces_typed_cells() {
        let mut sheet = Sheet::new("Sheet1");
        sheet.set_cell(0, 0, "id");
        sheet.set_cell(0, 1, "price");
        sheet.set_cell(0, 2, "active");
        sheet.set_cell(1, 0, 7.0);
        sheet.set_cell(1, 1, 9.5);
        sheet.set_cell(1, 2, true);

        let parsed = Table::from_sheet(&sheet, "typed.xlsx");

        assert_eq!(parsed.rows()[0], strings(&["7", "9.5", "true"]));
    }

    #[test]
    fn test_parse_fills_interior_gaps_and_offsets() {
        let mut sheet = Sheet::new("Sheet1");
        // Table anchored at C3
        sheet.set_cell(2, 2, "a");
        sheet.set_cell(2, 3, "b");
        sheet.set_cell(2, 4, "c");
        sheet.set_cell(3, 2, "1");
        sheet.set_cell(3, 4, CellValue::number(3.0));

        let parsed = Table::from_sheet(&sheet, "offset.xlsx");

        assert_eq!(parsed.headers(), strings(&["a", "b", "c"]).as_slice());
        assert_eq!(parsed.rows()[0], strings(&["1", "", "3"]));
    }

    #[test]
    fn test_parse_pads_short_rows_to_header_width() {
        let sheet = Sheet::from_data(vec![
            vec![Some("a"), Some("b"), Some("c")],
            vec![Some("x"), None, None],
            vec![Some("1"), Some("2"), Some("3"), Some("extra")],
        ]);

        let parsed = Table::from_sheet(&sheet, "short.xlsx");

        assert_eq!(parsed.rows()[0], strings(&["x", "", ""]));
        // wider rows are kept as read
        assert_eq!(parsed.rows()[1], strings(&["1", "2", "3", "extra"]));
    }

    #[test]
    fn test_edited_table() {
        let edited = Table::edited(strings(&["h"]), vec![strings(&["v"])]);
        assert_eq!(edited.source_name(), EDITED_SOURCE_NAME);
        assert_eq!(edited.row_count(), 1);
    }
}
