#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use sheetmerge_sheet::UploadedFile;

/// Build an xlsx workbook whose first sheet holds `rows` as text.
/// Empty strings leave the cell unwritten.
pub fn xlsx(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet
                    .write_string(row_idx as u32, col_idx as u16, *value)
                    .unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

pub fn upload(name: &str, rows: &[&[&str]]) -> UploadedFile {
    UploadedFile::new(name, xlsx(rows))
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}
