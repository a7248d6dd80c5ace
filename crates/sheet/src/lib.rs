//! Spreadsheet merging for sheetmerge
//!
//! Reads uploaded workbooks into string tables, merges tables that share a
//! header, flattens "template" sheets (two pivot cells plus two side-by-side
//! sub-tables) into wide rows, and exports the result as a single xlsx sheet.
//!
//! # Examples
//!
//! ## Parsing and merging
//!
//! ```
//! use sheetmerge_sheet::{Sheet, Table};
//!
//! let first = Table::from_sheet(
//!     &Sheet::from_data(vec![vec!["name", "qty"], vec!["apple", "3"]]),
//!     "a.xlsx",
//! );
//! let second = Table::from_sheet(
//!     &Sheet::from_data(vec![vec!["name", "qty"], vec!["pear", "5"]]),
//!     "b.xlsx",
//! );
//!
//! assert!(first.headers_match(&second));
//! let merged = first.merge(second);
//! assert_eq!(merged.row_count(), 2);
//! assert_eq!(merged.source_name(), "a.xlsx");
//! ```
//!
//! ## Flattening a template sheet
//!
//! ```
//! use sheetmerge_sheet::{flatten, Sheet, TemplateConfig};
//!
//! let mut sheet = Sheet::new("Sheet1");
//! sheet.set_cell(0, 1, "Acme");
//! sheet.set_cell(1, 1, "C1");
//! sheet.set_cell(3, 0, "Name");
//! sheet.set_cell(3, 4, "Name2");
//! sheet.set_cell(4, 0, "Kim");
//!
//! let config = TemplateConfig { col_count: 1, ..TemplateConfig::default() };
//! let table = flatten(&sheet, &config, "t.xlsx");
//!
//! assert_eq!(table.headers(), ["코드", "회사", "Name", "Name2"]);
//! assert_eq!(table.rows()[0], ["C1", "Acme", "Kim", ""]);
//! ```
//!
//! ## Session workflow
//!
//! ```
//! use sheetmerge_sheet::{MemoryStore, Session, SessionId};
//!
//! let mut store = MemoryStore::new();
//! let mut session = Session::new(&mut store, SessionId::new("user-1"));
//!
//! session.update(vec!["a".to_string()], vec![vec!["1".to_string()]]);
//! let export = session.export().unwrap();
//! assert_eq!(export.file_name, "merged_excel_data.xlsx");
//! ```

mod cell;
mod error;
mod session;
mod sheet;
mod table;
mod template;
mod xlsx;

/// Re-export cell types and coercion.
pub use cell::{coerce, CellValue, FormulaCell};
/// Re-export error types.
pub use error::{Result, SheetError};
/// Re-export session orchestration.
pub use session::{
    BatchReport, Export, FailedFile, FailureReason, MemoryStore, Session, SessionId, SessionKey,
    SessionStore, SessionValue, UploadedFile, EXPORT_CONTENT_TYPE, EXPORT_FILE_NAME,
};
/// Re-export the worksheet read view.
pub use sheet::{Row, Sheet};
/// Re-export table types.
pub use table::{validate_headers, Table, EDITED_SOURCE_NAME};
/// Re-export template flattening.
pub use template::{flatten, TemplateConfig, CODE_HEADER, COMPANY_HEADER};
/// Re-export workbook I/O.
pub use xlsx::{read_first_sheet, EXPORT_SHEET_NAME, MAX_COLUMN_WIDTH, MIN_COLUMN_WIDTH};
