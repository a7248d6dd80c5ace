use thiserror::Error;

/// Errors that can occur while reading, merging or exporting sheets
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Failed to open workbook: {0}")]
    Open(String),

    #[error("Failed to write workbook: {0}")]
    Write(String),

    #[error("Invalid template config: {0}")]
    InvalidConfig(String),

    #[error("No files to process")]
    NoFiles,

    #[error("No data to export")]
    NothingToExport,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<calamine::Error> for SheetError {
    fn from(err: calamine::Error) -> Self {
        SheetError::Open(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for SheetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        SheetError::Write(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SheetError>;
