//! Per-session orchestration of uploads, edits and exports.
//!
//! Each session owns at most one [`Table`] and one [`TemplateConfig`],
//! kept in a caller-supplied [`SessionStore`]. Every operation reads the
//! current value, computes a new one and writes it back whole.

use crate::error::{Result, SheetError};
use crate::table::Table;
use crate::template::TemplateConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// File name suggested for exported workbooks.
pub const EXPORT_FILE_NAME: &str = "merged_excel_data.xlsx";
/// Content type of exported workbooks.
pub const EXPORT_CONTENT_TYPE: &str = "application/octet-stream";

/// Opaque handle naming one user's private state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new<S: Into<String>>(id: S) -> Self {
        SessionId(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The values a session stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Table,
    TemplateConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionValue {
    Table(Table),
    TemplateConfig(TemplateConfig),
}

/// Key-value storage scoped by session.
pub trait SessionStore {
    fn get(&self, session: &SessionId, key: SessionKey) -> Option<SessionValue>;
    fn put(&mut self, session: &SessionId, value: SessionValue);
    fn remove(&mut self, session: &SessionId, key: SessionKey);
}

impl SessionValue {
    #[must_use]
    pub fn key(&self) -> SessionKey {
        match self {
            SessionValue::Table(_) => SessionKey::Table,
            SessionValue::TemplateConfig(_) => SessionKey::TemplateConfig,
        }
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<(SessionId, SessionKey), SessionValue>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, session: &SessionId, key: SessionKey) -> Option<SessionValue> {
        self.values.get(&(session.clone(), key)).cloned()
    }

    fn put(&mut self, session: &SessionId, value: SessionValue) {
        self.values.insert((session.clone(), value.key()), value);
    }

    fn remove(&mut self, session: &SessionId, key: SessionKey) {
        self.values.remove(&(session.clone(), key));
    }
}

/// An uploaded file: its original name and raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    #[must_use]
    pub fn new<S: Into<String>>(name: S, bytes: Vec<u8>) -> Self {
        UploadedFile {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, named after its file name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, std::fs::read(path)?))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Why a file was left out of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    HeaderMismatch,
    Unreadable,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::HeaderMismatch => f.write_str("header mismatch"),
            FailureReason::Unreadable => f.write_str("processing error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub name: String,
    pub reason: FailureReason,
}

impl fmt::Display for FailedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.reason)
    }
}

/// Outcome of one upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: Vec<FailedFile>,
    /// Rows in the session table after the batch.
    pub total_rows: usize,
}

impl BatchReport {
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file(s) merged ({} rows total)",
            self.succeeded, self.total_rows
        )?;
        if !self.failed.is_empty() {
            write!(f, ", {} file(s) failed", self.failed.len())?;
        }
        Ok(())
    }
}

/// A rendered workbook ready for download.
#[derive(Debug, Clone)]
pub struct Export {
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// How each file in a batch is parsed and joined to the running table.
#[derive(Debug, Clone, Copy)]
enum Ingest {
    /// Plain tables; each file's header must match the base.
    Generic,
    /// Template sheets; the header comes from the config, so it is not rechecked.
    Template(TemplateConfig),
}

impl Ingest {
    fn checks_headers(self) -> bool {
        matches!(self, Ingest::Generic)
    }
}

/// One session's view of a store.
pub struct Session<'s, S: SessionStore + ?Sized> {
    store: &'s mut S,
    id: SessionId,
}

impl<'s, S: SessionStore + ?Sized> Session<'s, S> {
    pub fn new(store: &'s mut S, id: SessionId) -> Self {
        Session { store, id }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The stored table, or an empty one.
    #[must_use]
    pub fn table(&self) -> Table {
        self.stored_table().unwrap_or_default()
    }

    /// The stored template config, or the default geometry.
    #[must_use]
    pub fn config(&self) -> TemplateConfig {
        match self.store.get(&self.id, SessionKey::TemplateConfig) {
            Some(SessionValue::TemplateConfig(config)) => config,
            _ => TemplateConfig::default(),
        }
    }

    /// Store a template config after validating it.
    pub fn save_config(&mut self, config: TemplateConfig) -> Result<()> {
        config.validate()?;
        self.store.put(&self.id, SessionValue::TemplateConfig(config));
        tracing::info!(session = %self.id, ?config, "Template config saved");
        Ok(())
    }

    /// Store the default template config.
    pub fn reset_config(&mut self) {
        self.store
            .put(&self.id, SessionValue::TemplateConfig(TemplateConfig::default()));
        tracing::info!(session = %self.id, "Template config reset");
    }

    /// Merge plain spreadsheets into the session table.
    ///
    /// Files are handled in order. The first readable file becomes the base
    /// when the session has no table yet; later files are appended only if
    /// their header matches the base exactly.
    pub fn upload(&mut self, files: &[UploadedFile]) -> Result<BatchReport> {
        self.ingest(files, Ingest::Generic)
    }

    /// Flatten template spreadsheets with the session config and merge them
    /// into the session table.
    pub fn upload_templates(&mut self, files: &[UploadedFile]) -> Result<BatchReport> {
        let config = self.config();
        self.ingest(files, Ingest::Template(config))
    }

    /// Replace the session table with user-edited content.
    pub fn update(&mut self, headers: Vec<String>, rows: Vec<Vec<String>>) -> Table {
        let table = Table::edited(headers, rows);
        self.store.put(&self.id, SessionValue::Table(table.clone()));
        tracing::info!(session = %self.id, rows = table.row_count(), "Table replaced by edit");
        table
    }

    /// Render the session table as a workbook.
    pub fn export(&self) -> Result<Export> {
        let table = self
            .stored_table()
            .filter(|t| t.row_count() > 0)
            .ok_or(SheetError::NothingToExport)?;

        let bytes = table.to_xlsx_bytes()?;
        tracing::info!(session = %self.id, rows = table.row_count(), bytes = bytes.len(), "Exported table");

        Ok(Export {
            file_name: EXPORT_FILE_NAME,
            content_type: EXPORT_CONTENT_TYPE,
            bytes,
        })
    }

    /// Drop the session table. The template config is kept.
    pub fn clear(&mut self) {
        self.store.remove(&self.id, SessionKey::Table);
        tracing::info!(session = %self.id, "Table cleared");
    }

    fn stored_table(&self) -> Option<Table> {
        match self.store.get(&self.id, SessionKey::Table) {
            Some(SessionValue::Table(table)) => Some(table),
            _ => None,
        }
    }

    fn ingest(&mut self, files: &[UploadedFile], mode: Ingest) -> Result<BatchReport> {
        let files: Vec<&UploadedFile> = files.iter().filter(|f| !f.is_empty()).collect();
        if files.is_empty() {
            return Err(SheetError::NoFiles);
        }

        let mut report = BatchReport::default();
        let mut merged = self.stored_table().filter(Table::has_headers);

        for file in files {
            let parsed = match mode {
                Ingest::Generic => Table::from_xlsx_bytes(&file.bytes, &file.name),
                Ingest::Template(config) => Table::from_template_bytes(&file.bytes, &config, &file.name),
            };

            let incoming = match parsed {
                Ok(table) => table,
                Err(e) => {
                    tracing::warn!(file = %file.name, error = %e, "Failed to read file");
                    report.failed.push(FailedFile {
                        name: file.name.clone(),
                        reason: FailureReason::Unreadable,
                    });
                    continue;
                }
            };

            merged = match merged {
                Some(base) if mode.checks_headers() && !base.headers_match(&incoming) => {
                    tracing::warn!(file = %file.name, "Header mismatch, file skipped");
                    report.failed.push(FailedFile {
                        name: file.name.clone(),
                        reason: FailureReason::HeaderMismatch,
                    });
                    Some(base)
                }
                Some(base) => {
                    report.succeeded += 1;
                    Some(base.merge(incoming))
                }
                None => {
                    report.succeeded += 1;
                    Some(incoming)
                }
            };

            // A header-less first file cannot serve as the base.
            merged = merged.filter(Table::has_headers);
        }

        if let Some(table) = &merged {
            report.total_rows = table.row_count();
            self.store.put(&self.id, SessionValue::Table(table.clone()));
        }

        tracing::info!(
            session = %self.id,
            succeeded = report.succeeded,
            failed = report.failure_count(),
            rows = report.total_rows,
            "Upload batch finished"
        );
        Ok(report)
    }
}
