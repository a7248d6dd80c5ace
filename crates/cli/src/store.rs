//! Session state persisted as a JSON file between invocations.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sheetmerge_sheet::{SessionId, SessionKey, SessionStore, SessionValue, Table, TemplateConfig};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    table: Option<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template_config: Option<TemplateConfig>,
}

impl SessionEntry {
    fn is_empty(&self) -> bool {
        self.table.is_none() && self.template_config.is_none()
    }
}

/// A [`SessionStore`] backed by one JSON file holding every session.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    sessions: IndexMap<SessionId, SessionEntry>,
}

impl FileStore {
    /// Load the state file, starting empty if it does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let sessions = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read state file: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Corrupt state file: {}", path.display()))?
        } else {
            IndexMap::new()
        };
        tracing::debug!(path = %path.display(), sessions = sessions.len(), "Loaded session state");
        Ok(FileStore { path, sessions })
    }

    /// Write the state back to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(&self.sessions)?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "Saved session state");
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, session: &SessionId, key: SessionKey) -> Option<SessionValue> {
        let entry = self.sessions.get(session)?;
        match key {
            SessionKey::Table => entry.table.clone().map(SessionValue::Table),
            SessionKey::TemplateConfig => entry.template_config.map(SessionValue::TemplateConfig),
        }
    }

    fn put(&mut self, session: &SessionId, value: SessionValue) {
        let entry = self.sessions.entry(session.clone()).or_default();
        match value {
            SessionValue::Table(table) => entry.table = Some(table),
            SessionValue::TemplateConfig(config) => entry.template_config = Some(config),
        }
    }

    fn remove(&mut self, session: &SessionId, key: SessionKey) {
        let Some(entry) = self.sessions.get_mut(session) else {
            return;
        };
        match key {
            SessionKey::Table => entry.table = None,
            SessionKey::TemplateConfig => entry.template_config = None,
        }
        if entry.is_empty() {
            self.sessions.shift_remove(session);
        }
    }
}
