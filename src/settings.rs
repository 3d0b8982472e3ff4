//! Flat string key/value settings.
//!
//! Backs notes, tasks, snippets and the raw storage editor of the panel.
//! Keys owned by HoloDesk carry the [`KEY_PREFIX`] namespace. The whole map
//! is persisted as one JSON object and rewritten on every change. This
//! surface shares nothing with the blob store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HoloError, Result};

/// Namespace of keys owned by HoloDesk.
pub const KEY_PREFIX: &str = "holodesk-";

/// Export document: `{"localStorage": {"holodesk-notes": "..."}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsExport {
    #[serde(rename = "localStorage")]
    pub local_storage: BTreeMap<String, String>,
}

/// Import document; `localStorage` may be absent and values may be any JSON.
#[derive(Debug, Deserialize)]
struct SettingsImport {
    #[serde(rename = "localStorage")]
    local_storage: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Persistent flat key/value map.
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl SettingsStore {
    /// Loads the settings file at `path`; a missing file is an empty map.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                HoloError::invalid_settings(format!("{} is not a string map: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(HoloError::storage_io(
                    format!("Failed to read {}", path.display()),
                    e,
                ))
            }
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Settings loaded");
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// Creates a store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// The map is left untouched if the change cannot be persisted.
    pub async fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let mut next = self.entries.clone();
        next.insert(key.into(), value.into());
        self.commit(next).await
    }

    /// Removes `key`. Returns whether it was present.
    pub async fn remove(&mut self, key: &str) -> Result<bool> {
        if !self.entries.contains_key(key) {
            return Ok(false);
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.commit(next).await?;
        Ok(true)
    }

    /// HoloDesk-owned keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        // BTreeMap iterates in key order.
        self.entries
            .keys()
            .filter(|k| k.starts_with(KEY_PREFIX))
            .cloned()
            .collect()
    }

    /// Snapshot of all HoloDesk-owned entries.
    pub fn export(&self) -> SettingsExport {
        SettingsExport {
            local_storage: self
                .entries
                .iter()
                .filter(|(k, _)| k.starts_with(KEY_PREFIX))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Export document as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.export())
            .map_err(|e| HoloError::invalid_settings(format!("Failed to serialize export: {}", e)))
    }

    /// Merges every entry of an export document into the map.
    ///
    /// All keys are imported, prefixed or not. Non-string values are stored
    /// as their JSON text. Returns the number of entries written.
    pub async fn import(&mut self, json: &str) -> Result<usize> {
        let document: SettingsImport = serde_json::from_str(json)
            .map_err(|e| HoloError::invalid_settings(format!("Import is not valid JSON: {}", e)))?;

        let Some(entries) = document.local_storage else {
            return Ok(0);
        };

        let count = entries.len();
        if count == 0 {
            return Ok(0);
        }

        let mut next = self.entries.clone();
        for (key, value) in entries {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            next.insert(key, value);
        }

        self.commit(next).await?;
        tracing::info!(count, "Settings imported");
        Ok(count)
    }

    /// Persists `next` and only then makes it the live map.
    async fn commit(&mut self, next: BTreeMap<String, String>) -> Result<()> {
        self.persist(&next).await?;
        self.entries = next;
        Ok(())
    }

    /// Writes `entries` to disk through a temp file and rename.
    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                HoloError::storage_io(format!("Failed to create {}", parent.display()), e)
            })?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| HoloError::invalid_settings(format!("Failed to serialize settings: {}", e)))?;

        let temp = path.with_extension("json.tmp");
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| HoloError::storage_io(format!("Failed to write {}", temp.display()), e))?;
        tokio::fs::rename(&temp, path)
            .await
            .map_err(|e| HoloError::storage_io(format!("Failed to commit {}", path.display()), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::tempdir;

    #[tokio::test]
    async fn set_get_remove() {
        let mut settings = SettingsStore::in_memory();
        settings.set("holodesk-notes", "[]").await.unwrap();
        assert_eq!(settings.get("holodesk-notes"), Some("[]"));

        assert!(settings.remove("holodesk-notes").await.unwrap());
        assert!(!settings.remove("holodesk-notes").await.unwrap());
        assert!(settings.get("holodesk-notes").is_none());
    }

    #[tokio::test]
    async fn keys_are_prefixed_and_sorted() {
        let mut settings = SettingsStore::in_memory();
        settings.set("holodesk-tasks", "[]").await.unwrap();
        settings.set("other-app", "x").await.unwrap();
        settings.set("holodesk-notes", "[]").await.unwrap();

        assert_eq!(settings.keys(), vec!["holodesk-notes", "holodesk-tasks"]);
    }

    #[tokio::test]
    async fn export_only_includes_prefixed_keys() {
        let mut settings = SettingsStore::in_memory();
        settings.set("holodesk-snippets", "[1]").await.unwrap();
        settings.set("foreign", "y").await.unwrap();

        let export = settings.export();
        assert_eq!(export.local_storage.len(), 1);
        assert_eq!(export.local_storage["holodesk-snippets"], "[1]");

        let json = settings.export_json().unwrap();
        assert!(json.contains("\"localStorage\""));
        assert!(!json.contains("foreign"));
    }

    #[tokio::test]
    async fn import_merges_and_stringifies() {
        let mut settings = SettingsStore::in_memory();
        settings.set("holodesk-notes", "old").await.unwrap();

        let count = settings
            .import(r#"{"localStorage": {"holodesk-notes": "new", "holodesk-count": 3, "extra": "kept"}}"#)
            .await
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(settings.get("holodesk-notes"), Some("new"));
        assert_eq!(settings.get("holodesk-count"), Some("3"));
        assert_eq!(settings.get("extra"), Some("kept"));
    }

    #[tokio::test]
    async fn import_without_local_storage_is_noop() {
        let mut settings = SettingsStore::in_memory();
        assert_eq!(settings.import(r#"{"something": 1}"#).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn import_rejects_invalid_json() {
        let mut settings = SettingsStore::in_memory();
        let err = settings.import("not json").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSettings);
    }

    #[tokio::test]
    async fn persists_across_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        {
            let mut settings = SettingsStore::open(&path).await.unwrap();
            settings.set("holodesk-notes", "[\"a\"]").await.unwrap();
        }
        let settings = SettingsStore::open(&path).await.unwrap();
        assert_eq!(settings.get("holodesk-notes"), Some("[\"a\"]"));
        assert_eq!(settings.path(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn open_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let err = SettingsStore::open(&path).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSettings);
    }

    #[tokio::test]
    async fn failed_write_leaves_map_unchanged() {
        let dir = tempdir().unwrap();
        let parent = dir.path().join("cfg");
        let path = parent.join("settings.json");
        let mut settings = SettingsStore::open(&path).await.unwrap();
        settings.set("holodesk-tasks", "[]").await.unwrap();

        // Replace the settings directory with a plain file so every write fails.
        std::fs::remove_dir_all(&parent).unwrap();
        std::fs::write(&parent, b"x").unwrap();

        let err = settings.set("holodesk-notes", "unsaved").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageIo);
        assert!(settings.get("holodesk-notes").is_none());

        assert!(settings.remove("holodesk-tasks").await.is_err());
        assert_eq!(settings.get("holodesk-tasks"), Some("[]"));

        assert!(settings
            .import(r#"{"localStorage": {"holodesk-snippets": "[]"}}"#)
            .await
            .is_err());
        assert!(settings.get("holodesk-snippets").is_none());
        assert_eq!(settings.keys(), vec!["holodesk-tasks"]);
    }
}
