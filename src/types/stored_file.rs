//! StoredFile type representing one persisted blob with its metadata.
//!
//! The serialized field names (`id`, `name`, `mimeType`, `size`,
//! `timestamp`, `blob`) are the on-disk schema and must not change.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A file persisted in the blob store.
///
/// Records are immutable once stored; an update is a full replacement at
/// the same `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Primary key. Random UUID v4 for records created here.
    pub id: String,

    /// Download file name, e.g. `converted_1700000000000.wav`.
    pub name: String,

    /// MIME type of `blob`.
    pub mime_type: String,

    /// Length of `blob` in bytes at write time. Display only.
    pub size: u64,

    /// Creation time, ISO 8601 UTC with milliseconds.
    pub timestamp: String,

    /// File contents, base64 in the serialized form.
    #[serde(with = "blob_base64")]
    pub blob: Vec<u8>,
}

/// Metadata of a [`StoredFile`] without its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFileInfo {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub timestamp: String,
}

impl StoredFile {
    /// Creates a record with a fresh identifier and the current time.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, blob: Vec<u8>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            mime_type: mime_type.into(),
            size: blob.len() as u64,
            timestamp: now_iso8601(),
            blob,
        }
    }

    /// Returns the metadata of this record.
    pub fn info(&self) -> StoredFileInfo {
        StoredFileInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size,
            timestamp: self.timestamp.clone(),
        }
    }

    /// Size formatted in megabytes with two decimals, as shown in file lists.
    pub fn size_mb(&self) -> String {
        format!("{:.2} MB", self.size as f64 / 1024.0 / 1024.0)
    }

    /// Validates that the record can be stored.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.id.is_empty() {
            return Some("Record id cannot be empty".to_string());
        }

        if chrono::DateTime::parse_from_rfc3339(&self.timestamp).is_err() {
            return Some(format!("Timestamp is not ISO 8601: {:?}", self.timestamp));
        }

        None
    }
}

/// Current time in the `YYYY-MM-DDTHH:MM:SS.sssZ` form.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serde adapter storing `Vec<u8>` as a base64 string.
mod blob_base64 {
    use super::{Engine, STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
