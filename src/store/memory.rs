//! In-memory blob store.
//!
//! Holds records in a map behind an async lock. Nothing survives the
//! process; used for tests and ephemeral sessions.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::BlobStore;
use crate::error::{HoloError, Result};
use crate::types::StoredFile;

/// Blob store backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryBlobStore {
    /// Records indexed by id.
    records: RwLock<HashMap<String, StoredFile>>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Removes every record.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, record: &StoredFile) -> Result<()> {
        if let Some(reason) = record.validate() {
            return Err(HoloError::precondition(reason));
        }
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredFile>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.records.write().await.remove(id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<StoredFile>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}
