//! Keyed blob store for converted files.
//!
//! [`BlobStore`] is the async contract; [`FsBlobStore`] persists records
//! in a directory and [`MemoryBlobStore`] keeps them in process. A
//! [`StoreSlot`] holds an optional open store and fails fast until one is
//! installed.

pub mod fs;
pub mod memory;
pub mod slot;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::StoredFile;

// Re-export commonly used types
pub use fs::{record_key, FsBlobStore, STORAGE_VERSION};
pub use memory::MemoryBlobStore;
pub use slot::{StoreSlot, StoreState};

/// Async keyed store of [`StoredFile`] records.
///
/// Every operation is a single attempt. Each call is an independent atomic
/// transaction against the record set: concurrent `put`s to the same id
/// resolve last-write-wins and readers never observe a partial record.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Inserts or fully replaces the record at `record.id`.
    async fn put(&self, record: &StoredFile) -> Result<()>;

    /// Returns the record with the given id, if any.
    async fn get(&self, id: &str) -> Result<Option<StoredFile>>;

    /// Removes the record if present. Absent ids are not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Returns every stored record. Order is unspecified.
    async fn list_all(&self) -> Result<Vec<StoredFile>>;
}
