//! Directory-backed durable blob store.
//!
//! Layout:
//!
//! ```text
//! <root>/VERSION                 storage version, currently "1"
//! <root>/<record key>.json       one StoredFile per file
//! <root>/.<record key>.<uuid>.tmp  in-flight writes
//! ```
//!
//! Writes land in a temp file that is renamed over the record file, so a
//! reader sees either the old or the new record, never a mix.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::BlobStore;
use crate::error::{HoloError, Result};
use crate::types::StoredFile;

/// The single supported storage version.
pub const STORAGE_VERSION: u32 = 1;

const VERSION_FILE: &str = "VERSION";
const RECORD_EXT: &str = "json";
const TEMP_EXT: &str = "tmp";

/// Temp files younger than this may belong to a write in another process.
const STALE_TEMP_AGE: Duration = Duration::from_secs(15 * 60);

/// Blob store persisting each record as a JSON file in `root`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Opens (creating if needed) the store at `root`.
    ///
    /// Fails with `STORAGE_UNAVAILABLE` if the directory cannot be created
    /// or read, or holds data of another storage version. Temp files left
    /// behind by interrupted writes are removed once they are older than
    /// fifteen minutes.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            HoloError::storage_unavailable(format!("cannot create {}: {}", root.display(), e))
        })?;

        let version_path = root.join(VERSION_FILE);
        match tokio::fs::read_to_string(&version_path).await {
            Ok(contents) => {
                let version = contents.trim().parse::<u32>().map_err(|_| {
                    HoloError::storage_unavailable(format!(
                        "unreadable storage version {:?} in {}",
                        contents.trim(),
                        version_path.display()
                    ))
                })?;
                if version != STORAGE_VERSION {
                    return Err(HoloError::storage_unavailable(format!(
                        "storage version {} is not supported (expected {})",
                        version, STORAGE_VERSION
                    )));
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tokio::fs::write(&version_path, STORAGE_VERSION.to_string())
                    .await
                    .map_err(|e| {
                        HoloError::storage_unavailable(format!(
                            "cannot write {}: {}",
                            version_path.display(),
                            e
                        ))
                    })?;
            }
            Err(e) => {
                return Err(HoloError::storage_unavailable(format!(
                    "cannot read {}: {}",
                    version_path.display(),
                    e
                )))
            }
        }

        let store = Self { root };
        let removed = store.remove_stale_temp_files().await.map_err(|e| {
            HoloError::storage_unavailable(format!("cannot scan {}: {}", store.root.display(), e))
        })?;

        tracing::info!(root = %store.root.display(), removed_temp_files = removed, "File store opened");
        Ok(store)
    }

    /// Directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.{}", record_key(id), RECORD_EXT))
    }

    fn temp_path(&self, id: &str) -> PathBuf {
        self.root.join(format!(
            ".{}.{}.{}",
            record_key(id),
            uuid::Uuid::new_v4().simple(),
            TEMP_EXT
        ))
    }

    async fn remove_stale_temp_files(&self) -> std::io::Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMP_EXT) {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            // A clock skewed into the future counts as fresh.
            let age = now.duration_since(modified).unwrap_or_default();
            if age < STALE_TEMP_AGE {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }

    async fn read_record(&self, path: &Path) -> Result<Option<StoredFile>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            // Deleted between listing and reading.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(HoloError::storage_io(
                    format!("Failed to read {}", path.display()),
                    e,
                ))
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| HoloError::corrupt_record(format!("Corrupt record {}", path.display()), e))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, record: &StoredFile) -> Result<()> {
        if let Some(reason) = record.validate() {
            return Err(HoloError::precondition(reason));
        }

        let json = serde_json::to_vec(record)
            .map_err(|e| HoloError::corrupt_record("Failed to serialize record", e))?;

        let temp = self.temp_path(&record.id);
        let target = self.record_path(&record.id);

        if let Err(e) = tokio::fs::write(&temp, &json).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(HoloError::storage_io(
                format!("Failed to write {}", temp.display()),
                e,
            ));
        }

        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(HoloError::storage_io(
                format!("Failed to commit {}", target.display()),
                e,
            ));
        }

        tracing::debug!(id = %record.id, name = %record.name, size = record.size, "Stored file");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredFile>> {
        let record = self.read_record(&self.record_path(id)).await?;
        // A digest collision would surface as a different id.
        Ok(record.filter(|r| r.id == id))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.record_path(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(id, "Deleted file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HoloError::storage_io(
                format!("Failed to delete {}", path.display()),
                e,
            )),
        }
    }

    async fn list_all(&self) -> Result<Vec<StoredFile>> {
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            HoloError::storage_io(format!("Failed to list {}", self.root.display()), e)
        })?;

        let mut records = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(HoloError::storage_io(
                        format!("Failed to list {}", self.root.display()),
                        e,
                    ))
                }
            };

            let path = entry.path();
            let is_record = path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXT)
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }

            if let Some(record) = self.read_record(&path).await? {
                records.push(record);
            }
        }

        Ok(records)
    }
}

/// File name stem for a record id.
///
/// The first 16 bytes of the SHA256 of the id, hex encoded, so that any
/// opaque id maps to a safe, fixed-length file name.
pub fn record_key(id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn make_file(name: &str, blob: Vec<u8>) -> StoredFile {
        StoredFile::new(name, "audio/wav", blob)
    }

    #[test]
    fn record_key_is_stable_hex() {
        let a = record_key("3f1c2a9e-0000-4000-8000-000000000000");
        assert_eq!(a, record_key("3f1c2a9e-0000-4000-8000-000000000000"));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, record_key("../../etc/passwd"));
    }

    #[tokio::test]
    async fn open_writes_version() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path().join("files")).await.unwrap();
        let version = std::fs::read_to_string(store.root().join("VERSION")).unwrap();
        assert_eq!(version, "1");

        // Reopening an existing store succeeds.
        FsBlobStore::open(dir.path().join("files")).await.unwrap();
    }

    #[tokio::test]
    async fn open_rejects_other_version() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("VERSION"), "2").unwrap();
        let err = FsBlobStore::open(dir.path()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
    }

    #[tokio::test]
    async fn open_fails_when_root_is_a_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        let err = FsBlobStore::open(&file).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
    }

    #[tokio::test]
    async fn open_removes_stale_temp_files() {
        let dir = tempdir().unwrap();
        let stale = dir.path().join(".abc.def.tmp");
        std::fs::write(&stale, b"partial").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(SystemTime::now() - STALE_TEMP_AGE * 2)
            .unwrap();

        FsBlobStore::open(dir.path()).await.unwrap();
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn open_keeps_in_flight_temp_files() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();

        // Another process is between writing its temp file and renaming it.
        let in_flight = store.temp_path("abc");
        std::fs::write(&in_flight, b"partial").unwrap();

        FsBlobStore::open(dir.path()).await.unwrap();
        assert!(in_flight.exists());
    }

    #[tokio::test]
    async fn put_then_list_includes_record() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let file = make_file("converted_1.wav", vec![1, 2, 3, 4]);

        store.put(&file).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        let listed = &all[0];
        assert_eq!(listed.id, file.id);
        assert_eq!(listed.name, file.name);
        assert_eq!(listed.mime_type, file.mime_type);
        assert_eq!(listed.size, file.size);
        assert_eq!(listed.timestamp, file.timestamp);
        assert_eq!(listed.blob, file.blob);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempdir().unwrap();
        let file = make_file("keep.wav", vec![9; 16]);
        {
            let store = FsBlobStore::open(dir.path()).await.unwrap();
            store.put(&file).await.unwrap();
        }
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get(&file.id).await.unwrap(), Some(file));
    }

    #[tokio::test]
    async fn put_is_idempotent_and_replaces() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let mut file = make_file("a.wav", vec![1]);

        store.put(&file).await.unwrap();
        store.put(&file).await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);

        file.blob = vec![2, 2];
        file.size = 2;
        store.put(&file).await.unwrap();
        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].blob, vec![2, 2]);
    }

    #[tokio::test]
    async fn delete_then_list_excludes_record() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let keep = make_file("keep.wav", vec![1]);
        let drop = make_file("drop.wav", vec![2]);
        store.put(&keep).await.unwrap();
        store.put(&drop).await.unwrap();

        store.delete(&drop.id).await.unwrap();

        let ids: Vec<String> = store.list_all().await.unwrap().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[tokio::test]
    async fn delete_missing_is_ok() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        store.delete("does-not-exist").await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_record_is_storage_io() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join(format!("{}.json", record_key("x"))), b"{not json").unwrap();

        let err = store.list_all().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageIo);
        assert_eq!(store.get("x").await.unwrap_err().code, ErrorCode::StorageIo);
    }

    #[tokio::test]
    async fn put_rejects_empty_id() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::open(dir.path()).await.unwrap();
        let mut file = make_file("a.wav", vec![]);
        file.id.clear();
        let err = store.put(&file).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PreconditionViolation);
    }

    #[tokio::test]
    async fn concurrent_puts_leave_one_complete_record() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FsBlobStore::open(dir.path()).await.unwrap());
        let base = make_file("race.wav", vec![]);

        let mut handles = Vec::new();
        for n in 0..8u8 {
            let store = Arc::clone(&store);
            let mut record = base.clone();
            record.blob = vec![n; 1024];
            record.size = 1024;
            handles.push(tokio::spawn(async move { store.put(&record).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        let first = all[0].blob[0];
        assert!(all[0].blob.iter().all(|b| *b == first));
    }
}
