//! Frame data channel storage.
//!
//! A snapshot is written once, when its job is created, and read many
//! times by the renderer. Reads return the exact bytes that were written.
//! A missing snapshot is a normal state (not yet written, or already
//! discarded), so `get` returns `Option` rather than an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reelforge_core::frame_data::FrameData;
use reelforge_core::types::JobId;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum FrameStoreError {
    #[error("Frame data for job {0} was already written")]
    AlreadyWritten(JobId),

    #[error("Frame data serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Frame data I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait FrameDataStore: Send + Sync {
    /// Store the snapshot for `job_id`. A second write for the same job
    /// is rejected and leaves the first untouched.
    async fn put(&self, job_id: JobId, data: &FrameData) -> Result<(), FrameStoreError>;

    /// Serialized snapshot, byte-identical to what `put` stored.
    async fn get(&self, job_id: JobId) -> Result<Option<String>, FrameStoreError>;

    /// Discard the snapshot. Removing a missing snapshot is not an error.
    async fn remove(&self, job_id: JobId) -> Result<(), FrameStoreError>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryFrameStore {
    snapshots: RwLock<HashMap<JobId, String>>,
}

impl InMemoryFrameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FrameDataStore for InMemoryFrameStore {
    async fn put(&self, job_id: JobId, data: &FrameData) -> Result<(), FrameStoreError> {
        let json = data.to_json()?;
        let mut snapshots = self.snapshots.write().await;
        if snapshots.contains_key(&job_id) {
            return Err(FrameStoreError::AlreadyWritten(job_id));
        }
        snapshots.insert(job_id, json);
        Ok(())
    }

    async fn get(&self, job_id: JobId) -> Result<Option<String>, FrameStoreError> {
        Ok(self.snapshots.read().await.get(&job_id).cloned())
    }

    async fn remove(&self, job_id: JobId) -> Result<(), FrameStoreError> {
        self.snapshots.write().await.remove(&job_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed
// ---------------------------------------------------------------------------

/// Stores each snapshot as `{dir}/{job_id}.json`.
///
/// The file is written under a temporary name and hard-linked into place,
/// so readers never observe a partial snapshot and an existing snapshot
/// is never overwritten.
pub struct FileFrameStore {
    dir: PathBuf,
    staging_seq: AtomicU64,
}

impl FileFrameStore {
    /// Use `dir`, creating it if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, FrameStoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            staging_seq: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, job_id: JobId) -> PathBuf {
        self.dir.join(format!("{job_id}.json"))
    }
}

#[async_trait]
impl FrameDataStore for FileFrameStore {
    async fn put(&self, job_id: JobId, data: &FrameData) -> Result<(), FrameStoreError> {
        let json = data.to_json()?;
        let path = self.path_for(job_id);
        let seq = self.staging_seq.fetch_add(1, Ordering::Relaxed);
        let staging = self
            .dir
            .join(format!("{job_id}.json.{}-{seq}.tmp", std::process::id()));

        tokio::fs::write(&staging, json.as_bytes()).await?;
        let linked = tokio::fs::hard_link(&staging, &path).await;
        if let Err(e) = tokio::fs::remove_file(&staging).await {
            tracing::warn!(path = %staging.display(), error = %e, "Failed to remove staging file");
        }

        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(FrameStoreError::AlreadyWritten(job_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, job_id: JobId) -> Result<Option<String>, FrameStoreError> {
        match tokio::fs::read_to_string(self.path_for(job_id)).await {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, job_id: JobId) -> Result<(), FrameStoreError> {
        match tokio::fs::remove_file(self.path_for(job_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use reelforge_core::brand::BrandAssets;
    use reelforge_core::request::RenderRequest;
    use reelforge_core::timeline::{Slide, Timeline};

    use super::*;

    fn snapshot(job_id: JobId, brand: &str) -> FrameData {
        let request = RenderRequest::new(
            Timeline::new(vec![Slide::new("Hello"), Slide::new("World")]),
            BrandAssets::named(brand),
            "amethyst",
        );
        FrameData::from_request(job_id, &request)
    }

    async fn exercise(store: &dyn FrameDataStore) {
        let id = JobId::new();
        let data = snapshot(id, "Acme");

        assert_eq!(store.get(id).await.unwrap(), None);

        store.put(id, &data).await.unwrap();
        let read = store.get(id).await.unwrap().unwrap();
        assert_eq!(read, data.to_json().unwrap());
        // Repeated reads are stable.
        assert_eq!(store.get(id).await.unwrap().unwrap(), read);

        assert_matches!(
            store.put(id, &snapshot(id, "Other")).await,
            Err(FrameStoreError::AlreadyWritten(j)) if j == id
        );
        assert_eq!(store.get(id).await.unwrap().unwrap(), read);

        store.remove(id).await.unwrap();
        assert_eq!(store.get(id).await.unwrap(), None);
        store.remove(id).await.unwrap();
    }

    #[tokio::test]
    async fn in_memory_store_contract() {
        exercise(&InMemoryFrameStore::new()).await;
    }

    #[tokio::test]
    async fn file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFrameStore::open(dir.path().join("frames")).await.unwrap();
        exercise(&store).await;
    }

    #[tokio::test]
    async fn file_store_uses_job_id_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileFrameStore::open(dir.path()).await.unwrap();
        let id = JobId::new();
        store.put(id, &snapshot(id, "Acme")).await.unwrap();

        assert!(dir.path().join(format!("{id}.json")).exists());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
