use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::StoreResult;
use crate::memory::Collections;
use crate::store::DocumentStore;
use crate::types::{CommitReceipt, Document, SortBy, WriteBatch};

/// Memory-backed store flushed to a single JSON file after every commit.
///
/// The write lock is held across the flush, and a batch only becomes visible
/// once the file carrying it has been renamed into place.
pub struct JsonFileStore {
    path: PathBuf,
    collections: RwLock<Collections>,
}

impl JsonFileStore {
    /// Load `path` if it exists, otherwise start empty.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let collections = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            if content.trim().is_empty() {
                Collections::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Collections::new()
        };

        info!(path = %path.display(), collections = collections.len(), "json store opened");
        Ok(Self {
            path,
            collections: RwLock::new(collections),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write atomically: unique temp file next to the target, then rename.
    async fn flush(&self, collections: &Collections) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store.json".to_string());
        let temp_name = format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple());
        let temp_path = self
            .path
            .parent()
            .unwrap_or(Path::new("."))
            .join(temp_name);

        let content = serde_json::to_string_pretty(collections)?;
        fs::write(&temp_path, &content).await?;
        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn find_all(&self, collection: &str, sort: Option<&SortBy>) -> StoreResult<Vec<Document>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(collection)
            .map(|c| c.sorted(sort))
            .unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let guard = self.collections.read().await;
        Ok(guard.get(collection).and_then(|c| c.find(id)).cloned())
    }

    async fn count(&self, collection: &str) -> StoreResult<usize> {
        let guard = self.collections.read().await;
        Ok(guard.get(collection).map(|c| c.documents.len()).unwrap_or(0))
    }

    async fn revision(&self, collection: &str) -> StoreResult<u64> {
        let guard = self.collections.read().await;
        Ok(guard.get(collection).map(|c| c.revision).unwrap_or(0))
    }

    async fn commit(&self, collection: &str, batch: WriteBatch) -> StoreResult<CommitReceipt> {
        let mut guard = self.collections.write().await;
        let (next, receipt) = guard
            .get(collection)
            .cloned()
            .unwrap_or_default()
            .apply(collection, batch)?;

        let mut staged = guard.clone();
        staged.insert(collection.to_string(), next);
        self.flush(&staged).await?;
        *guard = staged;

        tracing::trace!(collection, revision = receipt.revision, "batch committed and flushed");
        Ok(receipt)
    }
}
