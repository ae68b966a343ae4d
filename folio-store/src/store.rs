use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::file::JsonFileStore;
use crate::memory::MemoryStore;
use crate::types::{CommitReceipt, Document, RangeFilter, SortBy, WriteBatch, WriteOp};

/// Document-oriented persistence, addressed by collection name.
///
/// Backends implement the reads, `revision` and `commit`. The single-document
/// writes default to one-op batches, so every mutation goes through the same
/// atomic path.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document of the collection, in insertion order unless `sort` is given.
    async fn find_all(&self, collection: &str, sort: Option<&SortBy>) -> StoreResult<Vec<Document>>;

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    async fn count(&self, collection: &str) -> StoreResult<usize>;

    /// Monotonic counter bumped by every committed write to the collection.
    async fn revision(&self, collection: &str) -> StoreResult<u64>;

    /// Apply `batch` atomically: all ops land, or none do.
    async fn commit(&self, collection: &str, batch: WriteBatch) -> StoreResult<CommitReceipt>;

    /// First document in insertion order.
    async fn find_one(&self, collection: &str) -> StoreResult<Option<Document>> {
        Ok(self.find_all(collection, None).await?.into_iter().next())
    }

    /// Store `doc`, assigning an `_id` when it has none.
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<Document> {
        let receipt = self.commit(collection, WriteBatch::new().insert(doc)).await?;
        first_written(receipt)
    }

    async fn insert_many(&self, collection: &str, docs: Vec<Document>) -> StoreResult<Vec<Document>> {
        let batch = docs
            .into_iter()
            .fold(WriteBatch::new(), |batch, doc| batch.insert(doc));
        Ok(self.commit(collection, batch).await?.written)
    }

    /// Merge `patch` into the document. `None` when the id is unknown.
    async fn update_one(&self, collection: &str, id: &str, patch: Document) -> StoreResult<Option<Document>> {
        match self.commit(collection, WriteBatch::new().update(id, patch)).await {
            Ok(receipt) => first_written(receipt).map(Some),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove the document, returning it. `None` when the id is unknown.
    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        match self.commit(collection, WriteBatch::new().delete(id)).await {
            Ok(receipt) => first_written(receipt).map(Some),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Add `by` to `filter.field` of every matching document; returns the match count.
    async fn update_many(&self, collection: &str, filter: RangeFilter, by: i64) -> StoreResult<u64> {
        let batch = WriteBatch::new().push(WriteOp::IncrementMany { filter, by });
        Ok(self.commit(collection, batch).await?.shifted)
    }
}

fn first_written(receipt: CommitReceipt) -> StoreResult<Document> {
    receipt
        .written
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::invalid("commit wrote no document"))
}

/// Open a store from a url: `memory://` or `file://<path>`.
pub async fn open_store(url: &str) -> StoreResult<Arc<dyn DocumentStore>> {
    if url.is_empty() || url == "memory://" {
        return Ok(Arc::new(MemoryStore::new()));
    }
    if let Some(path) = url.strip_prefix("file://") {
        if !path.is_empty() {
            return Ok(Arc::new(JsonFileStore::open(path).await?));
        }
    }
    Err(StoreError::UnsupportedUrl {
        url: url.to_string(),
    })
}
