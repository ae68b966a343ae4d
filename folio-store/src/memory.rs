use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;
use crate::types::{CommitReceipt, Document, SortBy, WriteBatch, WriteOp, ID_FIELD};

/// One collection: its documents in insertion order and its revision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collection {
    pub revision: u64,
    pub documents: Vec<Document>,
}

/// All collections of a store, keyed by name.
pub(crate) type Collections = BTreeMap<String, Collection>;

impl Collection {
    fn index_of(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|d| doc_id(d) == Some(id))
    }

    pub(crate) fn find(&self, id: &str) -> Option<&Document> {
        self.index_of(id).map(|i| &self.documents[i])
    }

    pub(crate) fn sorted(&self, sort: Option<&SortBy>) -> Vec<Document> {
        let mut docs = self.documents.clone();
        if let Some(sort) = sort {
            docs.sort_by(|a, b| compare_by(a, b, sort));
        }
        docs
    }

    /// Apply `batch` to a copy of the collection. `self` is untouched on error.
    pub(crate) fn apply(&self, name: &str, batch: WriteBatch) -> StoreResult<(Collection, CommitReceipt)> {
        if let Some(expected) = batch.expected_revision {
            if expected != self.revision {
                return Err(StoreError::RevisionMismatch {
                    collection: name.to_string(),
                    expected,
                    actual: self.revision,
                });
            }
        }

        let mut next = self.clone();
        let mut receipt = CommitReceipt::default();
        let mutated = !batch.ops.is_empty();

        for op in batch.ops {
            match op {
                WriteOp::IncrementMany { filter, by } => {
                    for doc in next.documents.iter_mut().filter(|d| filter.matches(d)) {
                        if let Some(current) = doc.get(&filter.field).and_then(Value::as_i64) {
                            doc[filter.field.as_str()] = Value::from(current + by);
                            receipt.shifted += 1;
                        }
                    }
                }
                WriteOp::Insert(doc) => {
                    let Value::Object(mut obj) = doc else {
                        return Err(StoreError::invalid("documents must be JSON objects"));
                    };
                    let id = match obj.get(ID_FIELD) {
                        Some(Value::String(s)) if !s.is_empty() => s.clone(),
                        Some(Value::Number(n)) => n.to_string(),
                        _ => Uuid::new_v4().simple().to_string(),
                    };
                    if next.index_of(&id).is_some() {
                        return Err(StoreError::DuplicateId {
                            collection: name.to_string(),
                            id,
                        });
                    }
                    obj.insert(ID_FIELD.to_string(), Value::String(id));
                    let doc = Value::Object(obj);
                    next.documents.push(doc.clone());
                    receipt.written.push(doc);
                }
                WriteOp::Update { id, patch } => {
                    let idx = next
                        .index_of(&id)
                        .ok_or_else(|| StoreError::not_found(name, &id))?;
                    let Value::Object(patch) = patch else {
                        return Err(StoreError::invalid("update patch must be a JSON object"));
                    };
                    if let Value::Object(target) = &mut next.documents[idx] {
                        merge_document(target, patch);
                    }
                    receipt.written.push(next.documents[idx].clone());
                }
                WriteOp::Delete { id } => {
                    let idx = next
                        .index_of(&id)
                        .ok_or_else(|| StoreError::not_found(name, &id))?;
                    receipt.written.push(next.documents.remove(idx));
                }
            }
        }

        if mutated {
            next.revision += 1;
        }
        receipt.revision = next.revision;
        Ok((next, receipt))
    }
}

pub(crate) fn doc_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Nested objects merge key by key; any other value replaces. `_id` is never overwritten.
pub(crate) fn merge_document(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        if key == ID_FIELD {
            continue;
        }
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_document(existing, incoming);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

fn compare_by(a: &Document, b: &Document, sort: &SortBy) -> Ordering {
    let av = a.get(&sort.field).and_then(Value::as_i64);
    let bv = b.get(&sort.field).and_then(Value::as_i64);
    match (av, bv) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
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
        guard.insert(collection.to_string(), next);

        tracing::trace!(collection, revision = receipt.revision, "batch committed");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RangeFilter;
    use serde_json::json;
    use std::ops::Bound;

    #[tokio::test]
    async fn insert_assigns_ids_and_bumps_revision() {
        let store = MemoryStore::new();
        let doc = store
            .insert_one("social-links", json!({"url": "https://x.test", "icon": "x"}))
            .await
            .unwrap();

        assert!(doc_id(&doc).is_some());
        assert_eq!(store.revision("social-links").await.unwrap(), 1);
        assert_eq!(store.count("social-links").await.unwrap(), 1);
        assert_eq!(store.revision("other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_merges_nested_objects() {
        let store = MemoryStore::new();
        let doc = store
            .insert_one(
                "footer",
                json!({"description": {"logo": "a.png", "text": "old"}, "copyright": "c"}),
            )
            .await
            .unwrap();
        let id = doc_id(&doc).unwrap().to_string();

        let updated = store
            .update_one("footer", &id, json!({"description": {"text": "new"}, "_id": "hijack"}))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated["description"]["logo"], "a.png");
        assert_eq!(updated["description"]["text"], "new");
        assert_eq!(updated["_id"], id.as_str());
        assert!(store.update_one("footer", "missing", json!({})).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_batch_leaves_collection_untouched() {
        let store = MemoryStore::new();
        store.insert_one("navbar", json!({"position": 0})).await.unwrap();

        let batch = WriteBatch::new()
            .increment_many(
                RangeFilter::new("position", Bound::Included(0), Bound::Unbounded),
                1,
            )
            .delete("missing");
        let err = store.commit("navbar", batch).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let docs = store.find_all("navbar", None).await.unwrap();
        assert_eq!(docs[0]["position"], 0);
        assert_eq!(store.revision("navbar").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stale_revision_is_rejected() {
        let store = MemoryStore::new();
        store.insert_one("banner", json!({"position": 0})).await.unwrap();

        let err = store
            .commit("banner", WriteBatch::new().expect_revision(0).insert(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::RevisionMismatch { expected: 0, actual: 1, .. }
        ));
    }

    #[tokio::test]
    async fn find_all_sorts_missing_fields_last() {
        let store = MemoryStore::new();
        store
            .insert_many(
                "navbar",
                vec![json!({"n": "b", "position": 1}), json!({"n": "none"}), json!({"n": "a", "position": 0})],
            )
            .await
            .unwrap();

        let docs = store
            .find_all("navbar", Some(&SortBy::ascending("position")))
            .await
            .unwrap();
        let names: Vec<&str> = docs.iter().filter_map(|d| d["n"].as_str()).collect();
        assert_eq!(names, vec!["a", "b", "none"]);
    }
}
