//! Dense ordering for position-bearing collections.
//!
//! Every record of an ordered collection carries an integer position field.
//! After any completed insert, reposition or delete, the positions of the
//! N live records are exactly `0..N`.
//!
//! All three mutations are one primitive: shift a contiguous position range
//! by ±1, then write a single record. Both steps go to the store as one
//! [`WriteBatch`] pinned to the revision read at the start, and the whole
//! read-validate-commit sequence runs under a per-collection async mutex.

use std::ops::Bound;
use std::sync::Arc;

use dashmap::DashMap;
use folio_core::FolioError;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::StoreError;
use crate::store::DocumentStore;
use crate::types::{Document, RangeFilter, SortBy, WriteBatch, WriteOp, ID_FIELD};

pub const DEFAULT_POSITION_FIELD: &str = "position";

#[derive(Error, Debug)]
pub enum OrderingError {
    #[error("{collection} item not found: {id}")]
    NotFound { collection: String, id: String },

    #[error("Invalid position {position}: expected a value between 0 and {max}")]
    InvalidPosition { position: i64, max: i64 },

    #[error("{collection} was modified concurrently, retry the request")]
    Conflict { collection: String },

    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl From<OrderingError> for FolioError {
    fn from(err: OrderingError) -> Self {
        let message = err.to_string();
        match err {
            OrderingError::NotFound { .. } => FolioError::not_found(message),
            OrderingError::InvalidPosition { max, .. } => FolioError::bad_request(message)
                .with_field_error("position", format!("must be an integer between 0 and {max}")),
            OrderingError::Conflict { .. } => FolioError::conflict(message),
            OrderingError::Persistence(source) => {
                FolioError::general_error("Persistence failure").with_source(source.into())
            }
        }
    }
}

/// Per-collection async mutexes, shared by every [`OrderedCollection`]
/// built over the same store.
#[derive(Clone, Default)]
pub struct CollectionLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl CollectionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access to `collection` until the guard drops.
    pub async fn acquire(&self, collection: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(collection.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

/// How the surrounding records move before the single-record write.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RangeShift {
    start: Bound<i64>,
    end: Bound<i64>,
    by: i64,
}

impl RangeShift {
    /// Open a slot at `at` by pushing `[at, ∞)` up.
    fn open_at(at: i64) -> Self {
        Self {
            start: Bound::Included(at),
            end: Bound::Unbounded,
            by: 1,
        }
    }

    /// Close the gap left at `at` by pulling `(at, ∞)` down.
    fn close_at(at: i64) -> Self {
        Self {
            start: Bound::Excluded(at),
            end: Bound::Unbounded,
            by: -1,
        }
    }

    /// Records between `from` and `to` move one step toward `from`.
    fn for_move(from: i64, to: i64) -> Option<Self> {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Some(Self {
                start: Bound::Excluded(from),
                end: Bound::Included(to),
                by: -1,
            }),
            std::cmp::Ordering::Less => Some(Self {
                start: Bound::Included(to),
                end: Bound::Excluded(from),
                by: 1,
            }),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// A named collection whose records keep a dense position sequence.
#[derive(Clone)]
pub struct OrderedCollection {
    store: Arc<dyn DocumentStore>,
    collection: String,
    field: String,
    locks: CollectionLocks,
}

impl OrderedCollection {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            field: DEFAULT_POSITION_FIELD.to_string(),
            locks: CollectionLocks::new(),
        }
    }

    /// Share exclusion scopes with other managers over the same store.
    pub fn with_locks(mut self, locks: CollectionLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// All records, ascending by position.
    pub async fn list(&self) -> Result<Vec<Document>, OrderingError> {
        Ok(self
            .store
            .find_all(&self.collection, Some(&SortBy::ascending(&self.field)))
            .await?)
    }

    pub async fn get(&self, id: &str) -> Result<Document, OrderingError> {
        self.store
            .find_by_id(&self.collection, id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    /// Unlocked range check for an insert at `position`. `insert` checks
    /// again under the lock; this one lets callers fail before side effects.
    pub async fn check_insert(&self, position: Option<i64>) -> Result<(), OrderingError> {
        if let Some(position) = position {
            let count = self.store.count(&self.collection).await? as i64;
            check_range(position, count)?;
        }
        Ok(())
    }

    /// Unlocked range check for moving an existing record to `position`.
    pub async fn check_move(&self, position: Option<i64>) -> Result<(), OrderingError> {
        if let Some(position) = position {
            let count = self.store.count(&self.collection).await? as i64;
            check_range(position, count - 1)?;
        }
        Ok(())
    }

    /// Store `record` at `position`, or at the end when `None`.
    pub async fn insert(&self, record: Document, position: Option<i64>) -> Result<Document, OrderingError> {
        let _guard = self.locks.acquire(&self.collection).await;

        let revision = self.store.revision(&self.collection).await?;
        let count = self.store.count(&self.collection).await? as i64;
        let position = position.unwrap_or(count);
        check_range(position, count)?;

        let mut record = into_object(record)?;
        record.insert(self.field.clone(), Value::from(position));

        let written = self
            .shift_then_write(
                revision,
                Some(RangeShift::open_at(position)),
                WriteOp::Insert(Value::Object(record)),
            )
            .await?;

        tracing::debug!(collection = %self.collection, position, "ordered insert");
        Ok(written)
    }

    /// Move `id` to `position` (kept when `None`) and merge `patch` in the same write.
    pub async fn reposition(
        &self,
        id: &str,
        position: Option<i64>,
        patch: Document,
    ) -> Result<Document, OrderingError> {
        let _guard = self.locks.acquire(&self.collection).await;

        let revision = self.store.revision(&self.collection).await?;
        let current = self
            .store
            .find_by_id(&self.collection, id)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        let from = self.position_of(&current)?;
        let count = self.store.count(&self.collection).await? as i64;
        let to = position.unwrap_or(from);
        check_range(to, count - 1)?;

        let mut patch = into_object(patch)?;
        patch.remove(ID_FIELD);
        patch.insert(self.field.clone(), Value::from(to));

        let written = self
            .shift_then_write(
                revision,
                RangeShift::for_move(from, to),
                WriteOp::Update {
                    id: id.to_string(),
                    patch: Value::Object(patch),
                },
            )
            .await?;

        tracing::debug!(collection = %self.collection, id, from, to, "ordered reposition");
        Ok(written)
    }

    /// Remove `id` and close the gap it leaves. Returns the removed record.
    pub async fn delete(&self, id: &str) -> Result<Document, OrderingError> {
        let _guard = self.locks.acquire(&self.collection).await;

        let revision = self.store.revision(&self.collection).await?;
        let current = self
            .store
            .find_by_id(&self.collection, id)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        let at = self.position_of(&current)?;

        let removed = self
            .shift_then_write(
                revision,
                Some(RangeShift::close_at(at)),
                WriteOp::Delete { id: id.to_string() },
            )
            .await?;

        tracing::debug!(collection = %self.collection, id, at, "ordered delete");
        Ok(removed)
    }

    /// The range-shift primitive: shift, then write one record, atomically.
    async fn shift_then_write(
        &self,
        revision: u64,
        shift: Option<RangeShift>,
        write: WriteOp,
    ) -> Result<Document, OrderingError> {
        let mut batch = WriteBatch::new().expect_revision(revision);
        if let Some(shift) = shift {
            batch = batch.increment_many(
                RangeFilter::new(self.field.clone(), shift.start, shift.end),
                shift.by,
            );
        }
        batch = batch.push(write);

        let receipt = self
            .store
            .commit(&self.collection, batch)
            .await
            .map_err(|e| match e {
                StoreError::RevisionMismatch { .. } => OrderingError::Conflict {
                    collection: self.collection.clone(),
                },
                StoreError::NotFound { id, .. } => self.not_found(&id),
                other => OrderingError::Persistence(other),
            })?;

        receipt
            .written
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::invalid("ordered write produced no document").into())
    }

    fn position_of(&self, doc: &Document) -> Result<i64, OrderingError> {
        doc.get(&self.field).and_then(Value::as_i64).ok_or_else(|| {
            StoreError::invalid(format!(
                "{} record has no integer `{}`",
                self.collection, self.field
            ))
            .into()
        })
    }

    fn not_found(&self, id: &str) -> OrderingError {
        OrderingError::NotFound {
            collection: self.collection.clone(),
            id: id.to_string(),
        }
    }
}

fn check_range(position: i64, max: i64) -> Result<(), OrderingError> {
    if position < 0 || position > max {
        return Err(OrderingError::InvalidPosition { position, max });
    }
    Ok(())
}

fn into_object(doc: Document) -> Result<Map<String, Value>, OrderingError> {
    match doc {
        Value::Object(obj) => Ok(obj),
        Value::Null => Ok(Map::new()),
        _ => Err(StoreError::invalid("ordered records must be JSON objects").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_shifts_cover_only_the_records_in_between() {
        assert_eq!(
            RangeShift::for_move(1, 3),
            Some(RangeShift {
                start: Bound::Excluded(1),
                end: Bound::Included(3),
                by: -1
            })
        );
        assert_eq!(
            RangeShift::for_move(3, 0),
            Some(RangeShift {
                start: Bound::Included(0),
                end: Bound::Excluded(3),
                by: 1
            })
        );
        assert_eq!(RangeShift::for_move(2, 2), None);
    }

    #[test]
    fn range_check_rejects_instead_of_clamping() {
        assert!(check_range(0, 0).is_ok());
        assert!(matches!(
            check_range(-1, 3),
            Err(OrderingError::InvalidPosition { position: -1, max: 3 })
        ));
        assert!(matches!(
            check_range(0, -1),
            Err(OrderingError::InvalidPosition { position: 0, max: -1 })
        ));
    }

    #[test]
    fn invalid_position_maps_to_bad_request() {
        let folio: FolioError = OrderingError::InvalidPosition { position: 9, max: 2 }.into();
        assert_eq!(folio.code(), 400);
        assert!(folio.errors.is_some());

        let folio: FolioError = OrderingError::Conflict {
            collection: "navbar".into(),
        }
        .into();
        assert_eq!(folio.code(), 409);
    }
}
