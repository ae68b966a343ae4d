use std::ops::{Bound, RangeBounds};

use serde_json::Value;

/// Field holding a document's identifier.
pub const ID_FIELD: &str = "_id";

pub type Document = Value;

/// Ascending sort by an integer field. Documents missing the field sort last.
#[derive(Debug, Clone)]
pub struct SortBy {
    pub field: String,
}

impl SortBy {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

/// Matches documents whose integer `field` lies within `[start, end]`
/// (each bound inclusive, exclusive or open).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFilter {
    pub field: String,
    pub start: Bound<i64>,
    pub end: Bound<i64>,
}

impl RangeFilter {
    pub fn new(field: impl Into<String>, start: Bound<i64>, end: Bound<i64>) -> Self {
        Self {
            field: field.into(),
            start,
            end,
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match doc.get(&self.field).and_then(Value::as_i64) {
            Some(v) => (self.start, self.end).contains(&v),
            None => false,
        }
    }
}

/// One step of an atomic [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Add `by` to the filtered integer field of every matching document.
    IncrementMany { filter: RangeFilter, by: i64 },
    Insert(Document),
    /// Merge `patch` into the document (nested objects merge, everything else replaces).
    Update { id: String, patch: Document },
    Delete { id: String },
}

/// Ops applied to one collection all-or-nothing.
///
/// With `expected_revision` set the batch is refused when the collection
/// changed since that revision was read.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub expected_revision: Option<u64>,
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_revision(mut self, revision: u64) -> Self {
        self.expected_revision = Some(revision);
        self
    }

    pub fn push(mut self, op: WriteOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn increment_many(self, filter: RangeFilter, by: i64) -> Self {
        self.push(WriteOp::IncrementMany { filter, by })
    }

    pub fn insert(self, doc: Document) -> Self {
        self.push(WriteOp::Insert(doc))
    }

    pub fn update(self, id: impl Into<String>, patch: Document) -> Self {
        self.push(WriteOp::Update {
            id: id.into(),
            patch,
        })
    }

    pub fn delete(self, id: impl Into<String>) -> Self {
        self.push(WriteOp::Delete { id: id.into() })
    }
}

/// Outcome of a committed batch.
#[derive(Debug, Clone, Default)]
pub struct CommitReceipt {
    /// Collection revision after the commit.
    pub revision: u64,
    /// Documents touched by `Insert`/`Update`/`Delete`, in op order
    /// (deleted documents as they were before removal).
    pub written: Vec<Document>,
    /// Documents matched by `IncrementMany` ops.
    pub shifted: u64,
}
