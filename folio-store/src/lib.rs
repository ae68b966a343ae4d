//! folio-store: schema-less document persistence for Folio.
//!
//! A [`DocumentStore`] keeps JSON documents grouped by collection name.
//! Two backends ship with the crate: [`MemoryStore`] and [`JsonFileStore`]
//! (the same state, flushed to one JSON file after every write).
//!
//! [`OrderedCollection`] sits on top of a store and keeps the integer
//! `position` field of a collection dense (`0..N`) across inserts, moves
//! and deletes.

pub mod error;
pub mod file;
pub mod memory;
pub mod ordering;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use ordering::{CollectionLocks, OrderedCollection, OrderingError};
pub use store::{open_store, DocumentStore};
pub use types::{CommitReceipt, Document, RangeFilter, SortBy, WriteBatch, WriteOp, ID_FIELD};
