use folio_core::FolioError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Document already exists: {collection}/{id}")]
    DuplicateId { collection: String, id: String },

    #[error("Invalid document: {message}")]
    InvalidDocument { message: String },

    #[error("Revision mismatch on {collection}: expected {expected}, found {actual}")]
    RevisionMismatch {
        collection: String,
        expected: u64,
        actual: u64,
    },

    #[error("Unsupported store url: {url}")]
    UnsupportedUrl { url: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}

impl From<StoreError> for FolioError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound { .. } => FolioError::not_found(message),
            StoreError::DuplicateId { .. } | StoreError::RevisionMismatch { .. } => {
                FolioError::conflict(message)
            }
            StoreError::InvalidDocument { .. } => FolioError::bad_request(message),
            other => FolioError::general_error("Persistence failure").with_source(other.into()),
        }
    }
}
