use folio_core::FolioError;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Only image files are allowed (got {content_type})")]
    UnsupportedType { content_type: String },

    #[error("File too large: {size} bytes (limit {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("Invalid upload: {message}")]
    Invalid { message: String },

    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("Media backend misconfigured: {message}")]
    Config { message: String },

    #[error("Media backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl MediaError {
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn upload_failed<S: Into<String>>(reason: S) -> Self {
        Self::UploadFailed {
            reason: reason.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<MediaError> for FolioError {
    fn from(err: MediaError) -> Self {
        let message = err.to_string();
        match err {
            MediaError::UnsupportedType { .. } | MediaError::Invalid { .. } => {
                FolioError::bad_request(message)
            }
            MediaError::TooLarge { .. } => FolioError::payload_too_large(message),
            other => FolioError::general_error("Failed to upload image").with_source(other.into()),
        }
    }
}
