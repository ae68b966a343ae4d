use std::sync::Arc;

use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult};
use crate::guard::TempUpload;
use crate::store::MediaStore;
use crate::types::{MediaReceipt, StagedFile};

/// Checks staged files against [`MediaConfig`] and uploads them, releasing
/// the temporary file whatever the outcome.
#[derive(Clone)]
pub struct MediaAdapter {
    store: Arc<dyn MediaStore>,
    config: MediaConfig,
}

impl MediaAdapter {
    pub fn new(store: Arc<dyn MediaStore>, config: MediaConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    pub fn validate(&self, file: &StagedFile) -> MediaResult<()> {
        let content_type = file.content_type.as_deref().unwrap_or("");
        if !self.config.accepts(content_type) {
            return Err(MediaError::UnsupportedType {
                content_type: if content_type.is_empty() {
                    "unknown".to_string()
                } else {
                    content_type.to_string()
                },
            });
        }
        if file.size > self.config.max_file_bytes {
            return Err(MediaError::TooLarge {
                size: file.size,
                max: self.config.max_file_bytes,
            });
        }
        Ok(())
    }

    /// Upload `file` into `folder` and return its public URL receipt.
    ///
    /// A `temp_path` outside the staging area is refused before the guard
    /// takes ownership, so it is never read or removed.
    pub async fn upload(&self, file: StagedFile, folder: &str) -> MediaResult<MediaReceipt> {
        if !file.is_staged_in(self.config.staging_dir.as_deref()) {
            tracing::warn!(field = %file.key, path = %file.temp_path.display(), "refusing unstaged file");
            return Err(MediaError::invalid(format!("{} is not an uploaded file", file.key)));
        }
        let _temp = TempUpload::new(file.temp_path.clone());
        self.validate(&file)?;

        match self.store.upload(&file, folder).await {
            Ok(receipt) => {
                tracing::info!(
                    backend = self.store.name(),
                    folder,
                    field = %file.key,
                    bytes = receipt.bytes,
                    url = %receipt.url,
                    "media uploaded"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!(
                    backend = self.store.name(),
                    folder,
                    field = %file.key,
                    error = %e,
                    "media upload failed"
                );
                Err(e)
            }
        }
    }
}
