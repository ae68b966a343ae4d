use std::sync::Arc;

use anyhow::{Context, Result};
use folio_media::{CloudinaryStore, FsMediaStore, MediaAdapter, MediaConfig, MediaStore};
use folio_store::{open_store, CollectionLocks, DocumentStore};

use crate::config::{MediaBackend, SiteSettings};

pub type SiteParams = folio_axum::params::RestParams;

/// Everything the content services share.
pub struct SiteState {
    pub store: Arc<dyn DocumentStore>,
    pub media: MediaAdapter,
    /// One exclusion scope per ordered collection, shared by every manager.
    pub locks: CollectionLocks,
}

impl SiteState {
    pub fn new(store: Arc<dyn DocumentStore>, media: MediaAdapter) -> Self {
        Self {
            store,
            media,
            locks: CollectionLocks::new(),
        }
    }

    /// Open the store and media backend named by `settings`.
    pub async fn open(settings: &SiteSettings) -> Result<Arc<Self>> {
        let store = open_store(&settings.store_url)
            .await
            .with_context(|| format!("opening store {}", settings.store_url))?;

        tokio::fs::create_dir_all(&settings.upload_dir)
            .await
            .with_context(|| format!("creating upload dir {}", settings.upload_dir.display()))?;

        let backend: Arc<dyn MediaStore> = match &settings.media {
            MediaBackend::Local { root, base_url } => {
                tokio::fs::create_dir_all(root)
                    .await
                    .with_context(|| format!("creating media root {}", root.display()))?;
                Arc::new(FsMediaStore::new(root.clone(), base_url.clone()))
            }
            MediaBackend::Cloudinary(credentials) => Arc::new(CloudinaryStore::new(credentials.clone())),
        };

        let config = MediaConfig::new()
            .with_max_file_mb(settings.max_file_mb)
            .with_staging_dir(settings.upload_dir.clone());
        let media = MediaAdapter::new(backend, config);
        tracing::info!(
            store = %settings.store_url,
            media = media.backend(),
            "site state ready"
        );

        Ok(Arc::new(Self::new(store, media)))
    }
}
