//! Folio: the CMS backend behind the clinic website.
//!
//! Navbar items and banner slides keep a dense display order; the other
//! sections are plain lists or single documents. Images arrive as multipart
//! parts and are stored as URLs from the configured media backend.

pub mod config;
pub mod hooks;
pub mod services;
pub mod utils;

use std::sync::Arc;

use anyhow::Result;
use folio_axum::middlewares::MultipartConfig;
use folio_axum::{axum, AxumApp};
use folio_core::FolioApp;
use serde_json::Value;

use crate::config::{MediaBackend, SiteSettings};
use crate::services::{SiteParams, SiteState};

/// Configure from the environment, open the store and media backend and
/// mount every route.
pub async fn build() -> Result<AxumApp<Value, SiteParams>> {
    let app: FolioApp<Value, SiteParams> = FolioApp::new();
    config::config(&app)?;

    let settings = SiteSettings::from_config(&app.config_snapshot())?;
    let state = SiteState::open(&settings).await?;
    assemble(app, state, &settings)
}

/// Mount the site on an already configured app.
pub fn assemble(
    app: FolioApp<Value, SiteParams>,
    state: Arc<SiteState>,
    settings: &SiteSettings,
) -> Result<AxumApp<Value, SiteParams>> {
    hooks::global_hooks(&app);

    let ax = axum(app).service("/health", || async { "ok" });
    let ax = services::configure(ax, state)?.use_multipart(
        MultipartConfig::new()
            .upload_dir(&settings.upload_dir)
            .max_file_size(settings.max_file_bytes()),
    );

    Ok(match &settings.media {
        MediaBackend::Local { root, base_url } => ax.use_static(base_url, root),
        MediaBackend::Cloudinary(_) => ax,
    })
}
