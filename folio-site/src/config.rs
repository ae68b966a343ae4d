//! Startup configuration: environment variables copied into the app config,
//! then read back as typed [`SiteSettings`].

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use folio_core::{ConfigSnapshot, FolioApp, FolioError};
use folio_media::CloudinaryCredentials;
use serde_json::Value;

use crate::services::SiteParams;

pub const ENV_OVERRIDE_PREFIX: &str = "FOLIO__";

const DEFAULT_MAX_FILE_MB: u64 = 10;

/// Copy the process environment into `app`. `FOLIO__A__B` variables are
/// applied last and win over everything else.
pub fn config(app: &FolioApp<Value, SiteParams>) -> Result<()> {
    configure_http(app);
    configure_store(app);
    configure_media(app);
    configure_uploads(app);

    app.apply_env_overrides(ENV_OVERRIDE_PREFIX, env::vars());
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn configure_http(app: &FolioApp<Value, SiteParams>) {
    app.set("http.host", env_or("HTTP_HOST", "127.0.0.1"));
    app.set("http.port", env_or("HTTP_PORT", "5000"));
}

fn configure_store(app: &FolioApp<Value, SiteParams>) {
    app.set("store.url", env_or("STORE_URL", "memory://"));
}

fn configure_media(app: &FolioApp<Value, SiteParams>) {
    app.set("media.backend", env_or("MEDIA_BACKEND", "local"));
    app.set("media.root", env_or("MEDIA_ROOT", "media"));
    app.set("media.base_url", env_or("MEDIA_BASE_URL", "/media"));

    for (var, key) in [
        ("CLOUDINARY_CLOUD_NAME", "cloudinary.cloud_name"),
        ("CLOUDINARY_API_KEY", "cloudinary.api_key"),
        ("CLOUDINARY_API_SECRET", "cloudinary.api_secret"),
    ] {
        if let Ok(value) = env::var(var) {
            app.set(key, value);
        }
    }
}

fn configure_uploads(app: &FolioApp<Value, SiteParams>) {
    if let Ok(dir) = env::var("UPLOAD_DIR") {
        app.set("upload.dir", dir);
    }
    app.set(
        "upload.max_file_mb",
        env_or("UPLOAD_MAX_FILE_MB", &DEFAULT_MAX_FILE_MB.to_string()),
    );
}

#[derive(Debug, Clone)]
pub enum MediaBackend {
    /// Files copied below `root` and served at `base_url`.
    Local { root: PathBuf, base_url: String },
    Cloudinary(CloudinaryCredentials),
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub host: String,
    pub port: u16,
    pub store_url: String,
    pub media: MediaBackend,
    pub upload_dir: PathBuf,
    pub max_file_mb: u64,
}

impl SiteSettings {
    pub fn from_config(config: &ConfigSnapshot) -> Result<Self> {
        let host = config
            .get_string("http.host")
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = match config.get("http.port") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("http.port must be a port number, got {raw:?}"))?,
            None => 5000,
        };

        let media = match config.get("media.backend").map(str::trim).unwrap_or("local") {
            "local" => {
                let base_url = config
                    .get("media.base_url")
                    .unwrap_or("/media")
                    .trim()
                    .trim_end_matches('/')
                    .to_string();
                if !base_url.starts_with('/') {
                    anyhow::bail!("media.base_url must be a path below the site root, got {base_url:?}");
                }
                MediaBackend::Local {
                    root: PathBuf::from(config.get("media.root").unwrap_or("media")),
                    base_url,
                }
            }
            "cloudinary" => {
                let part = |key: &str| config.get_string(key).unwrap_or_default();
                let credentials = CloudinaryCredentials::new(
                    part("cloudinary.cloud_name"),
                    part("cloudinary.api_key"),
                    part("cloudinary.api_secret"),
                )
                .map_err(FolioError::from)?;
                MediaBackend::Cloudinary(credentials)
            }
            other => anyhow::bail!("unknown media.backend {other:?} (expected local or cloudinary)"),
        };

        Ok(Self {
            host,
            port,
            store_url: config
                .get_string("store.url")
                .unwrap_or_else(|| "memory://".to_string()),
            media,
            upload_dir: config
                .get("upload.dir")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            max_file_mb: config
                .get_u64("upload.max_file_mb")
                .unwrap_or(DEFAULT_MAX_FILE_MB),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb * 1024 * 1024
    }

    /// Request body limit: one file at the cap plus room for the text fields.
    pub fn body_limit(&self) -> usize {
        (self.max_file_bytes() as usize).saturating_mul(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> ConfigSnapshot {
        let app: FolioApp<Value, SiteParams> = FolioApp::new();
        for (k, v) in pairs {
            app.set(*k, *v);
        }
        app.config_snapshot()
    }

    #[test]
    fn defaults_select_memory_store_and_local_media() {
        let settings = SiteSettings::from_config(&snapshot(&[])).unwrap();

        assert_eq!(settings.addr(), "127.0.0.1:5000");
        assert_eq!(settings.store_url, "memory://");
        assert_eq!(settings.max_file_bytes(), 10 * 1024 * 1024);
        assert!(matches!(
            settings.media,
            MediaBackend::Local { ref base_url, .. } if base_url == "/media"
        ));
    }

    #[test]
    fn cloudinary_requires_every_credential() {
        let err = SiteSettings::from_config(&snapshot(&[
            ("media.backend", "cloudinary"),
            ("cloudinary.cloud_name", "demo"),
        ]))
        .unwrap_err();
        assert!(FolioError::from_anyhow(&err).is_some());

        let settings = SiteSettings::from_config(&snapshot(&[
            ("media.backend", "cloudinary"),
            ("cloudinary.cloud_name", "demo"),
            ("cloudinary.api_key", "key"),
            ("cloudinary.api_secret", "secret"),
        ]))
        .unwrap();
        assert!(matches!(settings.media, MediaBackend::Cloudinary(_)));
    }

    #[test]
    fn bad_port_and_unknown_backend_are_startup_errors() {
        assert!(SiteSettings::from_config(&snapshot(&[("http.port", "http")])).is_err());
        assert!(SiteSettings::from_config(&snapshot(&[("media.backend", "s3")])).is_err());
        assert!(SiteSettings::from_config(&snapshot(&[("media.base_url", "/")])).is_err());
    }
}
