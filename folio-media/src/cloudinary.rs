use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::{MediaError, MediaResult};
use crate::store::MediaStore;
use crate::types::{MediaReceipt, StagedFile};

#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryCredentials {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> MediaResult<Self> {
        let creds = Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        };
        if creds.cloud_name.is_empty() || creds.api_key.is_empty() || creds.api_secret.is_empty() {
            return Err(MediaError::config(
                "cloudinary needs a cloud name, api key and api secret",
            ));
        }
        Ok(creds)
    }
}

impl std::fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    bytes: u64,
}

/// Signed image uploads to the Cloudinary upload API.
#[derive(Debug, Clone)]
pub struct CloudinaryStore {
    client: Client,
    credentials: CloudinaryCredentials,
    endpoint: String,
    timeout: Duration,
}

impl CloudinaryStore {
    pub fn new(credentials: CloudinaryCredentials) -> Self {
        let endpoint = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            credentials.cloud_name
        );
        Self {
            client: Client::new(),
            credentials,
            endpoint,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Cloudinary request signature: params sorted by name, joined as
/// `a=1&b=2`, secret appended, SHA-256 hex digest.
pub(crate) fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, file: &StagedFile, folder: &str) -> MediaResult<MediaReceipt> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string();
        let signature = sign(
            &[("folder", folder), ("timestamp", timestamp.as_str())],
            &self.credentials.api_secret,
        );

        let content = tokio::fs::read(&file.temp_path).await?;
        let mut part = Part::bytes(content)
            .file_name(file.filename.clone().unwrap_or_else(|| "upload".to_string()));
        if let Some(ct) = &file.content_type {
            part = part.mime_str(ct).map_err(MediaError::backend)?;
        }

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.credentials.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(MediaError::backend)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::upload_failed(format!(
                "cloudinary answered {status}: {body}"
            )));
        }

        let body: UploadResponse = response.json().await.map_err(MediaError::backend)?;
        Ok(MediaReceipt {
            url: body.secure_url,
            public_id: body.public_id,
            bytes: if body.bytes > 0 { body.bytes } else { file.size },
        })
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let sig = sign(
            &[("timestamp", "1700000000"), ("folder", "banner-images")],
            "secret",
        );
        assert_eq!(
            sig,
            "bf0899a6863c553619b8036759afd32b18573591a342dcaef69e51d4ca5a72e5"
        );
    }

    #[test]
    fn credentials_require_every_part_and_hide_the_secret() {
        assert!(CloudinaryCredentials::new("demo", "", "s").is_err());

        let creds = CloudinaryCredentials::new("demo", "key", "s3cr3t").unwrap();
        assert!(!format!("{creds:?}").contains("s3cr3t"));

        let store = CloudinaryStore::new(creds);
        assert_eq!(
            store.endpoint,
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
