use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};
use crate::store::MediaStore;
use crate::types::{MediaReceipt, StagedFile};

/// Copies uploads below a local media root and serves them from `base_url`.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
    base_url: String,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Folder names come from code, but keep them to one safe path segment anyway.
fn safe_folder(folder: &str) -> MediaResult<&str> {
    let ok = !folder.is_empty()
        && folder != "."
        && folder != ".."
        && folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(folder)
    } else {
        Err(MediaError::config(format!("invalid media folder `{folder}`")))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn upload(&self, file: &StagedFile, folder: &str) -> MediaResult<MediaReceipt> {
        let folder = safe_folder(folder)?;
        let dir = self.root.join(folder);
        fs::create_dir_all(&dir).await?;

        let name = match file.extension() {
            Some(ext) => format!("{}.{}", Uuid::new_v4().simple(), ext.to_ascii_lowercase()),
            None => Uuid::new_v4().simple().to_string(),
        };
        let bytes = fs::copy(&file.temp_path, dir.join(&name)).await?;

        Ok(MediaReceipt {
            url: format!("{}/{folder}/{name}", self.base_url),
            public_id: format!("{folder}/{name}"),
            bytes,
        })
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_are_single_safe_segments() {
        assert!(safe_folder("DoctorService-images").is_ok());
        assert!(safe_folder("CTA-BG").is_ok());
        assert!(safe_folder("../etc").is_err());
        assert!(safe_folder("a/b").is_err());
        assert!(safe_folder("").is_err());
    }
}
