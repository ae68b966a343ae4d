use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File-name prefix of every staged temporary file.
pub const STAGED_FILE_PREFIX: &str = "folio_upload_";

/// A multipart file part written to a temporary file, as it appears in the
/// request JSON until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    /// Form field the part arrived in.
    pub key: String,
    pub temp_path: PathBuf,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
}

impl StagedFile {
    /// Whether `temp_path` names a file this process staged below `dir`.
    pub fn is_staged_in(&self, dir: Option<&std::path::Path>) -> bool {
        let named = self
            .temp_path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(STAGED_FILE_PREFIX));
        let placed = match dir {
            Some(dir) => self.temp_path.parent() == Some(dir),
            None => true,
        };
        named && placed
    }

    /// Read a staged file back out of a JSON payload field.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.get("temp_path")?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn extension(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}

/// Where an uploaded asset ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReceipt {
    /// Durable public URL; the only thing records keep.
    pub url: String,
    /// Backend identifier (Cloudinary public id, or path below the media root).
    pub public_id: String,
    pub bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn staged_file_round_trips_through_payload_json() {
        let value = json!({
            "key": "image",
            "temp_path": "/tmp/folio_upload_image_1",
            "filename": "slide.PNG",
            "content_type": "image/png",
            "size": 42
        });

        let staged = StagedFile::from_value(&value).unwrap();
        assert_eq!(staged.key, "image");
        assert_eq!(staged.extension(), Some("PNG"));

        assert!(StagedFile::from_value(&json!("plain text")).is_none());
        assert!(StagedFile::from_value(&json!({"key": "image"})).is_none());
    }
}
