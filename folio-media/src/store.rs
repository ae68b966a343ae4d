use async_trait::async_trait;

use crate::error::MediaResult;
use crate::types::{MediaReceipt, StagedFile};

/// A place that turns a local file into a public URL.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload `file` under `folder`. The caller owns (and deletes) the temp file.
    async fn upload(&self, file: &StagedFile, folder: &str) -> MediaResult<MediaReceipt>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
