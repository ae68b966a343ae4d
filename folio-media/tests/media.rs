use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use folio_core::{ErrorKind, FolioError};
use folio_media::{
    FsMediaStore, MediaAdapter, MediaConfig, MediaError, MediaReceipt, MediaResult, MediaStore,
    StagedFile,
};

fn stage(dir: &Path, name: &str, content_type: &str, body: &[u8]) -> StagedFile {
    let temp_path: PathBuf = dir.join(format!("folio_upload_{name}"));
    std::fs::write(&temp_path, body).unwrap();
    StagedFile {
        key: "image".to_string(),
        temp_path,
        filename: Some(name.to_string()),
        content_type: Some(content_type.to_string()),
        size: body.len() as u64,
    }
}

struct BrokenStore;

#[async_trait]
impl MediaStore for BrokenStore {
    async fn upload(&self, _file: &StagedFile, _folder: &str) -> MediaResult<MediaReceipt> {
        Err(MediaError::upload_failed("host unreachable"))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn local_upload_copies_into_folder_and_releases_temp_file() {
    let uploads = tempfile::tempdir().unwrap();
    let media = tempfile::tempdir().unwrap();
    let adapter = MediaAdapter::new(
        Arc::new(FsMediaStore::new(media.path(), "/media/")),
        MediaConfig::default(),
    );

    let staged = stage(uploads.path(), "slide.png", "image/png", b"\x89PNG fake");
    let temp = staged.temp_path.clone();

    let receipt = adapter.upload(staged, "banner-images").await.unwrap();

    assert!(receipt.url.starts_with("/media/banner-images/"));
    assert!(receipt.url.ends_with(".png"));
    assert_eq!(receipt.bytes, 9);
    assert!(media.path().join(&receipt.public_id).exists());
    assert!(!temp.exists());
}

#[tokio::test]
async fn non_images_are_rejected_and_still_released() {
    let uploads = tempfile::tempdir().unwrap();
    let media = tempfile::tempdir().unwrap();
    let adapter = MediaAdapter::new(
        Arc::new(FsMediaStore::new(media.path(), "/media")),
        MediaConfig::default(),
    );

    let staged = stage(uploads.path(), "notes.txt", "text/plain", b"hello");
    let temp = staged.temp_path.clone();

    let err = adapter.upload(staged, "blog-images").await.unwrap_err();
    assert!(matches!(err, MediaError::UnsupportedType { .. }));
    assert!(!temp.exists());

    let folio: FolioError = err.into();
    assert_eq!(folio.kind, ErrorKind::BadRequest);
}

#[tokio::test]
async fn oversized_files_are_rejected() {
    let uploads = tempfile::tempdir().unwrap();
    let adapter = MediaAdapter::new(
        Arc::new(BrokenStore),
        MediaConfig::new().with_max_file_bytes(4),
    );

    let staged = stage(uploads.path(), "big.jpg", "image/jpeg", b"12345");
    let err = adapter.upload(staged, "blog-images").await.unwrap_err();
    assert!(matches!(err, MediaError::TooLarge { size: 5, max: 4 }));

    let folio: FolioError = err.into();
    assert_eq!(folio.code(), 413);
}

#[tokio::test]
async fn backend_failures_release_the_temp_file_and_map_to_500() {
    let uploads = tempfile::tempdir().unwrap();
    let adapter = MediaAdapter::new(Arc::new(BrokenStore), MediaConfig::default());

    let staged = stage(uploads.path(), "doc.jpg", "image/jpeg", b"jpeg");
    let temp = staged.temp_path.clone();

    let err = adapter.upload(staged, "DoctorService-images").await.unwrap_err();
    assert!(!temp.exists());

    let folio: FolioError = err.into();
    assert_eq!(folio.code(), 500);
    assert_eq!(folio.message, "Failed to upload image");
}

#[tokio::test]
async fn files_outside_the_staging_dir_are_refused_and_left_alone() {
    let uploads = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let media = tempfile::tempdir().unwrap();
    let adapter = MediaAdapter::new(
        Arc::new(FsMediaStore::new(media.path(), "/media")),
        MediaConfig::default().with_staging_dir(uploads.path()),
    );

    let foreign = stage(elsewhere.path(), "secret.png", "image/png", b"keep me");
    let err = adapter.upload(foreign.clone(), "partner-images").await.unwrap_err();
    assert!(matches!(err, MediaError::Invalid { .. }));
    assert!(foreign.temp_path.exists());

    // Right directory, but not a name the multipart layer would produce.
    let unprefixed = uploads.path().join("notes.png");
    std::fs::write(&unprefixed, b"keep me too").unwrap();
    let forged = StagedFile {
        temp_path: unprefixed.clone(),
        ..foreign
    };
    assert!(adapter.upload(forged, "partner-images").await.is_err());
    assert!(unprefixed.exists());

    let staged = stage(uploads.path(), "logo.png", "image/png", b"ok");
    assert!(adapter.upload(staged, "partner-images").await.is_ok());
}
