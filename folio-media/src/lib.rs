//! folio-media: turns staged uploads into durable public URLs.
//!
//! A multipart request leaves each file part on disk as a [`StagedFile`].
//! [`MediaAdapter::upload`] checks it, hands it to a [`MediaStore`]
//! (Cloudinary or the local filesystem) and deletes the temporary file on
//! every exit path.

pub mod adapter;
pub mod cloudinary;
pub mod config;
pub mod error;
pub mod fs;
pub mod guard;
pub mod store;
pub mod types;

pub use adapter::MediaAdapter;
pub use cloudinary::{CloudinaryCredentials, CloudinaryStore};
pub use config::MediaConfig;
pub use error::{MediaError, MediaResult};
pub use fs::FsMediaStore;
pub use guard::TempUpload;
pub use store::MediaStore;
pub use types::{MediaReceipt, StagedFile, STAGED_FILE_PREFIX};
