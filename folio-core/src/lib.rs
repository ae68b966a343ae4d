//! folio-core: transport-agnostic core of the Folio CMS backend.
//!
//! Content blocks are exposed as named services. Every call to a service
//! runs through a hook pipeline (before → service → after, error hooks on
//! failure) owned by [`FolioApp`], and failures travel as [`FolioError`]s
//! inside `anyhow::Error` until a transport decides how to render them.

pub mod app;
pub mod config;
pub mod context;
pub mod errors;
pub mod hooks;
pub mod service;

pub use app::{FolioApp, ServiceHandle};
pub use config::{ConfigSnapshot, FolioConfig};
pub use context::RequestContext;
pub use errors::{ErrorKind, FolioError, FolioResult};
pub use hooks::{AfterHook, BeforeHook, ErrorHook, HookContext, HookResult, ServiceHooks};
pub use service::{FolioService, ServiceCapabilities, ServiceMethodKind};
