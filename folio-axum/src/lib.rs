//! folio-axum: serves a [`FolioApp`](folio_core::FolioApp) over HTTP with axum.
//!
//! Each registered service gets the REST mapping
//!
//! | route          | call     | status |
//! |----------------|----------|--------|
//! | `GET /`        | find     | 200    |
//! | `POST /`       | create   | 201    |
//! | `GET /{id}`    | get      | 200    |
//! | `PUT /{id}`    | update   | 200    |
//! | `PATCH /{id}`  | patch    | 200    |
//! | `DELETE /{id}` | remove   | 200    |
//!
//! Singleton services answer `GET /` with their single record (404 when
//! empty). Errors render as the JSON shape of
//! [`FolioError::to_json`](folio_core::FolioError::to_json).

pub mod app;
mod error;
pub mod middlewares;
pub mod params;
pub mod rest;
pub mod state;

pub use app::{axum, AxumApp};
pub use error::FolioAxumError;
pub use params::{FromRestParams, ResponseStatus, RestParams};
pub use state::FolioAxumState;
