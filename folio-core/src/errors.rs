//! # Errors
//!
//! Folio services fail with a [`FolioError`] wrapped in `anyhow::Error`, so
//! the error can cross the hook pipeline untouched and still be recovered
//! by the transport:
//!
//! ```rust
//! use folio_core::{ErrorKind, FolioError};
//!
//! let err = FolioError::not_found("Navbar item not found: 42").into_anyhow();
//! let folio = FolioError::from_anyhow(&err).unwrap();
//! assert_eq!(folio.kind, ErrorKind::NotFound);
//! assert_eq!(folio.code(), 404);
//! ```
//!
//! The JSON rendering (`to_json`) keeps the `name` / `message` / `code` /
//! `className` / `errors` shape the admin client expects.

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::{json, Value};

/// Result alias used across Folio core APIs.
pub type FolioResult<T> = std::result::Result<T, AnyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotFound,         // 404
    MethodNotAllowed, // 405
    Conflict,         // 409
    PayloadTooLarge,  // 413
    Unprocessable,    // 422
    GeneralError,     // 500
    NotImplemented,   // 501
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Conflict => 409,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError => 500,
            ErrorKind::NotImplemented => 501,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::PayloadTooLarge => "PayloadTooLarge",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::NotImplemented => "NotImplemented",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::PayloadTooLarge => "payload-too-large",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::NotImplemented => "not-implemented",
        }
    }

    /// Whether the failure is the server's fault (logged at error level).
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

/// A structured error that lives inside `anyhow::Error`.
#[derive(Debug)]
pub struct FolioError {
    pub kind: ErrorKind,
    pub message: String,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl FolioError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
            source: None,
        }
    }

    /// Attach per-field details, e.g. `{"position": ["must be <= 3"]}`.
    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Convenience for a single field message.
    pub fn with_field_error(self, field: &str, msg: impl Into<String>) -> Self {
        self.with_errors(json!({ field: [msg.into()] }))
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find a `FolioError` anywhere in an anyhow chain (contexts included).
    pub fn from_anyhow(err: &AnyError) -> Option<&FolioError> {
        err.chain().find_map(|e| e.downcast_ref::<FolioError>())
    }

    /// Turn any error into a `FolioError`, wrapping foreign errors as
    /// `GeneralError` and keeping them as the source.
    pub fn normalize(err: AnyError) -> FolioError {
        match err.downcast::<FolioError>() {
            Ok(folio) => folio,
            Err(other) => FolioError::general_error(other.to_string()).with_source(other),
        }
    }

    /// Copy without the source chain, safe to hand to clients.
    pub fn sanitize_for_client(&self) -> FolioError {
        FolioError {
            kind: self.kind,
            message: self.message.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, msg)
    }
}

impl fmt::Display for FolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for FolioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Return early with a `FolioError` built from one of its constructors.
#[macro_export]
macro_rules! bail_folio {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::FolioError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::FolioError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn folio_error_survives_anyhow_context() {
        let err: AnyError = Err::<(), _>(FolioError::conflict("navbar changed").into_anyhow())
            .context("while moving item")
            .unwrap_err();

        let folio = FolioError::from_anyhow(&err).expect("folio error in chain");
        assert_eq!(folio.kind, ErrorKind::Conflict);
    }

    #[test]
    fn foreign_errors_normalize_to_general_error() {
        let folio = FolioError::normalize(anyhow::anyhow!("disk on fire"));
        assert_eq!(folio.code(), 500);
        assert!(folio.source.is_some());
        assert!(folio.sanitize_for_client().source.is_none());
    }

    #[test]
    fn json_shape_includes_field_errors() {
        let body = FolioError::bad_request("Invalid position")
            .with_field_error("position", "must be between 0 and 2")
            .to_json();

        assert_eq!(body["name"], "BadRequest");
        assert_eq!(body["className"], "bad-request");
        assert_eq!(body["code"], 400);
        assert_eq!(body["errors"]["position"][0], "must be between 0 and 2");
    }
}
