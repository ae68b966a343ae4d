use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use folio_core::FolioError;

/// Turns any `anyhow::Error` coming out of a service into a JSON response.
#[derive(Debug)]
pub struct FolioAxumError(pub anyhow::Error);

impl From<anyhow::Error> for FolioAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<FolioError> for FolioAxumError {
    fn from(e: FolioError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for FolioAxumError {
    fn into_response(self) -> Response {
        let safe = match FolioError::from_anyhow(&self.0) {
            Some(folio) => folio.sanitize_for_client(),
            None => FolioError::general_error(self.0.to_string()),
        };

        if safe.kind.is_server_error() {
            tracing::error!(code = safe.code(), error = ?self.0, "request failed");
        } else {
            tracing::debug!(code = safe.code(), error = %self.0, "request rejected");
        }

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
