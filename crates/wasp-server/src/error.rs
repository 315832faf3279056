//! Maps `WaspError` onto HTTP responses. No variant's `Display` ever
//! includes the configured token or a filesystem path.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use wasp_core::WaspError;

pub struct AppError(pub WaspError);

impl From<WaspError> for AppError {
    fn from(err: WaspError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WaspError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            WaspError::Unauthorized => StatusCode::UNAUTHORIZED,
            WaspError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            WaspError::NotFound(_) => StatusCode::NOT_FOUND,
            WaspError::NotInitialized => StatusCode::SERVICE_UNAVAILABLE,
            WaspError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WaspError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // StorageFailure's Display wraps a sqlx error that may contain a
        // file path; the façade body never forwards it verbatim.
        let body = match &self.0 {
            WaspError::StorageFailure(_) => "internal storage error".to_string(),
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": body }))).into_response()
    }
}
