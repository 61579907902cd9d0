//! HTTP-facing errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flotilla_search::MediaIdError;
use serde_json::json;

/// Errors a request handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Content type or id could not be understood.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] MediaIdError),

    /// The path did not end in `.json`.
    #[error("Not found: {path}")]
    NotFound {
        /// The requested resource segment
        path: String,
    },
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match self {
            WebError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            WebError::NotFound { .. } => StatusCode::NOT_FOUND,
        };

        tracing::debug!(error = %self, status = status.as_u16(), "Rejecting request");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let invalid = WebError::from(MediaIdError::UnsupportedType {
            media_type: "tv-channel".to_string(),
        });
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let missing = WebError::NotFound {
            path: "tt1".to_string(),
        };
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
    }
}
