//! Structured errors for the gallery server.
//!
//! Every error renders as `{"error": "..."}` with a status that tells the
//! visitor's browser whether to retry.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use wedsite_client::UploadcareError;

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    /// Uploadcare keys are not configured.
    #[error("UNCONFIGURED: {0}")]
    Unconfigured(String),

    /// Uploadcare could not be reached or answered with an error.
    #[error("UPSTREAM: {0}")]
    Upstream(String),
}

impl GalleryError {
    pub fn status(&self) -> StatusCode {
        match self {
            GalleryError::Unconfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            GalleryError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<UploadcareError> for GalleryError {
    fn from(err: UploadcareError) -> Self {
        if err.is_config() { GalleryError::Unconfigured(err.to_string()) } else { GalleryError::Upstream(err.to_string()) }
    }
}

impl IntoResponse for GalleryError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = status.as_u16(), error = %self, "gallery request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
