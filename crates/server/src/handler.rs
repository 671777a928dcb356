//! HTTP routes for the gallery server.
//!
//! `GET /uploads` proxies the Uploadcare file list so the secret key never
//! reaches the browser. Everything else is served from the build directory.

use std::path::Path;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use wedsite_client::{UploadcareClient, UploadcareError};
use wedsite_core::AppConfig;

use crate::error::GalleryError;

/// Shared handler state. A missing key pair is kept as the error so each
/// request reports it instead of the server refusing to start.
#[derive(Clone)]
pub struct AppState {
    uploadcare: Result<UploadcareClient, UploadcareError>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let uploadcare = UploadcareClient::new(&config.uploadcare, &config.user_agent);
        if let Err(e) = &uploadcare {
            tracing::warn!(error = %e, "gallery disabled until Uploadcare keys are configured");
        }
        Self { uploadcare }
    }
}

pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/uploads", get(list_uploads))
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
}

async fn list_uploads(State(state): State<AppState>) -> Result<Json<Vec<String>>, GalleryError> {
    let client = state.uploadcare.as_ref().map_err(|e| GalleryError::from(e.clone()))?;
    let images = client.gallery_images().await?;
    tracing::info!(count = images.len(), "served gallery images");
    Ok(Json(images))
}
