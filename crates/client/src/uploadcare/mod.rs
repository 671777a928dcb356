//! Uploadcare REST API client for the photo gallery.
//!
//! ### API
//!
//! - **Endpoint**: `{api_base}/files/`, following `next` links across pages.
//! - **Authentication**: `Authorization: Uploadcare.Simple {public}:{secret}`.
//! - **Normalization**: ready images only, mapped to lightweight preview URLs.

pub mod error;
pub mod response;

pub use error::UploadcareError;
pub use response::{FileList, PREVIEW_SUFFIX, UploadedFile, gallery_urls};

use std::sync::Arc;
use std::time::Duration;

use reqwest::header;

use wedsite_core::config::UploadcareConfig;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on followed `next` links.
const MAX_PAGES: usize = 20;

#[derive(Debug, Clone)]
pub struct UploadcareClient {
    http: reqwest::Client,
    api_base: String,
    public_key: String,
    secret_key: String,
}

impl UploadcareClient {
    /// Build a client from config. Fails when either key is missing.
    pub fn new(config: &UploadcareConfig, user_agent: &str) -> Result<Self, UploadcareError> {
        let (public_key, secret_key) =
            config.require_keys().map_err(|e| UploadcareError::MissingKeys(e.to_string()))?;

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| UploadcareError::Network(Arc::new(e)))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            public_key: public_key.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    fn authorization(&self) -> String {
        format!("Uploadcare.Simple {}:{}", self.public_key, self.secret_key)
    }

    async fn fetch_page(&self, url: &str) -> Result<FileList, UploadcareError> {
        tracing::debug!("listing Uploadcare files: {}", url);

        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, self.authorization())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(UploadcareError::AuthError);
        }
        if !status.is_success() {
            return Err(UploadcareError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| UploadcareError::Parse(e.to_string()))
    }

    /// Every stored file, across pages.
    pub async fn list_files(&self) -> Result<Vec<UploadedFile>, UploadcareError> {
        let mut files = Vec::new();
        let mut next = Some(format!("{}/files/", self.api_base));
        let mut pages = 0;

        while let Some(url) = next.take() {
            let page = self.fetch_page(&url).await?;
            files.extend(page.results);
            pages += 1;
            if pages >= MAX_PAGES {
                tracing::warn!("stopping after {} pages of Uploadcare files", MAX_PAGES);
                break;
            }
            next = page.next;
        }
        Ok(files)
    }

    /// Preview URLs for every ready image upload.
    pub async fn gallery_images(&self) -> Result<Vec<String>, UploadcareError> {
        let files = self.list_files().await?;
        let images = gallery_urls(&files);
        tracing::debug!("{} of {} uploads are gallery images", images.len(), files.len());
        Ok(images)
    }
}
