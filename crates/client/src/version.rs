//! Polling source for the update notifier.

use async_trait::async_trait;
use url::Url;

use wedsite_core::notifier::{Probe, VersionSource};
use wedsite_core::offline::Request;
use wedsite_core::{Error, Manifest};

use crate::fetch::FetchClient;

/// Reads `version.json` from a deployed site on every probe.
#[derive(Debug, Clone)]
pub struct HttpVersionSource {
    client: FetchClient,
    site: Url,
}

impl HttpVersionSource {
    /// `site` is the root URL; `version.json` is resolved relative to it.
    pub fn new(client: FetchClient, site: Url) -> Self {
        Self { client, site }
    }

    fn version_url(&self) -> Result<Url, Error> {
        let path = format!("version.json?t={}", chrono::Utc::now().timestamp_millis());
        self.site
            .join(&path)
            .map_err(|e| Error::InvalidUrl(format!("{}: {e}", self.site)))
    }

    /// Fetch and parse the deployed manifest.
    pub async fn fetch_manifest(&self) -> Result<Manifest, Error> {
        let request = Request::get(self.version_url()?).with_no_cache();
        let response = self.client.send(&request).await?;
        if !response.is_success() {
            return Err(Error::HttpError(format!("{}: status {}", request.url, response.status)));
        }
        Manifest::from_slice(&response.body)
    }
}

#[async_trait]
impl VersionSource for HttpVersionSource {
    async fn probe(&self) -> Result<Probe, Error> {
        let manifest = self.fetch_manifest().await?;
        tracing::debug!(version = %manifest.version, "polled site version");
        Ok(Probe::Version(manifest.version))
    }
}
