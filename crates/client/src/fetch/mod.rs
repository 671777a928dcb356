//! HTTP fetch pipeline behind the offline worker and the version poller.
//!
//! - Any HTTP status is returned as a response; only transport failures are errors.
//! - Max redirects: 5
//! - Max body bytes: 10MB (configurable)
//! - `Request::no_cache` sends `Cache-Control: no-cache`.

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, header};

pub use url::{UrlError, parse_site, parse_url};

use wedsite_core::offline::{Network, Request};
use wedsite_core::{AppConfig, CachedResponse, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "wedsite/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "wedsite/0.1".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Default::default() }
    }
}

/// Build the shared reqwest client for all outbound calls.
pub(crate) fn build_http(user_agent: &str, timeout: Duration, max_redirects: usize) -> Result<Client, Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(max_redirects))
        .use_rustls_tls()
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))
}

/// reqwest-backed [`Network`] for the offline worker.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = build_http(&config.user_agent, config.timeout, config.max_redirects)?;
        Ok(Self { http, config })
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(FetchConfig::from_app_config(config))
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Issue the request and capture the response as a cacheable entry.
    pub async fn send(&self, request: &Request) -> Result<CachedResponse, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("invalid method: {}", request.method)))?;

        let mut builder = self.http.request(method, request.url.clone());
        if request.no_cache {
            builder = builder.header(header::CACHE_CONTROL, "no-cache");
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(format!("{}: {e}", request.url)))?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::Network(format!("{}: {len} bytes exceeds {}", request.url, self.config.max_bytes)));
        }

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read {}: {e}", request.url)))?;
        if body.len() > self.config.max_bytes {
            return Err(Error::Network(format!(
                "{}: {} bytes exceeds {}",
                request.url,
                body.len(),
                self.config.max_bytes
            )));
        }

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            request.url,
            status,
            start.elapsed().as_millis(),
            body.len()
        );

        let mut cached = CachedResponse::new(request.key(), status, body);
        cached.content_type = content_type;
        cached.headers = headers;
        Ok(cached)
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse, Error> {
        self.send(request).await
    }
}
