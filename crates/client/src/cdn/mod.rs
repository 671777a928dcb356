//! CDN cache invalidation for Cloudflare, Netlify and Vercel.
//!
//! ### Behavior
//!
//! - Only HTML, JSON and the worker script are purged; content-hashed assets
//!   never change under the same name and are left cached.
//! - **Authentication**: `Authorization: Bearer <token>` for every provider.
//! - Providers without credentials are skipped with a warning.
//! - Configured providers run concurrently; request failures are recorded in
//!   the report instead of being raised.

mod report;

pub use report::{InvalidationReport, Provider, ProviderResult};

use std::time::Duration;

use reqwest::{Client, header};
use serde::Deserialize;
use serde_json::{Value, json};

use wedsite_core::config::{CloudflareConfig, NetlifyConfig, VercelConfig};
use wedsite_core::{AppConfig, Error};

/// Cloudflare's response envelope; only the fields we act on.
#[derive(Debug, Deserialize)]
struct CloudflareEnvelope {
    success: bool,
    #[serde(default)]
    errors: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct CdnInvalidator {
    http: Client,
    user_agent: String,
    paths: Vec<String>,
    cloudflare: CloudflareConfig,
    netlify: NetlifyConfig,
    vercel: VercelConfig,
}

impl CdnInvalidator {
    pub fn new(config: &AppConfig) -> Result<Self, Error> {
        let http = crate::fetch::build_http(&config.user_agent, config.timeout(), 5)?;
        Ok(Self {
            http,
            user_agent: config.user_agent.clone(),
            paths: config.purge_paths.clone(),
            cloudflare: config.cloudflare.clone(),
            netlify: config.netlify.clone(),
            vercel: config.vercel.clone(),
        })
    }

    /// Replace the configured purge list.
    pub fn with_paths(mut self, paths: Vec<String>) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, Error> {
        self.http = crate::fetch::build_http(&self.user_agent, timeout, 5)?;
        Ok(self)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Purge every configured provider concurrently.
    pub async fn invalidate_all(&self) -> InvalidationReport {
        tracing::info!(paths = %self.paths.join(", "), "starting CDN invalidation");

        let (cloudflare, netlify, vercel) =
            tokio::join!(self.invalidate_cloudflare(), self.invalidate_netlify(), self.invalidate_vercel());

        let mut report = InvalidationReport::default();
        for (provider, outcome) in
            [(Provider::Cloudflare, cloudflare), (Provider::Netlify, netlify), (Provider::Vercel, vercel)]
        {
            match outcome {
                Some(result) => report.results.push(result),
                None => report.skipped.push(provider),
            }
        }

        tracing::info!(
            succeeded = report.success_count(),
            attempted = report.results.len(),
            "CDN invalidation finished"
        );
        report
    }

    /// Absolute URLs for Cloudflare, which purges by full URL.
    fn cloudflare_files(&self) -> Vec<String> {
        self.paths
            .iter()
            .map(|path| format!("https://{}{}", self.cloudflare.domain, path))
            .collect()
    }

    pub async fn invalidate_cloudflare(&self) -> Option<ProviderResult> {
        let Some((zone_id, token)) = self.cloudflare.credentials() else {
            tracing::warn!("Cloudflare credentials not configured, skipping");
            return None;
        };

        let url = format!("{}/client/v4/zones/{}/purge_cache", self.cloudflare.api_base, zone_id);
        let body = json!({ "files": self.cloudflare_files() });

        let provider = Provider::Cloudflare;
        let response = match self.post(&url, token, &body).await {
            Ok(response) => response,
            Err(e) => return Some(request_failed(provider, e)),
        };

        let status = response.status().as_u16();
        let result = match response.json::<CloudflareEnvelope>().await {
            Ok(envelope) if envelope.success => ProviderResult::succeeded(provider, status),
            Ok(envelope) => {
                let errors = envelope.errors.iter().map(describe_cloudflare_error).collect();
                ProviderResult::failed(provider, Some(status), errors)
            }
            Err(e) => ProviderResult::failed(provider, Some(status), vec![format!("invalid response: {e}")]),
        };
        Some(log_result(result))
    }

    pub async fn invalidate_netlify(&self) -> Option<ProviderResult> {
        let Some((site_id, token)) = self.netlify.credentials() else {
            tracing::warn!("Netlify credentials not configured, skipping");
            return None;
        };

        let url = format!("{}/api/v1/sites/{}/purge", self.netlify.api_base, site_id);
        Some(self.purge_paths(Provider::Netlify, &url, token).await)
    }

    pub async fn invalidate_vercel(&self) -> Option<ProviderResult> {
        let Some((project_id, token)) = self.vercel.credentials() else {
            tracing::warn!("Vercel credentials not configured, skipping");
            return None;
        };

        let url = format!("{}/v1/integrations/deploy/{}/purge", self.vercel.api_base, project_id);
        Some(self.purge_paths(Provider::Vercel, &url, token).await)
    }

    /// Netlify and Vercel share the `{"paths": [...]}` shape and succeed on 200.
    async fn purge_paths(&self, provider: Provider, url: &str, token: &str) -> ProviderResult {
        let body = json!({ "paths": self.paths });
        let response = match self.post(url, token, &body).await {
            Ok(response) => response,
            Err(e) => return request_failed(provider, e),
        };

        let status = response.status().as_u16();
        let result = if status == 200 {
            ProviderResult::succeeded(provider, status)
        } else {
            let text = response.text().await.unwrap_or_default();
            ProviderResult::failed(provider, Some(status), vec![text])
        };
        log_result(result)
    }

    async fn post(&self, url: &str, token: &str, body: &Value) -> Result<reqwest::Response, reqwest::Error> {
        tracing::debug!(url = %url, "sending purge request");
        self.http
            .post(url)
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
    }
}

fn request_failed(provider: Provider, err: reqwest::Error) -> ProviderResult {
    tracing::error!(provider = %provider, error = %err, "purge request failed");
    ProviderResult::failed(provider, None, vec![err.to_string()])
}

fn log_result(result: ProviderResult) -> ProviderResult {
    if result.success {
        tracing::info!(provider = %result.provider, "cache invalidated");
    } else {
        tracing::error!(provider = %result.provider, errors = ?result.errors, "invalidation failed");
    }
    result
}

/// Cloudflare errors look like `{"code": 1234, "message": "..."}`.
fn describe_cloudflare_error(err: &Value) -> String {
    match (err.get("code").and_then(Value::as_i64), err.get("message").and_then(Value::as_str)) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (None, Some(message)) => message.to_string(),
        _ => err.to_string(),
    }
}
