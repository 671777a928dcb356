//! Credentials and endpoints for the third-party services.
//!
//! Every credential is optional: a provider without credentials is skipped
//! at runtime rather than failing the whole run.

use serde::{Deserialize, Serialize};

use super::ConfigError;

fn default_cloudflare_api() -> String {
    "https://api.cloudflare.com".into()
}

fn default_cloudflare_domain() -> String {
    "your-domain.com".into()
}

fn default_netlify_api() -> String {
    "https://api.netlify.com".into()
}

fn default_vercel_api() -> String {
    "https://api.vercel.com".into()
}

fn default_uploadcare_api() -> String {
    "https://api.uploadcare.com".into()
}

/// Cloudflare zone purge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudflareConfig {
    /// Set via CLOUDFLARE_ZONE_ID.
    #[serde(default)]
    pub zone_id: Option<String>,

    /// Set via CLOUDFLARE_API_TOKEN.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Public domain used to build absolute purge URLs (CLOUDFLARE_DOMAIN).
    #[serde(default = "default_cloudflare_domain")]
    pub domain: String,

    #[serde(default = "default_cloudflare_api")]
    pub api_base: String,
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            zone_id: None,
            api_token: None,
            domain: default_cloudflare_domain(),
            api_base: default_cloudflare_api(),
        }
    }
}

impl CloudflareConfig {
    /// Zone id and token, when both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.zone_id.as_deref()?, self.api_token.as_deref()?))
    }
}

/// Netlify site purge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetlifyConfig {
    /// Set via NETLIFY_SITE_ID.
    #[serde(default)]
    pub site_id: Option<String>,

    /// Set via NETLIFY_ACCESS_TOKEN.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_netlify_api")]
    pub api_base: String,
}

impl Default for NetlifyConfig {
    fn default() -> Self {
        Self { site_id: None, access_token: None, api_base: default_netlify_api() }
    }
}

impl NetlifyConfig {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.site_id.as_deref()?, self.access_token.as_deref()?))
    }
}

/// Vercel project purge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VercelConfig {
    /// Set via VERCEL_PROJECT_ID.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Set via VERCEL_ACCESS_TOKEN.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_vercel_api")]
    pub api_base: String,
}

impl Default for VercelConfig {
    fn default() -> Self {
        Self { project_id: None, access_token: None, api_base: default_vercel_api() }
    }
}

impl VercelConfig {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.project_id.as_deref()?, self.access_token.as_deref()?))
    }
}

/// Uploadcare REST API settings for the gallery proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadcareConfig {
    /// Set via UPLOADCARE_PUBLIC_KEY.
    #[serde(default)]
    pub public_key: Option<String>,

    /// Set via UPLOADCARE_SECRET_KEY.
    #[serde(default)]
    pub secret_key: Option<String>,

    #[serde(default = "default_uploadcare_api")]
    pub api_base: String,
}

impl Default for UploadcareConfig {
    fn default() -> Self {
        Self { public_key: None, secret_key: None, api_base: default_uploadcare_api() }
    }
}

impl UploadcareConfig {
    /// Check that both keys are available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first absent key.
    pub fn require_keys(&self) -> Result<(&str, &str), ConfigError> {
        let public = self.public_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "uploadcare.public_key".into(),
            hint: "Set UPLOADCARE_PUBLIC_KEY environment variable".into(),
        })?;
        let secret = self.secret_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "uploadcare.secret_key".into(),
            hint: "Set UPLOADCARE_SECRET_KEY environment variable".into(),
        })?;
        Ok((public, secret))
    }
}
