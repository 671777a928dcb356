//! Post-load checks for [`AppConfig`].
//!
//! Figment only guarantees the shape of the values. Everything here catches
//! values that deserialize fine but would break the build, the offline cache
//! names or the HTTP clients at runtime.

use std::ops::RangeInclusive;

use crate::config::AppConfig;
use thiserror::Error;

/// Accepted HTTP timeout, in milliseconds.
const TIMEOUT_RANGE_MS: RangeInclusive<u64> = 100..=300_000;

/// Placeholder shipped in example configs for `cloudflare.domain`.
const PLACEHOLDER_DOMAIN: &str = "your-domain.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.to_string(), reason: reason.into() }
}

/// Cache names are `{prefix}-static-{version}`, so neither part may be blank
/// or contain whitespace.
fn check_name_part(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(invalid(field, "must be non-empty and contain no whitespace"));
    }
    Ok(())
}

impl AppConfig {
    /// Reject values that load but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !TIMEOUT_RANGE_MS.contains(&self.timeout_ms) {
            return Err(invalid(
                "timeout_ms",
                format!("must be between {}ms and {}ms", TIMEOUT_RANGE_MS.start(), TIMEOUT_RANGE_MS.end()),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        check_name_part("cache_prefix", &self.cache_prefix)?;
        check_name_part("cache_version", &self.cache_version)?;

        if let Some(ext) = self.hashable_extensions.iter().find(|ext| !ext.starts_with('.') || ext.len() < 2) {
            return Err(invalid("hashable_extensions", format!("`{ext}` must look like `.css`")));
        }
        if self.check_interval_secs == 0 {
            return Err(invalid("check_interval_secs", "must be greater than 0"));
        }
        if !self.offline_fallback.starts_with('/') {
            return Err(invalid("offline_fallback", "must be a site-relative path"));
        }

        if self.cloudflare.credentials().is_some() && self.cloudflare.domain == PLACEHOLDER_DOMAIN {
            tracing::warn!(domain = PLACEHOLDER_DOMAIN, "Cloudflare purge will target the placeholder domain");
        }

        Ok(())
    }
}
