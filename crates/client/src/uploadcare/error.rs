//! Uploadcare client error types.

use std::sync::Arc;

/// Errors from the Uploadcare REST client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UploadcareError {
    /// Public or secret key not configured.
    #[error("missing Uploadcare keys: {0}")]
    MissingKeys(String),

    /// Uploadcare rejected the key pair.
    #[error("authentication failed: invalid Uploadcare keys")]
    AuthError,

    /// Non-success response from Uploadcare.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("request timeout")]
    Timeout,

    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response body was not a file list.
    #[error("parse error: {0}")]
    Parse(String),
}

impl UploadcareError {
    /// Whether the failure lies with configuration rather than the upstream.
    pub fn is_config(&self) -> bool {
        matches!(self, UploadcareError::MissingKeys(_))
    }
}

impl From<reqwest::Error> for UploadcareError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { UploadcareError::Timeout } else { UploadcareError::Network(Arc::new(err)) }
    }
}
