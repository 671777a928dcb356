//! Site URL parsing for command-line and config input.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for wedsite_core::Error {
    fn from(err: UrlError) -> Self {
        wedsite_core::Error::InvalidUrl(err.to_string())
    }
}

/// Parse a user-supplied URL, defaulting the scheme to `https` and dropping
/// any fragment.
pub fn parse_url(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme =
        if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
    url.set_fragment(None);
    Ok(url)
}

/// Parse the root URL of a deployed site.
///
/// Keeps any path prefix but guarantees a trailing slash, so relative joins
/// such as `version.json` stay under it. Queries are dropped.
pub fn parse_site(input: &str) -> Result<Url, UrlError> {
    let mut url = parse_url(input)?;
    url.set_query(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
