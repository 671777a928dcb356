//! Request metadata the worker routes on.

use url::Url;

use crate::Error;

/// How the request was issued by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

/// What kind of resource the page asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Style,
    Script,
    Font,
    Image,
    Manifest,
    Other,
}

impl Destination {
    /// Infer the destination from the last path extension.
    pub fn from_path(path: &str) -> Self {
        let file = path.rsplit('/').next().unwrap_or_default();
        let ext = match file.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return Destination::Other,
        };
        match ext.as_str() {
            "html" | "htm" => Destination::Document,
            "css" => Destination::Style,
            "js" | "mjs" => Destination::Script,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Destination::Font,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" | "avif" => Destination::Image,
            "json" | "webmanifest" => Destination::Manifest,
            _ => Destination::Other,
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: Url,
    pub method: String,
    pub mode: RequestMode,
    pub destination: Destination,
    /// Ask intermediaries to revalidate (`Cache-Control: no-cache`).
    pub no_cache: bool,
}

impl Request {
    /// Subresource GET with the destination inferred from the URL.
    pub fn get(url: Url) -> Self {
        let destination = Destination::from_path(url.path());
        Self { url, method: "GET".into(), mode: RequestMode::NoCors, destination, no_cache: false }
    }

    /// Top-level page navigation.
    pub fn navigate(url: Url) -> Self {
        Self { url, method: "GET".into(), mode: RequestMode::Navigate, destination: Destination::Document, no_cache: false }
    }

    /// Resolve `input` (absolute or site-relative) against `origin`.
    pub fn resolve(origin: &Url, input: &str) -> Result<Url, Error> {
        origin.join(input.trim()).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn with_no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Cache key for this request.
    pub fn key(&self) -> &str {
        self.url.as_str()
    }
}
