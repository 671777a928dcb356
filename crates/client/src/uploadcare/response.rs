//! Uploadcare file list types and gallery mapping.

use serde::Deserialize;

/// Lightweight preview transformation appended to each CDN URL.
pub const PREVIEW_SUFFIX: &str = "-/preview/-/quality/lightest/";

/// One page of `GET /files/`.
#[derive(Debug, Deserialize)]
pub struct FileList {
    /// Absolute URL of the next page, if any.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<UploadedFile>,
}

/// The fields of a stored file the gallery cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    #[serde(default)]
    pub uuid: Option<String>,
    pub cdn_url: String,
    #[serde(default)]
    pub is_image: bool,
    #[serde(default)]
    pub is_ready: bool,
}

impl UploadedFile {
    /// Only finished image uploads belong in the gallery.
    pub fn is_gallery_image(&self) -> bool {
        self.is_image && self.is_ready
    }

    pub fn preview_url(&self) -> String {
        format!("{}{PREVIEW_SUFFIX}", self.cdn_url)
    }
}

/// Preview URLs for every ready image, in listing order.
pub fn gallery_urls<'a>(files: impl IntoIterator<Item = &'a UploadedFile>) -> Vec<String> {
    files
        .into_iter()
        .filter(|f| f.is_gallery_image())
        .map(UploadedFile::preview_url)
        .collect()
}
