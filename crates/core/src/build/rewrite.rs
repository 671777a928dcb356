//! HTML reference rewriting against a build manifest.
//!
//! All manifest keys are compiled into one alternation, longest first, and
//! applied in a single pass. A replaced reference is never scanned again, so
//! the rewrite is 1:1 with the manifest.

use regex::bytes::{Captures, Regex};

use crate::{Error, Manifest};

/// Compiled rewriter for one manifest.
#[derive(Debug)]
pub struct ReferenceRewriter<'m> {
    manifest: &'m Manifest,
    pattern: Option<Regex>,
}

impl<'m> ReferenceRewriter<'m> {
    pub fn new(manifest: &'m Manifest) -> Result<Self, Error> {
        if manifest.is_empty() {
            return Ok(Self { manifest, pattern: None });
        }

        let mut keys: Vec<&str> = manifest.assets.keys().map(String::as_str).collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = keys.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");
        let pattern = Regex::new(&alternation)
            .map_err(|e| Error::InvalidInput(format!("manifest too large to rewrite: {e}")))?;

        Ok(Self { manifest, pattern: Some(pattern) })
    }

    /// Replace every standalone occurrence of an original asset path.
    ///
    /// Pages are treated as raw bytes, so a page in a legacy encoding is
    /// rewritten with its other bytes untouched. A match glued to a longer
    /// path token (`assets/app.js` inside `assets/app.json`) is left alone.
    pub fn rewrite_bytes(&self, html: &[u8]) -> Vec<u8> {
        let Some(pattern) = &self.pattern else {
            return html.to_vec();
        };

        pattern
            .replace_all(html, |caps: &Captures<'_>| {
                let Some(m) = caps.get(0) else {
                    return Vec::new();
                };
                let matched = m.as_bytes();
                let before = html[..m.start()].last().copied();
                let after = html.get(m.end()).copied();
                if before.is_some_and(is_path_byte) || after.is_some_and(is_path_byte) {
                    return matched.to_vec();
                }
                match std::str::from_utf8(matched).ok().and_then(|key| self.manifest.resolve(key)) {
                    Some(hashed) => hashed.as_bytes().to_vec(),
                    None => matched.to_vec(),
                }
            })
            .into_owned()
    }

    pub fn rewrite(&self, html: &str) -> String {
        match String::from_utf8(self.rewrite_bytes(html.as_bytes())) {
            Ok(out) => out,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')
}

/// One-shot convenience over [`ReferenceRewriter`].
pub fn rewrite_references(html: &str, manifest: &Manifest) -> Result<String, Error> {
    Ok(ReferenceRewriter::new(manifest)?.rewrite(html))
}
