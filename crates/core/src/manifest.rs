//! Build manifest: original asset path to content-hashed path, plus build metadata.
//!
//! Serialized as `{"version", "buildTime", "assets"}`. The same document is
//! served as `/version.json` and polled by the update notifier.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Opaque build identifier, epoch milliseconds for regular builds.
    pub version: String,
    /// RFC 3339 build timestamp.
    #[serde(rename = "buildTime")]
    pub build_time: String,
    #[serde(default)]
    pub assets: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new(version: impl Into<String>, build_time: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            build_time: build_time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            assets: BTreeMap::new(),
        }
    }

    /// Manifest stamped with the current time, versioned by epoch millis.
    pub fn stamped_now() -> Self {
        let now = Utc::now();
        Self::new(now.timestamp_millis().to_string(), now)
    }

    pub fn insert(&mut self, original: impl Into<String>, hashed: impl Into<String>) {
        self.assets.insert(original.into(), hashed.into());
    }

    /// Hashed path for an original asset path.
    pub fn resolve(&self, original: &str) -> Option<&str> {
        self.assets.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Whether this manifest describes a different build than `version`.
    ///
    /// Versions are opaque; any difference counts as newer.
    pub fn is_newer_than(&self, version: &str) -> bool {
        self.version != version
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_slice(&bytes)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_pretty()?).map_err(|e| Error::io(path, e))
    }
}
