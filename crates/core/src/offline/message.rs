//! JSON messages exchanged between pages and the worker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Page -> worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    CheckVersion,
    SkipWaiting,
    ClearCaches,
    GetCacheStatus,
}

/// Worker -> page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "SW_ACTIVATED")]
    Activated { version: String },
    #[serde(rename = "CACHE_STATUS")]
    CacheStatus { caches: BTreeMap<String, u64> },
    #[serde(rename = "CACHES_CLEARED")]
    CachesCleared { deleted: Vec<String> },
    /// Reply to CHECK_VERSION, sent without a `type` field.
    #[serde(untagged)]
    VersionStatus {
        #[serde(rename = "hasUpdate")]
        has_update: bool,
    },
}
