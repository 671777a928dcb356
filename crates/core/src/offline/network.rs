//! Outbound fetch seam used by the offline worker.

use async_trait::async_trait;

use super::request::Request;
use crate::{CachedResponse, Error};

/// Where the worker sends requests it cannot answer from cache.
///
/// Implementations return `Ok` for any HTTP status and reserve `Err` for
/// transport failures, so strategies can tell "offline" from "404".
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<CachedResponse, Error>;
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// In-memory network keyed by URL (query ignored when no exact match).
    #[derive(Default)]
    pub(crate) struct FakeNetwork {
        responses: Mutex<HashMap<String, (u16, String)>>,
        offline: AtomicBool,
        hits: Mutex<Vec<String>>,
    }

    impl FakeNetwork {
        pub(crate) fn serve(&self, url: &str, status: u16, body: &str) {
            self.responses.lock().unwrap().insert(url.to_string(), (status, body.to_string()));
        }

        pub(crate) fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        pub(crate) fn hits(&self, url: &str) -> usize {
            self.hits.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
        }
    }

    #[async_trait]
    impl Network for FakeNetwork {
        async fn fetch(&self, request: &Request) -> Result<CachedResponse, Error> {
            let url = request.url.as_str().to_string();
            self.hits.lock().unwrap().push(url.clone());
            if self.offline.load(Ordering::SeqCst) {
                return Err(Error::Network(format!("{url}: offline")));
            }

            let responses = self.responses.lock().unwrap();
            let without_query = url.split('?').next().unwrap_or_default();
            let hit = responses.get(&url).or_else(|| responses.get(without_query));
            Ok(match hit {
                Some((status, body)) => CachedResponse::new(url.clone(), *status, body.clone().into_bytes()),
                None => CachedResponse::new(url.clone(), 404, Vec::<u8>::new()),
            })
        }
    }
}
