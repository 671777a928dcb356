//! Offline worker lifecycle and fetch handling.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use url::Url;

use super::buster::add_cache_buster;
use super::message::{ClientMessage, WorkerMessage};
use super::names::CacheNames;
use super::network::Network;
use super::request::Request;
use super::route::{Partition, Route, Strategy};
use crate::cache::WorkerRecord;
use crate::{AppConfig, CacheDb, CachedResponse, Error, Manifest};

/// Path of the deployed build manifest, always fetched from the network.
const VERSION_PATH: &str = "/version.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "installing" => Ok(WorkerState::Installing),
            "installed" => Ok(WorkerState::Installed),
            "activating" => Ok(WorkerState::Activating),
            "activated" => Ok(WorkerState::Activated),
            "redundant" => Ok(WorkerState::Redundant),
            other => Err(Error::InvalidState(format!("unknown worker state '{other}'"))),
        }
    }
}

/// Settings the worker needs, resolved against the site origin.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub origin: Url,
    pub names: CacheNames,
    pub precache_urls: Vec<String>,
    pub offline_fallback: String,
}

impl WorkerConfig {
    pub fn from_app_config(config: &AppConfig, origin: Url) -> Self {
        Self {
            origin,
            names: config.cache_names(),
            precache_urls: config.precache_urls.clone(),
            offline_fallback: config.offline_fallback.clone(),
        }
    }
}

/// Where a fetch answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
    /// The offline fallback page stood in for a failed navigation.
    Fallback,
}

#[derive(Debug)]
pub struct FetchOutcome {
    pub response: CachedResponse,
    pub source: ResponseSource,
    pub strategy: Strategy,
    /// Background refresh started by stale-while-revalidate.
    pub revalidation: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cache: String,
    pub urls: Vec<String>,
    pub site_version: Option<String>,
    /// Set when a pending skip-waiting request activated the worker right away.
    pub activated: Option<ActivateReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub message: WorkerMessage,
}

/// A service-worker style cache engine over [`CacheDb`].
///
/// State is persisted after each lifecycle transition, so a worker restored
/// with [`OfflineWorker::restore`] continues where the previous process left
/// off as long as the cache version is unchanged.
pub struct OfflineWorker {
    db: CacheDb,
    network: Arc<dyn Network>,
    config: WorkerConfig,
    state: WorkerState,
    skip_waiting: bool,
    site_version: Option<String>,
}

impl OfflineWorker {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, config: WorkerConfig) -> Self {
        Self { db, network, config, state: WorkerState::Installing, skip_waiting: false, site_version: None }
    }

    /// Resume from the persisted record, or start fresh when the record
    /// belongs to another cache version.
    pub async fn restore(db: CacheDb, network: Arc<dyn Network>, config: WorkerConfig) -> Result<Self, Error> {
        let record = db.load_worker_record().await?;
        let mut worker = Self::new(db, network, config);

        match record {
            Some(record) if record.cache_version == worker.config.names.version() => {
                worker.state = record.state.parse()?;
                worker.skip_waiting = record.skip_waiting;
                worker.site_version = record.site_version;
                tracing::debug!(state = %worker.state, "restored worker");
            }
            Some(record) => {
                tracing::info!(
                    previous = %record.cache_version,
                    current = %worker.config.names.version(),
                    "cache version changed, new worker must install"
                );
            }
            None => {}
        }
        Ok(worker)
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn names(&self) -> &CacheNames {
        &self.config.names
    }

    pub fn site_version(&self) -> Option<&str> {
        self.site_version.as_deref()
    }

    pub fn with_site_version(mut self, version: impl Into<String>) -> Self {
        self.site_version = Some(version.into());
        self
    }

    /// A worker is waiting when it installed but has not taken over yet.
    pub fn is_waiting(&self) -> bool {
        self.state == WorkerState::Installed
    }

    async fn persist(&self) -> Result<(), Error> {
        let record = WorkerRecord {
            cache_version: self.config.names.version().to_string(),
            state: self.state.as_str().to_string(),
            site_version: self.site_version.clone(),
            skip_waiting: self.skip_waiting,
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        self.db.save_worker_record(&record).await
    }

    /// Precache every configured URL into the static cache.
    ///
    /// Either all URLs are stored or none are: a failed fetch or store leaves
    /// the cache as it was and marks the worker redundant.
    pub async fn install(&mut self) -> Result<InstallReport, Error> {
        match self.state {
            WorkerState::Installing | WorkerState::Redundant => {}
            other => return Err(Error::InvalidState(format!("cannot install a worker that is {other}"))),
        }
        self.state = WorkerState::Installing;
        let cache = self.config.names.static_name();
        tracing::info!(cache = %cache, urls = self.config.precache_urls.len(), "installing");

        match self.precache(&cache).await {
            Ok(urls) => {
                if self.site_version.is_none() {
                    self.site_version = self.fetch_site_version().await.ok();
                }
                self.state = WorkerState::Installed;
                self.persist().await?;
                tracing::info!(cache = %cache, stored = urls.len(), "installed");

                let activated = if self.skip_waiting { Some(self.activate().await?) } else { None };
                Ok(InstallReport { cache, urls, site_version: self.site_version.clone(), activated })
            }
            Err(e) => {
                self.state = WorkerState::Redundant;
                self.persist().await?;
                tracing::error!(error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self, cache: &str) -> Result<Vec<String>, Error> {
        let mut responses = Vec::with_capacity(self.config.precache_urls.len());
        for input in &self.config.precache_urls {
            let request = Request::get(Request::resolve(&self.config.origin, input)?);
            let response = self.network.fetch(&request).await?;
            if !response.is_success() {
                return Err(Error::HttpError(format!("precache {}: status {}", request.key(), response.status)));
            }
            responses.push((request.key().to_string(), response));
        }

        self.db.open_cache(cache).await?;
        let mut stored: Vec<String> = Vec::with_capacity(responses.len());
        for (key, mut response) in responses {
            response.url = key.clone();
            if let Err(e) = self.db.put(cache, &response).await {
                for url in &stored {
                    self.db.delete_entry(cache, url).await?;
                }
                return Err(e);
            }
            stored.push(key);
        }
        Ok(stored)
    }

    /// Activate as soon as installation finishes, without waiting for pages
    /// controlled by an older worker to go away.
    pub fn skip_waiting(&mut self) {
        self.skip_waiting = true;
    }

    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting
    }

    /// Evict every cache that does not belong to the current version.
    pub async fn activate(&mut self) -> Result<ActivateReport, Error> {
        if self.state != WorkerState::Installed {
            return Err(Error::InvalidState(format!("cannot activate a worker that is {}", self.state)));
        }
        self.state = WorkerState::Activating;

        let mut deleted = Vec::new();
        for name in self.db.cache_names().await? {
            if !self.config.names.is_current(&name) {
                tracing::info!(cache = %name, "deleting old cache");
                self.db.delete_cache(&name).await?;
                deleted.push(name);
            }
        }

        self.state = WorkerState::Activated;
        self.skip_waiting = false;
        self.persist().await?;

        let version = self.config.names.version().to_string();
        tracing::info!(version = %version, deleted = deleted.len(), "activated");
        Ok(ActivateReport { deleted, message: WorkerMessage::Activated { version } })
    }

    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if self.state != WorkerState::Activated {
            let response = self.network.fetch(request).await?;
            return Ok(outcome(response, ResponseSource::Network, Strategy::NetworkOnly));
        }

        let route = Route::for_request(request);
        tracing::debug!(url = %request.url, strategy = ?route.strategy, "fetch");

        match (route.strategy, route.partition) {
            (Strategy::NetworkOnly, _) | (_, None) => {
                let response = self.network.fetch(request).await?;
                Ok(outcome(response, ResponseSource::Network, Strategy::NetworkOnly))
            }
            (Strategy::CacheFirst, Some(partition)) => self.cache_first(request, partition).await,
            (Strategy::NetworkFirst, Some(partition)) => self.network_first(request, partition).await,
            (Strategy::StaleWhileRevalidate, Some(partition)) => {
                self.stale_while_revalidate(request, partition).await
            }
        }
    }

    async fn lookup(&self, cache: &str, request: &Request) -> Result<Option<CachedResponse>, Error> {
        if let Some(hit) = self.db.match_in(cache, request.key()).await? {
            return Ok(Some(hit));
        }
        self.db.match_any(request.key()).await
    }

    async fn store(&self, cache: &str, response: &CachedResponse) {
        if !response.is_success() {
            return;
        }
        if let Err(e) = self.db.put(cache, response).await {
            tracing::warn!(url = %response.url, error = %e, "failed to cache response");
        }
    }

    async fn cache_first(&self, request: &Request, partition: Partition) -> Result<FetchOutcome, Error> {
        let cache = self.config.names.name_for(partition);
        if let Some(hit) = self.lookup(&cache, request).await? {
            return Ok(outcome(hit, ResponseSource::Cache, Strategy::CacheFirst));
        }

        let response = self.network.fetch(request).await?;
        self.store(&cache, &response).await;
        Ok(outcome(response, ResponseSource::Network, Strategy::CacheFirst))
    }

    async fn network_first(&self, request: &Request, partition: Partition) -> Result<FetchOutcome, Error> {
        let cache = self.config.names.name_for(partition);
        let err = match self.network.fetch(request).await {
            Ok(response) => {
                self.store(&cache, &response).await;
                return Ok(outcome(response, ResponseSource::Network, Strategy::NetworkFirst));
            }
            Err(e) => e,
        };
        tracing::debug!(url = %request.url, error = %err, "network failed, trying cache");

        if let Some(hit) = self.lookup(&cache, request).await? {
            return Ok(outcome(hit, ResponseSource::Cache, Strategy::NetworkFirst));
        }

        if request.is_navigation() {
            let fallback = Request::resolve(&self.config.origin, &self.config.offline_fallback)?;
            if let Some(page) = self.db.match_any(fallback.as_str()).await? {
                return Ok(outcome(page, ResponseSource::Fallback, Strategy::NetworkFirst));
            }
        }

        Err(Error::Offline(format!("{}: {err}", request.url)))
    }

    async fn stale_while_revalidate(&self, request: &Request, partition: Partition) -> Result<FetchOutcome, Error> {
        let cache = self.config.names.name_for(partition);
        let Some(hit) = self.lookup(&cache, request).await? else {
            let response = self.network.fetch(request).await?;
            self.store(&cache, &response).await;
            return Ok(outcome(response, ResponseSource::Network, Strategy::StaleWhileRevalidate));
        };

        let db = self.db.clone();
        let network = Arc::clone(&self.network);
        let request = request.clone();
        let revalidation = tokio::spawn(async move {
            match network.fetch(&request).await {
                Ok(fresh) if fresh.is_success() => {
                    if let Err(e) = db.put(&cache, &fresh).await {
                        tracing::warn!(url = %request.url, error = %e, "failed to store revalidated response");
                    }
                }
                Ok(fresh) => tracing::debug!(url = %request.url, status = fresh.status, "revalidation not stored"),
                Err(e) => tracing::warn!(url = %request.url, error = %e, "revalidation failed"),
            }
        });

        let mut stale = outcome(hit, ResponseSource::Cache, Strategy::StaleWhileRevalidate);
        stale.revalidation = Some(revalidation);
        Ok(stale)
    }

    /// Fetch the deployed build version, bypassing every cache.
    pub async fn fetch_site_version(&self) -> Result<String, Error> {
        let now = chrono::Utc::now().timestamp_millis().to_string();
        let path = add_cache_buster(VERSION_PATH, &now);
        let request = Request::get(Request::resolve(&self.config.origin, &path)?).with_no_cache();

        let response = self.network.fetch(&request).await?;
        if !response.is_success() {
            return Err(Error::HttpError(format!("{}: status {}", request.url, response.status)));
        }
        Ok(Manifest::from_slice(&response.body)?.version)
    }

    /// Whether the deployed build differs from the one this worker knows.
    ///
    /// Unknown local versions and network failures both report no update.
    pub async fn check_version(&self) -> bool {
        let Some(known) = self.site_version.as_deref() else {
            tracing::debug!("no known site version, skipping check");
            return false;
        };
        match self.fetch_site_version().await {
            Ok(remote) => {
                let has_update = remote != known;
                if has_update {
                    tracing::info!(known = %known, remote = %remote, "site update available");
                }
                has_update
            }
            Err(e) => {
                tracing::warn!(error = %e, "version check failed");
                false
            }
        }
    }

    /// Entry count per cache.
    pub async fn status(&self) -> Result<std::collections::BTreeMap<String, u64>, Error> {
        self.db.entry_counts().await
    }

    pub async fn clear_all(&self) -> Result<Vec<String>, Error> {
        let deleted = self.db.clear_all().await?;
        tracing::info!(deleted = deleted.len(), "cleared caches");
        Ok(deleted)
    }

    /// Answer a page message. `SKIP_WAITING` only replies when it caused
    /// an activation.
    pub async fn handle_message(&mut self, message: ClientMessage) -> Result<Option<WorkerMessage>, Error> {
        match message {
            ClientMessage::CheckVersion => {
                Ok(Some(WorkerMessage::VersionStatus { has_update: self.check_version().await }))
            }
            ClientMessage::SkipWaiting => {
                self.skip_waiting();
                if self.is_waiting() {
                    let report = self.activate().await?;
                    Ok(Some(report.message))
                } else {
                    self.persist().await?;
                    Ok(None)
                }
            }
            ClientMessage::ClearCaches => Ok(Some(WorkerMessage::CachesCleared { deleted: self.clear_all().await? })),
            ClientMessage::GetCacheStatus => Ok(Some(WorkerMessage::CacheStatus { caches: self.status().await? })),
        }
    }
}

fn outcome(response: CachedResponse, source: ResponseSource, strategy: Strategy) -> FetchOutcome {
    FetchOutcome { response, source, strategy, revalidation: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::network::fake::FakeNetwork;

    const ORIGIN: &str = "https://wedding.example";

    fn config(version: &str) -> WorkerConfig {
        WorkerConfig {
            origin: Url::parse(ORIGIN).unwrap(),
            names: CacheNames::new("site", version),
            precache_urls: vec!["/".into(), "/index.html".into(), "/assets/app.js".into()],
            offline_fallback: "/index.html".into(),
        }
    }

    fn url(path: &str) -> Url {
        Url::parse(ORIGIN).unwrap().join(path).unwrap()
    }

    fn site() -> Arc<FakeNetwork> {
        let net = FakeNetwork::default();
        net.serve(&format!("{ORIGIN}/"), 200, "<html>home</html>");
        net.serve(&format!("{ORIGIN}/index.html"), 200, "<html>home</html>");
        net.serve(&format!("{ORIGIN}/assets/app.js"), 200, "console.log(1)");
        net.serve(&format!("{ORIGIN}/version.json"), 200, r#"{"version":"100","buildTime":"x","assets":{}}"#);
        Arc::new(net)
    }

    async fn activated(net: Arc<FakeNetwork>) -> OfflineWorker {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut worker = OfflineWorker::new(db, net, config("v1"));
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        worker
    }

    #[test]
    fn test_state_round_trip() {
        for state in [
            WorkerState::Installing,
            WorkerState::Installed,
            WorkerState::Activating,
            WorkerState::Activated,
            WorkerState::Redundant,
        ] {
            assert_eq!(state.as_str().parse::<WorkerState>().unwrap(), state);
        }
        assert!("parsed".parse::<WorkerState>().is_err());
    }

    #[tokio::test]
    async fn test_install_precaches_and_records_version() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut worker = OfflineWorker::new(db.clone(), site(), config("v1"));

        let report = worker.install().await.unwrap();
        assert_eq!(report.cache, "site-static-v1");
        assert_eq!(report.urls.len(), 3);
        assert_eq!(report.site_version.as_deref(), Some("100"));
        assert_eq!(worker.state(), WorkerState::Installed);
        assert!(worker.is_waiting());

        let keys = db.keys("site-static-v1").await.unwrap();
        assert!(keys.contains(&format!("{ORIGIN}/assets/app.js")));
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let net = site();
        net.serve(&format!("{ORIGIN}/assets/app.js"), 500, "boom");
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut worker = OfflineWorker::new(db.clone(), net, config("v1"));

        let err = worker.install().await.unwrap_err();
        assert_eq!(err.code(), "HTTP_ERROR");
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(db.keys("site-static-v1").await.unwrap().is_empty());

        let record = db.load_worker_record().await.unwrap().unwrap();
        assert_eq!(record.state, "redundant");
    }

    #[tokio::test]
    async fn test_install_rolls_back_when_store_fails() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_app_js BEFORE INSERT ON cache_entries
                     WHEN NEW.url LIKE '%/assets/app.js'
                     BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
                )
            })
            .await
            .unwrap();
        let mut worker = OfflineWorker::new(db.clone(), site(), config("v1"));

        let err = worker.install().await.unwrap_err();
        assert_eq!(err.code(), "CACHE_ERROR");
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(db.keys("site-static-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut worker = OfflineWorker::new(db, site(), config("v1"));
        assert_eq!(worker.activate().await.unwrap_err().code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn test_version_bump_evicts_old_caches() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = site();

        let mut old = OfflineWorker::new(db.clone(), net.clone(), config("v1"));
        old.install().await.unwrap();
        old.activate().await.unwrap();
        db.open_cache("site-dynamic-v1").await.unwrap();
        db.open_cache("james-oliver-wedding-v1").await.unwrap();

        let mut new = OfflineWorker::restore(db.clone(), net, config("v2")).await.unwrap();
        assert_eq!(new.state(), WorkerState::Installing);
        new.install().await.unwrap();
        let report = new.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["site-static-v1", "site-dynamic-v1", "james-oliver-wedding-v1"]);
        assert_eq!(report.message, WorkerMessage::Activated { version: "v2".into() });
        assert_eq!(db.cache_names().await.unwrap(), vec!["site-static-v2"]);
    }

    #[tokio::test]
    async fn test_restore_continues_lifecycle() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let net = site();
        let mut worker = OfflineWorker::new(db.clone(), net.clone(), config("v1"));
        worker.install().await.unwrap();

        let mut resumed = OfflineWorker::restore(db, net, config("v1")).await.unwrap();
        assert_eq!(resumed.state(), WorkerState::Installed);
        assert_eq!(resumed.site_version(), Some("100"));
        resumed.activate().await.unwrap();
        assert_eq!(resumed.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_passthrough_before_activation() {
        let net = site();
        net.serve(&format!("{ORIGIN}/images/hero.jpg"), 200, "JPEG");
        let db = CacheDb::open_in_memory().await.unwrap();
        let worker = OfflineWorker::new(db.clone(), net, config("v1"));

        let out = worker.handle_fetch(&Request::get(url("/images/hero.jpg"))).await.unwrap();
        assert_eq!(out.source, ResponseSource::Network);
        assert!(db.cache_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_first_serves_precached_asset() {
        let net = site();
        let worker = activated(net.clone()).await;
        let app = format!("{ORIGIN}/assets/app.js");

        let out = worker.handle_fetch(&Request::get(url("/assets/app.js"))).await.unwrap();
        assert_eq!(out.strategy, Strategy::CacheFirst);
        assert_eq!(out.source, ResponseSource::Cache);
        assert_eq!(net.hits(&app), 1);
    }

    #[tokio::test]
    async fn test_cache_first_stores_only_success() {
        let net = site();
        net.serve(&format!("{ORIGIN}/assets/site.css"), 200, "body{}");
        let worker = activated(net.clone()).await;

        let css = worker.handle_fetch(&Request::get(url("/assets/site.css"))).await.unwrap();
        assert_eq!(css.source, ResponseSource::Network);
        let missing = worker.handle_fetch(&Request::get(url("/assets/gone.css"))).await.unwrap();
        assert_eq!(missing.response.status, 404);

        let keys = worker.db.keys("site-static-v1").await.unwrap();
        assert!(keys.contains(&format!("{ORIGIN}/assets/site.css")));
        assert!(!keys.contains(&format!("{ORIGIN}/assets/gone.css")));
    }

    #[tokio::test]
    async fn test_navigation_falls_back_to_index_offline() {
        let net = site();
        let worker = activated(net.clone()).await;
        net.set_offline(true);

        let out = worker.handle_fetch(&Request::navigate(url("/pages/gifts.html"))).await.unwrap();
        assert_eq!(out.source, ResponseSource::Fallback);
        assert_eq!(out.response.url, format!("{ORIGIN}/index.html"));
        assert_eq!(&out.response.body[..], b"<html>home</html>");
    }

    #[tokio::test]
    async fn test_network_first_prefers_cached_copy_offline() {
        let net = site();
        net.serve(&format!("{ORIGIN}/pages/photos.html"), 200, "photos");
        let worker = activated(net.clone()).await;
        let nav = Request::navigate(url("/pages/photos.html"));

        let online = worker.handle_fetch(&nav).await.unwrap();
        assert_eq!(online.source, ResponseSource::Network);

        net.set_offline(true);
        let offline = worker.handle_fetch(&nav).await.unwrap();
        assert_eq!(offline.source, ResponseSource::Cache);
        assert_eq!(&offline.response.body[..], b"photos");
    }

    #[tokio::test]
    async fn test_network_first_offline_without_cache() {
        let net = site();
        let worker = activated(net.clone()).await;
        net.set_offline(true);

        let err = worker.handle_fetch(&Request::get(url("/data/rsvp"))).await.unwrap_err();
        assert_eq!(err.code(), "OFFLINE");
    }

    #[tokio::test]
    async fn test_stale_while_revalidate_refreshes() {
        let net = site();
        let hero = format!("{ORIGIN}/images/hero.jpg");
        net.serve(&hero, 200, "old");
        let worker = activated(net.clone()).await;
        let req = Request::get(url("/images/hero.jpg"));

        let first = worker.handle_fetch(&req).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);
        assert!(first.revalidation.is_none());

        net.serve(&hero, 200, "new");
        let second = worker.handle_fetch(&req).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(&second.response.body[..], b"old");
        second.revalidation.unwrap().await.unwrap();

        let third = worker.handle_fetch(&req).await.unwrap();
        assert_eq!(&third.response.body[..], b"new");
        third.revalidation.unwrap().await.unwrap();
    }

    #[tokio::test]
    async fn test_revalidation_failure_is_ignored() {
        let net = site();
        net.serve(&format!("{ORIGIN}/images/hero.jpg"), 200, "cached");
        let worker = activated(net.clone()).await;
        let req = Request::get(url("/images/hero.jpg"));
        worker.handle_fetch(&req).await.unwrap();

        net.set_offline(true);
        let out = worker.handle_fetch(&req).await.unwrap();
        assert_eq!(&out.response.body[..], b"cached");
        out.revalidation.unwrap().await.unwrap();
    }

    #[tokio::test]
    async fn test_version_json_never_cached() {
        let net = site();
        let worker = activated(net.clone()).await;
        let out = worker.handle_fetch(&Request::get(url("/version.json"))).await.unwrap();
        assert_eq!(out.strategy, Strategy::NetworkOnly);

        let counts = worker.status().await.unwrap();
        assert_eq!(counts.values().sum::<u64>(), 3);
    }

    #[tokio::test]
    async fn test_check_version_messages() {
        let net = site();
        let mut worker = activated(net.clone()).await;

        let reply = worker.handle_message(ClientMessage::CheckVersion).await.unwrap();
        assert_eq!(reply, Some(WorkerMessage::VersionStatus { has_update: false }));

        net.serve(&format!("{ORIGIN}/version.json"), 200, r#"{"version":"200","buildTime":"y","assets":{}}"#);
        let reply = worker.handle_message(ClientMessage::CheckVersion).await.unwrap();
        assert_eq!(reply, Some(WorkerMessage::VersionStatus { has_update: true }));

        net.set_offline(true);
        let reply = worker.handle_message(ClientMessage::CheckVersion).await.unwrap();
        assert_eq!(reply, Some(WorkerMessage::VersionStatus { has_update: false }));
    }

    #[tokio::test]
    async fn test_skip_waiting_message_activates() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut worker = OfflineWorker::new(db, site(), config("v3"));
        worker.install().await.unwrap();
        assert!(worker.is_waiting());

        let reply = worker.handle_message(ClientMessage::SkipWaiting).await.unwrap();
        assert_eq!(reply, Some(WorkerMessage::Activated { version: "v3".into() }));
        assert_eq!(worker.state(), WorkerState::Activated);
        assert!(!worker.skips_waiting());
    }

    #[tokio::test]
    async fn test_skip_waiting_before_install_activates_on_install() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut worker = OfflineWorker::new(db, site(), config("v3"));
        assert_eq!(worker.handle_message(ClientMessage::SkipWaiting).await.unwrap(), None);
        assert!(worker.skips_waiting());

        let report = worker.install().await.unwrap();
        let activated = report.activated.unwrap();
        assert_eq!(activated.message, WorkerMessage::Activated { version: "v3".into() });
        assert_eq!(worker.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_status_and_clear_messages() {
        let mut worker = activated(site()).await;

        match worker.handle_message(ClientMessage::GetCacheStatus).await.unwrap() {
            Some(WorkerMessage::CacheStatus { caches }) => assert_eq!(caches["site-static-v1"], 3),
            other => panic!("unexpected reply: {other:?}"),
        }

        let reply = worker.handle_message(ClientMessage::ClearCaches).await.unwrap();
        assert_eq!(reply, Some(WorkerMessage::CachesCleared { deleted: vec!["site-static-v1".into()] }));
        assert!(worker.status().await.unwrap().is_empty());
    }
}
