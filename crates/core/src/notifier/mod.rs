//! Update notifier: detects a newly deployed build and drives the update banner.
//!
//! One state machine serves both variants. [`VersionSource`] hides whether the
//! deployed version comes from polling `version.json` or from asking the
//! offline worker.

mod banner;
mod source;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

pub use banner::Banner;
pub use source::{Probe, VersionSource, WorkerVersionSource};

use crate::offline::WorkerMessage;

/// Default delay before an ignored banner hides itself.
pub const DEFAULT_BANNER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierEvent {
    UpdateAvailable { version: Option<String>, banner: Banner },
    BannerHidden(HideReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideReason {
    Dismissed,
    TimedOut,
    /// The waiting worker took over.
    Activated,
}

/// What the page should do when the visitor accepts the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadAction {
    /// Send `SKIP_WAITING` to the waiting worker.
    SkipWaiting,
    /// Reload bypassing the HTTP cache.
    ForceReload,
}

#[derive(Debug, Default)]
struct NotifierState {
    current: Option<String>,
    shown: Option<ShownBanner>,
}

#[derive(Debug)]
struct ShownBanner {
    version: Option<String>,
    since: Instant,
}

/// Clears the in-flight flag even if the check future is dropped.
struct CheckGuard<'a>(&'a AtomicBool);

impl Drop for CheckGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct UpdateNotifier<S> {
    source: S,
    banner_timeout: Duration,
    checking: AtomicBool,
    state: Mutex<NotifierState>,
}

impl<S: VersionSource> UpdateNotifier<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            banner_timeout: DEFAULT_BANNER_TIMEOUT,
            checking: AtomicBool::new(false),
            state: Mutex::new(NotifierState::default()),
        }
    }

    pub fn with_banner_timeout(mut self, timeout: Duration) -> Self {
        self.banner_timeout = timeout;
        self
    }

    fn state(&self) -> MutexGuard<'_, NotifierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_version(&self) -> Option<String> {
        self.state().current.clone()
    }

    pub fn is_banner_shown(&self) -> bool {
        self.state().shown.is_some()
    }

    /// Record the version the visitor is looking at.
    ///
    /// A failure is logged and leaves the version unknown, which suppresses
    /// update reports from version comparison until a later `init`.
    pub async fn init(&self) {
        if !self.source.reports_versions() {
            return;
        }
        match self.source.probe().await {
            Ok(Probe::Version(version)) => {
                tracing::info!(version = %version, "current site version");
                self.state().current = Some(version);
            }
            Ok(Probe::HasUpdate(_)) => {}
            Err(e) => tracing::warn!(error = %e, "failed to read current version"),
        }
    }

    /// Ask the source for a newer build.
    ///
    /// Does nothing while another check is in flight or while the banner is
    /// up. Finding an update shows the banner, which pauses checking.
    pub async fn check_for_updates(&self) -> Option<NotifierEvent> {
        if self.is_banner_shown() || self.checking.swap(true, Ordering::SeqCst) {
            return None;
        }
        let _guard = CheckGuard(&self.checking);

        let probe = match self.source.probe().await {
            Ok(probe) => probe,
            Err(e) => {
                tracing::debug!(error = %e, "version check failed");
                return None;
            }
        };

        let mut state = self.state();
        let version = match probe {
            Probe::Version(remote) => match state.current.as_deref() {
                Some(current) if current != remote => Some(remote),
                _ => return None,
            },
            Probe::HasUpdate(true) => None,
            Probe::HasUpdate(false) => return None,
        };

        tracing::info!(version = ?version, "new version detected");
        state.shown = Some(ShownBanner { version: version.clone(), since: Instant::now() });
        Some(NotifierEvent::UpdateAvailable { version, banner: self.source.banner() })
    }

    fn hide(&self, reason: HideReason) -> Option<NotifierEvent> {
        self.state().shown.take().map(|_| NotifierEvent::BannerHidden(reason))
    }

    /// "Later": hide the banner and resume checking.
    pub fn dismiss(&self) -> Option<NotifierEvent> {
        self.hide(HideReason::Dismissed)
    }

    /// React to a message posted by the offline worker. `SW_ACTIVATED` means
    /// the update already happened, so the banner goes away.
    pub fn on_worker_message(&self, message: &WorkerMessage) -> Option<NotifierEvent> {
        match message {
            WorkerMessage::Activated { version } => {
                tracing::info!(version = %version, "worker activated");
                self.hide(HideReason::Activated)
            }
            _ => None,
        }
    }

    /// Hide a banner that has been up longer than the banner timeout.
    pub fn tick(&self, now: Instant) -> Option<NotifierEvent> {
        let expired = self
            .state()
            .shown
            .as_ref()
            .is_some_and(|shown| now.saturating_duration_since(shown.since) >= self.banner_timeout);
        if expired { self.hide(HideReason::TimedOut) } else { None }
    }

    fn banner_deadline(&self) -> Option<Instant> {
        self.state().shown.as_ref().map(|shown| shown.since + self.banner_timeout)
    }

    /// "Reload/Update Now": hand control to a waiting worker when there is
    /// one, otherwise reload.
    pub async fn apply(&self) -> ReloadAction {
        let action =
            if self.source.has_waiting_worker().await { ReloadAction::SkipWaiting } else { ReloadAction::ForceReload };

        let mut state = self.state();
        if let Some(version) = state.shown.take().and_then(|shown| shown.version) {
            state.current = Some(version);
        }
        tracing::info!(action = ?action, "applying update");
        action
    }

    /// Check every `interval` until `shutdown` resolves, delivering events on
    /// `events`. Also hides the banner once it times out.
    pub async fn run<F>(&self, interval: Duration, events: mpsc::Sender<NotifierEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        tokio::pin!(shutdown);

        loop {
            let deadline = self.banner_deadline();
            let sleep_until = tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now));

            let event = tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => self.check_for_updates().await,
                _ = tokio::time::sleep_until(sleep_until), if deadline.is_some() => self.tick(Instant::now()),
            };

            let Some(event) = event else { continue };
            if events.send(event).await.is_err() {
                tracing::debug!("event receiver dropped, stopping notifier");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::{RwLock, oneshot};
    use url::Url;

    use super::*;
    use crate::offline::{CacheNames, ClientMessage, FakeNetwork, WorkerConfig, WorkerMessage};
    use crate::{CacheDb, Error, OfflineWorker};

    #[derive(Default)]
    struct FakeSource {
        version: Mutex<Option<String>>,
        waiting: bool,
        probes: AtomicUsize,
    }

    impl FakeSource {
        fn at(version: &str) -> Self {
            Self { version: Mutex::new(Some(version.into())), ..Default::default() }
        }

        fn deploy(&self, version: &str) {
            *self.version.lock().unwrap() = Some(version.into());
        }
    }

    #[async_trait]
    impl VersionSource for FakeSource {
        async fn probe(&self) -> Result<Probe, Error> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            match self.version.lock().unwrap().clone() {
                Some(v) => Ok(Probe::Version(v)),
                None => Err(Error::Network("unreachable".into())),
            }
        }

        async fn has_waiting_worker(&self) -> bool {
            self.waiting
        }
    }

    #[tokio::test]
    async fn test_no_update_for_same_version() {
        let notifier = UpdateNotifier::new(FakeSource::at("100"));
        notifier.init().await;
        assert_eq!(notifier.current_version().as_deref(), Some("100"));
        assert_eq!(notifier.check_for_updates().await, None);
        assert!(!notifier.is_banner_shown());
    }

    #[tokio::test]
    async fn test_update_shows_banner_and_pauses() {
        let notifier = UpdateNotifier::new(FakeSource::at("100"));
        notifier.init().await;
        notifier.source.deploy("200");

        let event = notifier.check_for_updates().await;
        assert_eq!(
            event,
            Some(NotifierEvent::UpdateAvailable { version: Some("200".into()), banner: Banner::polling() })
        );
        assert!(notifier.is_banner_shown());

        let probes = notifier.source.probes.load(Ordering::SeqCst);
        assert_eq!(notifier.check_for_updates().await, None);
        assert_eq!(notifier.source.probes.load(Ordering::SeqCst), probes);
    }

    #[tokio::test]
    async fn test_unknown_current_version_never_reports() {
        let source = FakeSource::default();
        let notifier = UpdateNotifier::new(source);
        notifier.init().await;
        assert_eq!(notifier.current_version(), None);

        notifier.source.deploy("200");
        assert_eq!(notifier.check_for_updates().await, None);
    }

    #[tokio::test]
    async fn test_dismiss_resumes_checking() {
        let notifier = UpdateNotifier::new(FakeSource::at("100"));
        notifier.init().await;
        notifier.source.deploy("200");
        notifier.check_for_updates().await.unwrap();

        assert_eq!(notifier.dismiss(), Some(NotifierEvent::BannerHidden(HideReason::Dismissed)));
        assert_eq!(notifier.dismiss(), None);
        assert!(notifier.check_for_updates().await.is_some());
    }

    #[tokio::test]
    async fn test_banner_times_out() {
        let notifier = UpdateNotifier::new(FakeSource::at("1")).with_banner_timeout(Duration::from_secs(30));
        notifier.init().await;
        notifier.source.deploy("2");
        notifier.check_for_updates().await.unwrap();

        let now = Instant::now();
        assert_eq!(notifier.tick(now), None);
        assert_eq!(
            notifier.tick(now + Duration::from_secs(31)),
            Some(NotifierEvent::BannerHidden(HideReason::TimedOut))
        );
        assert!(!notifier.is_banner_shown());
    }

    #[tokio::test]
    async fn test_apply_actions() {
        let notifier = UpdateNotifier::new(FakeSource::at("1"));
        notifier.init().await;
        notifier.source.deploy("2");
        notifier.check_for_updates().await.unwrap();
        assert_eq!(notifier.apply().await, ReloadAction::ForceReload);
        assert_eq!(notifier.current_version().as_deref(), Some("2"));
        assert!(!notifier.is_banner_shown());

        let waiting = UpdateNotifier::new(FakeSource { waiting: true, ..FakeSource::at("1") });
        assert_eq!(waiting.apply().await, ReloadAction::SkipWaiting);
    }

    #[tokio::test]
    async fn test_run_delivers_events_until_shutdown() {
        let notifier = UpdateNotifier::new(FakeSource::at("1"));
        notifier.init().await;
        notifier.source.deploy("2");

        let (tx, mut rx) = mpsc::channel(4);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let run = notifier.run(Duration::from_millis(10), tx, async {
            let _ = stop_rx.await;
        });
        let observe = async {
            let event = rx.recv().await;
            let _ = stop_tx.send(());
            event
        };

        let ((), event) = tokio::join!(run, observe);
        assert!(matches!(event, Some(NotifierEvent::UpdateAvailable { .. })));
    }

    fn worker_config(origin: &str, version: &str) -> WorkerConfig {
        WorkerConfig {
            origin: Url::parse(origin).unwrap(),
            names: CacheNames::new("site", version),
            precache_urls: vec!["/".into()],
            offline_fallback: "/".into(),
        }
    }

    #[tokio::test]
    async fn test_worker_variant() {
        let origin = "https://wedding.example";
        let net = Arc::new(FakeNetwork::default());
        net.serve(&format!("{origin}/"), 200, "home");
        net.serve(&format!("{origin}/version.json"), 200, r#"{"version":"1","buildTime":"x","assets":{}}"#);

        let db = CacheDb::open_in_memory().await.unwrap();
        let mut worker = OfflineWorker::new(db, net.clone(), worker_config(origin, "v1"));
        worker.install().await.unwrap();
        worker.activate().await.unwrap();

        let notifier = UpdateNotifier::new(WorkerVersionSource::new(Arc::new(RwLock::new(worker))));
        notifier.init().await;
        assert_eq!(notifier.check_for_updates().await, None);

        net.serve(&format!("{origin}/version.json"), 200, r#"{"version":"2","buildTime":"y","assets":{}}"#);
        let event = notifier.check_for_updates().await;
        assert_eq!(event, Some(NotifierEvent::UpdateAvailable { version: None, banner: Banner::worker() }));
        assert_eq!(notifier.apply().await, ReloadAction::ForceReload);
    }

    #[tokio::test]
    async fn test_waiting_worker_shows_banner_until_activated() {
        let origin = "https://wedding.example";
        let net = Arc::new(FakeNetwork::default());
        net.serve(&format!("{origin}/"), 200, "home");
        net.serve(&format!("{origin}/version.json"), 200, r#"{"version":"1","buildTime":"x","assets":{}}"#);

        let db = CacheDb::open_in_memory().await.unwrap();
        let mut worker = OfflineWorker::new(db, net, worker_config(origin, "v2"));
        worker.install().await.unwrap();
        assert!(worker.is_waiting());
        let worker = Arc::new(RwLock::new(worker));

        let notifier = UpdateNotifier::new(WorkerVersionSource::new(worker.clone()));
        let event = notifier.check_for_updates().await;
        assert_eq!(event, Some(NotifierEvent::UpdateAvailable { version: None, banner: Banner::worker() }));
        assert_eq!(notifier.apply().await, ReloadAction::SkipWaiting);

        assert!(notifier.check_for_updates().await.is_some());
        let message = worker.write().await.handle_message(ClientMessage::SkipWaiting).await.unwrap().unwrap();
        assert_eq!(notifier.on_worker_message(&message), Some(NotifierEvent::BannerHidden(HideReason::Activated)));
        assert!(!notifier.is_banner_shown());
        assert_eq!(notifier.check_for_updates().await, None);
    }

    #[test]
    fn test_other_worker_messages_leave_banner() {
        let notifier = UpdateNotifier::new(FakeSource::at("1"));
        let cleared = WorkerMessage::CachesCleared { deleted: vec![] };
        assert_eq!(notifier.on_worker_message(&cleared), None);
        let activated = WorkerMessage::Activated { version: "v2".into() };
        assert_eq!(notifier.on_worker_message(&activated), None);
    }
}
