//! Where the update notifier learns about newly deployed builds.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::banner::Banner;
use crate::{Error, OfflineWorker};

/// What a version source can tell about the deployed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The deployed build version; the notifier compares it.
    Version(String),
    /// The source already compared and answers yes or no.
    HasUpdate(bool),
}

/// Where the notifier learns about new builds.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn probe(&self) -> Result<Probe, Error>;

    /// Whether the notifier should remember a baseline version at startup.
    fn reports_versions(&self) -> bool {
        true
    }

    /// Whether an installed worker is waiting to take over.
    async fn has_waiting_worker(&self) -> bool {
        false
    }

    fn banner(&self) -> Banner {
        Banner::polling()
    }
}

/// Asks the offline worker. A worker that installed and is waiting counts as
/// an update on its own; otherwise the worker answers `CHECK_VERSION`.
#[derive(Clone)]
pub struct WorkerVersionSource {
    worker: Arc<RwLock<OfflineWorker>>,
}

impl WorkerVersionSource {
    pub fn new(worker: Arc<RwLock<OfflineWorker>>) -> Self {
        Self { worker }
    }
}

#[async_trait]
impl VersionSource for WorkerVersionSource {
    async fn probe(&self) -> Result<Probe, Error> {
        let worker = self.worker.read().await;
        if worker.is_waiting() {
            return Ok(Probe::HasUpdate(true));
        }
        Ok(Probe::HasUpdate(worker.check_version().await))
    }

    fn reports_versions(&self) -> bool {
        false
    }

    async fn has_waiting_worker(&self) -> bool {
        self.worker.read().await.is_waiting()
    }

    fn banner(&self) -> Banner {
        Banner::worker()
    }
}
