//! Offline cache engine modelled after a browser service worker.
//!
//! Requests are routed to one of four strategies by [`Route::for_request`].
//! Responses land in one of two versioned partitions named by
//! [`CacheNames`]; activating a worker with a new cache version evicts every
//! cache from older versions.

mod buster;
mod message;
mod names;
mod network;
mod request;
mod route;
mod worker;

pub use buster::{add_cache_buster, cache_buster};
pub use message::{ClientMessage, WorkerMessage};
pub use names::CacheNames;
pub use network::Network;
pub use request::{Destination, Request, RequestMode};
pub use route::{Partition, Route, Strategy};
pub use worker::{
    ActivateReport, FetchOutcome, InstallReport, OfflineWorker, ResponseSource, WorkerConfig, WorkerState,
};

#[cfg(test)]
pub(crate) use network::fake::FakeNetwork;
