//! SQLite-backed cache storage for the offline worker.
//!
//! Stores named cache partitions of URL-keyed responses, with async access
//! via tokio-rusqlite. It supports:
//!
//! - CacheStorage-style open/has/delete/keys on cache names
//! - Upsert and lookup of responses per cache or across all caches
//! - Automatic schema migrations
//! - A persisted worker lifecycle record

pub mod connection;
pub mod entries;
pub mod migrations;
pub mod worker_state;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
pub use worker_state::WorkerRecord;
