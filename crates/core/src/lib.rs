//! Core types and shared functionality for wedsite.
//!
//! This crate provides:
//! - Unified error types and layered configuration
//! - The build manifest and the content-hashing asset builder
//! - The offline cache engine with its SQLite cache storage
//! - The update notifier state machine

pub mod build;
pub mod cache;
pub mod config;
pub mod error;
pub mod manifest;
pub mod notifier;
pub mod offline;

pub use build::{AssetBuilder, BuildReport};
pub use cache::{CacheDb, CachedResponse};
pub use config::AppConfig;
pub use error::Error;
pub use manifest::Manifest;
pub use offline::{OfflineWorker, Request};
