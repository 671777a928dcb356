//! Network clients for wedsite.
//!
//! This crate provides the reqwest-backed fetch pipeline used by the offline
//! worker and the version poller, plus the CDN purge and Uploadcare clients
//! shared by the server and CLI.

pub mod cdn;
pub mod fetch;
pub mod uploadcare;
pub mod version;

pub use cdn::{CdnInvalidator, InvalidationReport, Provider, ProviderResult};
pub use fetch::{FetchClient, FetchConfig, UrlError, parse_site, parse_url};
pub use uploadcare::{UploadcareClient, UploadcareError};
pub use version::HttpVersionSource;
