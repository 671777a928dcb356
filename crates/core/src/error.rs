//! Unified error types for wedsite.

use std::path::PathBuf;

use tokio_rusqlite::rusqlite;

/// Unified error types shared by the builder, the offline cache and the clients.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty precache URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Filesystem failure while building assets.
    #[error("BUILD_IO: {}: {source}", path.display())]
    BuildIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest could not be read, parsed or written.
    #[error("MANIFEST_ERROR: {0}")]
    Manifest(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network request could not be completed.
    #[error("NETWORK: {0}")]
    Network(String),

    /// HTTP error response.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Network failed and nothing usable was cached.
    #[error("OFFLINE: {0}")]
    Offline(String),

    /// Worker lifecycle step attempted out of order.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::BuildIo { path: path.into(), source }
    }

    /// Short machine-readable code, the prefix of the display form.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::BuildIo { .. } => "BUILD_IO",
            Error::Manifest(_) => "MANIFEST_ERROR",
            Error::Database(_) | Error::MigrationFailed(_) => "CACHE_ERROR",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Network(_) => "NETWORK",
            Error::HttpError(_) => "HTTP_ERROR",
            Error::Offline(_) => "OFFLINE",
            Error::InvalidState(_) => "INVALID_STATE",
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Manifest(err.to_string())
    }
}
