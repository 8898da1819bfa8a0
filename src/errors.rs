//! Error taxonomy for playlist caching runs.

use std::io;
use std::path::PathBuf;

/// Failures reported by a remote playlist service.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    /// Transport, parse or ordinary API failure.
    #[error("{0}")]
    Request(String),

    /// The service rejected this client outright.
    #[error("service rejected the call (code {code}): {message}")]
    CallFailure { code: i64, message: String },
}

/// Failures looking up a playlist by name pattern.
#[derive(thiserror::Error, Debug)]
pub enum PlaylistLookupError {
    #[error("no playlist matched search string: {0:?}")]
    NotFound(String),

    #[error("invalid playlist name pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Failure caching one track. The batch continues after any of these.
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    #[error("download failed: {0}")]
    Transport(String),

    #[error("tagging failed: {0}")]
    Tagging(String),

    #[error("track processing panicked: {0}")]
    Panicked(String),

    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors that abort a whole run.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    PlaylistLookup(#[from] PlaylistLookupError),

    #[error("bad login, check credentials and connectivity: {0}")]
    BadLogin(String),

    #[error(
        "failed to get a streaming url for track {track_id} ({message}); \
         the client registration is stale, refresh the client id and retry"
    )]
    StaleClientRegistration { track_id: String, message: String },

    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CacheError::PlaylistLookup(_) => 3,
            CacheError::BadLogin(_) => 4,
            CacheError::StaleClientRegistration { .. } => 5,
            CacheError::Service(_) => 6,
            CacheError::Config(_) => 2,
        }
    }
}
