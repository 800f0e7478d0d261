//! Common error types for postnorm
//!
//! Every failure in the registry and normalizer surfaces as one of these
//! variants. The HTTP layer picks a status code from [`Error::kind`], never
//! from the rendered message.

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for postnorm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across postnorm crates
#[derive(Error, Debug)]
pub enum Error {
    /// Platform identifier is not in the fixed allow-list
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Platform is allow-listed but has no entry in the registry document
    #[error("No configuration found for platform: {0}")]
    PlatformConfigMissing(String),

    /// Registry document is absent or unreadable
    #[error("Registry document not readable at {path}: {source}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry document could not be parsed, or an entry is not well-formed
    #[error("Registry document malformed at {path}: {reason}")]
    ConfigMalformed { path: PathBuf, reason: String },

    /// Raw data source is absent or unreadable
    #[error("Data source not readable at {path}: {source}")]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raw data source is not a JSON array of objects
    #[error("Data source malformed at {path}: {reason}")]
    SourceMalformed { path: PathBuf, reason: String },

    /// Anything uncategorized
    #[error("Unexpected failure: {0}")]
    UnexpectedFailure(String),
}

/// Error kind without context, for boundary-layer dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedPlatform,
    PlatformConfigMissing,
    ConfigNotFound,
    ConfigMalformed,
    SourceNotFound,
    SourceMalformed,
    UnexpectedFailure,
}

impl Error {
    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedPlatform(_) => ErrorKind::UnsupportedPlatform,
            Error::PlatformConfigMissing(_) => ErrorKind::PlatformConfigMissing,
            Error::ConfigNotFound { .. } => ErrorKind::ConfigNotFound,
            Error::ConfigMalformed { .. } => ErrorKind::ConfigMalformed,
            Error::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            Error::SourceMalformed { .. } => ErrorKind::SourceMalformed,
            Error::UnexpectedFailure(_) => ErrorKind::UnexpectedFailure,
        }
    }

    /// True for failures caused by the caller rather than the deployment
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::UnsupportedPlatform
    }
}
