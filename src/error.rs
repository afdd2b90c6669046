//! Error types for artsync
//!
//! All modules use `SyncResult<T>` as their return type.

use thiserror::Error;

/// Result type alias for artsync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// All errors that can occur in artsync
#[derive(Error, Debug)]
pub enum SyncError {
    // Configuration errors
    #[error("{name} is required.")]
    MissingConfig { name: &'static str },

    // Remote call errors
    #[error("API rate limit exceeded")]
    RateLimited,

    #[error("{context}: HTTP {status}")]
    ApiStatus { status: u16, context: String },

    #[error("{context}: {source}")]
    Http {
        context: String,
        #[source]
        source: Box<ureq::Error>,
    },

    // Archive errors
    #[error("invalid artifact archive: {0}")]
    InvalidArchive(#[from] zip::result::ZipError),

    #[error("archive entry escapes the staging directory: {0}")]
    UnsafeArchivePath(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an HTTP transport error with context
    pub fn http(context: impl Into<String>, source: ureq::Error) -> Self {
        Self::Http {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error is a rate-limit signal eligible for backoff retry
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingConfig {
                name: "GITHUB_TOKEN",
            } => Some("Set the GITHUB_TOKEN environment variable or pass --token"),
            Self::MissingConfig {
                name: "INPUT_REPOSITORY",
            } => Some("Set INPUT_REPOSITORY (or GITHUB_REPOSITORY) or pass --repository"),
            _ => None,
        }
    }
}
