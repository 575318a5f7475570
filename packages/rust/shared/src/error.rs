//! Error types for the IndexNow submitter.
//!
//! Library crates use [`IndexNowError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all IndexNow operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexNowError {
    /// Missing or invalid argument, config file, or sitemap URL.
    #[error("config error: {message}")]
    Config { message: String },

    /// The key file could not be fetched or does not match the key.
    #[error("key integrity error: {message}")]
    Integrity { message: String },

    /// Transport or HTTP failure while retrieving a sitemap document.
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// Sitemap XML matches neither the index nor the URL-set schema.
    #[error("failed to parse XML from {url}: {message}")]
    Parse { url: String, message: String },

    /// A provider POST could not be completed at the transport level.
    #[error("submission to {provider} failed: {message}")]
    Submission { provider: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, IndexNowError>;

impl IndexNowError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a key integrity error from any displayable message.
    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity {
            message: msg.into(),
        }
    }

    /// Create a fetch error for the given sitemap URL.
    pub fn fetch(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a parse error for the given sitemap URL.
    pub fn parse(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a submission transport error for the named provider.
    pub fn submission(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Submission {
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
