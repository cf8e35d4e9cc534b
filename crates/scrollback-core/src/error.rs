//! Error types for loads against the remote feed.

use scrollback_types::ItemId;
use thiserror::Error;

/// Failure reported by (or on behalf of) the remote feed.
///
/// Always retryable from the loader's point of view; retry and backoff belong
/// to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteDataError {
    /// The request never produced a response (connect, timeout, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The feed answered with a non-success status.
    #[error("remote returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// The response could not be understood (bad body, bad pagination header).
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Why a load did not complete.
///
/// Whatever the variant, the page cache is exactly as it was before the load.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    /// A fetch failed; the caller may retry.
    #[error(transparent)]
    Remote(#[from] RemoteDataError),

    /// The refresh anchor is not in any cached page.
    ///
    /// Cache and UI state have drifted apart. Not retryable: discard and
    /// perform a cold refresh.
    #[error("anchor {0} not found in the page cache")]
    AnchorNotFound(ItemId),
}

/// A [`LoaderConfig`](crate::LoaderConfig) the loader cannot work with.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("initial_load_size must be at least 1, got {0}")]
    LoadSize(usize),
}

impl LoadError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// The caller must drop the cache and cold-refresh.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AnchorNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_errors_are_retryable() {
        let err = LoadError::from(RemoteDataError::Transport("reset".into()));
        assert!(err.is_retryable());
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "transport error: reset");
    }

    #[test]
    fn test_config_error_message() {
        assert_eq!(
            ConfigError::LoadSize(0).to_string(),
            "initial_load_size must be at least 1, got 0"
        );
    }

    #[test]
    fn test_anchor_not_found_is_fatal() {
        let err = LoadError::AnchorNotFound(ItemId::from("42"));
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "anchor 42 not found in the page cache");
    }
}
