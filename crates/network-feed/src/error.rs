//! Error types for the network feed reader

use std::path::PathBuf;

use c3_common::FeedError;
use thiserror::Error;

/// Main reader error type
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status} for {url}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        url: String,
        message: String,
    },

    #[error("Invalid {service} response: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReaderError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_response(service: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            reason: reason.into(),
        }
    }
}

/// Result type alias for reader operations
pub type ReaderResult<T> = Result<T, ReaderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use c3_common::{AssetFingerprint, MatchMode, PolicyId};

    #[test]
    fn test_feed_errors_are_transparent() {
        let err: ReaderError = FeedError::NotFound {
            fingerprint: AssetFingerprint::oracle_feed(PolicyId::new([0; 28])),
            mode: MatchMode::Exact,
        }
        .into();
        assert_eq!(
            err.to_string(),
            format!("no output holds {}.OracleFeed (exact match)", "00".repeat(28))
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = ReaderError::config("context for kupo not found or is incomplete");
        assert_eq!(
            err.to_string(),
            "Configuration error: context for kupo not found or is incomplete"
        );
    }
}
