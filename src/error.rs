use std::path::PathBuf;
use thiserror::Error;

/// Failure to get an HTTP response back through a proxy at all.
/// Status codes are not errors at this layer; they travel in `HttpResponse`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid proxy endpoint {proxy}: {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Errors that abort a single farming iteration
#[derive(Debug, Error)]
pub enum FarmError {
    #[error("failed to generate identity: {0}")]
    Identity(String),

    #[error("failed to persist mnemonic to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("minting stopped at '{template}' after {completed} receipts: {reason}")]
    MintAborted {
        template: String,
        completed: usize,
        reason: String,
    },
}
