use std::io;
use thiserror::Error;

/// Errors surfaced by the authorization handshake.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Transport failure: DNS, connect, TLS, request timeout or a non-2xx status.
    #[error("connection error: {0}")]
    Connection(String),

    /// The router answered but the payload was not what the API promises
    /// (missing field, `success: false`, ...).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The user refused the request on the router display.
    #[error("authorization denied on the Freebox")]
    AuthorizationDenied,

    /// Nobody answered the request before the router or the client gave up.
    #[error("authorization timed out")]
    AuthorizationTimeout,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Interrupted by the user.
    #[error("interrupted")]
    Cancelled,
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Credential file errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File parsed but holds something that can't be used as credentials.
    #[error("invalid credentials file: {0}")]
    Invalid(String),
}
