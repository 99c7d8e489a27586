//! Dispatch error types

use thiserror::Error;

/// Result type for dispatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures a dispatch can produce
///
/// Every variant carries its cause as plain data so the enum stays `Clone`
/// and `PartialEq`; mocks store errors for replay and tests assert on them.
/// The dispatcher never retries on any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Base URL missing from the configuration, or the composed URL could
    /// not be parsed
    #[error("invalid URL")]
    InvalidUrl,
    /// Server answered with a non-2xx status
    ///
    /// `status` is `None` when the transport yielded something that was not
    /// a valid HTTP response. The body is preserved for diagnostics and may
    /// be empty.
    #[error("request failed ({}): {}", display_status(.0), .1)]
    Status(Option<u16>, String),
    /// Response body did not match the expected shape
    #[error("decoding failed: {0}")]
    Decode(String),
    /// Connectivity, timeout or TLS failure below the HTTP layer
    #[error("transport error: {0}")]
    Transport(String),
    /// Custom error message
    #[error("{0}")]
    Custom(String),
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "non-HTTP response".to_string(),
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(_: url::ParseError) -> Self {
        Error::InvalidUrl
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Error::InvalidUrl
        } else {
            Error::Transport(err.to_string())
        }
    }
}
