//! Rate source error types.

use thiserror::Error;

/// Errors a rate source can hit before it degrades to "unavailable".
///
/// These never leave a source: [`RateSource::fetch`](crate::RateSource::fetch)
/// logs them and returns `None`.
#[derive(Debug, Error)]
pub enum FxError {
    /// Connection, DNS or TLS failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request did not complete within its timeout.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Upstream answered with a non-success status.
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Body was not the document we expected.
    #[error("Unexpected response shape: {0}")]
    Shape(String),

    /// Headless rendering session failed to start, navigate or capture.
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Page was rendered but held no value inside the plausibility window.
    #[error("No plausible rate found in page")]
    NoPlausibleValue,

    /// Both tiers of a fallback source failed.
    #[error("Primary failed ({primary}); fallback failed ({fallback})")]
    BothTiersFailed { primary: String, fallback: String },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for FxError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FxError::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            FxError::Status {
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            FxError::Shape(e.to_string())
        } else {
            FxError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FxError {
    fn from(e: serde_json::Error) -> Self {
        FxError::Shape(e.to_string())
    }
}

/// Result type for rate source operations.
pub type FxResult<T> = Result<T, FxError>;
