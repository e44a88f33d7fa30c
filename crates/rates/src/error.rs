//! Rate source error types

use thiserror::Error;

/// Rate-related errors
///
/// These never reach `RateSource::get_rate` callers; they are returned from
/// explicit refreshes and logged by the pollers.
#[derive(Debug, Error)]
pub enum RateError {
    /// The rate endpoint could not be reached or answered with a failure
    #[error("Rate fetch for {target} failed: {source}")]
    FetchFailed {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The endpoint has no rates for the requested target currency
    #[error("No rates available for target {target}")]
    Unavailable { target: String },

    /// A quoted rate is unusable
    #[error("Invalid rate for {pair}: {reason}")]
    InvalidRate { pair: String, reason: String },
}

/// Result type for rate operations
pub type RateResult<T> = Result<T, RateError>;

impl RateError {
    /// Wrap any transport error as a fetch failure
    pub fn fetch_failed(
        target: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        RateError::FetchFailed {
            target: target.into(),
            source: source.into(),
        }
    }
}
