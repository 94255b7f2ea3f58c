//! Error types for the Civo API client.

use thiserror::Error;

/// Errors raised by the Civo API client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CivoApiError {
    /// Raised when the HTTP request itself fails.
    #[error("civo api request failed: {message}")]
    Transport {
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when the API answers with a non-success status.
    #[error("civo api returned status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, surfaced verbatim.
        message: String,
    },
    /// Raised when a successful response body cannot be decoded.
    #[error("failed to decode civo api response: {message}")]
    Decode {
        /// Underlying decode failure.
        message: String,
    },
    /// Raised when the region exposes no default network to scope volumes to.
    #[error("no default network found in region {region}")]
    DefaultNetworkMissing {
        /// Region used for the lookup.
        region: String,
    },
}

impl From<reqwest::Error> for CivoApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            message: value.to_string(),
        }
    }
}
