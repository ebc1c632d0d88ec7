//! Error types for catalog queries.

use thiserror::Error;

/// Errors raised by the search and metadata endpoints.
///
/// No variant is retried; the caller aborts the operation.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport failure (DNS, connect, TLS, timeout, body read).
    #[error("network error querying {url}: {source}")]
    Network {
        /// The request URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a status other than 200.
    #[error("HTTP {status} querying {url}")]
    HttpStatus {
        /// The request URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request URL could not be built from the session base URL.
    #[error("invalid catalog URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// The body could not be decoded as the expected document.
    #[error("unexpected response document from {url}: {source}")]
    Protocol {
        /// The request URL.
        url: String,
        /// The decode error, with line and column.
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// Creates a transport error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a non-200 status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a body decode error.
    pub fn protocol(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Protocol {
            url: url.into(),
            source,
        }
    }

    /// True for transport failures and bad statuses, false for decode failures.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::HttpStatus { .. })
    }
}
