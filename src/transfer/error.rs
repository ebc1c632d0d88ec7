//! Error types for asset transfers.
//!
//! Every variant leaves an existing in-progress file in place so that the next
//! run can resume from it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while transferring one asset.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Transport failure (DNS, connect, TLS, timeout, body read).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The asset URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status the transfer cannot use.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The asset URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The asset URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// The server-resolved URL carries no usable file name.
    #[error("server did not name a file for {url}")]
    MissingFilename {
        /// The final URL after redirects.
        url: String,
    },

    /// Local filesystem failure (open, write, rename, remove).
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The body ended before the declared size was reached.
    #[error("incomplete transfer to {path}: expected {expected} bytes, have {received}")]
    Incomplete {
        /// The in-progress file, kept for resume.
        path: PathBuf,
        /// Declared total size.
        expected: u64,
        /// Bytes present on disk.
        received: u64,
    },
}

impl TransferError {
    /// Creates a transport error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an unusable status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// True for transport failures and unusable statuses.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::HttpStatus { .. })
    }
}
