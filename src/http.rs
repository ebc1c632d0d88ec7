//! HTTP client construction shared by every catalog-facing component.
//!
//! The catalog only accepts requests that look like they come from its own
//! web pages, so every client built here carries a browser User-Agent and a
//! Referer/Origin pair derived from the catalog origin.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, REFERER};
use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument};
use url::Url;

/// Default catalog origin.
pub const DEFAULT_BASE_URL: &str = "https://www.gog.com";

/// Browser User-Agent sent with every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/107.0.0.0 Safari/537.36";

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout: longest silence tolerated between two reads.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Timeout settings applied to the catalog client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Connect timeout in seconds.
    pub connect_secs: u64,
    /// Idle timeout between reads in seconds. Bodies may take any total time.
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// Returns the `Origin` header value for a catalog base URL (`scheme://host[:port]`).
#[must_use]
pub fn origin_of(base_url: &Url) -> String {
    base_url.origin().ascii_serialization()
}

/// Resolves a catalog-relative path (`/downloads/...`) against the base URL.
///
/// Paths that are already absolute `http(s)` URLs are returned unchanged.
#[must_use]
pub fn absolute_url(base_url: &Url, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let origin = base_url.as_str().trim_end_matches('/');
    if path.starts_with('/') {
        format!("{origin}{path}")
    } else {
        format!("{origin}/{path}")
    }
}

/// Builds the default header set: Referer (`<origin>/`) and Origin (`<origin>`).
fn site_headers(base_url: &Url) -> HeaderMap {
    let origin = origin_of(base_url);
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&origin) {
        headers.insert(ORIGIN, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("{origin}/")) {
        headers.insert(REFERER, value);
    }
    headers
}

/// Builds the catalog HTTP client with cookie jar, fixed headers and timeouts.
///
/// # Errors
///
/// Returns the underlying `reqwest::Error` when the TLS backend or proxy
/// configuration cannot be initialised.
#[instrument(level = "debug", skip(cookie_jar))]
pub fn build_client(
    cookie_jar: Arc<Jar>,
    base_url: &Url,
    timeouts: HttpTimeouts,
) -> Result<Client, reqwest::Error> {
    debug!(origin = %origin_of(base_url), "building catalog HTTP client");
    base_client_builder(base_url, timeouts)
        .cookie_provider(cookie_jar)
        .build()
}

fn base_client_builder(base_url: &Url, timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .read_timeout(Duration::from_secs(timeouts.read_secs))
        .gzip(true)
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(site_headers(base_url))
}
