//! Credential records exported from a browser and the reqwest jar loader.
//!
//! Accepts the JSON export produced by common cookie-export browser
//! extensions, either a bare array or `{ "cookies": [...] }`, and installs
//! the records into a `reqwest::cookie::Jar` scoped to the catalog origin.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::cookie::Jar;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

/// A single persisted credential record.
///
/// The value field is redacted in Debug output.
#[derive(Clone)]
pub struct CookieRecord {
    /// The domain the cookie belongs to (e.g., `.gog.com`).
    pub domain: String,
    /// Whether the cookie is bound to the exact host only.
    pub host_only: bool,
    /// The URL path scope for the cookie.
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Unix timestamp for expiry (0 = session cookie).
    pub expires: u64,
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive, never logged).
    value: String,
}

impl CookieRecord {
    /// Creates a new credential record.
    #[must_use]
    pub fn new(
        domain: String,
        host_only: bool,
        path: String,
        secure: bool,
        expires: u64,
        name: String,
        value: String,
    ) -> Self {
        Self {
            domain,
            host_only,
            path,
            secure,
            expires,
            name,
            value,
        }
    }

    /// Returns the cookie value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns true when this cookie would be sent to `host`.
    #[must_use]
    pub fn applies_to_host(&self, host: &str) -> bool {
        let domain = self.domain.trim_start_matches('.').to_ascii_lowercase();
        let host = host.to_ascii_lowercase();
        if domain.is_empty() {
            return false;
        }
        if self.host_only {
            return host == domain;
        }
        host == domain || host.ends_with(&format!(".{domain}"))
    }
}

impl fmt::Debug for CookieRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieRecord")
            .field("domain", &self.domain)
            .field("host_only", &self.host_only)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur while loading the credential file.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// The credential file could not be read.
    #[error("cannot read cookie file '{path}': {source}")]
    Io {
        /// File that failed to open.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Input was empty.
    #[error("cookie input is empty")]
    EmptyInput,
    /// JSON parser failed.
    #[error("invalid cookie JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// No valid cookies remained after validation.
    #[error("no valid cookies found after validation")]
    NoValidCookies,
}

/// Parsed credential records plus non-fatal warnings.
#[derive(Debug)]
pub struct ParsedCookies {
    /// Records that passed validation.
    pub cookies: Vec<CookieRecord>,
    /// One entry per skipped record.
    pub warnings: Vec<String>,
}

/// Reads and parses a credential file from disk.
///
/// # Errors
///
/// Returns [`CookieError::Io`] when the file cannot be read, otherwise the
/// errors of [`parse_cookie_records`].
pub fn read_cookie_file(path: &Path) -> Result<ParsedCookies, CookieError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CookieError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_cookie_records(&raw)
}

/// Parses and validates a JSON credential export.
///
/// # Errors
///
/// Returns [`CookieError`] when input is empty, is not valid JSON of a known
/// shape, or every record is invalid or expired.
#[instrument(level = "debug", skip(input))]
pub fn parse_cookie_records(input: &str) -> Result<ParsedCookies, CookieError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CookieError::EmptyInput);
    }

    let payload: JsonCookiePayload = serde_json::from_str(trimmed)?;
    let entries = match payload {
        JsonCookiePayload::Array(entries) => entries,
        JsonCookiePayload::Wrapped { cookies } => cookies,
    };

    let mut cookies = Vec::new();
    let mut warnings = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        match convert_json_cookie(entry) {
            Ok(cookie) => cookies.push(cookie),
            Err(reason) => warnings.push(format!("entry {}: {}", index + 1, reason)),
        }
    }

    let (valid, expiry_warnings) = drop_expired(cookies, unix_now());
    warnings.extend(expiry_warnings);

    if valid.is_empty() {
        return Err(CookieError::NoValidCookies);
    }

    Ok(ParsedCookies {
        cookies: valid,
        warnings,
    })
}

/// Installs credential records into a new jar against `base_url`.
///
/// Records whose domain does not cover the catalog host are skipped.
#[instrument(level = "debug", skip(cookies))]
pub fn load_cookies_into_jar(cookies: &[CookieRecord], base_url: &Url) -> Arc<Jar> {
    let jar = Arc::new(Jar::default());
    let host = base_url.host_str().unwrap_or_default();

    for cookie in cookies {
        if !cookie.applies_to_host(host) {
            warn!(
                domain = %cookie.domain,
                name = %cookie.name,
                host = %host,
                "skipping cookie that does not apply to the catalog host"
            );
            continue;
        }
        jar.add_cookie_str(&build_set_cookie_string(cookie), base_url);
        debug!(domain = %cookie.domain, name = %cookie.name, "loaded cookie into jar");
    }

    jar
}

/// Builds a `Set-Cookie` header string from a record.
fn build_set_cookie_string(cookie: &CookieRecord) -> String {
    let mut parts = vec![format!("{}={}", cookie.name, cookie.value())];

    // Host-only cookies carry no Domain attribute.
    if !cookie.host_only {
        parts.push(format!("Domain={}", cookie.domain));
    }
    parts.push(format!("Path={}", cookie.path));
    if cookie.secure {
        parts.push("Secure".to_string());
    }
    if cookie.expires > 0 {
        if let Some(expires) = unix_to_http_date(cookie.expires) {
            parts.push(format!("Expires={expires}"));
        } else {
            warn!(
                name = %cookie.name,
                expires = cookie.expires,
                "cookie expiry timestamp overflows SystemTime; treating as session cookie"
            );
        }
    }

    parts.join("; ")
}

fn unix_to_http_date(timestamp: u64) -> Option<String> {
    use std::time::Duration;

    let time = UNIX_EPOCH.checked_add(Duration::from_secs(timestamp))?;
    Some(httpdate::fmt_http_date(time))
}

fn convert_json_cookie(entry: JsonCookieEntry) -> Result<CookieRecord, String> {
    let mut domain = entry.domain.unwrap_or_default().trim().to_string();
    if domain.is_empty() {
        return Err("missing required field: domain".to_string());
    }
    if let Some((host, _rest)) = domain
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split_once('/')
    {
        domain = host.to_string();
    }

    let host_only = entry.host_only.unwrap_or(false);
    if host_only {
        domain = domain.trim_start_matches('.').to_string();
    }

    let mut path = entry.path.unwrap_or_else(|| "/".to_string());
    if path.trim().is_empty() {
        path = "/".to_string();
    } else if !path.starts_with('/') {
        path = format!("/{path}");
    }

    let name = entry.name.unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return Err("missing required field: name".to_string());
    }

    let value = entry.value.unwrap_or_default();
    if value.is_empty() {
        return Err(format!("cookie '{name}' for domain '{domain}' has empty value"));
    }

    // Session cookies carry no usable expiry even when the export includes one.
    let expires = if entry.session.unwrap_or(false) {
        0
    } else {
        entry.expiration_date.map_or(0, normalized_expiry)
    };

    Ok(CookieRecord::new(
        domain,
        host_only,
        path,
        entry.secure.unwrap_or(false),
        expires,
        name,
        value,
    ))
}

fn drop_expired(cookies: Vec<CookieRecord>, now: u64) -> (Vec<CookieRecord>, Vec<String>) {
    let mut valid = Vec::new();
    let mut warnings = Vec::new();
    for cookie in cookies {
        if cookie.expires > 0 && cookie.expires <= now {
            warnings.push(format!(
                "skipped expired cookie '{}' for domain '{}'",
                cookie.name, cookie.domain
            ));
            continue;
        }
        valid.push(cookie);
    }
    (valid, warnings)
}

fn normalized_expiry(raw_expiry: f64) -> u64 {
    if !raw_expiry.is_finite() || raw_expiry <= 0.0 {
        return 0;
    }
    let integer_text = format!("{:.0}", raw_expiry.floor());
    integer_text.parse::<u64>().unwrap_or(u64::MAX)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonCookiePayload {
    Array(Vec<JsonCookieEntry>),
    Wrapped { cookies: Vec<JsonCookieEntry> },
}

#[derive(Debug, Deserialize)]
struct JsonCookieEntry {
    domain: Option<String>,
    #[serde(rename = "hostOnly")]
    host_only: Option<bool>,
    path: Option<String>,
    secure: Option<bool>,
    session: Option<bool>,
    name: Option<String>,
    value: Option<String>,
    #[serde(rename = "expirationDate")]
    expiration_date: Option<f64>,
}
