//! Authenticated catalog session.
//!
//! A [`Session`] owns the cookie-carrying HTTP client and the catalog base URL.
//! It is built once at startup and passed by reference to every component
//! that talks to the catalog.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use super::cookies::{CookieRecord, load_cookies_into_jar};
use crate::http::{HttpTimeouts, absolute_url, build_client};

/// Errors raised while building or validating a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configured base URL could not be parsed.
    #[error("invalid catalog URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// HTTP client construction failed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Transport failure during the login probe.
    #[error("network error checking login at {url}: {source}")]
    Network {
        /// Probe URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Login probe answered with a non-200 status.
    #[error("HTTP {status} checking login at {url}")]
    HttpStatus {
        /// Probe URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// Login probe body was not the expected document.
    #[error("unexpected login status document from {url}: {source}")]
    Protocol {
        /// Probe URL.
        url: String,
        /// Decode error.
        #[source]
        source: reqwest::Error,
    },

    /// The cookies were accepted but the catalog reports no signed-in user.
    #[error("not signed in; export fresh cookies from a logged-in browser session")]
    NotLoggedIn,
}

/// Login status returned by the user-data probe.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    /// Whether the cookies identify a signed-in user.
    pub is_logged_in: bool,
    /// Display name, present when signed in.
    #[serde(default)]
    pub username: Option<String>,
}

/// Authenticated HTTP context scoped to the catalog origin.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    base_url: Url,
}

impl Session {
    /// Builds a session from credential records.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidUrl`] for an unparseable base URL and
    /// [`SessionError::Client`] when the HTTP client cannot be built.
    #[instrument(level = "debug", skip(cookies), fields(cookies = cookies.len()))]
    pub fn from_cookies(
        cookies: &[CookieRecord],
        base_url: &str,
        timeouts: HttpTimeouts,
    ) -> Result<Self, SessionError> {
        let base_url = Url::parse(base_url).map_err(|_| SessionError::InvalidUrl {
            url: base_url.to_string(),
        })?;
        let jar = load_cookies_into_jar(cookies, &base_url);
        let client = build_client(jar, &base_url, timeouts).map_err(SessionError::Client)?;
        Ok(Self { client, base_url })
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the catalog base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a catalog-relative path (`/account/...`) to an absolute URL string.
    #[must_use]
    pub fn absolute(&self, path: &str) -> String {
        absolute_url(&self.base_url, path)
    }

    /// Probes the user-data endpoint and returns the login status.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] for transport failures, non-200 status, or an
    /// undecodable body.
    #[instrument(level = "debug", skip(self))]
    pub async fn user_data(&self) -> Result<UserData, SessionError> {
        let url = self.absolute("/userData.json");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| SessionError::Network {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SessionError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let data = response
            .json::<UserData>()
            .await
            .map_err(|source| SessionError::Protocol {
                url: url.clone(),
                source,
            })?;
        debug!(logged_in = data.is_logged_in, "login probe answered");
        Ok(data)
    }

    /// Validates that the session is signed in and returns the username.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotLoggedIn`] when the catalog reports no user,
    /// plus any error of [`user_data`](Self::user_data).
    pub async fn validate(&self) -> Result<String, SessionError> {
        let data = self.user_data().await?;
        if !data.is_logged_in {
            return Err(SessionError::NotLoggedIn);
        }
        let username = data.username.unwrap_or_default();
        info!(username = %username, "session validated");
        Ok(username)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(base: &str) -> Session {
        Session::from_cookies(&[], base, HttpTimeouts::default()).unwrap()
    }

    #[test]
    fn test_absolute_joins_relative_paths() {
        let session = session("https://www.gog.com");
        assert_eq!(
            session.absolute("/downloads/foo/en1installer0"),
            "https://www.gog.com/downloads/foo/en1installer0"
        );
        assert_eq!(
            session.absolute("userData.json"),
            "https://www.gog.com/userData.json"
        );
    }

    #[test]
    fn test_from_cookies_rejects_bad_base_url() {
        let result = Session::from_cookies(&[], "not a url", HttpTimeouts::default());
        assert!(matches!(result, Err(SessionError::InvalidUrl { .. })));
    }

    #[test]
    fn test_user_data_decodes_camel_case() {
        let data: UserData =
            serde_json::from_str(r#"{"isLoggedIn": true, "username": "rust", "country": "PL"}"#)
                .unwrap();
        assert!(data.is_logged_in);
        assert_eq!(data.username.as_deref(), Some("rust"));

        let data: UserData = serde_json::from_str(r#"{"isLoggedIn": false}"#).unwrap();
        assert!(!data.is_logged_in);
        assert!(data.username.is_none());
    }
}
