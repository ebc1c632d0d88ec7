//! Paginated catalog search and per-title metadata fetch.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use url::Url;

use super::error::CatalogError;
use super::types::{SearchPage, Title};
use crate::auth::Session;
use crate::config::{Language, Platform};
use crate::manifest::TitleMetadata;

/// Search endpoint path, relative to the catalog base URL.
pub const SEARCH_PATH: &str = "/account/getFilteredProducts";

/// Pause between consecutive search pages. Not configurable.
pub const PAGE_DELAY: Duration = Duration::from_secs(1);

/// Builds the search URL for one page.
///
/// `language` is omitted for [`Language::All`] and `search` for an empty query.
///
/// # Errors
///
/// Returns [`url::ParseError`] when the session base URL cannot host the path.
pub fn search_url(
    session: &Session,
    query: &str,
    platform: Platform,
    language: &Language,
    page: u32,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&session.absolute(SEARCH_PATH))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("hiddenFlag", "0");
        if let Some(code) = language.query_value() {
            pairs.append_pair("language", code);
        }
        pairs.append_pair("mediaType", "1");
        pairs.append_pair("sortBy", "date_purchased");
        if !query.is_empty() {
            pairs.append_pair("search", query);
        }
        pairs.append_pair("system", platform.search_codes());
        pairs.append_pair("totalPages", "1");
        pairs.append_pair("page", &page.to_string());
    }
    Ok(url)
}

/// Lists every owned title matching `query` on `platform`, page by page.
///
/// Pages are fetched strictly in order with [`PAGE_DELAY`] between them.
/// Enumeration stops at the server-declared page count, or immediately when
/// the first page declares zero pages.
///
/// # Errors
///
/// Returns the first [`CatalogError`] encountered; nothing is retried.
#[instrument(skip(session), fields(platform = %platform, language = %language))]
pub async fn enumerate(
    session: &Session,
    query: &str,
    platform: Platform,
    language: &Language,
) -> Result<Vec<Title>, CatalogError> {
    let mut titles = Vec::new();
    let mut page = 1;

    loop {
        let url = search_url(session, query, platform, language, page).map_err(|_| {
            CatalogError::InvalidUrl {
                url: session.absolute(SEARCH_PATH),
            }
        })?;
        let body: SearchPage = get_json(session, url.as_str()).await?;
        debug!(
            page,
            total_pages = body.total_pages,
            products = body.products.len(),
            "search page received"
        );

        if body.total_pages == 0 {
            break;
        }
        titles.extend(body.products);
        if page >= body.total_pages {
            break;
        }

        page += 1;
        tokio::time::sleep(PAGE_DELAY).await;
    }

    info!(count = titles.len(), "catalog search finished");
    Ok(titles)
}

/// Fetches the metadata document of one title.
///
/// # Errors
///
/// Returns [`CatalogError`] on transport failure, non-200 status, or an
/// undecodable body.
#[instrument(skip(session))]
pub async fn fetch_metadata(session: &Session, id: u64) -> Result<TitleMetadata, CatalogError> {
    let url = session.absolute(&format!("/account/gameDetails/{id}.json"));
    let mut metadata: TitleMetadata = get_json(session, &url).await?;
    metadata.id = id;
    debug!(title = %metadata.title, extras = metadata.extras.len(), "metadata received");
    Ok(metadata)
}

/// GETs `url` and decodes a 200 body as `T`.
async fn get_json<T: DeserializeOwned>(session: &Session, url: &str) -> Result<T, CatalogError> {
    let response = session
        .client()
        .get(url)
        .send()
        .await
        .map_err(|e| CatalogError::network(url, e))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        debug!(status = status.as_u16(), url, "catalog request rejected");
        return Err(CatalogError::http_status(url, status.as_u16()));
    }

    let text = response
        .text()
        .await
        .map_err(|e| CatalogError::network(url, e))?;
    serde_json::from_str(&text).map_err(|e| CatalogError::protocol(url, e))
}
