//! Catalog enumeration: paginated search over owned titles and metadata fetch.

mod enumerator;
mod error;
mod types;

pub use enumerator::{PAGE_DELAY, SEARCH_PATH, enumerate, fetch_metadata, search_url};
pub use error::CatalogError;
pub use types::{Availability, PlatformSupport, SearchPage, Title};
