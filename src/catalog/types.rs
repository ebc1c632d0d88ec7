use serde::Deserialize;

/// A title the signed-in user owns, as listed by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    /// Stable server-assigned identifier.
    pub id: u64,
    /// Display name.
    #[serde(rename = "title")]
    pub name: String,
    /// Platform compatibility flags.
    #[serde(rename = "worksOn", default)]
    pub platforms: PlatformSupport,
    /// Availability flags.
    #[serde(default)]
    pub availability: Availability,
}

/// Which platforms a title runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PlatformSupport {
    #[serde(rename = "Windows", default)]
    pub windows: bool,
    #[serde(rename = "Mac", default)]
    pub mac: bool,
    #[serde(rename = "Linux", default)]
    pub linux: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub is_available_in_account: bool,
}

/// One page of search results.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub page: u32,
    /// Total page count declared by the server; zero means no results.
    pub total_pages: u32,
    #[serde(default)]
    pub products: Vec<Title>,
}
