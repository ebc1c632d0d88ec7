use serde::Deserialize;
use serde_json::Value;

/// Version shown for assets that do not declare one.
pub const NO_VERSION: &str = "<no ver>";

/// Per-title metadata document.
///
/// `downloads` is kept as raw JSON: its shape varies between titles and is
/// validated level by level by [`resolve_assets`](super::resolve_assets).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleMetadata {
    /// Title identifier. Not part of the document; filled in by the fetcher.
    #[serde(skip)]
    pub id: u64,
    /// Display name.
    pub title: String,
    /// Raw download manifest: `[[group, { platform: [descriptor, ...] }], ...]`.
    #[serde(default)]
    pub downloads: Value,
    /// Bonus content entries.
    #[serde(default)]
    pub extras: Vec<BonusEntry>,
}

/// One bonus-content entry. Unlike the primary manifest these are uniformly shaped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusEntry {
    /// Catalog-relative download link.
    pub manual_url: String,
    /// Display name.
    pub name: String,
    /// Declared size, human readable.
    #[serde(default)]
    pub size: String,
    /// Content kind label (e.g. "manuals", "soundtrack").
    #[serde(rename = "type", default)]
    pub category: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Whether an asset is part of the primary installer set or bonus content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Primary,
    Bonus,
}

/// A resolved, uniform downloadable file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Absolute source URL; the server names the file.
    pub url: String,
    /// Display name.
    pub name: String,
    /// Declared version, or [`NO_VERSION`].
    pub version: String,
    /// Declared release date, verbatim.
    pub release_date: Option<String>,
    /// Declared size, verbatim (e.g. "1.2 GB").
    pub size: String,
    pub kind: AssetKind,
}

/// Builds multi-select labels: `<name padded to the longest> - <version>, <size>`.
#[must_use]
pub fn option_labels(assets: &[Asset]) -> Vec<String> {
    let longest = assets
        .iter()
        .map(|asset| asset.name.chars().count())
        .max()
        .unwrap_or(0);
    assets
        .iter()
        .map(|asset| {
            let version = if asset.version.is_empty() {
                NO_VERSION
            } else {
                asset.version.as_str()
            };
            let padding = " ".repeat(longest - asset.name.chars().count());
            format!("{}{padding} - {version}, {}", asset.name, asset.size)
        })
        .collect()
}
