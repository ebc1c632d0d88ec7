//! Resolution of the irregular download manifest into uniform [`Asset`] records.
//!
//! Every nesting level is classified into a [`Node`] before use, so a shape
//! mismatch becomes a [`SchemaError`] naming the exact JSON path instead of a
//! panic deep inside indexing code.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use super::types::{Asset, AssetKind, NO_VERSION, TitleMetadata};
use crate::config::Platform;
use crate::http::absolute_url;

/// Group resolved from the manifest; element 1 of it is the platform map.
const MANIFEST_GROUP: usize = 0;

/// The manifest did not have the expected shape at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("manifest schema mismatch at {path}: expected {expected}, found {found}")]
pub struct SchemaError {
    /// JSON path of the offending node, e.g. `downloads[0][1].windows[2].size`.
    pub path: String,
    /// Shape that was required.
    pub expected: &'static str,
    /// Shape that was present.
    pub found: &'static str,
}

/// Classification of one JSON node.
#[derive(Debug, Clone, Copy)]
enum Node<'a> {
    Missing,
    Null,
    Bool,
    Number,
    Text(&'a str),
    List(&'a [Value]),
    Map(&'a Map<String, Value>),
}

impl<'a> Node<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            None => Self::Missing,
            Some(Value::Null) => Self::Null,
            Some(Value::Bool(_)) => Self::Bool,
            Some(Value::Number(_)) => Self::Number,
            Some(Value::String(text)) => Self::Text(text),
            Some(Value::Array(items)) => Self::List(items),
            Some(Value::Object(map)) => Self::Map(map),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Missing => "nothing",
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::Text(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "object",
        }
    }

    fn list(self, path: &str, expected: &'static str) -> Result<&'a [Value], SchemaError> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(mismatch(path, expected, other)),
        }
    }

    fn map(self, path: &str, expected: &'static str) -> Result<&'a Map<String, Value>, SchemaError> {
        match self {
            Self::Map(map) => Ok(map),
            other => Err(mismatch(path, expected, other)),
        }
    }

    fn text(self, path: &str) -> Result<&'a str, SchemaError> {
        match self {
            Self::Text(text) => Ok(text),
            other => Err(mismatch(path, "string", other)),
        }
    }

    fn optional_text(self, path: &str) -> Result<Option<&'a str>, SchemaError> {
        match self {
            Self::Missing | Self::Null => Ok(None),
            Self::Text(text) => Ok(Some(text)),
            other => Err(mismatch(path, "string or null", other)),
        }
    }
}

fn mismatch(path: &str, expected: &'static str, found: Node<'_>) -> SchemaError {
    SchemaError {
        path: path.to_string(),
        expected,
        found: found.describe(),
    }
}

/// Resolves a title's assets for `platform`.
///
/// Primary assets come first in manifest order; when `include_bonus` is set,
/// bonus entries follow in their declared order. Download links are made
/// absolute against `base_url`.
///
/// # Errors
///
/// Returns [`SchemaError`] when any level of the manifest is absent or has an
/// unexpected shape, including a missing entry for `platform`.
#[instrument(level = "debug", skip(metadata, base_url), fields(title = %metadata.title))]
pub fn resolve_assets(
    metadata: &TitleMetadata,
    base_url: &Url,
    platform: Platform,
    include_bonus: bool,
) -> Result<Vec<Asset>, SchemaError> {
    let descriptors = platform_descriptors(&metadata.downloads, platform)?;
    let list_path = format!(
        "downloads[{MANIFEST_GROUP}][1].{}",
        platform.manifest_key()
    );

    let mut assets = Vec::with_capacity(descriptors.len() + metadata.extras.len());
    for (index, descriptor) in descriptors.iter().enumerate() {
        let path = format!("{list_path}[{index}]");
        assets.push(primary_asset(descriptor, &path, base_url)?);
    }

    if include_bonus {
        assets.extend(metadata.extras.iter().map(|extra| Asset {
            url: absolute_url(base_url, &extra.manual_url),
            name: extra.name.clone(),
            version: extra
                .version
                .clone()
                .unwrap_or_else(|| NO_VERSION.to_string()),
            release_date: extra.date.clone(),
            size: extra.size.clone(),
            kind: AssetKind::Bonus,
        }));
    }

    debug!(
        platform = %platform,
        count = assets.len(),
        include_bonus,
        "resolved assets"
    );
    Ok(assets)
}

/// Walks `downloads[0][1][platform]` and returns the descriptor list.
fn platform_descriptors(downloads: &Value, platform: Platform) -> Result<&[Value], SchemaError> {
    let groups = Node::of(Some(downloads)).list("downloads", "list of download groups")?;

    let group_path = format!("downloads[{MANIFEST_GROUP}]");
    let group = Node::of(groups.get(MANIFEST_GROUP))
        .list(&group_path, "[label, platform map] pair")?;

    let map_path = format!("{group_path}[1]");
    let platforms = Node::of(group.get(1)).map(&map_path, "object keyed by platform")?;

    let key = platform.manifest_key();
    Node::of(platforms.get(key)).list(&format!("{map_path}.{key}"), "list of asset descriptors")
}

fn primary_asset(descriptor: &Value, path: &str, base_url: &Url) -> Result<Asset, SchemaError> {
    let fields = Node::of(Some(descriptor)).map(path, "asset descriptor object")?;
    let field = |name: &str| (Node::of(fields.get(name)), format!("{path}.{name}"));

    let (node, at) = field("manualUrl");
    let manual_url = node.text(&at)?;
    let (node, at) = field("name");
    let name = node.text(&at)?;
    let (node, at) = field("date");
    let date = node.text(&at)?;
    let (node, at) = field("size");
    let size = node.text(&at)?;
    let (node, at) = field("version");
    let version = node.optional_text(&at)?.unwrap_or(NO_VERSION);

    Ok(Asset {
        url: absolute_url(base_url, manual_url),
        name: name.to_string(),
        version: version.to_string(),
        release_date: Some(date.to_string()),
        size: size.to_string(),
        kind: AssetKind::Primary,
    })
}
