//! Title metadata and asset resolution.

mod resolver;
mod types;

pub use resolver::{SchemaError, resolve_assets};
pub use types::{Asset, AssetKind, BonusEntry, NO_VERSION, TitleMetadata, option_labels};
