//! Run configuration: file defaults merged with command-line overrides.
//!
//! Command-line values win over file values, file values win over built-in
//! defaults. Platform and language have no default and must come from one of
//! the two sources.

mod error;
mod file;
mod platform;

use std::path::PathBuf;

pub use error::ValidationError;
pub use file::{FileConfig, load_file_config, parse_config_str, resolve_default_config_path};
pub use platform::{LANGUAGES, Language, Platform};

use crate::http::HttpTimeouts;
use crate::naming::DEFAULT_TEMPLATE;

/// Output root used when neither the command line nor the file sets one.
pub const DEFAULT_OUTPUT_DIR: &str = "GOG downloads";

/// Credential file used when neither the command line nor the file sets one.
pub const DEFAULT_COOKIES_FILE: &str = "cookies.json";

/// Minimum length of a non-empty search query.
pub const MIN_QUERY_LEN: usize = 3;

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub query: Option<String>,
    pub platform: Option<String>,
    pub language: Option<String>,
    pub folder_template: Option<String>,
    pub goodies: bool,
    pub output_dir: Option<PathBuf>,
    pub cookies_file: Option<PathBuf>,
}

/// Fully resolved, validated settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Trimmed search text; empty lists every owned title.
    pub query: String,
    pub platform: Platform,
    pub language: Language,
    pub folder_template: String,
    pub goodies: bool,
    pub output_dir: PathBuf,
    pub cookies_file: PathBuf,
    pub timeouts: HttpTimeouts,
}

impl Settings {
    /// Merges overrides with file config and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a too-short query, a missing or unknown
    /// platform/language, or an out-of-range timeout.
    pub fn resolve(
        overrides: Overrides,
        file: Option<&FileConfig>,
    ) -> Result<Self, ValidationError> {
        let file = file.cloned().unwrap_or_default();

        let query = validate_query(overrides.query.as_deref().unwrap_or_default())?;

        let platform_raw = non_blank(overrides.platform)
            .or_else(|| non_blank(file.platform))
            .ok_or(ValidationError::MissingField("platform"))?;
        let language_raw = non_blank(overrides.language)
            .or_else(|| non_blank(file.language))
            .ok_or(ValidationError::MissingField("language"))?;
        let language: Language = language_raw.parse()?;
        let platform: Platform = platform_raw.parse()?;

        let folder_template = non_blank(overrides.folder_template)
            .or_else(|| non_blank(file.folder_template))
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

        let output_dir = overrides
            .output_dir
            .filter(|path| !path.as_os_str().is_empty())
            .or(file.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let cookies_file = overrides
            .cookies_file
            .or(file.cookies_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIES_FILE));

        let mut timeouts = HttpTimeouts::default();
        if let Some(secs) = file.connect_timeout_secs {
            timeouts.connect_secs = validate_timeout("connect_timeout_secs", secs)?;
        }
        if let Some(secs) = file.read_timeout_secs {
            timeouts.read_secs = validate_timeout("read_timeout_secs", secs)?;
        }

        Ok(Self {
            query,
            platform,
            language,
            folder_template,
            goodies: overrides.goodies || file.goodies.unwrap_or(false),
            output_dir,
            cookies_file,
            timeouts,
        })
    }
}

/// Trims the query and rejects non-empty queries shorter than [`MIN_QUERY_LEN`].
///
/// # Errors
///
/// Returns [`ValidationError::QueryTooShort`] for a trimmed length of 1 or 2.
pub fn validate_query(raw: &str) -> Result<String, ValidationError> {
    let query = raw.trim();
    let len = query.chars().count();
    if len > 0 && len < MIN_QUERY_LEN {
        return Err(ValidationError::QueryTooShort(query.to_string()));
    }
    Ok(query.to_string())
}

fn validate_timeout(field: &'static str, secs: u64) -> Result<u64, ValidationError> {
    if (1..=3600).contains(&secs) {
        Ok(secs)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value: secs,
            range: "1..=3600",
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
