//! Platform and language tables used to build catalog queries.

use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Operating system family a title's assets are resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    Mac,
}

impl Platform {
    /// Key used by the download manifest for this platform.
    #[must_use]
    pub fn manifest_key(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Mac => "mac",
        }
    }

    /// Comma-joined numeric system codes the search endpoint filters on.
    #[must_use]
    pub fn search_codes(self) -> &'static str {
        match self {
            Self::Windows => "1,2,4,8,4096,16384",
            Self::Linux => "1024,2048,8192",
            Self::Mac => "16,32",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_key())
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    /// Accepts exact names and the `win`/`osx` aliases, case-insensitively.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "windows" | "win" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "mac" | "osx" => Ok(Self::Mac),
            _ => Err(ValidationError::UnknownPlatform(raw.to_string())),
        }
    }
}

/// Language codes accepted by the search endpoint. `all` disables filtering.
pub const LANGUAGES: &[&str] = &[
    "en", "cz", "de", "es", "fr", "it", "hu", "nl", "pl", "pt", "br", "sv", "tr", "uk", "ru",
    "ar", "ko", "cn", "jp", "all",
];

/// Catalog language filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Language {
    /// No language filter.
    All,
    /// A specific language code from [`LANGUAGES`].
    Code(String),
}

impl Language {
    /// Returns the query parameter value, or `None` when no filter applies.
    #[must_use]
    pub fn query_value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Code(code) => Some(code),
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let code = raw.trim().to_ascii_lowercase();
        if !LANGUAGES.contains(&code.as_str()) {
            return Err(ValidationError::UnknownLanguage(raw.to_string()));
        }
        if code == "all" {
            Ok(Self::All)
        } else {
            Ok(Self::Code(code))
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value().unwrap_or("all"))
    }
}
