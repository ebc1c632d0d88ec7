use std::path::PathBuf;

use thiserror::Error;

/// Bad configuration: file syntax, unknown values, or missing required fields.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The platform is neither a known name nor an alias.
    #[error("invalid platform: {0}")]
    UnknownPlatform(String),

    /// The language code is not in the supported table.
    #[error("invalid language: {0}")]
    UnknownLanguage(String),

    /// A non-empty query shorter than three characters.
    #[error("query must be at least three characters (got {0:?})")]
    QueryTooShort(String),

    /// A required setting was given neither on the command line nor in the file.
    #[error("{0} is required (pass it on the command line or set it in the config file)")]
    MissingField(&'static str),

    /// A numeric setting is outside its accepted range.
    #[error("invalid value for `{field}`: {value}. Expected range: {range}")]
    OutOfRange {
        /// Setting name.
        field: &'static str,
        /// Rejected value.
        value: u64,
        /// Human-readable accepted range.
        range: &'static str,
    },

    /// The config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config file contains a malformed line.
    #[error("invalid config syntax on line {line}: {reason}")]
    Syntax {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// The config file names a key this tool does not know.
    #[error("unknown configuration key '{key}' on line {line}")]
    UnknownKey {
        /// Offending key.
        key: String,
        /// 1-based line number.
        line: usize,
    },
}
