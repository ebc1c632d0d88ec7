//! File-backed defaults.
//!
//! The file uses a minimal `key = value` syntax: double-quoted strings,
//! `true`/`false`, bare non-negative integers, and `#` comments.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ValidationError;

/// Settings read from the config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Platform name or alias.
    pub platform: Option<String>,
    /// Language code.
    pub language: Option<String>,
    /// Folder naming template.
    pub folder_template: Option<String>,
    /// Include bonus content.
    pub goodies: Option<bool>,
    /// Root output directory.
    pub output_dir: Option<PathBuf>,
    /// Credential file path.
    pub cookies_file: Option<PathBuf>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/gogdl/config.toml`
/// 2. `$HOME/.config/gogdl/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("gogdl").join("config.toml"));
    }
    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("gogdl")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is optional and a missing
/// file yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`ValidationError`] when the file cannot be read or parsed.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>, ValidationError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match resolve_default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("no config file found; using command-line values only");
                return Ok(None);
            }
        },
    };

    let raw = fs::read_to_string(&path).map_err(|source| ValidationError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    parse_config_str(&raw).map(Some)
}

/// Parses config text.
///
/// # Errors
///
/// Returns [`ValidationError::Syntax`] for malformed lines and
/// [`ValidationError::UnknownKey`] for unrecognised keys.
pub fn parse_config_str(raw: &str) -> Result<FileConfig, ValidationError> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_number = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            return Err(syntax(line_number, "expected key = value"));
        };
        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "platform" => cfg.platform = Some(parse_string_literal(value, line_number)?),
            "language" => cfg.language = Some(parse_string_literal(value, line_number)?),
            "folder_template" => {
                cfg.folder_template = Some(parse_string_literal(value, line_number)?);
            }
            "goodies" => cfg.goodies = Some(parse_boolean(value, line_number)?),
            "output_dir" => {
                cfg.output_dir = Some(PathBuf::from(parse_string_literal(value, line_number)?));
            }
            "cookies_file" => {
                cfg.cookies_file = Some(PathBuf::from(parse_string_literal(value, line_number)?));
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value, line_number)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value, line_number)?);
            }
            unknown => {
                return Err(ValidationError::UnknownKey {
                    key: unknown.to_string(),
                    line: line_number,
                });
            }
        }
    }
    Ok(cfg)
}

fn syntax(line: usize, reason: impl Into<String>) -> ValidationError {
    ValidationError::Syntax {
        line,
        reason: reason.into(),
    }
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str, line: usize) -> Result<String, ValidationError> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        return Err(syntax(line, "expected double-quoted string"));
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str, line: usize) -> Result<u64, ValidationError> {
    raw_value
        .parse::<u64>()
        .map_err(|_| syntax(line, format!("expected non-negative integer, got '{raw_value}'")))
}

fn parse_boolean(raw_value: &str, line: usize) -> Result<bool, ValidationError> {
    match raw_value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(syntax(line, "expected 'true' or 'false'")),
    }
}
