//! Folder naming from title metadata.
//!
//! Templates use `{{variable}}` tags (a leading dot, `{{.title}}`, is also
//! accepted). The vocabulary is fixed:
//!
//! - `title`: the title verbatim
//! - `titlePeriods`: the title with spaces replaced by periods
//!
//! A template that fails to render is replaced by [`DEFAULT_TEMPLATE`] once,
//! which always renders.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::warn;

/// Template used when none is configured or the configured one is invalid.
pub const DEFAULT_TEMPLATE: &str = "{{title}} [GOG]";

/// Characters that are replaced with `_` in folder names.
pub const FORBIDDEN_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

#[allow(clippy::expect_used)]
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(.*?)\}\}").expect("tag regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|amp|lt|gt|quot|apos);")
        .expect("entity regex is valid") // Static pattern, safe to panic
});

/// Template syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `{{` without matching `}}` (or a stray `}}`).
    #[error("unclosed tag in template {0:?}")]
    Unclosed(String),
    /// `{{ }}` with nothing inside.
    #[error("empty tag in template")]
    EmptyTag,
    /// A variable outside the fixed vocabulary.
    #[error("unknown template variable {0:?}; expected title or titlePeriods")]
    UnknownVariable(String),
}

/// Values substituted into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars {
    pub title: String,
    pub title_periods: String,
}

impl TemplateVars {
    /// Builds the substitution set for a title.
    #[must_use]
    pub fn for_title(title: &str) -> Self {
        Self {
            title: title.to_string(),
            title_periods: title.replace(' ', "."),
        }
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(&self.title),
            "titlePeriods" => Some(&self.title_periods),
            _ => None,
        }
    }
}

/// Renders a template against the fixed vocabulary.
///
/// # Errors
///
/// Returns [`TemplateError`] for unbalanced braces, empty tags and unknown
/// variables.
pub fn render_template(template: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
    let leftover = TAG_PATTERN.replace_all(template, "");
    if leftover.contains("{{") || leftover.contains("}}") {
        return Err(TemplateError::Unclosed(template.to_string()));
    }

    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;
    for caps in TAG_PATTERN.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        rendered.push_str(&template[last..whole.start()]);
        let name = caps.get(1).map_or("", |m| m.as_str()).trim();
        let name = name.strip_prefix('.').unwrap_or(name);
        if name.is_empty() {
            return Err(TemplateError::EmptyTag);
        }
        let value = vars
            .lookup(name)
            .ok_or_else(|| TemplateError::UnknownVariable(name.to_string()))?;
        rendered.push_str(value);
        last = whole.end();
    }
    rendered.push_str(&template[last..]);
    Ok(rendered)
}

/// Replaces every forbidden character with exactly one underscore.
#[must_use]
pub fn sanitize_path_segment(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Encodes the characters [`unescape_entities`] would otherwise reinterpret.
#[must_use]
pub fn escape_entities(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Decodes the HTML entities a template may carry (`&amp;`, `&#39;`, ...).
#[must_use]
pub fn unescape_entities(text: &str) -> String {
    ENTITY_PATTERN
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => decode_numeric_entity(entity),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

/// Derives the per-title folder name.
///
/// Renders `template` (falling back to [`DEFAULT_TEMPLATE`] with a warning),
/// unescapes HTML entities, then sanitizes the result into a single path
/// segment. Substituted values are escaped first, so the title appears
/// literally even when it contains entity-like text.
#[must_use]
pub fn folder_name(template: &str, title: &str) -> String {
    let vars = TemplateVars::for_title(&escape_entities(title));
    let rendered = match render_template(template, &vars) {
        Ok(rendered) => rendered,
        Err(error) => {
            warn!(%error, template, "failed to parse folder template; default will be used instead");
            render_default(&vars)
        }
    };

    let name = sanitize_path_segment(&unescape_entities(&rendered));
    if matches!(name.trim(), "" | "." | "..") {
        return "_".repeat(name.chars().count().max(1));
    }
    name
}

fn render_default(vars: &TemplateVars) -> String {
    DEFAULT_TEMPLATE.replace("{{title}}", &vars.title)
}
