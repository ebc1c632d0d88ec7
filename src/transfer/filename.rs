//! Local path derivation for transferred assets.

use std::path::{Path, PathBuf};

use url::Url;

use crate::naming::sanitize_path_segment;

/// Extension that marks an in-progress file.
pub const INCOMPLETE_EXTENSION: &str = "incomplete";

/// Double extension whose inner part belongs to the real extension.
const TARBALL_EXTENSION: &str = ".tar.gz";

/// Derives the in-progress path for a final output path.
///
/// The final name's extension is replaced with [`INCOMPLETE_EXTENSION`];
/// `.tar.gz` is removed as a whole.
///
/// ```
/// use std::path::Path;
/// use gogdl_core::transfer::partial_path_for;
///
/// assert_eq!(
///     partial_path_for(Path::new("out/game-1.0.tar.gz")),
///     Path::new("out/game-1.0.incomplete")
/// );
/// ```
#[must_use]
pub fn partial_path_for(final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = if name.len() > TARBALL_EXTENSION.len()
        && name.to_ascii_lowercase().ends_with(TARBALL_EXTENSION)
    {
        name[..name.len() - TARBALL_EXTENSION.len()].to_string()
    } else {
        Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(name)
    };

    final_path.with_file_name(format!("{stem}.{INCOMPLETE_EXTENSION}"))
}

/// Extracts the server-declared file name from a (post-redirect) URL.
///
/// The last path segment is percent-decoded and sanitized into a single path
/// segment. Returns `None` when the path ends without a name.
#[must_use]
pub fn filename_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(segment)
        .map_or_else(|_| segment.to_string(), std::borrow::Cow::into_owned);
    let name = sanitize_path_segment(decoded.trim());
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name)
}
