//! Static asset lookups.

use std::collections::BTreeMap;

/// Look up the MIME type of `file` by its extension.
///
/// Keys may be written with or without the leading dot; extension matching
/// is case-insensitive.
pub fn mime_type<'a>(mime_types: &'a BTreeMap<String, String>, file: &str) -> Option<&'a str> {
    let name = file.rsplit('/').next().unwrap_or(file);
    let (_, extension) = name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();

    mime_types
        .get(&format!(".{}", extension))
        .or_else(|| mime_types.get(&extension))
        .map(String::as_str)
}

/// Normalise a pathname for prerendered lookups: no trailing slash except
/// for the root.
pub fn normalize_path(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
