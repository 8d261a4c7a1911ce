//! POSIX path normalization for manifest keys.
//!
//! Manifest-derived and filesystem-derived paths both pass through here, so
//! the two sets compare equal when they name the same file.

use std::path::{Component, Path, PathBuf};

/// Collapse `.`/`..` segments and repeated separators in a `/`-separated path.
///
/// Leading `..` segments that cannot be collapsed are kept, as is a leading
/// `/`. An empty result normalizes to `.`.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Express `path` relative to `root` as a normalized `/`-separated string.
///
/// Returns `None` when `path` is not under `root`.
pub fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();
    Some(normalize(&parts.join("/")))
}

/// Resolve a `/`-separated manifest path against the bag root using the host
/// separator.
pub fn to_native(root: &Path, posix: &str) -> PathBuf {
    posix
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}
