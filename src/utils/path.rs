//! Path and URL helpers shared by discovery, rendering and the dev server.
//!
//! Page names, entry paths and request paths are always POSIX strings,
//! whatever separator the host platform uses.

use std::{
    env,
    path::{Component, Path, PathBuf},
};

/// Convert a filesystem path to a normalized POSIX string.
///
/// `.\src\pages\` → `src/pages`, `/proj/./src//pages` → `/proj/src/pages`
pub fn to_posix(path: impl AsRef<Path>) -> String {
    normalize_posix(&path.as_ref().to_string_lossy().replace('\\', "/"))
}

/// Normalize a `/`-separated path lexically.
///
/// Collapses repeated separators, drops `.` segments, resolves `..` against
/// preceding segments and removes trailing separators. A leading `/` is kept.
pub fn normalize_posix(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute { format!("/{joined}") } else { joined }
}

/// Ensure a URL prefix ends with exactly one `/`.
///
/// `""` → `/`, `/app` → `/app/`, `/app///` → `/app/`
pub fn ensure_trailing_slash(prefix: &str) -> String {
    format!("{}/", prefix.trim_end_matches('/'))
}

/// Strip every trailing `/` from a URL path.
#[inline]
pub fn strip_trailing_slashes(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Escape a literal for embedding inside a regular expression.
#[inline]
pub fn escape_regex(literal: &str) -> String {
    regex::escape(literal)
}

/// Check whether `child` lies inside (or equals) `parent`.
///
/// Comparison is component-wise on normalized paths, so `/a/bc` is not
/// inside `/a/b`.
pub fn is_path_inside(child: &Path, parent: &Path) -> bool {
    lexical_absolute(child).starts_with(lexical_absolute(parent))
}

/// Normalize a path to absolute form for reliable comparison.
///
/// Existing paths are canonicalized; paths that do not exist (a deleted file
/// reported by the watcher, a template not yet created) are made absolute
/// lexically.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| lexical_absolute(path))
}

/// Make a path absolute without touching the filesystem.
///
/// Uses the canonical form of the deepest existing ancestor so that symlinked
/// temp directories compare equal to their canonicalized children.
fn lexical_absolute(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other),
        }
    }

    // Canonicalize the longest existing prefix, then re-append the rest
    let mut existing = clean.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return clean,
        }
    }

    let mut resolved = existing.canonicalize().unwrap_or_else(|_| existing.to_path_buf());
    resolved.extend(rest.iter().rev());
    resolved
}
