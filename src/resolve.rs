//! Request resolution: navigation URL → page name.
//!
//! Names produced here must match the names discovery derives from
//! directories, since the dev adapter looks pages up by direct key match.
//!
//! | Request              | Canonical URL          | Page name          |
//! |----------------------|------------------------|--------------------|
//! | `/`                  | `/index.html`          | `index`            |
//! | `/about`             | `/about.html`          | `about`            |
//! | `/about/`            | `/about.html`          | `about`            |
//! | `/a/b.html?x=1`      | `/a/b.html?x=1`        | `a/b`              |

use crate::utils::path::strip_trailing_slashes;
use std::borrow::Cow;

/// Canonical document URL and the page it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    /// Normalized `.html` path with the original query string reattached.
    pub canonical_url: String,
    pub page_name: String,
}

/// Resolve a navigation request path (optionally with a query string).
///
/// Callers filter out asset and internal requests first; anything reaching
/// this function is treated as a page navigation.
pub fn resolve_request(raw: &str) -> ResolvedRequest {
    let (path, query) = match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    };

    let path = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
    let path = normalize_document_path(&path);

    let page_name = path
        .trim_start_matches('/')
        .strip_suffix(".html")
        .unwrap_or_default()
        .to_owned();

    let canonical_url = match query {
        Some(query) => format!("{path}?{query}"),
        None => path,
    };

    ResolvedRequest {
        canonical_url,
        page_name,
    }
}

/// `/` → `/index.html`, `/foo/` → `/foo.html`, `/foo.html` unchanged.
fn normalize_document_path(path: &str) -> String {
    if path.ends_with(".html") {
        return path.to_owned();
    }

    match strip_trailing_slashes(path) {
        "" => "/index.html".to_owned(),
        trimmed if trimmed.starts_with('/') => format!("{trimmed}.html"),
        trimmed => format!("/{trimmed}.html"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(raw: &str) -> String {
        resolve_request(raw).page_name
    }

    #[test]
    fn test_root() {
        let resolved = resolve_request("/");
        assert_eq!(resolved.canonical_url, "/index.html");
        assert_eq!(resolved.page_name, "index");

        assert_eq!(name(""), "index");
        assert_eq!(name("///"), "index");
    }

    #[test]
    fn test_plain_and_trailing_slash() {
        assert_eq!(name("/foo"), "foo");
        assert_eq!(name("/foo/"), "foo");
        assert_eq!(name("/foo//"), "foo");
        assert_eq!(resolve_request("/foo/").canonical_url, "/foo.html");
    }

    #[test]
    fn test_nested_html_with_query() {
        let resolved = resolve_request("/a/b.html?x=1");
        assert_eq!(resolved.page_name, "a/b");
        assert_eq!(resolved.canonical_url, "/a/b.html?x=1");
    }

    #[test]
    fn test_query_reattached_unchanged() {
        let resolved = resolve_request("/admin/dashboard/?tab=users&sort=desc");
        assert_eq!(resolved.page_name, "admin/dashboard");
        assert_eq!(resolved.canonical_url, "/admin/dashboard.html?tab=users&sort=desc");

        assert_eq!(resolve_request("/?").canonical_url, "/index.html?");
    }

    #[test]
    fn test_index_html_explicit() {
        assert_eq!(name("/index.html"), "index");
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(name("/caf%C3%A9"), "café");
        assert_eq!(name("/my%20page/"), "my page");
    }
}
