//! Development adapter: file-event invalidation plus the request contract.
//!
//! ```text
//! received ─► filtered ─► resolved ─► found ─► render ─► transform ─► 200
//!    │                                  │
//!    └── Next (not a navigation)        └── not found ─► 404 listing
//! ```
//!
//! The page index is swapped wholesale through [`ArcSwap`], so a request
//! always sees one complete discovery pass.

use super::{AppType, ConfigContribution};
use crate::{
    log,
    page::{COLOCATED_TEMPLATE, PageIndex, PageOptions, discover_pages},
    render::{Mode, Renderer, log_render_error},
    resolve::resolve_request,
    utils::path::{ensure_trailing_slash, is_path_inside, normalize_path},
};
use anyhow::Result;
use arc_swap::ArcSwap;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

/// Page listing served when no page matches (embedded at compile time)
const NOT_FOUND_TEMPLATE: &str = include_str!("../embed/serve/not_found.html");

/// Request path prefixes owned by the host tooling, never page navigations.
const INTERNAL_PREFIXES: &[&str] = &["/@", "/__", "/node_modules/"];

/// Media types that mark a request as a document navigation.
const HTML_MEDIA_TYPES: &[&str] = &["text/html", "application/xhtml+xml", "*/*"];

/// File extension on the last path segment.
static EXTENSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9]+$").unwrap());

// ============================================================================
// Collaborator Types
// ============================================================================

/// Post-processing applied to rendered html before it is sent.
///
/// Receives the canonical document URL and the rendered html.
pub trait HtmlTransform: Send + Sync {
    fn transform(&self, url: &str, html: String) -> Result<String>;
}

impl<F> HtmlTransform for F
where
    F: Fn(&str, String) -> Result<String> + Send + Sync,
{
    fn transform(&self, url: &str, html: String) -> Result<String> {
        self(url, html)
    }
}

/// Transform that returns the html unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl HtmlTransform for Passthrough {
    fn transform(&self, _url: &str, html: String) -> Result<String> {
        Ok(html)
    }
}

/// The parts of an incoming request the adapter looks at.
#[derive(Debug, Clone, Copy)]
pub struct DevRequest<'a> {
    pub method: &'a str,
    /// Path plus optional query string, as received.
    pub url: &'a str,
    pub accept: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevResponse {
    pub status: u16,
    pub body: String,
}

impl DevResponse {
    pub const CONTENT_TYPE: &'static str = "text/html; charset=utf-8";
}

/// What the adapter did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a page navigation: hand the request to the next handler.
    Next,
    Respond(DevResponse),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Change,
    Add,
    Unlink,
}

/// A file-system event, path absolute or relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Effect of a file-system event on adapter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    /// Event did not concern pages or templates.
    None,
    /// Both caches were cleared.
    CachesCleared,
    /// The page set may have changed; caller should run a debounced
    /// [`DevAdapter::rebuild_index`]. Caches may also have been cleared.
    RescanScheduled,
}

// ============================================================================
// Adapter
// ============================================================================

pub struct DevAdapter {
    options: PageOptions,
    /// Server base, always ending in exactly one `/`.
    base: String,
    index: ArcSwap<PageIndex>,
    renderer: Renderer,
    transform: Box<dyn HtmlTransform>,
    /// Normalized pages root and default template, for event matching.
    pages_root: PathBuf,
    template: PathBuf,
}

impl DevAdapter {
    /// Run discovery and build an adapter serving under `base`.
    pub fn new(options: PageOptions, base: &str) -> Self {
        let index = discover_pages(&options);
        Self {
            pages_root: normalize_path(&options.pages_root()),
            template: normalize_path(&options.template),
            base: ensure_trailing_slash(base),
            index: ArcSwap::from_pointee(index),
            renderer: Renderer::new(),
            transform: Box::new(Passthrough),
            options,
        }
    }

    /// Replace the html post-transform.
    pub fn with_transform(mut self, transform: impl HtmlTransform + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }

    pub fn config(&self) -> ConfigContribution {
        ConfigContribution {
            app_type: AppType::Mpa,
            build: None,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn options(&self) -> &PageOptions {
        &self.options
    }

    /// Snapshot of the current page index.
    pub fn index(&self) -> Arc<PageIndex> {
        self.index.load_full()
    }

    /// Re-run discovery and swap the index in. Returns the new page count.
    pub fn rebuild_index(&self) -> usize {
        let index = discover_pages(&self.options);
        let count = index.len();
        self.index.store(Arc::new(index));
        count
    }

    // ------------------------------------------------------------------------
    // File events
    // ------------------------------------------------------------------------

    /// Apply a file-system event.
    ///
    /// Cache invalidation happens immediately; rediscovery is left to the
    /// caller so bursts can be coalesced.
    pub fn handle_fs_event(&self, event: &FsEvent) -> WatchAction {
        let path = self.absolute(&event.path);
        let is_html = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));

        if is_html {
            self.renderer.invalidate();
        }

        match event.kind {
            FsEventKind::Add | FsEventKind::Unlink if self.affects_index(&path) => {
                WatchAction::RescanScheduled
            }
            _ if is_html => WatchAction::CachesCleared,
            _ => WatchAction::None,
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.options.root.join(path))
        }
    }

    /// The default template itself, or under the pages root: an entry file,
    /// a colocated template, or a directory.
    ///
    /// Moving or deleting a directory is reported for the directory only, so
    /// a path that is a directory now, or has no extension and is gone, may
    /// have carried whole pages with it.
    fn affects_index(&self, path: &Path) -> bool {
        if path == self.template {
            return true;
        }
        if !is_path_inside(path, &self.pages_root) {
            return false;
        }

        let is_entry = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.options.is_entry_name(name) || name == COLOCATED_TEMPLATE);

        is_entry || path.is_dir() || (path.extension().is_none() && !path.exists())
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// Handle a request, or pass it on with [`Outcome::Next`].
    pub fn handle(&self, request: &DevRequest<'_>) -> Outcome {
        let Some(target) = self.navigation_target(request) else {
            return Outcome::Next;
        };

        let resolved = resolve_request(&target);
        let index = self.index.load();

        let Some(page) = index.get(&resolved.page_name) else {
            return Outcome::Respond(DevResponse {
                status: 404,
                body: self.not_found_page(&resolved.canonical_url, &index),
            });
        };

        let html = self
            .renderer
            .load_html_content(page, Mode::Dev, &self.base, log_render_error);

        match self.transform.transform(&resolved.canonical_url, html.to_string()) {
            Ok(body) => Outcome::Respond(DevResponse { status: 200, body }),
            Err(err) => {
                log!("serve"; "transform failed for {}: {err:#}", resolved.canonical_url);
                Outcome::Respond(DevResponse {
                    status: 500,
                    body: format!("<pre>{}</pre>", escape_html(&format!("{err:#}"))),
                })
            }
        }
    }

    /// Base-relative path plus query for a page navigation, `None` for
    /// everything else.
    fn navigation_target(&self, request: &DevRequest<'_>) -> Option<String> {
        if !matches!(request.method, "GET" | "HEAD") || !accepts_html(request.accept) {
            return None;
        }

        let (path, query) = match request.url.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (request.url, None),
        };

        if is_internal(path) || has_asset_extension(path) {
            return None;
        }

        let path = self.strip_base(path)?;
        if is_internal(path) {
            return None;
        }

        Some(match query {
            Some(query) => format!("{path}?{query}"),
            None => path.to_owned(),
        })
    }

    /// Request path relative to the server base, keeping the leading `/`.
    ///
    /// `/app/about` under `/app/` → `/about`. `None` outside the base.
    pub fn strip_base<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.base == "/" {
            return Some(path);
        }

        let prefix = self.base.trim_end_matches('/');
        match path.strip_prefix(prefix)? {
            "" => Some("/"),
            rest if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }

    #[allow(clippy::literal_string_with_formatting_args)]
    fn not_found_page(&self, url: &str, index: &PageIndex) -> String {
        let pages = if index.is_empty() {
            r#"<p class="empty">No pages found.</p>"#.to_owned()
        } else {
            let items: Vec<_> = index
                .names()
                .map(|name| {
                    let name = escape_html(name);
                    format!(r#"<li><a href="{}{name}">{name}</a></li>"#, self.base)
                })
                .collect();
            format!("<ul>\n      {}\n    </ul>", items.join("\n      "))
        };

        NOT_FOUND_TEMPLATE
            .replace("{path}", &escape_html(url))
            .replace("{pages}", &pages)
    }
}

// ============================================================================
// Request Filter
// ============================================================================

fn accepts_html(accept: Option<&str>) -> bool {
    accept.is_some_and(|accept| {
        accept.split(',').any(|part| {
            let media = part.split(';').next().unwrap_or_default().trim();
            HTML_MEDIA_TYPES
                .iter()
                .any(|html| media.eq_ignore_ascii_case(html))
        })
    })
}

fn is_internal(path: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Whether the last path segment carries a non-html extension.
fn has_asset_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    EXTENSION
        .find(last)
        .is_some_and(|ext| !ext.as_str().eq_ignore_ascii_case(".html"))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HTML: Option<&str> = Some("text/html,application/xhtml+xml,*/*;q=0.8");

    fn options(root: &Path) -> PageOptions {
        PageOptions {
            root: root.to_path_buf(),
            pages_dir: "src/pages".into(),
            entries: vec!["main.ts".into()],
            template: root.join("src/index.html"),
        }
    }

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/index.html", "<html><body><div id=\"app\"></div></body></html>");
        write(dir.path(), "src/pages/main.ts", "");
        write(dir.path(), "src/pages/about/main.ts", "");
        write(dir.path(), "src/pages/admin/dashboard/main.ts", "");
        dir
    }

    fn get<'a>(url: &'a str) -> DevRequest<'a> {
        DevRequest {
            method: "GET",
            url,
            accept: HTML,
        }
    }

    fn respond(adapter: &DevAdapter, url: &str) -> DevResponse {
        match adapter.handle(&get(url)) {
            Outcome::Respond(response) => response,
            Outcome::Next => panic!("{url} was passed through"),
        }
    }

    #[test]
    fn test_serves_page_with_injected_script() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/");

        let response = respond(&adapter, "/about");
        assert_eq!(response.status, 200);
        assert!(response.body.contains(
            r#"<div id="app"></div><script type="module" src="/src/pages/about/main.ts"></script></body>"#
        ));

        let root = respond(&adapter, "/");
        assert!(root.body.contains(r#"src="/src/pages/main.ts""#));
    }

    #[test]
    fn test_missing_page_lists_known_pages() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/");

        let response = respond(&adapter, "/missing");
        assert_eq!(response.status, 404);
        assert!(response.body.contains("/missing.html"));

        let about = response.body.find(r#"<a href="/about">about</a>"#).unwrap();
        let admin = response.body.find(r#"<a href="/admin/dashboard">admin/dashboard</a>"#).unwrap();
        let index = response.body.find(r#"<a href="/index">index</a>"#).unwrap();
        assert!(about < admin && admin < index);
    }

    #[test]
    fn test_missing_page_without_pages() {
        let dir = TempDir::new().unwrap();
        let adapter = DevAdapter::new(options(dir.path()), "/");

        let response = respond(&adapter, "/");
        assert_eq!(response.status, 404);
        assert!(response.body.contains("No pages found."));
        assert!(!response.body.contains("<ul>"));
    }

    #[test]
    fn test_not_found_escapes_url() {
        let dir = TempDir::new().unwrap();
        let adapter = DevAdapter::new(options(dir.path()), "/");

        let response = respond(&adapter, "/%3Cscript%3E");
        assert!(response.body.contains("&lt;script&gt;.html"));
        assert!(!response.body.contains("<script>"));
    }

    #[test]
    fn test_filter_passes_non_navigation() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/");

        let post = DevRequest { method: "POST", url: "/about", accept: HTML };
        assert_eq!(adapter.handle(&post), Outcome::Next);

        let json = DevRequest { method: "GET", url: "/about", accept: Some("application/json") };
        assert_eq!(adapter.handle(&json), Outcome::Next);

        let none = DevRequest { method: "GET", url: "/about", accept: None };
        assert_eq!(adapter.handle(&none), Outcome::Next);

        for url in ["/@vite/client", "/__open-in-editor", "/node_modules/x/index.js", "/src/main.ts", "/logo.svg?v=1"] {
            assert_eq!(adapter.handle(&get(url)), Outcome::Next, "{url}");
        }

        let head = DevRequest { method: "HEAD", url: "/about.html", accept: Some("*/*") };
        assert!(matches!(adapter.handle(&head), Outcome::Respond(r) if r.status == 200));
    }

    #[test]
    fn test_base_prefix() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/app");
        assert_eq!(adapter.base(), "/app/");

        let response = respond(&adapter, "/app/about/");
        assert_eq!(response.status, 200);
        assert!(response.body.contains(r#"src="/app/src/pages/about/main.ts""#));

        assert_eq!(respond(&adapter, "/app").status, 200);
        assert_eq!(adapter.handle(&get("/about")), Outcome::Next);
        assert_eq!(adapter.handle(&get("/application")), Outcome::Next);
        assert_eq!(adapter.handle(&get("/app/@vite/client")), Outcome::Next);
    }

    #[test]
    fn test_transform_receives_canonical_url() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/").with_transform(
            |url: &str, html: String| -> Result<String> { Ok(format!("<!-- {url} -->{html}")) },
        );

        let response = respond(&adapter, "/about/?tab=1");
        assert!(response.body.starts_with("<!-- /about.html?tab=1 -->"));
    }

    #[test]
    fn test_transform_failure_is_500() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/").with_transform(
            |_: &str, _: String| -> Result<String> { Err(anyhow::anyhow!("boom")) },
        );

        let response = respond(&adapter, "/about");
        assert_eq!(response.status, 500);
        assert!(response.body.contains("boom"));
    }

    #[test]
    fn test_html_change_rereads_template() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/");

        assert!(!respond(&adapter, "/about").body.contains("SENTINEL"));

        let template = write(dir.path(), "src/index.html", "<body>SENTINEL</body>");
        // still cached
        assert!(!respond(&adapter, "/about").body.contains("SENTINEL"));

        let action = adapter.handle_fs_event(&FsEvent::new(FsEventKind::Change, &template));
        assert_eq!(action, WatchAction::CachesCleared);
        assert!(respond(&adapter, "/about").body.contains("SENTINEL"));
    }

    #[test]
    fn test_event_classification() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/");

        let rescan = [
            FsEvent::new(FsEventKind::Add, "src/pages/blog/main.ts"),
            FsEvent::new(FsEventKind::Unlink, dir.path().join("src/pages/about/main.ts")),
            FsEvent::new(FsEventKind::Add, "src/pages/about/index.html"),
            FsEvent::new(FsEventKind::Unlink, "src/index.html"),
        ];
        for event in &rescan {
            assert_eq!(adapter.handle_fs_event(event), WatchAction::RescanScheduled, "{event:?}");
        }

        assert_eq!(
            adapter.handle_fs_event(&FsEvent::new(FsEventKind::Change, "src/pages/about/main.ts")),
            WatchAction::None
        );
        assert_eq!(
            adapter.handle_fs_event(&FsEvent::new(FsEventKind::Add, "src/main.ts")),
            WatchAction::None
        );
        assert_eq!(
            adapter.handle_fs_event(&FsEvent::new(FsEventKind::Add, "src/other.html")),
            WatchAction::CachesCleared
        );
    }

    #[test]
    fn test_removed_page_directory_rescans() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/");
        assert_eq!(respond(&adapter, "/about").status, 200);

        let about = dir.path().join("src/pages/about");
        fs::remove_dir_all(&about).unwrap();

        let action = adapter.handle_fs_event(&FsEvent::new(FsEventKind::Unlink, &about));
        assert_eq!(action, WatchAction::RescanScheduled);

        adapter.rebuild_index();
        assert_eq!(respond(&adapter, "/about").status, 404);
    }

    #[test]
    fn test_added_page_directory_rescans() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/");

        // a whole directory moved in reports only the directory
        write(dir.path(), "src/pages/blog/post/main.ts", "");
        let blog = dir.path().join("src/pages/blog");
        let action = adapter.handle_fs_event(&FsEvent::new(FsEventKind::Add, &blog));
        assert_eq!(action, WatchAction::RescanScheduled);

        adapter.rebuild_index();
        assert_eq!(respond(&adapter, "/blog/post").status, 200);
    }

    #[test]
    fn test_non_entry_files_do_not_rescan() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/");

        let util = write(dir.path(), "src/pages/about/util.ts", "");
        assert_eq!(
            adapter.handle_fs_event(&FsEvent::new(FsEventKind::Add, &util)),
            WatchAction::None
        );
        // directories outside the pages root are irrelevant
        fs::create_dir_all(dir.path().join("src/components")).unwrap();
        assert_eq!(
            adapter.handle_fs_event(&FsEvent::new(FsEventKind::Add, "src/components")),
            WatchAction::None
        );
    }

    #[test]
    fn test_rebuild_index_picks_up_new_page() {
        let dir = project();
        let adapter = DevAdapter::new(options(dir.path()), "/");
        assert_eq!(respond(&adapter, "/blog").status, 404);

        write(dir.path(), "src/pages/blog/main.ts", "");
        let event = FsEvent::new(FsEventKind::Add, dir.path().join("src/pages/blog/main.ts"));
        assert_eq!(adapter.handle_fs_event(&event), WatchAction::RescanScheduled);

        assert_eq!(adapter.rebuild_index(), 4);
        assert_eq!(respond(&adapter, "/blog").status, 200);
    }

    #[test]
    fn test_request_filter_helpers() {
        assert!(accepts_html(Some("TEXT/HTML; q=0.9")));
        assert!(accepts_html(Some("image/png, */*")));
        assert!(!accepts_html(Some("image/*")));

        assert!(has_asset_extension("/a/b.js"));
        assert!(!has_asset_extension("/a/b.html"));
        assert!(!has_asset_extension("/a.b/c"));

        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
