//! Production adapter: pages as virtual html modules.
//!
//! Every page becomes an entry `<name>.html` that exists only in memory. The
//! bundler asks [`BuildAdapter::resolve_id`] whether it owns an id, then
//! [`BuildAdapter::load`] for its text. The index is frozen at construction.

use super::{AppType, BuildContribution, ConfigContribution, RollupOptions};
use crate::{
    page::{PageIndex, PageOptions, discover_pages},
    render::{Mode, Renderer, log_render_error},
};
use std::{collections::BTreeMap, sync::Arc};

const HTML_SUFFIX: &str = ".html";

pub struct BuildAdapter {
    index: Arc<PageIndex>,
    renderer: Renderer,
}

impl BuildAdapter {
    /// Run discovery once and freeze the result.
    pub fn new(options: &PageOptions) -> Self {
        Self::from_index(discover_pages(options))
    }

    pub fn from_index(index: PageIndex) -> Self {
        Self {
            index: Arc::new(index),
            renderer: Renderer::new(),
        }
    }

    pub fn index(&self) -> Arc<PageIndex> {
        Arc::clone(&self.index)
    }

    /// Bundler entries: page name → virtual document id.
    pub fn input(&self) -> BTreeMap<String, String> {
        self.index
            .names()
            .map(|name| (name.to_owned(), format!("{name}{HTML_SUFFIX}")))
            .collect()
    }

    pub fn config(&self) -> ConfigContribution {
        ConfigContribution {
            app_type: AppType::Mpa,
            build: Some(BuildContribution {
                rollup_options: RollupOptions {
                    input: self.input(),
                },
            }),
        }
    }

    /// Claim ids ending in `.html`.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        id.ends_with(HTML_SUFFIX).then(|| id.to_owned())
    }

    /// Rendered html for a claimed id, `None` for unknown pages.
    pub fn load(&self, id: &str) -> Option<String> {
        let name = id.trim_start_matches('/').strip_suffix(HTML_SUFFIX)?;
        let page = self.index.get(name)?;

        let html = self
            .renderer
            .load_html_content(page, Mode::Build, "/", log_render_error);
        Some(html.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let dashboard = dir.path().join("src/pages/admin/dashboard");
        fs::create_dir_all(&dashboard).unwrap();
        fs::write(dir.path().join("src/pages/main.ts"), "").unwrap();
        fs::write(dashboard.join("main.ts"), "").unwrap();
        fs::write(
            dir.path().join("src/index.html"),
            "<html><body><div id=\"app\"></div></body></html>",
        )
        .unwrap();
        dir
    }

    fn adapter(root: &Path) -> BuildAdapter {
        BuildAdapter::new(&PageOptions {
            root: root.to_path_buf(),
            pages_dir: "src/pages".into(),
            entries: vec!["main.ts".into()],
            template: root.join("src/index.html"),
        })
    }

    #[test]
    fn test_entry_map() {
        let dir = project();
        let adapter = adapter(dir.path());

        let input = adapter.input();
        assert_eq!(input.len(), 2);
        assert_eq!(input["index"], "index.html");
        assert_eq!(input["admin/dashboard"], "admin/dashboard.html");
    }

    #[test]
    fn test_load_nested_page() {
        let dir = project();
        let adapter = adapter(dir.path());

        let id = adapter.resolve_id("admin/dashboard.html").unwrap();
        let html = adapter.load(&id).unwrap();

        assert!(html.contains(
            r#"<script type="module" src="/src/pages/admin/dashboard/main.ts"></script></body>"#
        ));
        assert_eq!(html.matches("<script").count(), 1);
    }

    #[test]
    fn test_resolve_id_claims_html_only() {
        let dir = project();
        let adapter = adapter(dir.path());

        assert_eq!(adapter.resolve_id("index.html").as_deref(), Some("index.html"));
        assert_eq!(adapter.resolve_id("src/pages/main.ts"), None);
        assert_eq!(adapter.resolve_id("style.css"), None);
    }

    #[test]
    fn test_load_unknown_declines() {
        let dir = project();
        let adapter = adapter(dir.path());

        assert_eq!(adapter.load("missing.html"), None);
        assert_eq!(adapter.load("index.js"), None);
        assert!(adapter.load("/index.html").is_some());
    }

    #[test]
    fn test_index_frozen() {
        let dir = project();
        let adapter = adapter(dir.path());

        let about = dir.path().join("src/pages/about");
        fs::create_dir_all(&about).unwrap();
        fs::write(about.join("main.ts"), "").unwrap();

        assert_eq!(adapter.load("about.html"), None);
        assert_eq!(adapter.index().len(), 2);
    }
}
