//! Page discovery: scan the pages root for entry files.
//!
//! # Naming
//!
//! | Entry file                              | Page name          | Entry path                                  |
//! |-----------------------------------------|--------------------|---------------------------------------------|
//! | `src/pages/main.ts`                     | `index`            | `/src/pages/main.ts`                        |
//! | `src/pages/about/main.ts`               | `about`            | `/src/pages/about/main.ts`                  |
//! | `src/pages/admin/dashboard/main.ts`     | `admin/dashboard`  | `/src/pages/admin/dashboard/main.ts`        |
//!
//! # Template priority
//!
//! 1. `index.html` beside the entry file
//! 2. the configured default template, if it exists
//! 3. the built-in fallback document

use super::{Page, PageIndex, PageOptions, TemplateSource};
use crate::{
    log,
    utils::path::{normalize_posix, to_posix},
};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Directories that never contain pages.
///
/// These names are reserved at every depth: `src/pages/build/main.ts` is not
/// a page, so there is no `/build` route. Name such a page directory
/// differently (`builds`, `build-status`, ...).
const IGNORED_DIRS: &[&str] = &["node_modules", "dist", "build", "target"];

/// Template file name looked up beside each entry.
pub const COLOCATED_TEMPLATE: &str = "index.html";

/// Check if a directory name is skipped during discovery.
///
/// Hidden directories (`.git`, `.cache`, ...) and dependency/build output
/// directories are skipped.
pub fn is_ignored_dir_name(name: &str) -> bool {
    name.starts_with('.') || IGNORED_DIRS.contains(&name)
}

/// Walker filter: skip symlinks and ignored directories below the root.
fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry.path_is_symlink()
        || (entry.file_type().is_dir()
            && entry.file_name().to_str().is_some_and(is_ignored_dir_name))
}

/// Scan the pages root and build a fresh page index.
///
/// Unreadable directories are skipped and a missing pages root yields an empty
/// index. When two entries derive the same name (e.g. `main.ts` and `main.tsx`
/// in one directory) the one discovered last wins; a warning is logged.
pub fn discover_pages(options: &PageOptions) -> PageIndex {
    let pages_root = options.pages_root();
    let pages_posix = options.pages_posix();
    let mut index = PageIndex::default();

    let walker = WalkDir::new(&pages_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(Result::ok);

    for entry in walker {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        if !options.is_entry_name(file_name) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&pages_root) else {
            continue;
        };

        let page = Page {
            name: page_name(rel),
            entry_path: entry_path(&pages_posix, rel),
            template: resolve_template(entry.path(), &options.template),
        };

        if let Some(previous) = index.insert(page) {
            log!("pages"; "duplicate page `{}`: {} replaced by {}",
                previous.name,
                previous.entry_path,
                index.get(&previous.name).map_or("", |p| p.entry_path.as_str()));
        }
    }

    index
}

/// Page name from an entry path relative to the pages root.
///
/// `main.ts` → `index`, `admin/dashboard/main.ts` → `admin/dashboard`
fn page_name(rel_entry: &Path) -> String {
    let dir = rel_entry.parent().map(to_posix).unwrap_or_default();
    if dir.is_empty() { "index".to_owned() } else { dir }
}

/// Root-relative module specifier for an entry.
///
/// `("src/pages", "about/main.ts")` → `/src/pages/about/main.ts`
fn entry_path(pages_posix: &str, rel_entry: &Path) -> String {
    let joined = normalize_posix(&format!("{pages_posix}/{}", to_posix(rel_entry)));
    format!("/{}", joined.trim_start_matches('/'))
}

/// Resolve an entry's template by priority.
fn resolve_template(entry: &Path, default_template: &Path) -> TemplateSource {
    let colocated = entry
        .parent()
        .map(|dir| dir.join(COLOCATED_TEMPLATE))
        .filter(|path| path.is_file());

    match colocated {
        Some(path) => TemplateSource::File(path),
        None if default_template.is_file() => TemplateSource::File(default_template.to_path_buf()),
        None => TemplateSource::Fallback,
    }
}
