//! Page model and page index.
//!
//! A [`Page`] is one discovered entry script plus the template its html is
//! rendered from. The [`PageIndex`] is the unit both adapters hold: it is
//! rebuilt from scratch on every discovery pass and swapped in wholesale,
//! never patched.

mod discover;

pub use discover::{COLOCATED_TEMPLATE, discover_pages, is_ignored_dir_name};

use crate::utils::path::to_posix;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Where a page's html template comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateSource {
    /// An html file on disk (absolute path).
    File(PathBuf),
    /// The built-in minimal document.
    Fallback,
}

impl TemplateSource {
    /// Template file path, `None` for the built-in fallback.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Fallback => None,
        }
    }
}

/// One discovered entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Route name and output key: `index`, `about`, `admin/dashboard`.
    pub name: String,
    /// Root-relative POSIX module specifier: `/src/pages/about/main.ts`.
    pub entry_path: String,
    /// Template this page is rendered from.
    pub template: TemplateSource,
}

/// Inputs of a discovery pass.
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Absolute project root.
    pub root: PathBuf,
    /// Pages root as configured, relative to `root`.
    pub pages_dir: PathBuf,
    /// File names marking a directory as a page.
    pub entries: Vec<String>,
    /// Default template, used when a page has no colocated `index.html`.
    pub template: PathBuf,
}

impl PageOptions {
    /// Absolute pages root.
    pub fn pages_root(&self) -> PathBuf {
        self.root.join(&self.pages_dir)
    }

    /// POSIX form of the pages root, used as the entry path prefix.
    pub fn pages_posix(&self) -> String {
        to_posix(&self.pages_dir)
    }

    /// Whether `file_name` is one of the configured entry file names.
    pub fn is_entry_name(&self, file_name: &str) -> bool {
        self.entries.iter().any(|entry| entry == file_name)
    }
}

/// Pages keyed by name, iterated in lexicographic name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageIndex {
    pages: BTreeMap<String, Page>,
}

impl PageIndex {
    /// Insert a page, returning the page it replaced under the same name.
    pub fn insert(&mut self, page: Page) -> Option<Page> {
        self.pages.insert(page.name.clone(), page)
    }

    pub fn get(&self, name: &str) -> Option<&Page> {
        self.pages.get(name)
    }

    /// Page names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromIterator<Page> for PageIndex {
    fn from_iter<I: IntoIterator<Item = Page>>(iter: I) -> Self {
        let mut index = Self::default();
        for page in iter {
            index.insert(page);
        }
        index
    }
}
