//! `[pages]` section configuration.
//!
//! Where page entries live, which file names mark a page, and which template
//! a page falls back to when it has no colocated `index.html`.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One entry file name or a list of them.
///
/// ```toml
/// entry = "main.ts"
/// entry = ["main.ts", "main.tsx"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryFiles {
    One(String),
    Many(Vec<String>),
}

impl EntryFiles {
    /// All configured entry file names, in declaration order.
    pub fn names(&self) -> &[String] {
        match self {
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        }
    }
}

impl Default for EntryFiles {
    fn default() -> Self {
        defaults::pages::entry()
    }
}

/// `[pages]` section in mpa.toml.
///
/// # Example
/// ```toml
/// [pages]
/// dir = "src/pages"
/// entry = ["main.ts", "main.tsx"]
/// template = "src/index.html"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct PagesConfig {
    /// Pages root, relative to the project root.
    #[serde(default = "defaults::pages::dir")]
    #[educe(Default = defaults::pages::dir())]
    pub dir: PathBuf,

    /// Entry file name(s) marking a directory as a page.
    #[serde(default = "defaults::pages::entry")]
    #[educe(Default = defaults::pages::entry())]
    pub entry: EntryFiles,

    /// Default template used by pages without a colocated `index.html`.
    /// Absolute after loading.
    #[serde(default = "defaults::pages::template")]
    #[educe(Default = defaults::pages::template())]
    pub template: PathBuf,
}
