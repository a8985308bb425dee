//! Host-facing adapters.
//!
//! The engine plugs into its host in one of two mutually exclusive ways,
//! picked once at startup:
//!
//! | Variant  | Serves pages through                     | Index lifetime             |
//! |----------|------------------------------------------|----------------------------|
//! | `Dev`    | request handling ([`DevAdapter::handle`])| rebuilt on file events     |
//! | `Build`  | virtual modules (`resolve_id` / `load`)  | frozen at construction     |
//!
//! Both contribute configuration to the host build tool via
//! [`ConfigContribution`].

mod build;
mod dev;

pub use build::BuildAdapter;
pub use dev::{
    DevAdapter, DevRequest, DevResponse, FsEvent, FsEventKind, HtmlTransform, Outcome,
    Passthrough, WatchAction,
};

use crate::{page::PageIndex, page::PageOptions, render::Mode};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};

/// Application type declared to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    /// Multi-page: no single root document, every page is its own entry.
    Mpa,
}

/// Entry points handed to the bundler: page name → virtual document id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupOptions {
    pub input: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildContribution {
    pub rollup_options: RollupOptions,
}

/// Configuration merged into the host build tool's config.
///
/// ```json
/// { "appType": "mpa", "build": { "rollupOptions": { "input": { "index": "index.html" } } } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigContribution {
    pub app_type: AppType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildContribution>,
}

/// The adapter selected for this run.
pub enum Plugin {
    Dev(DevAdapter),
    Build(BuildAdapter),
}

impl Plugin {
    /// Discover pages and build the adapter for `mode`.
    pub fn new(mode: Mode, options: PageOptions, base: &str) -> Self {
        match mode {
            Mode::Dev => Self::Dev(DevAdapter::new(options, base)),
            Mode::Build => Self::Build(BuildAdapter::new(&options)),
        }
    }

    pub fn config(&self) -> ConfigContribution {
        match self {
            Self::Dev(dev) => dev.config(),
            Self::Build(build) => build.config(),
        }
    }

    /// Current page index.
    pub fn index(&self) -> Arc<PageIndex> {
        match self {
            Self::Dev(dev) => dev.index(),
            Self::Build(build) => build.index(),
        }
    }
}
