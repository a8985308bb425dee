//! Template and assembled-html caches.
//!
//! Two independent stores, both living as long as the renderer:
//!
//! | Store       | Key                         | Value               | Used in     |
//! |-------------|-----------------------------|---------------------|-------------|
//! | templates   | [`TemplateSource`]          | raw template text   | dev + build |
//! | assembled   | (base, entry path)          | injected html       | dev only    |
//!
//! There is no eviction. Any html change on disk clears both stores, since
//! the watcher cannot tell which entries the change affects.
//!
//! Renders and clears run on different threads. Every clear bumps a
//! generation counter while holding both write locks; an insert carries the
//! generation its render started under and is dropped if a clear happened
//! in between, so text read before a clear never outlives it.

use crate::page::TemplateSource;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

type AssembledKey = (String, String);

#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: RwLock<FxHashMap<TemplateSource, Arc<str>>>,
    assembled: RwLock<FxHashMap<AssembledKey, Arc<str>>>,
    generation: AtomicU64,
}

impl TemplateCache {
    /// Cached raw template text.
    pub fn template(&self, source: &TemplateSource) -> Option<Arc<str>> {
        self.templates.read().get(source).cloned()
    }

    /// Current generation, captured before reading anything to insert.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store template text read under `generation`. Returns `false` when a
    /// clear happened since, leaving the cache untouched.
    pub fn insert_template(&self, generation: u64, source: TemplateSource, text: Arc<str>) -> bool {
        let mut templates = self.templates.write();
        if self.generation() != generation {
            return false;
        }
        templates.insert(source, text);
        true
    }

    /// Cached html for an entry rendered under `base`.
    pub fn assembled(&self, base: &str, entry_path: &str) -> Option<Arc<str>> {
        self.assembled
            .read()
            .get(&(base.to_owned(), entry_path.to_owned()))
            .cloned()
    }

    /// Store html rendered under `generation`, see [`Self::insert_template`].
    pub fn insert_assembled(&self, generation: u64, base: &str, entry_path: &str, html: Arc<str>) -> bool {
        let mut assembled = self.assembled.write();
        if self.generation() != generation {
            return false;
        }
        assembled.insert((base.to_owned(), entry_path.to_owned()), html);
        true
    }

    /// Drop every cached template and assembled page.
    pub fn clear(&self) {
        let mut templates = self.templates.write();
        let mut assembled = self.assembled.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        templates.clear();
        assembled.clear();
    }

    #[cfg(test)]
    pub fn template_count(&self) -> usize {
        self.templates.read().len()
    }

    #[cfg(test)]
    pub fn assembled_count(&self) -> usize {
        self.assembled.read().len()
    }
}
