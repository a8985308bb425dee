//! Page rendering: template lookup plus module-script injection.
//!
//! [`Renderer::load_html_content`] is the single path both adapters use to
//! turn a [`Page`] into html. Dev and build differ only in the script `src`
//! (based vs. raw entry path) and in whether the assembled result is cached.
//!
//! ```text
//! load_html_content(page, mode, base)
//!     │
//!     ├── dev: assembled cache hit? ──► return
//!     │
//!     ├── read_template(page.template)   (template cache, fallback on error)
//!     ├── inject_script(template, src)   (idempotent)
//!     └── dev: store in assembled cache
//! ```

mod cache;
mod inject;

pub use cache::TemplateCache;
pub use inject::{build_script_src, inject_script};

use crate::{
    log,
    page::{Page, TemplateSource},
};
use std::{fs, io, path::PathBuf, sync::Arc};
use thiserror::Error;

/// Built-in document used when a page has no template or it cannot be read.
pub const FALLBACK_TEMPLATE: &str = include_str!("../embed/fallback.html");

/// Which adapter is rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Dev,
    Build,
}

/// Rendering errors. Never fatal: they are reported and the fallback is used.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read template `{}`: {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Default error reporter: log through the `template` channel.
pub fn log_render_error(err: &RenderError) {
    log!("template"; "{err}, using fallback");
}

/// Renders pages, owning both caches.
#[derive(Debug, Default)]
pub struct Renderer {
    cache: TemplateCache,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Clear both caches.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// Raw template text for `source`, cached.
    ///
    /// Read failures are passed to `on_error` and the built-in fallback is
    /// cached under the requested source instead.
    pub fn read_template<F>(&self, source: &TemplateSource, on_error: F) -> Arc<str>
    where
        F: Fn(&RenderError),
    {
        let generation = self.cache.generation();
        if let Some(text) = self.cache.template(source) {
            return text;
        }

        let text: Arc<str> = match source {
            TemplateSource::Fallback => Arc::from(FALLBACK_TEMPLATE),
            TemplateSource::File(path) => match fs::read_to_string(path) {
                Ok(text) => Arc::from(text),
                Err(err) => {
                    on_error(&RenderError::TemplateRead {
                        path: path.clone(),
                        source: err,
                    });
                    Arc::from(FALLBACK_TEMPLATE)
                }
            },
        };

        self.cache
            .insert_template(generation, source.clone(), Arc::clone(&text));
        text
    }

    /// Final html for `page`.
    ///
    /// In dev the result is cached per `(base, entry path)`; in build nothing
    /// beyond the raw template is cached. A result whose render overlapped a
    /// cache clear is returned but not cached.
    pub fn load_html_content<F>(&self, page: &Page, mode: Mode, base: &str, on_error: F) -> Arc<str>
    where
        F: Fn(&RenderError),
    {
        let generation = self.cache.generation();
        if mode == Mode::Dev
            && let Some(html) = self.cache.assembled(base, &page.entry_path)
        {
            return html;
        }

        let src = build_script_src(&page.entry_path, mode, base);
        let template = self.read_template(&page.template, on_error);
        let html: Arc<str> = inject_script(&template, &src).into();

        if mode == Mode::Dev {
            self.cache
                .insert_assembled(generation, base, &page.entry_path, Arc::clone(&html));
        }

        html
    }
}
