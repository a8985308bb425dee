//! Production build host.
//!
//! Drives the [`BuildAdapter`] the way a bundler would: every entry id is
//! resolved, loaded and written to the output directory.
//!
//! ```text
//! build_site()
//!     │
//!     └── for each (name, id) in input()
//!             ├── resolve_id(id)
//!             ├── load(id)            ──► rendered html
//!             ├── minify (optional)
//!             └── write <output>/<name>.html
//! ```

use crate::{adapter::BuildAdapter, config::MpaConfig, log, utils::minify::minify_html};
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Build every page into `config.build.output`. Returns the number written.
pub fn build_site(config: &MpaConfig, adapter: &BuildAdapter) -> Result<usize> {
    let written = write_pages(adapter, &config.build.output, config.build.minify)?;
    log!("build"; "{} pages written to {}", written, config.build.output.display());
    Ok(written)
}

/// Resolve, load and write each virtual document under `output`.
fn write_pages(adapter: &BuildAdapter, output: &Path, minify: bool) -> Result<usize> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let mut written = 0;
    for id in adapter.input().values() {
        let Some(resolved) = adapter.resolve_id(id) else {
            continue;
        };
        let Some(html) = adapter.load(&resolved) else {
            log!("build"; "no page for `{resolved}`, skipped");
            continue;
        };

        let path = output.join(&resolved);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let html = minify_html(&html, minify);
        fs::write(&path, html.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        log!("build"; "{resolved}");
        written += 1;
    }

    Ok(written)
}
