//! File system watcher for the development server.
//!
//! Forwards file events to the [`DevAdapter`] as they arrive (so template
//! edits are visible on the next request) and coalesces the events that
//! change the page set into one rediscovery per quiet window.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Loop                              │
//! │                                                              │
//! │  ┌──────────┐    ┌──────────────────┐    ┌───────────────┐   │
//! │  │ notify   │───▶│ handle_fs_event  │───▶│   Debouncer   │   │
//! │  │ events   │    │ (cache clearing) │    │   (100ms)     │   │
//! │  └──────────┘    └──────────────────┘    └───────┬───────┘   │
//! │                                                  ▼           │
//! │                                          rebuild_index()     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::{
    adapter::{DevAdapter, FsEvent, FsEventKind, WatchAction},
    log,
    page::is_ignored_dir_name,
};
use anyhow::{Context, Result};
use notify::{
    Event, EventKind, RecursiveMode, Watcher,
    event::ModifyKind,
};
use rustc_hash::FxHashSet;
use std::{
    path::{Component, Path, PathBuf},
    sync::mpsc::{RecvTimeoutError, channel},
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 100;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Check if any directory between `root` and `path` is one discovery skips.
///
/// Paths outside `root` are never considered ignored.
fn in_ignored_dir(path: &Path, root: &Path) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return false;
    };
    let dirs = rel.parent().map(Path::components).into_iter().flatten();

    dirs.filter_map(|component| match component {
        Component::Normal(name) => name.to_str(),
        _ => None,
    })
    .any(is_ignored_dir_name)
}

/// Format path as relative to root for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Translate a notify event into adapter events.
///
/// Renames are reported per path: a path that still exists was added, one
/// that does not was unlinked.
fn fs_events(event: Event, root: &Path) -> Vec<FsEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => Some(FsEventKind::Add),
        EventKind::Remove(_) => Some(FsEventKind::Unlink),
        EventKind::Modify(ModifyKind::Name(_)) => None,
        EventKind::Modify(_) => Some(FsEventKind::Change),
        _ => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .filter(|path| !is_temp_file(path) && !in_ignored_dir(path, root))
        .map(|path| {
            let kind = kind.unwrap_or_else(|| {
                if path.exists() {
                    FsEventKind::Add
                } else {
                    FsEventKind::Unlink
                }
            });
            FsEvent::new(kind, path)
        })
        .collect()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Coalesces rescans: every new trigger pushes the deadline back.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, path: PathBuf) {
        self.pending.insert(path);
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Apply events to the adapter, queueing paths that need a rescan.
fn handle_events(events: Vec<FsEvent>, adapter: &DevAdapter, debouncer: &mut Debouncer) {
    let root = &adapter.options().root;

    for event in events {
        match adapter.handle_fs_event(&event) {
            WatchAction::RescanScheduled => debouncer.add(event.path),
            WatchAction::CachesCleared => {
                log!("watch"; "{} changed, template cache cleared", rel_path(&event.path, root));
            }
            WatchAction::None => {}
        }
    }
}

/// Rebuild the page index after a quiet window.
fn rescan(paths: &[PathBuf], adapter: &DevAdapter) {
    let root = &adapter.options().root;
    let trigger: Vec<_> = paths.iter().map(|p| rel_path(p, root)).collect();

    let count = adapter.rebuild_index();
    log!("pages"; "{} changed, {} pages", trigger.join(", "), count);
}

// =============================================================================
// Watcher Setup
// =============================================================================

/// A directory watched once it exists.
///
/// Until then its nearest existing ancestor is watched non-recursively, so
/// each missing level is noticed as it is created. Ancestor watches are kept
/// after the target appears: they only add events outside the pages root,
/// which the adapter ignores.
struct DeferredWatch {
    name: &'static str,
    target: PathBuf,
    mode: RecursiveMode,
    ancestor: Option<PathBuf>,
    active: bool,
}

impl DeferredWatch {
    fn new(name: &'static str, target: PathBuf, mode: RecursiveMode) -> Self {
        Self {
            name,
            target,
            mode,
            ancestor: None,
            active: false,
        }
    }

    /// Watch the target if it now exists, otherwise move the ancestor watch
    /// down to the deepest existing level.
    ///
    /// Returns `true` when this call started watching the target.
    fn refresh(&mut self, watcher: &mut impl Watcher) -> Result<bool> {
        if self.active {
            return Ok(false);
        }

        if self.target.is_dir() {
            watcher
                .watch(&self.target, self.mode)
                .with_context(|| format!("Failed to watch {}: {}", self.name, self.target.display()))?;
            self.active = true;
            return Ok(true);
        }

        let ancestor = nearest_existing_ancestor(&self.target);
        if ancestor != self.ancestor {
            if let Some(dir) = &ancestor {
                watcher
                    .watch(dir, RecursiveMode::NonRecursive)
                    .with_context(|| format!("Failed to watch {}", dir.display()))?;
            }
            self.ancestor = ancestor;
        }
        Ok(false)
    }
}

fn nearest_existing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors().skip(1).find(|dir| dir.is_dir()).map(Path::to_path_buf)
}

/// Watches for the pages root (recursive) and the default template's
/// directory, unless the template already lives under the pages root.
fn deferred_watches(adapter: &DevAdapter) -> Vec<DeferredWatch> {
    let options = adapter.options();
    let pages_root = options.pages_root();
    let template_dir = options.template.parent().map(Path::to_path_buf);

    let mut watches = vec![DeferredWatch::new(
        "pages",
        pages_root.clone(),
        RecursiveMode::Recursive,
    )];
    if let Some(dir) = template_dir
        && !dir.starts_with(&pages_root)
    {
        watches.push(DeferredWatch::new("template", dir, RecursiveMode::NonRecursive));
    }
    watches
}

/// Refresh every pending watch; a target that just appeared may hold pages
/// or the default template, so it schedules a rescan.
///
/// A directory removed again before it could be watched is retried on the
/// next event.
fn refresh_watches(
    watches: &mut [DeferredWatch],
    watcher: &mut impl Watcher,
    adapter: &DevAdapter,
    debouncer: &mut Debouncer,
) {
    let root = &adapter.options().root;

    for watch in watches.iter_mut().filter(|watch| !watch.active) {
        match watch.refresh(watcher) {
            Ok(true) => {
                log!("watch"; "{}: {}/", watch.name, rel_path(&watch.target, root));
                debouncer.add(watch.target.clone());
            }
            Ok(false) => {}
            Err(e) => log!("watch"; "{e:#}"),
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debounced rediscovery.
pub fn watch_for_changes_blocking(adapter: &DevAdapter) -> Result<()> {
    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;

    let root = adapter.options().pages_root();
    let mut watches = deferred_watches(adapter);
    for watch in &mut watches {
        if watch.refresh(&mut watcher)? {
            log!("watch"; "{}: {}/", watch.name, rel_path(&watch.target, &adapter.options().root));
        } else {
            log!("watch"; "{} directory {} not found, waiting for it", watch.name, watch.target.display());
        }
    }

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) => {
                handle_events(fs_events(event, &root), adapter, &mut debouncer);
                refresh_watches(&mut watches, &mut watcher, adapter, &mut debouncer);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                rescan(&debouncer.take(), adapter);
            }
            Err(RecvTimeoutError::Disconnected) => break,
            // Timeout while still inside the debounce window
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    Ok(())
}
