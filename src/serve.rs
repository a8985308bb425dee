//! Development server.
//!
//! Hosts the [`DevAdapter`] behind a `tiny_http` server:
//!
//! - Page navigations are answered by the adapter
//! - Everything the adapter passes on falls through to static files under
//!   the project root
//! - File watching and debounced rediscovery (via `watch` module)
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │  (File Monitor)  │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    adapter.handle()        handle_fs_event()
//!    static fallback         rebuild_index()
//!          └──────────┬────────────┘
//!                     ▼
//!            Arc<DevAdapter>
//! ```

use crate::{
    adapter::{DevAdapter, DevRequest, DevResponse, Outcome},
    config::MpaConfig,
    log,
    utils::path::{is_path_inside, normalize_path},
    watch::watch_for_changes_blocking,
};
use anyhow::{Context, Result, anyhow};
use std::{
    borrow::Cow,
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the development server with optional file watching.
///
/// Blocks until Ctrl+C is received.
pub fn serve_site(config: &'static MpaConfig, adapter: DevAdapter) -> Result<()> {
    let interface: IpAddr = config.serve.interface.parse()?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);
    let adapter = Arc::new(adapter);

    // Set up Ctrl+C handler for graceful shutdown
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    if config.config_path.is_file() {
        log!("config"; "{}", config.config_path.display());
    }
    log!("serve"; "http://{}{}", addr, adapter.base());
    log!("pages"; "{} pages", adapter.index().len());

    if config.serve.watch {
        let adapter = Arc::clone(&adapter);
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(&adapter) {
                log!("watch"; "{err}");
            }
        });
    }

    let static_root = normalize_path(&config.root);
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &adapter, &static_root) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_err = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
///
/// Resolution order:
/// 1. Page navigation → adapter response (200 / 404 / 500)
/// 2. File under the project root → serve file
/// 3. Nothing found → 404
fn handle_request(request: Request, adapter: &DevAdapter, static_root: &Path) -> Result<()> {
    let method = request.method().to_string();
    let url = request.url().to_owned();
    let accept = request
        .headers()
        .iter()
        .find(|header| header.field.equiv("Accept"))
        .map(|header| header.value.as_str().to_owned());

    let dev_request = DevRequest {
        method: &method,
        url: &url,
        accept: accept.as_deref(),
    };

    match adapter.handle(&dev_request) {
        Outcome::Respond(response) => serve_page(request, response),
        Outcome::Next => serve_static(request, adapter, static_root),
    }
}

/// Fallback handler: static files under the project root.
fn serve_static(request: Request, adapter: &DevAdapter, static_root: &Path) -> Result<()> {
    match static_target(request.url(), adapter, static_root) {
        Some(local_path) => serve_file(request, &local_path),
        None => serve_not_found(request),
    }
}

/// Local file for a request URL, honoring the server base.
fn static_target(url: &str, adapter: &DevAdapter, static_root: &Path) -> Option<PathBuf> {
    let path = url.split('?').next().unwrap_or_default();
    let path = adapter.strip_base(path)?;

    // Decode URL-encoded characters (e.g., %20 → space)
    let path = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
    static_file(static_root, &path)
}

/// Existing file for `request_path`, never outside `root`.
fn static_file(root: &Path, request_path: &str) -> Option<PathBuf> {
    let local_path = normalize_path(&root.join(request_path.trim_matches('/')));
    (local_path.is_file() && is_path_inside(&local_path, root)).then_some(local_path)
}

// ============================================================================
// Response Helpers
// ============================================================================

fn content_type(value: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", value).map_err(|()| anyhow!("invalid header value `{value}`"))
}

/// Send a rendered page.
fn serve_page(request: Request, page: DevResponse) -> Result<()> {
    let response = Response::from_string(page.body)
        .with_status_code(StatusCode(page.status))
        .with_header(content_type(DevResponse::CONTENT_TYPE)?);
    request.respond(response)?;
    Ok(())
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let response = Response::from_data(content).with_header(content_type(guess_content_type(path))?);
    request.respond(response)?;
    Ok(())
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![content_type("text/plain")?],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Content Type Detection
// ============================================================================

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs" | "ts" | "tsx" | "jsx" | "mts") => "application/javascript; charset=utf-8",
        Some("json" | "map") => "application/json; charset=utf-8",
        Some("wasm") => "application/wasm",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        Some("txt") => "text/plain; charset=utf-8",

        // Default binary
        _ => "application/octet-stream",
    }
}
