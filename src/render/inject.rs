//! Module-script injection.
//!
//! Every rendered page carries exactly one
//! `<script type="module" src="…"></script>` pointing at its entry. Injection
//! is idempotent: html that already references the entry as a module script
//! passes through untouched, whatever its attribute order, quoting or case.

use super::Mode;
use crate::utils::path::{ensure_trailing_slash, escape_regex};
use regex::Regex;
use std::{borrow::Cow, sync::LazyLock};

/// First closing body tag.
static BODY_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</body\s*>").unwrap());

/// Opening script tags, capturing the attribute text.
static SCRIPT_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<script\b([^>]*)>").unwrap());

/// `type="module"` in any quoting style.
static TYPE_MODULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)(?:^|\s)type\s*=\s*(?:"module"|'module'|module(?:\s|/|$))"#).unwrap()
});

/// The tag injected for `src`.
pub fn script_tag(src: &str) -> String {
    format!(r#"<script type="module" src="{src}"></script>"#)
}

/// Check whether `html` already has a module script pointing at `src`.
pub fn has_module_script(html: &str, src: &str) -> bool {
    let escaped = escape_regex(src);
    let Ok(src_attr) = Regex::new(&format!(
        r#"(?is)(?:^|\s)src\s*=\s*(?:"{escaped}"|'{escaped}'|{escaped}(?:\s|/|$))"#
    )) else {
        return false;
    };

    SCRIPT_OPEN
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .any(|attrs| TYPE_MODULE.is_match(attrs.as_str()) && src_attr.is_match(attrs.as_str()))
}

/// Insert a module script for `src` before the first `</body>`.
///
/// Appends the tag when the document has no closing body tag. Returns the
/// input unchanged when an equivalent tag is already present.
pub fn inject_script<'a>(html: &'a str, src: &str) -> Cow<'a, str> {
    if has_module_script(html, src) {
        return Cow::Borrowed(html);
    }

    let tag = script_tag(src);
    match BODY_CLOSE.find(html) {
        Some(body) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..body.start()]);
            out.push_str(&tag);
            out.push_str(&html[body.start()..]);
            Cow::Owned(out)
        }
        None => Cow::Owned(format!("{html}{tag}")),
    }
}

/// Script `src` for an entry.
///
/// - build: the entry path as-is, left for the bundler to rewrite
/// - dev: served under the base path, `("/app", "/src/main.ts")` → `/app/src/main.ts`
pub fn build_script_src(entry_path: &str, mode: Mode, base: &str) -> String {
    match mode {
        Mode::Build => entry_path.to_owned(),
        Mode::Dev => format!(
            "{}{}",
            ensure_trailing_slash(base),
            entry_path.trim_start_matches('/')
        ),
    }
}
