//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [pages] Section Defaults
// ============================================================================

pub mod pages {
    use super::super::EntryFiles;
    use std::path::PathBuf;

    pub fn dir() -> PathBuf {
        "src/pages".into()
    }

    pub fn entry() -> EntryFiles {
        EntryFiles::One("main.ts".into())
    }

    pub fn template() -> PathBuf {
        "src/index.html".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5173
    }

    pub fn base() -> String {
        "/".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn output() -> PathBuf {
        "dist".into()
    }
}
