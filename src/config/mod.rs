//! Project configuration management for `mpa.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `[pages]`   | Pages root, entry file names, default template     |
//! | `[serve]`   | Development server (port, interface, watch, base)  |
//! | `[build]`   | Production output directory and minification       |
//!
//! The file is optional: a project with no `mpa.toml` runs on defaults.
//!
//! # Example
//!
//! ```toml
//! [pages]
//! dir = "src/pages"
//! entry = ["main.ts", "main.tsx"]
//! template = "src/index.html"
//!
//! [serve]
//! port = 5173
//!
//! [build]
//! output = "dist"
//! minify = true
//! ```

mod build;
pub mod defaults;
mod error;
mod pages;
mod serve;

pub use pages::EntryFiles;

use build::BuildConfig;
use error::ConfigError;
use pages::PagesConfig;
use serve::ServeConfig;

use crate::{
    cli::{Cli, Commands},
    page::PageOptions,
    utils::path::normalize_path,
};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing mpa.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct MpaConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory (set after loading)
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    /// Page discovery settings
    #[serde(default)]
    pub pages: PagesConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Production build settings
    #[serde(default)]
    pub build: BuildConfig,
}

impl MpaConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: MpaConfig = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load, apply CLI overrides, and validate.
    ///
    /// A missing config file is not an error; defaults apply.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };

        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Absolute pages root.
    pub fn pages_root(&self) -> PathBuf {
        self.root.join(&self.pages.dir)
    }

    /// Discovery inputs derived from `[pages]`.
    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            root: self.root.clone(),
            pages_dir: self.pages.dir.clone(),
            entries: self.pages.entry.names().to_vec(),
            template: self.pages.template.clone(),
        }
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        self.root = normalize_path(root);
        self.config_path = normalize_path(&self.root.join(&cli.config));

        Self::update_option(&mut self.pages.dir, cli.pages.as_ref());
        Self::update_option(&mut self.pages.template, cli.template.as_ref());
        if !cli.entry.is_empty() {
            self.pages.entry = EntryFiles::Many(cli.entry.clone());
        }

        match &cli.command {
            Commands::Serve {
                interface,
                port,
                watch,
                base,
            } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
                Self::update_option(&mut self.serve.base, base.as_ref());
            }
            Commands::Build { output, minify } => {
                Self::update_option(&mut self.build.output, output.as_ref());
                Self::update_option(&mut self.build.minify, minify.as_ref());
            }
            _ => {}
        }

        self.update_path_with_root();
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Make file paths absolute against the project root.
    ///
    /// `pages.dir` stays relative: its POSIX form is part of every entry path.
    fn update_path_with_root(&mut self) {
        self.pages.template = normalize_path(&self.root.join(&self.pages.template));
        self.build.output = normalize_path(&self.root.join(&self.build.output));

        if self.pages.dir.is_absolute()
            && let Ok(rel) = self.pages.dir.strip_prefix(&self.root)
        {
            self.pages.dir = rel.to_path_buf();
        }
    }

    /// Validate configuration values that serde cannot check.
    pub fn validate(&self) -> Result<()> {
        let entries = self.pages.entry.names();
        if entries.is_empty() {
            bail!(ConfigError::Validation(
                "[pages.entry] must name at least one file".into()
            ));
        }

        if let Some(bad) = entries
            .iter()
            .find(|name| name.is_empty() || name.contains(['/', '\\']))
        {
            bail!(ConfigError::Validation(format!(
                "[pages.entry] `{bad}` must be a bare file name"
            )));
        }

        if !self.serve.base.starts_with('/') {
            bail!(ConfigError::Validation(
                "[serve.base] must start with `/`".into()
            ));
        }

        if self.serve.interface.parse::<std::net::IpAddr>().is_err() {
            bail!(ConfigError::Validation(format!(
                "[serve.interface] `{}` is not an IP address",
                self.serve.interface
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("mpa").chain(args.iter().copied()))
    }

    #[test]
    fn test_from_str_full() {
        let config = MpaConfig::from_str(
            r#"
            [pages]
            dir = "web/pages"
            entry = ["main.ts", "main.tsx"]
            template = "web/index.html"

            [serve]
            port = 3000

            [build]
            output = "out"
            minify = true
        "#,
        )
        .unwrap();

        assert_eq!(config.pages.dir, PathBuf::from("web/pages"));
        assert_eq!(config.pages.entry.names().len(), 2);
        assert_eq!(config.serve.port, 3000);
        assert!(config.build.minify);
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(MpaConfig::from_str("[pages\ndir = 1").is_err());
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result = MpaConfig::from_str(
            r#"
            [unknown_section]
            field = "value"
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_default_root() {
        let config = MpaConfig::default();
        assert_eq!(config.root, PathBuf::from("./"));
        assert_eq!(config.serve.port, 5173);
    }

    #[test]
    fn test_load_without_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let config = MpaConfig::load(&cli(&["--root", root, "pages"])).unwrap();

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.root, root);
        assert_eq!(config.pages_root(), root.join("src/pages"));
        assert_eq!(config.pages.template, root.join("src/index.html"));
        assert_eq!(config.build.output, root.join("dist"));
    }

    #[test]
    fn test_load_applies_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("mpa.toml"),
            "[serve]\nport = 4000\nbase = \"/app/\"\n",
        )
        .unwrap();
        let root = dir.path().to_str().unwrap();

        let config = MpaConfig::load(&cli(&[
            "--root", root, "--entry", "main.tsx", "serve", "--port", "4100",
        ]))
        .unwrap();

        assert_eq!(config.serve.port, 4100);
        assert_eq!(config.serve.base, "/app/");
        assert_eq!(config.pages.entry.names(), ["main.tsx"]);
    }

    #[test]
    fn test_validate_rejects_bad_base() {
        let mut config = MpaConfig::default();
        config.serve.base = "app/".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[serve.base]"));
    }

    #[test]
    fn test_validate_rejects_nested_entry_name() {
        let mut config = MpaConfig::default();
        config.pages.entry = EntryFiles::Many(vec!["src/main.ts".into()]);
        assert!(config.validate().is_err());

        config.pages.entry = EntryFiles::Many(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_options() {
        let mut config = MpaConfig::default();
        config.root = PathBuf::from("/proj");
        config.pages.entry = EntryFiles::Many(vec!["main.ts".into(), "main.tsx".into()]);

        let options = config.page_options();
        assert_eq!(options.root, PathBuf::from("/proj"));
        assert_eq!(options.pages_dir, PathBuf::from("src/pages"));
        assert_eq!(options.entries, vec!["main.ts", "main.tsx"]);
    }
}
