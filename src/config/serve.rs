//! `[serve]` section configuration.
//!
//! Contains development server settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[serve]` section in mpa.toml - development server settings.
///
/// # Example
/// ```toml
/// [serve]
/// interface = "0.0.0.0"  # Listen on all interfaces
/// port = 3000
/// watch = true           # Rediscover pages on file changes
/// base = "/app/"         # URL prefix pages are served under
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    #[serde(default = "defaults::serve::interface")]
    #[educe(Default = defaults::serve::interface())]
    pub interface: String,

    /// HTTP port number (default: 5173).
    #[serde(default = "defaults::serve::port")]
    #[educe(Default = defaults::serve::port())]
    pub port: u16,

    /// Enable file watcher for cache invalidation and page rediscovery.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub watch: bool,

    /// Public base path. Must start with `/`.
    #[serde(default = "defaults::serve::base")]
    #[educe(Default = defaults::serve::base())]
    pub base: String,
}

#[cfg(test)]
mod tests {
    use super::super::MpaConfig;

    #[test]
    fn test_serve_config() {
        let config: MpaConfig = toml::from_str(
            r#"
            [serve]
            interface = "0.0.0.0"
            port = 8080
            watch = false
            base = "/app/"
        "#,
        )
        .unwrap();

        assert_eq!(config.serve.interface, "0.0.0.0");
        assert_eq!(config.serve.port, 8080);
        assert!(!config.serve.watch);
        assert_eq!(config.serve.base, "/app/");
    }

    #[test]
    fn test_serve_config_defaults() {
        let config: MpaConfig = toml::from_str("").unwrap();

        assert_eq!(config.serve.interface, "127.0.0.1");
        assert_eq!(config.serve.port, 5173);
        assert!(config.serve.watch);
        assert_eq!(config.serve.base, "/");
    }

    #[test]
    fn test_serve_config_partial_override() {
        let config: MpaConfig = toml::from_str(
            r#"
            [serve]
            port = 3000
        "#,
        )
        .unwrap();

        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.interface, "127.0.0.1");
        assert!(config.serve.watch);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<MpaConfig, _> = toml::from_str(
            r#"
            [serve]
            unknown_field = "should_fail"
        "#,
        );
        assert!(result.is_err());
    }
}
