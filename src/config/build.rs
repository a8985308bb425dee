//! `[build]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in mpa.toml - production output settings.
///
/// # Example
/// ```toml
/// [build]
/// output = "dist"
/// minify = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Output directory for rendered pages. Absolute after loading.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Minify rendered html.
    #[serde(default)]
    pub minify: bool,
}

#[cfg(test)]
mod tests {
    use super::super::MpaConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: MpaConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert!(!config.build.minify);
    }

    #[test]
    fn test_build_config() {
        let config: MpaConfig = toml::from_str(
            r#"
            [build]
            output = "public"
            minify = true
        "#,
        )
        .unwrap();

        assert_eq!(config.build.output, PathBuf::from("public"));
        assert!(config.build.minify);
    }
}
