//! Optional config file for defaults that rarely change per invocation
//!
//! Looked up in the working directory first (`kubeforge.toml`), then under
//! the user config directory. Absent or unreadable files fall back to
//! defaults; command-line flags always win over file values.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Default target namespace
    pub namespace: Option<String>,

    /// Default domain suffix for ingress hostnames
    pub host_suffix: Option<String>,

    /// Whether to run the pre-flight inventory listing
    pub preflight: Option<bool>,
}

impl Config {
    /// Load the first readable config file, or defaults when there is none
    pub fn load() -> Self {
        Self::candidate_paths()
            .into_iter()
            .find_map(|path| fs::read_to_string(path).ok())
            .and_then(|content| toml::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("kubeforge.toml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("kubeforge").join("config.toml"));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
            namespace = "staging"
            host_suffix = "apps.example.com"
            preflight = false
            "#,
        )
        .unwrap();

        assert_eq!(config.namespace.as_deref(), Some("staging"));
        assert_eq!(config.host_suffix.as_deref(), Some("apps.example.com"));
        assert_eq!(config.preflight, Some(false));
    }

    #[test]
    fn test_empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.namespace.is_none());
        assert!(config.host_suffix.is_none());
        assert!(config.preflight.is_none());
    }
}
