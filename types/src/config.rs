//! User configuration.
//!
//! The engine loads this from `~/.config/caravel/config.toml`; every field
//! has a default so an absent file behaves like an empty one.

use serde::Deserialize;

fn default_true() -> bool {
    true
}

fn default_search_limit() -> u32 {
    20
}

/// Configuration for the Caravel sidecar.
#[derive(Debug, Clone, Deserialize)]
pub struct CaravelConfig {
    /// Run a check pass when the editor reports a save. Default: true.
    #[serde(default = "default_true")]
    pub check_on_save: bool,
    /// Extra arguments appended to `cargo check` (e.g. `["--all-targets"]`).
    #[serde(default)]
    pub cargo_args: Vec<String>,
    /// Maximum number of results per registry search. Default: 20.
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

impl Default for CaravelConfig {
    fn default() -> Self {
        Self {
            check_on_save: true,
            cargo_args: Vec::new(),
            search_limit: default_search_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: CaravelConfig = toml::from_str("").unwrap();
        assert!(config.check_on_save);
        assert!(config.cargo_args.is_empty());
        assert_eq!(config.search_limit, 20);
    }

    #[test]
    fn test_full_config() {
        let config: CaravelConfig = toml::from_str(
            r#"
            check_on_save = false
            cargo_args = ["--all-targets", "--workspace"]
            search_limit = 5
            "#,
        )
        .unwrap();
        assert!(!config.check_on_save);
        assert_eq!(config.cargo_args, vec!["--all-targets", "--workspace"]);
        assert_eq!(config.search_limit, 5);
    }

    #[test]
    fn test_default_matches_empty_deserialization() {
        let from_toml: CaravelConfig = toml::from_str("").unwrap();
        let from_default = CaravelConfig::default();
        assert_eq!(from_toml.check_on_save, from_default.check_on_save);
        assert_eq!(from_toml.cargo_args, from_default.cargo_args);
        assert_eq!(from_toml.search_limit, from_default.search_limit);
    }

    #[test]
    fn test_json_config_also_accepted() {
        // The LSP initializationOptions path hands us JSON, not TOML.
        let config: CaravelConfig =
            serde_json::from_value(serde_json::json!({ "check_on_save": false })).unwrap();
        assert!(!config.check_on_save);
        assert_eq!(config.search_limit, 20);
    }
}
