//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use caravel_types::CaravelConfig;

/// `~/.config/caravel/config.toml` (platform equivalent via `dirs`).
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("caravel").join("config.toml"))
}

/// Load the user configuration. A missing file is the defaults; a present
/// but malformed file is an error — silently ignoring a config the user
/// wrote is worse than refusing to start.
pub fn load_config() -> Result<CaravelConfig> {
    let Some(path) = config_path() else {
        return Ok(CaravelConfig::default());
    };
    load_config_from(&path)
}

fn load_config_from(path: &Path) -> Result<CaravelConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(CaravelConfig::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading config {}", path.display()));
        }
    };
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}
