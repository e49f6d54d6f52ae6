//! Where walkie keeps its config file.

use std::path::{Path, PathBuf};
use tracing::info;
use walkie_common::ConfigError;

use super::template::default_config_toml;

const APP_DIR: &str = "walkie";
const CONFIG_FILE: &str = "config.toml";

/// `<platform config dir>/walkie/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("no platform config directory".into()))?;
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// Write the commented template to `path`, creating its directory.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_err = |what: &str, at: &Path, e: std::io::Error| {
        ConfigError::WriteError(format!("{what} {}: {e}", at.display()))
    };

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| write_err("cannot create", dir, e))?;
    }
    std::fs::write(path, default_config_toml())
        .map_err(|e| write_err("cannot write walkie config to", path, e))?;

    info!(path = %path.display(), "Seeded default walkie config");
    Ok(())
}
