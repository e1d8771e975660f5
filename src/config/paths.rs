use std::env;
use std::path::PathBuf;

use super::error::ConfigError;

/// Locates the engine's configuration file, following the XDG Base
/// Directory specification.
pub struct ConfigPaths;

impl ConfigPaths {
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let config_home = env::var("XDG_CONFIG_HOME")
            .or_else(|_| env::var("HOME").map(|home| format!("{home}/.config")))
            .map_err(|_| ConfigError::NoConfigHome)?;
        Ok(PathBuf::from(config_home).join("dcplane"))
    }

    pub fn main_config() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}
