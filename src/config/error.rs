use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on '{path}': {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to parse TOML at '{path}': {source}")]
    Parse { path: PathBuf, #[source] source: toml::de::Error },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    NoConfigHome,
}
