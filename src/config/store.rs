use std::fs;

use futures::Stream;

use crate::common::Property;

use super::error::ConfigError;
use super::paths::ConfigPaths;
use super::schema::EngineConfig;

/// Holds the engine's configuration and notifies watchers when it changes.
///
/// Unlike the per-path change stream of a GUI-facing config store, the
/// engine only ever cares about the config as a whole: a reload either
/// leaves a slot's settings untouched or it doesn't, and the reducers react
/// to the new snapshot rather than to individual field diffs.
#[derive(Clone)]
pub struct ConfigStore {
    current: Property<EngineConfig>,
}

impl ConfigStore {
    /// Creates a store seeded with [`EngineConfig::default`].
    pub fn with_defaults() -> Self {
        Self { current: Property::new(EngineConfig::default()) }
    }

    /// Creates a store seeded with a caller-supplied snapshot, bypassing
    /// the on-disk file. Used by tests that need a specific configuration
    /// without writing a fixture file.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { current: Property::new(config) }
    }

    /// Loads the store from the on-disk configuration file. A missing file
    /// is treated as an empty config, falling back to defaults; a malformed
    /// one is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = ConfigPaths::main_config()?;
        let config = match fs::read_to_string(&path) {
            Ok(raw) => toml::from_str(&raw)
                .map_err(|source| ConfigError::Parse { path: path.clone(), source })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => EngineConfig::default(),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Ok(Self { current: Property::new(config) })
    }

    /// Re-reads the configuration file and publishes the new snapshot.
    /// Watchers are only notified if the reload actually changed something.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let path = ConfigPaths::main_config()?;
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io { path: path.clone(), source })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?;
        self.current.set(config);
        Ok(())
    }

    /// Writes the current configuration to disk, creating the config
    /// directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = ConfigPaths::main_config()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io { path: path.clone(), source })?;
        }
        let raw = toml::to_string_pretty(&self.get_current())?;
        fs::write(&path, raw).map_err(|source| ConfigError::Io { path, source })
    }

    /// Returns a clone of the current configuration snapshot.
    pub fn get_current(&self) -> EngineConfig {
        self.current.get()
    }

    /// Streams configuration snapshots, starting with the current one and
    /// yielding again each time [`Self::reload`] applies a real change.
    pub fn watch(&self) -> impl Stream<Item = EngineConfig> + Send {
        self.current.watch()
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let store = ConfigStore::with_defaults();
        let raw = toml::to_string_pretty(&store.get_current()).expect("serialize");
        let parsed: EngineConfig = toml::from_str(&raw).expect("parse");
        assert_eq!(parsed, store.get_current());
    }

    #[tokio::test]
    async fn watch_yields_current_snapshot_immediately() {
        let store = ConfigStore::with_defaults();
        let mut stream = Box::pin(store.watch());
        let first = stream.next().await.expect("initial snapshot");
        assert_eq!(first, EngineConfig::default());
    }
}
