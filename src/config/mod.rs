mod error;
mod log_level;
mod paths;
mod schema;
mod store;

pub use error::ConfigError;
pub use log_level::LogLevel;
pub use paths::ConfigPaths;
pub use schema::{ApnPriorityConfig, CarrierConfig, EngineConfig, GeneralConfig, OperatingModeConfig};
pub use store::ConfigStore;
