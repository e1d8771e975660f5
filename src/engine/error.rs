use thiserror::Error;

use crate::apndb::ApnParseError;
use crate::config::ConfigError;
use crate::radio::RadioError;

/// Top-level error surfaced by [`super::Engine`] setup and query operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("radio error: {0}")]
    Radio(#[from] RadioError),

    #[error("apn database error: {0}")]
    ApnDatabase(#[from] ApnParseError),

    #[error("unknown slot {0:?}")]
    UnknownSlot(crate::model::SlotId),

    #[error("transport {0:?} is not configured for this slot")]
    TransportNotConfigured(crate::model::Transport),
}
