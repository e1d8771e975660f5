//! Tracing initialization for the engine process. An embedding binary calls
//! [`init`] once at startup; the engine itself only ever calls into
//! `tracing`'s macros and never touches a subscriber directly.

use std::env;

use thiserror::Error;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogLevel;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Initializes the global tracing subscriber. `RUST_LOG`, if set, overrides
/// `default_level`; otherwise `default_level` (normally read from
/// [`crate::config::GeneralConfig::log_level`]) picks the filter.
/// `json` selects structured output, matching
/// [`crate::config::GeneralConfig::json_logs`].
pub fn init(default_level: LogLevel, json: bool) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry.with(fmt::layer().json().with_target(true).with_level(true)).try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true).with_thread_ids(true))
            .try_init()?;
    }

    Ok(())
}

/// Reads `DCPLANE_LOG_FORMAT`-style override: returns `true` if the
/// caller's environment asks for JSON output regardless of the configured
/// default.
pub fn json_requested_by_env() -> bool {
    parse_json_flag(env::var("DCPLANE_LOG_FORMAT").ok().as_deref())
}

fn parse_json_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_is_case_insensitive() {
        assert!(parse_json_flag(Some("JSON")));
        assert!(parse_json_flag(Some("json")));
        assert!(!parse_json_flag(Some("pretty")));
        assert!(!parse_json_flag(None));
    }
}
