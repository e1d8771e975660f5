use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{ApnType, OperatingMode, SubscriptionId};

use super::log_level::LogLevel;

/// Top-level configuration schema, loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub general: GeneralConfig,
    pub operating_mode: OperatingModeConfig,
    pub apn_priority: ApnPriorityConfig,
    pub carriers: CarrierConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Emit structured JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json_logs: bool,
    /// True on hardware where only one SIM slot can hold the modem's
    /// attach at a time. When set, [`crate::engine::Engine`] arbitrates
    /// outstanding requests across slots by priority instead of letting
    /// every slot attach independently.
    #[serde(default)]
    pub dual_sim_single_radio: bool,
}

/// Resolves a slot's [`OperatingMode`] when nothing external overrides it.
/// Resolution order: [`Self::override_mode`], then the HAL version
/// threshold, then [`OperatingMode::Legacy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct OperatingModeConfig {
    /// Forces a mode regardless of HAL version. Set from an environment
    /// variable or resource overlay at startup; `None` defers to
    /// `min_hal_version_for_ap_assisted`.
    pub override_mode: Option<OperatingMode>,
    /// Minimum HAL major version that supports AP-assisted mode.
    pub min_hal_version_for_ap_assisted: u32,
}

impl OperatingModeConfig {
    /// Resolves the effective mode given the modem's reported HAL major
    /// version.
    pub fn resolve(&self, hal_major_version: u32) -> OperatingMode {
        if let Some(mode) = self.override_mode {
            return mode;
        }
        if self.min_hal_version_for_ap_assisted > 0 && hal_major_version >= self.min_hal_version_for_ap_assisted {
            OperatingMode::ApAssisted
        } else {
            OperatingMode::Legacy
        }
    }
}

/// Static priority table used to arbitrate between requests for different
/// apn types. Keyed by the same lowercase names [`crate::apndb`] accepts
/// (`default`, `mms`, `supl`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct ApnPriorityConfig {
    pub priorities: HashMap<String, i32>,
}

impl ApnPriorityConfig {
    /// Priority for `apn_type`, or `0` if it's not configured.
    pub fn priority_for(&self, apn_type: ApnType) -> i32 {
        apn_type_name(apn_type).and_then(|name| self.priorities.get(name)).copied().unwrap_or(0)
    }
}

fn apn_type_name(apn_type: ApnType) -> Option<&'static str> {
    Some(match apn_type {
        ApnType::DEFAULT => "default",
        ApnType::MMS => "mms",
        ApnType::SUPL => "supl",
        ApnType::DUN => "dun",
        ApnType::HIPRI => "hipri",
        ApnType::FOTA => "fota",
        ApnType::IMS => "ims",
        ApnType::CBS => "cbs",
        ApnType::IA => "ia",
        ApnType::EMERGENCY => "emergency",
        _ => return None,
    })
}

/// Per-subscription carrier overrides — which package should provide the
/// data service binding for a given SIM's subscription id, when it differs
/// from the platform default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct CarrierConfig {
    pub package_overrides: HashMap<i32, String>,
}

impl CarrierConfig {
    pub fn package_for(&self, subscription: SubscriptionId) -> Option<&str> {
        self.package_overrides.get(&subscription.0).map(String::as_str)
    }
}
