use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The two packet-data bearers a session can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Transport {
    /// Cellular wide-area bearer.
    Wwan,
    /// Carrier Wi-Fi bearer.
    Wlan,
}

/// How a SIM slot is wired up: whether IWLAN has its own data service or is
/// just another cellular radio type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum OperatingMode {
    /// Only WWAN is available. IWLAN, if reported at all, comes in as a
    /// cellular radio type rather than a distinct transport.
    #[default]
    Legacy,
    /// Both WWAN and WLAN are available through separate data services.
    ApAssisted,
}

impl OperatingMode {
    /// Transports reachable in this mode.
    pub fn available_transports(self) -> &'static [Transport] {
        match self {
            OperatingMode::Legacy => &[Transport::Wwan],
            OperatingMode::ApAssisted => &[Transport::Wwan, Transport::Wlan],
        }
    }
}

/// Radio access network types the policy oracle and modem report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessNetwork {
    Geran,
    Utran,
    Eutran,
    Cdma2000,
    Ngran,
    Iwlan,
}

impl AccessNetwork {
    /// Maps an access network to the transport that carries it.
    ///
    /// `{GERAN, UTRAN, EUTRAN, CDMA2000, NGRAN} -> WWAN`, `{IWLAN} -> WLAN`.
    pub fn transport(self) -> Transport {
        match self {
            AccessNetwork::Iwlan => Transport::Wlan,
            AccessNetwork::Geran
            | AccessNetwork::Utran
            | AccessNetwork::Eutran
            | AccessNetwork::Cdma2000
            | AccessNetwork::Ngran => Transport::Wwan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_mode_only_exposes_wwan() {
        assert_eq!(OperatingMode::Legacy.available_transports(), &[Transport::Wwan]);
    }

    #[test]
    fn ap_assisted_exposes_both_transports() {
        assert_eq!(
            OperatingMode::ApAssisted.available_transports(),
            &[Transport::Wwan, Transport::Wlan]
        );
    }

    #[test]
    fn iwlan_maps_to_wlan_transport() {
        assert_eq!(AccessNetwork::Iwlan.transport(), Transport::Wlan);
    }

    #[test]
    fn cellular_access_networks_map_to_wwan() {
        for an in [
            AccessNetwork::Geran,
            AccessNetwork::Utran,
            AccessNetwork::Eutran,
            AccessNetwork::Cdma2000,
            AccessNetwork::Ngran,
        ] {
            assert_eq!(an.transport(), Transport::Wwan);
        }
    }
}
