//! Top-level wiring: one [`connection::DcController`] + [`transport::TransportManager`]
//! pair per SIM slot, a [`request::RequestRegistry`] + [`request::DispatchStateMachine`]
//! per slot, and an engine-wide [`settings::DataEnabledSettings`]. Holds no
//! process-wide statics — every piece of state lives behind the returned
//! `Arc<Engine>`.

mod error;
mod slot;

pub use error::EngineError;
pub use slot::SlotEngine;

use std::collections::HashMap;
use std::sync::Arc;

use crate::connection::{DcController, RetryManager};
use crate::config::ConfigStore;
use crate::model::{ApnProfile, ApnType, RequestId, SlotId, Transport};
use crate::radio::DataServiceBinding;
use crate::request::{select_top_priority_slot, RequestInfo};
use crate::settings::DataEnabledSettings;
use crate::transport::QualifiedNetworksUpdate;

/// Retry delay ladder shared by every [`DcController`]. Matches the
/// teacher's convention of a small, hand-tuned constant table rather than
/// a config-driven schedule — retry timing is an engine implementation
/// detail, not something an integrator is expected to tune per deployment.
fn default_retry_manager() -> RetryManager {
    RetryManager::new(
        vec![
            std::time::Duration::from_secs(1),
            std::time::Duration::from_secs(5),
            std::time::Duration::from_secs(20),
        ],
        5,
        0.2,
    )
}

/// Everything the engine needs for one slot at startup: the modem's
/// reported HAL version (resolves [`OperatingMode`] against config unless
/// overridden) and a bound [`DataServiceBinding`] per transport this slot
/// will actually use.
pub struct SlotInit {
    pub slot: SlotId,
    pub hal_major_version: u32,
    pub bindings: HashMap<Transport, Arc<DataServiceBinding>>,
}

/// Owns every per-slot engine and the settings shared across all of them.
pub struct Engine {
    config: ConfigStore,
    settings: Arc<DataEnabledSettings>,
    slots: HashMap<SlotId, SlotEngine>,
}

impl Engine {
    /// Builds a running engine from the given configuration and per-slot
    /// bindings. In [`OperatingMode::Legacy`] a slot only needs a
    /// [`Transport::Wwan`] binding; [`OperatingMode::ApAssisted`] additionally
    /// uses a [`Transport::Wlan`] binding if one was supplied.
    pub fn init(config: ConfigStore, slot_inits: Vec<SlotInit>) -> Arc<Engine> {
        let snapshot = config.get_current();
        let mut slots = HashMap::new();

        for init in slot_inits {
            let mode = snapshot.operating_mode.resolve(init.hal_major_version);
            let mut controllers = HashMap::new();
            for transport in mode.available_transports() {
                if let Some(binding) = init.bindings.get(transport) {
                    let controller =
                        DcController::new(*transport, init.slot, Arc::clone(binding), default_retry_manager());
                    controllers.insert(*transport, controller);
                }
            }
            slots.insert(init.slot, SlotEngine::new(init.slot, mode, controllers));
        }

        Arc::new(Engine { config, settings: Arc::new(DataEnabledSettings::new()), slots })
    }

    pub fn data_enabled_settings(&self) -> &Arc<DataEnabledSettings> {
        &self.settings
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn slot(&self, slot: SlotId) -> Result<&SlotEngine, EngineError> {
        self.slots.get(&slot).ok_or(EngineError::UnknownSlot(slot))
    }

    pub fn slots(&self) -> impl Iterator<Item = &SlotEngine> {
        self.slots.values()
    }

    /// Priority configured for `apn_type`, read live from the config store
    /// so a reload takes effect on the next request without restarting the
    /// engine.
    pub fn priority_for(&self, apn_type: ApnType) -> i32 {
        self.config.get_current().apn_priority.priority_for(apn_type)
    }

    pub async fn submit_request(
        &self,
        slot: SlotId,
        apn_type: ApnType,
        id: RequestId,
        profile: ApnProfile,
    ) -> Result<(), EngineError> {
        if !self.settings.is_enabled() {
            return Ok(());
        }
        let priority = self.priority_for(apn_type);
        self.slot(slot)?.submit_request(RequestInfo { id, apn_type, priority, executed: false }, profile).await;
        if self.config.get_current().general.dual_sim_single_radio {
            self.arbitrate_cross_slot().await;
        }
        Ok(())
    }

    /// On hardware where only one slot can hold the modem's attach, picks
    /// the single highest-priority outstanding request across every slot
    /// and every apn type, then tears down every session on every losing
    /// slot wholesale — a full `DisconnectAll` rather than demoting just
    /// the contested apn type. Losing slots' requests stay registered,
    /// just not executing.
    async fn arbitrate_cross_slot(&self) {
        let candidates: Vec<(SlotId, Option<RequestInfo>)> =
            self.slots.values().map(|s| (s.slot(), s.top_priority_request_any())).collect();
        let Some(winner) = select_top_priority_slot(&candidates) else { return };
        for slot in self.slots.values() {
            if slot.slot() != winner && slot.top_priority_request_any().is_some() {
                slot.demote_all().await;
            }
        }
    }

    pub async fn release_request(&self, slot: SlotId, apn_type: ApnType, id: &RequestId) -> Result<(), EngineError> {
        self.slot(slot)?.release_request(apn_type, id).await;
        Ok(())
    }

    pub async fn handle_qualified_networks_update(
        &self,
        slot: SlotId,
        update: QualifiedNetworksUpdate,
    ) -> Result<(), EngineError> {
        self.slot(slot)?.handle_qualified_networks_update(update).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio_stream::wrappers::WatchStream;

    use super::*;
    use crate::config::EngineConfig;
    use crate::model::{AuthType, Cid, DataCallResponse, DataCallStatus, IpProtocol, LinkStatus, MvnoMatchType, OperationToken, RetryHint};
    use crate::radio::{RadioError, RadioFacade};
    use crate::request::DispatchState;

    struct AlwaysSucceedsFacade;

    #[async_trait]
    impl RadioFacade for AlwaysSucceedsFacade {
        async fn setup_data_call(
            &self,
            _slot: SlotId,
            _apn_type: ApnType,
            _apn: &ApnProfile,
            _token: OperationToken,
        ) -> Result<DataCallResponse, RadioError> {
            Ok(DataCallResponse {
                status: DataCallStatus::Success,
                suggested_retry: RetryHint::Never,
                cid: 1,
                link_status: LinkStatus::Active,
                ip_type: IpProtocol::Ipv4v6,
                ifname: "rmnet0".into(),
                addresses: vec![],
                dnses: vec![],
                gateways: vec![],
                pcscf: vec![],
                mtu: 1500,
            })
        }

        async fn deactivate_data_call(&self, _slot: SlotId, _cid: Cid, _token: OperationToken) -> Result<(), RadioError> {
            Ok(())
        }

        async fn set_data_allowed(&self, _slot: SlotId, _allowed: bool, _token: OperationToken) -> Result<(), RadioError> {
            Ok(())
        }

        async fn set_initial_attach_apn(&self, _slot: SlotId, _apn: &ApnProfile) -> Result<(), RadioError> {
            Ok(())
        }

        async fn set_data_profile(&self, _slot: SlotId, _profiles: &[ApnProfile]) -> Result<(), RadioError> {
            Ok(())
        }

        async fn get_data_call_list(&self, _slot: SlotId) -> Result<Vec<DataCallResponse>, RadioError> {
            Ok(vec![])
        }

        fn data_call_list_changed(&self, _slot: SlotId) -> WatchStream<Vec<DataCallResponse>> {
            let (_tx, rx) = tokio::sync::watch::channel(vec![]);
            WatchStream::new(rx)
        }

        async fn restart_radio(&self, _slot: SlotId) -> Result<(), RadioError> {
            Ok(())
        }
    }

    fn profile() -> ApnProfile {
        ApnProfile {
            plmn_id: "310260".into(),
            apn: "internet".into(),
            proxy: None,
            port: None,
            mmsc: None,
            mms_proxy: None,
            mms_port: None,
            user: None,
            password: None,
            auth_type: AuthType::None,
            supported_types: ApnType::DEFAULT,
            protocol: IpProtocol::Ipv4v6,
            roaming_protocol: IpProtocol::Ipv4v6,
            carrier_enabled: true,
            network_type_bitmask: 0,
            profile_id: 1,
            mtu: 1500,
            mvno_match_type: MvnoMatchType::None,
            mvno_match_data: None,
            apn_set_id: 0,
        }
    }

    fn single_slot_engine() -> Arc<Engine> {
        let mut bindings = HashMap::new();
        let binding = Arc::new(DataServiceBinding::new(Transport::Wwan));
        binding.bind("com.example.radio", Arc::new(AlwaysSucceedsFacade));
        bindings.insert(Transport::Wwan, binding);
        Engine::init(
            ConfigStore::with_defaults(),
            vec![SlotInit { slot: SlotId(0), hal_major_version: 0, bindings }],
        )
    }

    #[tokio::test]
    async fn cold_setup_activates_and_attaches() {
        let engine = single_slot_engine();
        engine
            .submit_request(SlotId(0), ApnType::DEFAULT, RequestId::new("r1"), profile())
            .await
            .expect("known slot");
        let slot = engine.slot(SlotId(0)).expect("known slot");
        assert_eq!(slot.dispatch_state(), DispatchState::Attached);
        assert_eq!(slot.active_session_count(Transport::Wwan), 1);
    }

    #[tokio::test]
    async fn last_release_tears_down_session() {
        let engine = single_slot_engine();
        let id = RequestId::new("r1");
        engine.submit_request(SlotId(0), ApnType::DEFAULT, id.clone(), profile()).await.expect("known slot");
        engine.release_request(SlotId(0), ApnType::DEFAULT, &id).await.expect("known slot");
        let slot = engine.slot(SlotId(0)).expect("known slot");
        assert_eq!(slot.active_session_count(Transport::Wwan), 0);
    }

    #[test]
    fn unconfigured_apn_type_has_zero_priority() {
        let engine = single_slot_engine();
        assert_eq!(engine.priority_for(ApnType::MMS), 0);
    }

    #[tokio::test]
    async fn disabled_settings_suppress_new_requests() {
        let engine = single_slot_engine();
        engine.data_enabled_settings().set_user(false);
        engine
            .submit_request(SlotId(0), ApnType::DEFAULT, RequestId::new("r1"), profile())
            .await
            .expect("known slot");
        let slot = engine.slot(SlotId(0)).expect("known slot");
        assert_eq!(slot.active_session_count(Transport::Wwan), 0);
    }

    fn dual_sim_engine() -> Arc<Engine> {
        let mut slot_inits = Vec::new();
        for slot in [SlotId(0), SlotId(1)] {
            let mut bindings = HashMap::new();
            let binding = Arc::new(DataServiceBinding::new(Transport::Wwan));
            binding.bind("com.example.radio", Arc::new(AlwaysSucceedsFacade));
            bindings.insert(Transport::Wwan, binding);
            slot_inits.push(SlotInit { slot, hal_major_version: 0, bindings });
        }

        let mut config = EngineConfig::default();
        config.general.dual_sim_single_radio = true;
        config.apn_priority.priorities.insert("default".to_string(), 45);
        config.apn_priority.priorities.insert("ims".to_string(), 100);

        Engine::init(ConfigStore::with_config(config), slot_inits)
    }

    #[tokio::test]
    async fn sim_switch_dispatcher_demotes_the_losing_slot() {
        let engine = dual_sim_engine();
        let r1 = RequestId::new("r1");
        let r2 = RequestId::new("r2");

        engine.submit_request(SlotId(0), ApnType::DEFAULT, r1.clone(), profile()).await.expect("known slot");
        let slot0 = engine.slot(SlotId(0)).expect("known slot");
        assert_eq!(slot0.active_session_count(Transport::Wwan), 1);
        assert_eq!(slot0.dispatch_state(), DispatchState::Attached);

        engine.submit_request(SlotId(1), ApnType::IMS, r2.clone(), profile()).await.expect("known slot");

        let slot0 = engine.slot(SlotId(0)).expect("known slot");
        let slot1 = engine.slot(SlotId(1)).expect("known slot");
        assert_eq!(slot0.active_session_count(Transport::Wwan), 0, "losing slot tears down its session");
        assert_eq!(slot0.dispatch_state(), DispatchState::Idle, "losing slot detaches");
        assert_eq!(slot1.active_session_count(Transport::Wwan), 1, "winning slot activates");
        assert_eq!(slot1.dispatch_state(), DispatchState::Attached);

        assert_eq!(slot0.registry().top_priority_request_any().map(|r| r.id), Some(r1), "demoted request stays registered");

        // Once the contending request is released, the same request id
        // resubmitted on the demoted slot must reactivate a real session,
        // not silently no-op against a stale ref-count left over from
        // before the demotion.
        engine.release_request(SlotId(1), ApnType::IMS, &r2).await.expect("known slot");
        engine.submit_request(SlotId(0), ApnType::DEFAULT, r1.clone(), profile()).await.expect("known slot");
        let slot0 = engine.slot(SlotId(0)).expect("known slot");
        assert_eq!(slot0.active_session_count(Transport::Wwan), 1, "demoted request reactivates once resubmitted");
        assert_eq!(slot0.dispatch_state(), DispatchState::Attached);
    }
}
