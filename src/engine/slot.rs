use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{info, warn};

use crate::agent::NetworkAgent;
use crate::connection::DcController;
use crate::model::{ApnProfile, ApnType, LocalSessionId, OperatingMode, RequestId, SlotId, Transport};
use crate::request::{DispatchState, DispatchStateMachine, RequestInfo, RequestRegistry};
use crate::transport::{HandoverDecision, QualifiedNetworksUpdate, TransportManager};

/// Deadline for a handover's target session to reach `Active` before the
/// handover is abandoned and the source transport is left in place.
const HANDOVER_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the engine owns for one SIM slot: a [`DcController`] per
/// transport available in this slot's [`OperatingMode`], the slot-wide
/// attach toggle, the request registry, and the handover coordinator.
pub struct SlotEngine {
    slot: SlotId,
    mode: OperatingMode,
    controllers: HashMap<Transport, Arc<DcController>>,
    transport_manager: TransportManager,
    registry: RequestRegistry,
    dispatch: DispatchStateMachine,
    agents: RwLock<HashMap<LocalSessionId, Arc<NetworkAgent>>>,
}

impl SlotEngine {
    pub fn new(slot: SlotId, mode: OperatingMode, controllers: HashMap<Transport, Arc<DcController>>) -> Self {
        Self {
            slot,
            mode,
            controllers,
            transport_manager: TransportManager::new(slot, mode),
            registry: RequestRegistry::new(),
            dispatch: DispatchStateMachine::default(),
            agents: RwLock::new(HashMap::new()),
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.dispatch.state()
    }

    pub fn transport_manager(&self) -> &TransportManager {
        &self.transport_manager
    }

    pub fn registry(&self) -> &RequestRegistry {
        &self.registry
    }

    pub fn active_session_count(&self, transport: Transport) -> usize {
        self.controllers.get(&transport).map_or(0, |c| c.active_session_count())
    }

    /// The highest-priority outstanding request on this slot, across every
    /// apn type — see [`RequestRegistry::top_priority_request_any`].
    pub fn top_priority_request_any(&self) -> Option<RequestInfo> {
        self.registry.top_priority_request_any()
    }

    /// Tears down every active session on this slot, across every
    /// transport and apn type, and detaches — without releasing any
    /// outstanding registry request. Used when cross-slot arbitration (on
    /// single-radio hardware) hands the modem's attach to a different
    /// slot; demoted requests stay registered so they're re-eligible the
    /// next time this slot wins arbitration.
    pub async fn demote_all(&self) {
        let mut any_torn_down = false;
        for controller in self.controllers.values() {
            for (id, apn_type) in controller.active_sessions() {
                controller.disconnect(id).await;
                if let Some(agent) = self.agents.write().unwrap_or_else(|e| e.into_inner()).remove(&id) {
                    agent.release_ownership().await;
                }
                self.transport_manager.record_teardown(apn_type);
                any_torn_down = true;
            }
        }
        self.registry.demote_all();
        if any_torn_down && self.dispatch.state() != DispatchState::Idle {
            self.toggle_data_allowed(false).await;
        }
    }

    /// Registers `request` and, if it's the first outstanding request for
    /// its apn type, dispatches the slot-wide attach and activates a
    /// session. The dispatch SM moves Idle → Attaching before the DC-SM is
    /// ever touched.
    pub async fn submit_request(&self, request: RequestInfo, profile: ApnProfile) -> Option<LocalSessionId> {
        let apn_type = request.apn_type;
        let is_first = self.registry.execute_request(request);
        if !is_first {
            return self.controllers.values().find_map(|c| c.active_session_for(apn_type)).map(|(id, _)| id);
        }

        if self.dispatch.state() == DispatchState::Idle {
            self.toggle_data_allowed(true).await;
        }

        let transport = self.transport_manager.current_transport(apn_type).unwrap_or(Transport::Wwan);
        let controller = self.controllers.get(&transport)?;
        let id = controller.activate(apn_type, profile).await;
        self.transport_manager.record_initial_transport(apn_type, transport);

        let (agent, _events) = NetworkAgent::new(id);
        self.agents.write().unwrap_or_else(|e| e.into_inner()).insert(id, Arc::new(agent));
        info!(slot = ?self.slot, ?apn_type, ?transport, session = ?id, "data session activated");
        Some(id)
    }

    /// Releases `request_id`. If it was the last outstanding request for
    /// `apn_type`, tears the session down and, if no apn type on this slot
    /// has an outstanding request left, detaches.
    pub async fn release_request(&self, apn_type: ApnType, request_id: &RequestId) {
        let Some(was_last) = self.registry.release_request(request_id) else { return };
        if !was_last {
            return;
        }

        if let Some(transport) = self.transport_manager.current_transport(apn_type) {
            if let Some(controller) = self.controllers.get(&transport) {
                if let Some((id, _)) = controller.active_session_for(apn_type) {
                    controller.disconnect(id).await;
                    if let Some(agent) = self.agents.write().unwrap_or_else(|e| e.into_inner()).remove(&id) {
                        agent.release_ownership().await;
                    }
                }
            }
            self.transport_manager.record_teardown(apn_type);
        }

        if !self.registry.has_any_active() && self.dispatch.state() != DispatchState::Idle {
            self.toggle_data_allowed(false).await;
        }
    }

    /// Issues `set_data_allowed` on the slot's WWAN controller — the
    /// modem's own attach toggle is a cellular concept, so an AP-assisted
    /// WLAN-only session never drives it. Applies the result against the
    /// sequence number the dispatch SM itself handed out, so a reply that
    /// arrives after a newer request has already superseded this one is
    /// dropped rather than applied.
    async fn toggle_data_allowed(&self, allowed: bool) {
        let sequence = self.dispatch.request_set_data_allowed(allowed);
        let Some(wwan) = self.controllers.get(&Transport::Wwan) else { return };
        let result = wwan.set_data_allowed(allowed).await;
        self.dispatch.complete_set_data_allowed(sequence, allowed, result.is_ok());
    }

    /// Applies a fresh preference list from the qualified-networks oracle,
    /// running a handover when one is needed.
    pub async fn handle_qualified_networks_update(&self, update: QualifiedNetworksUpdate) {
        let apn_type = update.apn_type;
        let decision = self.transport_manager.evaluate(apn_type, update.preferred);
        let HandoverDecision::Required { from, to, .. } = decision else { return };

        let Some(source) = self.controllers.get(&from).cloned() else {
            self.transport_manager.complete_handover(apn_type, to, false);
            return;
        };
        let Some(target) = self.controllers.get(&to).cloned() else {
            self.transport_manager.complete_handover(apn_type, to, false);
            return;
        };
        let Some((old_id, profile)) = source.active_session_for(apn_type) else {
            self.transport_manager.complete_handover(apn_type, to, false);
            return;
        };

        let new_id = target.activate(apn_type, profile).await;
        let outcome = target.await_outcome(new_id, HANDOVER_TIMEOUT).await;
        let succeeded = outcome == Some(crate::connection::ConnectionState::Active);

        if succeeded {
            if let Some(agent) = self.agents.write().unwrap_or_else(|e| e.into_inner()).remove(&old_id) {
                self.agents.write().unwrap_or_else(|e| e.into_inner()).insert(new_id, agent);
            }
            source.disconnect(old_id).await;
            info!(slot = ?self.slot, ?apn_type, ?from, ?to, "handover complete");
        } else {
            target.disconnect(new_id).await;
            warn!(slot = ?self.slot, ?apn_type, ?from, ?to, "handover failed, staying on source transport");
        }

        if let Some(queued) = self.transport_manager.complete_handover(apn_type, to, succeeded) {
            Box::pin(self.handle_qualified_networks_update(QualifiedNetworksUpdate { apn_type, preferred: queued })).await;
        }
    }
}
