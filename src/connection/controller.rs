use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::model::{
    ApnContext, ApnProfile, ApnType, Cid, DataCallResponse, DataCallStatus, FailCause,
    LocalSessionId, SessionIdGenerator, SlotId, Transport,
};
use crate::radio::{DataServiceBinding, RadioError, RadioResultCode};

use super::retry::RetryManager;
use super::sm::{step, ConnectionEffect, ConnectionEvent, ConnectionState, Session};

/// Owns every [`Session`] for one (slot, transport) pair — exactly the
/// grouping the modem's own data-call list is scoped to. Wraps the pure
/// reducer in [`super::sm`] and is the only thing in the engine that
/// actually calls out to the radio or a timer.
pub struct DcController {
    transport: Transport,
    slot: SlotId,
    binding: Arc<DataServiceBinding>,
    sessions: RwLock<HashMap<LocalSessionId, Session>>,
    active_by_cid: RwLock<HashMap<Cid, LocalSessionId>>,
    session_ids: SessionIdGenerator,
    retry: RetryManager,
}

impl DcController {
    pub fn new(
        transport: Transport,
        slot: SlotId,
        binding: Arc<DataServiceBinding>,
        retry: RetryManager,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            slot,
            binding,
            sessions: RwLock::new(HashMap::new()),
            active_by_cid: RwLock::new(HashMap::new()),
            session_ids: SessionIdGenerator::new(),
            retry,
        })
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn session_state(&self, id: LocalSessionId) -> Option<ConnectionState> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).get(&id).map(|s| s.state)
    }

    pub fn active_session_count(&self) -> usize {
        self.active_by_cid.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Every currently `Active` session on this controller, with the apn
    /// type it's serving. Used by cross-slot arbitration's full
    /// `DisconnectAll`, which tears a slot down regardless of apn type.
    pub fn active_sessions(&self) -> Vec<(LocalSessionId, ApnType)> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|s| s.state == ConnectionState::Active)
            .map(|s| (s.id, s.apn.apn_type))
            .collect()
    }

    /// Finds the active session serving `apn_type`, if any, along with the
    /// profile it was activated with — used by [`crate::engine`] to carry a
    /// session's profile across a handover to a sibling transport.
    pub fn active_session_for(&self, apn_type: ApnType) -> Option<(LocalSessionId, ApnProfile)> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .find(|s| s.apn.apn_type == apn_type && s.state == ConnectionState::Active)
            .map(|s| (s.id, s.apn.profile.clone()))
    }

    /// Starts a new session for `apn_type`/`profile`. Returns the
    /// [`LocalSessionId`] immediately; reaching [`ConnectionState::Active`]
    /// happens asynchronously and is observed via [`Self::session_state`] or
    /// the eventual [`crate::agent::NetworkAgent`] this session is paired
    /// with by the owning [`crate::engine::Engine`].
    pub async fn activate(self: &Arc<Self>, apn_type: ApnType, profile: ApnProfile) -> LocalSessionId {
        let id = self.session_ids.next();
        let mut session = Session::new(id, ApnContext::new(apn_type, profile));
        let effects = step(&mut session, ConnectionEvent::Activate);
        self.sessions.write().unwrap_or_else(|e| e.into_inner()).insert(id, session);
        self.execute(id, effects).await;
        id
    }

    /// Tears a session down. No-op if `id` is unknown (already gone).
    pub async fn disconnect(self: &Arc<Self>, id: LocalSessionId) {
        self.handle_event(id, ConnectionEvent::Disconnect).await;
    }

    /// Issues `set_data_allowed` on this controller's binding, for
    /// [`crate::request::DispatchStateMachine`]'s slot-wide attach toggle.
    pub async fn set_data_allowed(&self, allowed: bool) -> Result<(), RadioError> {
        self.binding.set_data_allowed(self.slot, allowed).await
    }

    /// Reconciles an unsolicited call-list snapshot against every tracked
    /// session. A tracked `Cid` missing from the snapshot is treated as an
    /// unreported failure. If the same `ifname` is reported live for two
    /// tracked sessions in one batch, the session with the higher `Cid` is
    /// torn down with a permanent failure and the collision is logged —
    /// reject-second, not first-seen-wins silently.
    pub async fn on_list_changed(self: &Arc<Self>, responses: Vec<DataCallResponse>) {
        let mut tracked: Vec<(Cid, LocalSessionId)> = self
            .active_by_cid
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(cid, id)| (*cid, *id))
            .collect();
        tracked.sort_by_key(|(cid, _)| *cid);

        let mut claimed_ifnames: HashMap<String, Cid> = HashMap::new();

        for (cid, id) in tracked {
            match responses.iter().find(|r| r.cid == cid) {
                None => {
                    // Sentinel cause: the modem stopped reporting this Cid
                    // without an explicit fail cause. Classifies as a radio
                    // restart, so the session goes Inactive to be rebuilt
                    // once the radio comes back rather than retried in place.
                    self.handle_event(id, ConnectionEvent::ListReportsFailure(FailCause(-1))).await;
                }
                Some(response) if response.status == DataCallStatus::Success && !response.ifname.is_empty() => {
                    if let Some(&holder) = claimed_ifnames.get(&response.ifname) {
                        tracing::warn!(ifname = %response.ifname, holder_cid = ?holder, duplicate_cid = ?cid, "duplicate interface name in call list, tearing down later session");
                        self.handle_event(id, ConnectionEvent::ListReportsFailure(FailCause(33))).await;
                        continue;
                    }
                    claimed_ifnames.insert(response.ifname.clone(), cid);
                    self.handle_event(id, ConnectionEvent::ListReportsLinkProperties(response.link_properties())).await;
                }
                Some(response) => match response.status {
                    DataCallStatus::Success => {
                        self.handle_event(id, ConnectionEvent::ListReportsLinkProperties(response.link_properties())).await;
                    }
                    DataCallStatus::Failed(cause) => {
                        self.handle_event(id, ConnectionEvent::ListReportsFailure(cause)).await;
                    }
                },
            }
        }
    }

    /// Polls `id` until its activation attempt settles at `Active` or falls
    /// back to `Inactive`, or `timeout` elapses. Used by
    /// [`crate::engine`] to know when a handover's target session is ready
    /// to take over, without threading a completion channel through every
    /// reducer effect.
    pub async fn await_outcome(&self, id: LocalSessionId, timeout: Duration) -> Option<ConnectionState> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.session_state(id) {
                Some(ConnectionState::Active) => return Some(ConnectionState::Active),
                Some(ConnectionState::Inactive) => return Some(ConnectionState::Inactive),
                Some(_) => {}
                None => return None,
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn handle_event(self: &Arc<Self>, id: LocalSessionId, event: ConnectionEvent) {
        let effects = {
            let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
            match sessions.get_mut(&id) {
                Some(session) => step(session, event),
                None => return,
            }
        };
        self.execute(id, effects).await;
    }

    async fn execute(self: &Arc<Self>, id: LocalSessionId, effects: Vec<ConnectionEffect>) {
        for effect in effects {
            match effect {
                ConnectionEffect::CallSetupDataCall => {
                    let (apn_type, profile) = {
                        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
                        let session = match sessions.get(&id) {
                            Some(s) => s,
                            None => continue,
                        };
                        (session.apn.apn_type, session.apn.profile.clone())
                    };
                    match self.binding.setup_data_call(self.slot, apn_type, &profile).await {
                        Ok((response, _token)) => {
                            self.handle_event(id, ConnectionEvent::SetupComplete(response)).await;
                        }
                        Err(err) => {
                            let response = radio_error_to_failure(&err);
                            self.handle_event(id, ConnectionEvent::SetupComplete(response)).await;
                        }
                    }
                }
                ConnectionEffect::CallDeactivateDataCall(cid) => {
                    let _ = self.binding.deactivate_data_call(self.slot, cid).await;
                    self.handle_event(id, ConnectionEvent::DeactivateComplete).await;
                }
                ConnectionEffect::ScheduleRetry(base_delay) => {
                    let attempt = self
                        .sessions
                        .read()
                        .unwrap_or_else(|e| e.into_inner())
                        .get(&id)
                        .map(|s| s.retry_count)
                        .unwrap_or(0);
                    let delay = self.retry.next_delay(id_salt(id), attempt).unwrap_or(base_delay);
                    let controller = Arc::clone(self);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        controller.handle_event(id, ConnectionEvent::RetryTimerFired).await;
                    });
                }
                ConnectionEffect::PublishLinkProperties(_) => {}
                ConnectionEffect::PublishDisconnected => {
                    self.active_by_cid.write().unwrap_or_else(|e| e.into_inner()).retain(|_, sid| *sid != id);
                }
                ConnectionEffect::NotifyActive => {
                    if let Some(cid) = self.sessions.read().unwrap_or_else(|e| e.into_inner()).get(&id).and_then(|s| s.cid) {
                        self.active_by_cid.write().unwrap_or_else(|e| e.into_inner()).insert(cid, id);
                    }
                }
                ConnectionEffect::RequestRadioRestart => {
                    if let Err(err) = self.binding.restart_radio(self.slot).await {
                        tracing::warn!(slot = ?self.slot, transport = ?self.transport, %err, "radio restart request failed");
                    }
                }
            }
        }
    }
}

fn id_salt(id: LocalSessionId) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    id.hash(&mut hasher);
    hasher.finish()
}

fn radio_error_to_failure(err: &RadioError) -> DataCallResponse {
    use crate::model::{IpProtocol, LinkStatus, RetryHint};
    let cause = match err {
        RadioError::Disconnected => FailCause(-1),
        RadioError::Rejected(RadioResultCode::ErrorRadioNotAvailable) => FailCause(-2),
        RadioError::Rejected(RadioResultCode::ErrorInvalidArg | RadioResultCode::ErrorUnsupported) => FailCause(34),
        RadioError::Rejected(RadioResultCode::ErrorIllegalState) => FailCause(-1),
        RadioError::Rejected(RadioResultCode::Success) | RadioError::Timeout => FailCause(i32::MAX),
    };
    DataCallResponse {
        status: DataCallStatus::Failed(cause),
        suggested_retry: RetryHint::UseRetryManager,
        cid: 0,
        link_status: LinkStatus::Inactive,
        ip_type: IpProtocol::Ipv4,
        ifname: String::new(),
        addresses: vec![],
        dnses: vec![],
        gateways: vec![],
        pcscf: vec![],
        mtu: 0,
    }
}
