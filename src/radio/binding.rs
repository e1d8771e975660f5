use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use futures::stream::Stream;

use crate::common::Property;
use crate::model::{ApnProfile, ApnType, Cid, DataCallResponse, OperationToken, SlotId, Transport, TokenGenerator};

use super::facade::{RadioError, RadioFacade, RadioResultCode};

/// Owns the live binding to a transport's modem HAL, re-binding across
/// service restarts and correlating every call with the [`OperationToken`]
/// it issues.
///
/// Bound target identity is tracked so that re-granting the same target
/// while already bound is a no-op; this mirrors the modem's own idempotent
/// "already bound" acknowledgement rather than tearing down and redoing a
/// no-op bind.
pub struct DataServiceBinding {
    transport: Transport,
    facade: RwLock<Option<Arc<dyn RadioFacade>>>,
    bound_target: RwLock<Option<String>>,
    granted_apn_types: RwLock<HashSet<ApnType>>,
    connected: Property<bool>,
    tokens: TokenGenerator,
}

impl DataServiceBinding {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            facade: RwLock::new(None),
            bound_target: RwLock::new(None),
            granted_apn_types: RwLock::new(HashSet::new()),
            connected: Property::new(false),
            tokens: TokenGenerator::new(),
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// Watches the binding's connected state. Subscribers see the current
    /// value immediately, then every subsequent transition.
    pub fn watch_connected(&self) -> impl Stream<Item = bool> + Send {
        self.connected.watch()
    }

    /// Binds (or re-binds) to `facade` under `target`. Returns `false`
    /// without touching anything if `target` is identical to the currently
    /// bound target and the binding is already connected.
    pub fn bind(&self, target: impl Into<String>, facade: Arc<dyn RadioFacade>) -> bool {
        let target = target.into();
        let already_bound = {
            let bound = self.bound_target.read().unwrap_or_else(|e| e.into_inner());
            bound.as_deref() == Some(target.as_str()) && self.connected.get()
        };
        if already_bound {
            return false;
        }
        *self.facade.write().unwrap_or_else(|e| e.into_inner()) = Some(facade);
        *self.bound_target.write().unwrap_or_else(|e| e.into_inner()) = Some(target);
        self.connected.set(true);
        true
    }

    /// Grants the binding permission to serve `apn_type`. Idempotent:
    /// granting a type that's already granted is a no-op and returns
    /// `false`.
    pub fn grant_capability(&self, apn_type: ApnType) -> bool {
        self.granted_apn_types.write().unwrap_or_else(|e| e.into_inner()).insert(apn_type)
    }

    pub fn revoke_capability(&self, apn_type: ApnType) -> bool {
        self.granted_apn_types.write().unwrap_or_else(|e| e.into_inner()).remove(&apn_type)
    }

    pub fn has_capability(&self, apn_type: ApnType) -> bool {
        self.granted_apn_types.read().unwrap_or_else(|e| e.into_inner()).contains(&apn_type)
    }

    /// Unbinds, e.g. because the bound service process died. Fires the
    /// `false` edge of the connected property (only if it was previously
    /// `true`) so owners can fail outstanding work with `ErrorIllegalState`.
    pub fn unbind(&self) {
        *self.facade.write().unwrap_or_else(|e| e.into_inner()) = None;
        *self.bound_target.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.connected.set(false);
    }

    fn current_facade(&self) -> Result<Arc<dyn RadioFacade>, RadioError> {
        self.facade
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(RadioError::Rejected(RadioResultCode::ErrorIllegalState))
    }

    pub fn next_token(&self) -> OperationToken {
        self.tokens.next()
    }

    pub async fn setup_data_call(
        &self,
        slot: SlotId,
        apn_type: ApnType,
        apn: &ApnProfile,
    ) -> Result<(DataCallResponse, OperationToken), RadioError> {
        let facade = self.current_facade()?;
        let token = self.next_token();
        let response = facade.setup_data_call(slot, apn_type, apn, token).await?;
        Ok((response, token))
    }

    pub async fn deactivate_data_call(&self, slot: SlotId, cid: Cid) -> Result<(), RadioError> {
        let facade = self.current_facade()?;
        let token = self.next_token();
        facade.deactivate_data_call(slot, cid, token).await
    }

    pub async fn set_data_allowed(&self, slot: SlotId, allowed: bool) -> Result<(), RadioError> {
        let facade = self.current_facade()?;
        let token = self.next_token();
        facade.set_data_allowed(slot, allowed, token).await
    }

    pub async fn set_initial_attach_apn(&self, slot: SlotId, apn: &ApnProfile) -> Result<(), RadioError> {
        self.current_facade()?.set_initial_attach_apn(slot, apn).await
    }

    pub async fn set_data_profile(&self, slot: SlotId, profiles: &[ApnProfile]) -> Result<(), RadioError> {
        self.current_facade()?.set_data_profile(slot, profiles).await
    }

    pub async fn get_data_call_list(&self, slot: SlotId) -> Result<Vec<DataCallResponse>, RadioError> {
        self.current_facade()?.get_data_call_list(slot).await
    }

    pub async fn restart_radio(&self, slot: SlotId) -> Result<(), RadioError> {
        self.current_facade()?.restart_radio(slot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_stream::wrappers::WatchStream;

    struct FakeFacade {
        calls: AtomicU32,
    }

    #[async_trait]
    impl RadioFacade for FakeFacade {
        async fn setup_data_call(
            &self,
            _slot: SlotId,
            _apn_type: ApnType,
            _apn: &ApnProfile,
            _token: OperationToken,
        ) -> Result<DataCallResponse, RadioError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RadioError::Disconnected)
        }

        async fn deactivate_data_call(
            &self,
            _slot: SlotId,
            _cid: Cid,
            _token: OperationToken,
        ) -> Result<(), RadioError> {
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

    #[tokio::test]
    async fn unbound_calls_fail_illegal_state() {
        let binding = DataServiceBinding::new(Transport::Wwan);
        let err = binding.deactivate_data_call(SlotId(0), 1).await.unwrap_err();
        assert_eq!(err, RadioError::Rejected(RadioResultCode::ErrorIllegalState));
    }

    #[test]
    fn rebinding_same_target_is_idempotent() {
        let binding = DataServiceBinding::new(Transport::Wwan);
        let facade: Arc<dyn RadioFacade> = Arc::new(FakeFacade { calls: AtomicU32::new(0) });
        assert!(binding.bind("com.example.radio", facade.clone()));
        assert!(!binding.bind("com.example.radio", facade));
    }

    #[test]
    fn unbind_fires_false_edge() {
        let binding = DataServiceBinding::new(Transport::Wwan);
        let facade: Arc<dyn RadioFacade> = Arc::new(FakeFacade { calls: AtomicU32::new(0) });
        binding.bind("com.example.radio", facade);
        assert!(binding.is_connected());
        binding.unbind();
        assert!(!binding.is_connected());
    }

    #[test]
    fn capability_grant_is_idempotent() {
        let binding = DataServiceBinding::new(Transport::Wwan);
        assert!(binding.grant_capability(ApnType::DEFAULT));
        assert!(!binding.grant_capability(ApnType::DEFAULT));
        assert!(binding.has_capability(ApnType::DEFAULT));
        assert!(binding.revoke_capability(ApnType::DEFAULT));
        assert!(!binding.has_capability(ApnType::DEFAULT));
    }
}
