use async_trait::async_trait;
use thiserror::Error;
use tokio_stream::wrappers::WatchStream;

use crate::model::{ApnProfile, ApnType, Cid, DataCallResponse, OperationToken, SlotId, Transport};

/// Mirrors the modem's own reply codes for a rejected request. Anything the
/// modem doesn't classify this finely collapses to [`RadioResultCode::ErrorUnsupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioResultCode {
    Success,
    ErrorInvalidArg,
    ErrorIllegalState,
    ErrorRadioNotAvailable,
    ErrorUnsupported,
}

/// Failure modes surfaced by a [`RadioFacade`] call itself, as distinct from
/// a [`DataCallResponse`] carrying a modem fail cause — this is for the
/// transport to the modem failing, not the data call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RadioError {
    #[error("modem rejected request: {0:?}")]
    Rejected(RadioResultCode),
    #[error("radio service disconnected")]
    Disconnected,
    #[error("request timed out")]
    Timeout,
}

/// Narrow capability boundary to the modem's packet-data HAL. Two concrete
/// implementations are expected in deployment (a real vendor HAL binding and
/// an in-process simulator for tests); which one backs a given slot is an
/// external selector, not something decided in this crate.
#[async_trait]
pub trait RadioFacade: Send + Sync {
    /// Requests a new data call for `apn` on behalf of `apn_type`. `token`
    /// correlates this call with its eventual completion or an unsolicited
    /// `data_call_list_changed` carrying the same `cid`.
    async fn setup_data_call(
        &self,
        slot: SlotId,
        apn_type: ApnType,
        apn: &ApnProfile,
        token: OperationToken,
    ) -> Result<DataCallResponse, RadioError>;

    /// Tears down an active call. Idempotent: tearing down a `cid` that is
    /// already gone is not an error.
    async fn deactivate_data_call(
        &self,
        slot: SlotId,
        cid: Cid,
        token: OperationToken,
    ) -> Result<(), RadioError>;

    /// Toggles the slot's overall "is data allowed" attach state.
    /// Sequence-numbered by the caller ([`crate::request::DispatchStateMachine`])
    /// so a stale reply can be told apart from the current one.
    async fn set_data_allowed(
        &self,
        slot: SlotId,
        allowed: bool,
        token: OperationToken,
    ) -> Result<(), RadioError>;

    /// Sets the APN used for the modem's initial PDN attach, ahead of any
    /// explicit `setup_data_call`.
    async fn set_initial_attach_apn(
        &self,
        slot: SlotId,
        apn: &ApnProfile,
    ) -> Result<(), RadioError>;

    /// Pushes the full APN profile list the modem should consider for
    /// automatic attach and handover decisions.
    async fn set_data_profile(&self, slot: SlotId, profiles: &[ApnProfile]) -> Result<(), RadioError>;

    /// Snapshot of the modem's current call list, independent of any
    /// particular request.
    async fn get_data_call_list(&self, slot: SlotId) -> Result<Vec<DataCallResponse>, RadioError>;

    /// A stream of unsolicited call-list snapshots. Terminates (yields
    /// nothing further) when the underlying binding disconnects.
    fn data_call_list_changed(&self, slot: SlotId) -> WatchStream<Vec<DataCallResponse>>;

    /// Requests that the modem itself be restarted. Issued when a setup
    /// failure classifies as [`crate::model::FailureClass::RadioRestart`];
    /// sessions are expected to be rebuilt from scratch once the radio
    /// comes back, not retried in place.
    async fn restart_radio(&self, slot: SlotId) -> Result<(), RadioError>;
}
