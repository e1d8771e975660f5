//! Value types shared across the engine: transports, APN profiles and
//! contexts, data call responses, and the identifiers that tie sessions,
//! requests, and modem operations together.

mod apn;
mod data_call;
mod ids;
mod transport;

pub use apn::{ApnContext, ApnProfile, ApnType, AuthType, IpProtocol, MvnoMatchType};
pub use data_call::{
    DataCallResponse, DataCallResponseError, DataCallStatus, FailCause, FailureClass,
    LinkProperties, LinkPropertiesDelta, LinkStatus, RetryHint, NEVER_RETRY_SENTINEL,
};
pub use ids::{Cid, LocalSessionId, OperationToken, RequestId, SessionIdGenerator, SlotId,
    SubscriptionId, TokenGenerator};
pub use transport::{AccessNetwork, OperatingMode, Transport};
