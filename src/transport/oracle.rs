use async_trait::async_trait;
use tokio_stream::wrappers::WatchStream;

use crate::model::{ApnType, Transport};

/// One apn-type's transport preference order, most preferred first. An
/// empty list means "no transport is currently qualified" — every session
/// of that type should be torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedNetworksUpdate {
    pub apn_type: ApnType,
    pub preferred: Vec<Transport>,
}

/// The policy boundary that decides which transport(s) a given apn type
/// may use right now — carrier policy, signal quality, and anything else
/// upstream of this crate. A concrete implementation is injected per slot;
/// this crate only consumes its output.
#[async_trait]
pub trait QualifiedNetworksOracle: Send + Sync {
    /// Current preference order for `apn_type`.
    async fn qualified_networks(&self, apn_type: ApnType) -> Vec<Transport>;

    /// A stream of preference updates as they change. The stream's first
    /// item is the current preference for whichever apn type it concerns.
    fn subscribe(&self) -> WatchStream<QualifiedNetworksUpdate>;
}
