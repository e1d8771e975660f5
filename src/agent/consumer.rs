use std::time::Duration;

use async_trait::async_trait;

use crate::model::{ApnType, LinkProperties, Transport};

/// Identifies one offloaded socket keepalive session on an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeepaliveSlot(pub u32);

/// Why an offloaded keepalive stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveError {
    HardwareUnsupported,
    InvalidInterval,
    NetworkLost,
}

/// Terminal or transitional event for one offloaded keepalive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveEvent {
    Started(KeepaliveSlot),
    Stopped(KeepaliveSlot),
    Error(KeepaliveSlot, KeepaliveError),
}

/// Snapshot of what this network can currently do, published whenever it
/// changes.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkCapabilities {
    pub transport: Transport,
    pub apn_types: ApnType,
    pub not_metered: bool,
    pub not_roaming: bool,
    pub validated: bool,
}

/// A relative ranking used to arbitrate between networks that could both
/// satisfy the same request. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NetworkScore(pub i32);

/// Free-form description surfaced alongside capabilities (interface name,
/// subtype) — kept separate since it changes on a different cadence.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkInfo {
    pub ifname: String,
    pub extra_info: Option<String>,
}

/// The outward half of the agent/consumer boundary: whoever currently owns
/// a [`crate::agent::NetworkAgent`] implements this to receive pushes from
/// it. Exactly one consumer owns a given agent at a time; see
/// [`crate::agent::NetworkAgent::take_ownership`].
#[async_trait]
pub trait ConnectivityConsumer: Send + Sync {
    async fn send_network_capabilities(&self, capabilities: NetworkCapabilities);
    async fn send_link_properties(&self, properties: LinkProperties);
    async fn send_network_score(&self, score: NetworkScore);
    async fn send_network_info(&self, info: NetworkInfo);
    async fn on_socket_keepalive_event(&self, event: KeepaliveEvent);
    /// Called exactly once, when this consumer's ownership ends — either it
    /// released voluntarily or another consumer took over.
    async fn unregister(&self);
}

/// A consumer-requested socket keepalive, as the inbound half of the
/// boundary delivers it to [`crate::agent::NetworkAgent`].
#[derive(Debug, Clone, Copy)]
pub struct KeepaliveRequest {
    pub slot: KeepaliveSlot,
    pub interval: Duration,
}
