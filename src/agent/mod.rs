//! Represents one live network to the rest of the stack: capability and
//! link-property publication, a single current owner with explicit
//! ownership transfer, and the socket-keepalive/bandwidth/validation
//! callbacks that owner exchanges with it.

mod consumer;

pub use consumer::{
    ConnectivityConsumer, KeepaliveError, KeepaliveEvent, KeepaliveRequest, KeepaliveSlot,
    NetworkCapabilities, NetworkInfo, NetworkScore,
};

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use crate::common::Property;
use crate::model::LocalSessionId;

/// Inbound traffic from the current owning consumer that this agent can't
/// resolve on its own — the owning [`crate::connection::DcController`]
/// drains these from the paired receiver and acts on them.
#[derive(Debug, Clone, Copy)]
pub enum AgentEvent {
    /// The consumer no longer wants this network; it should be torn down.
    Unwanted,
    /// The consumer wants a fresh capabilities push (typically to resample
    /// achieved bandwidth).
    BandwidthUpdateRequested,
    StartSocketKeepalive(KeepaliveRequest),
    StopSocketKeepalive(KeepaliveSlot),
}

/// One session's handle into the connectivity stack. Lives for the
/// session's lifetime; survives a handover by being handed to a new
/// [`ConnectivityConsumer`] rather than recreated.
pub struct NetworkAgent {
    session: LocalSessionId,
    consumer: RwLock<Option<Arc<dyn ConnectivityConsumer>>>,
    validated: Property<bool>,
    keepalives: RwLock<HashSet<KeepaliveSlot>>,
    events_tx: mpsc::UnboundedSender<AgentEvent>,
}

impl NetworkAgent {
    /// Creates a new, ownerless agent. The returned receiver carries every
    /// [`AgentEvent`] the eventual owner raises; something must poll it or
    /// inbound callbacks are silently lost.
    pub fn new(session: LocalSessionId) -> (Self, mpsc::UnboundedReceiver<AgentEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let agent = Self {
            session,
            consumer: RwLock::new(None),
            validated: Property::new(false),
            keepalives: RwLock::new(HashSet::new()),
            events_tx,
        };
        (agent, events_rx)
    }

    pub fn session(&self) -> LocalSessionId {
        self.session
    }

    /// Transfers ownership to `new_owner`. If another consumer currently
    /// owns the agent, its `unregister` fires first.
    pub async fn take_ownership(&self, new_owner: Arc<dyn ConnectivityConsumer>) {
        let previous = self.consumer.write().unwrap_or_else(|e| e.into_inner()).replace(new_owner);
        if let Some(previous) = previous {
            previous.unregister().await;
        }
    }

    /// Releases ownership with no replacement, firing `unregister` on the
    /// outgoing consumer if one was present.
    pub async fn release_ownership(&self) {
        let previous = self.consumer.write().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(previous) = previous {
            previous.unregister().await;
        }
    }

    pub fn has_owner(&self) -> bool {
        self.consumer.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    fn owner(&self) -> Option<Arc<dyn ConnectivityConsumer>> {
        self.consumer.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub async fn publish_capabilities(&self, capabilities: NetworkCapabilities) {
        if let Some(owner) = self.owner() {
            owner.send_network_capabilities(capabilities).await;
        }
    }

    pub async fn publish_link_properties(&self, properties: crate::model::LinkProperties) {
        if let Some(owner) = self.owner() {
            owner.send_link_properties(properties).await;
        }
    }

    pub async fn publish_score(&self, score: NetworkScore) {
        if let Some(owner) = self.owner() {
            owner.send_network_score(score).await;
        }
    }

    pub async fn publish_info(&self, info: NetworkInfo) {
        if let Some(owner) = self.owner() {
            owner.send_network_info(info).await;
        }
    }

    pub async fn notify_keepalive_event(&self, event: KeepaliveEvent) {
        match event {
            KeepaliveEvent::Started(slot) => {
                self.keepalives.write().unwrap_or_else(|e| e.into_inner()).insert(slot);
            }
            KeepaliveEvent::Stopped(slot) | KeepaliveEvent::Error(slot, _) => {
                self.keepalives.write().unwrap_or_else(|e| e.into_inner()).remove(&slot);
            }
        }
        if let Some(owner) = self.owner() {
            owner.on_socket_keepalive_event(event).await;
        }
    }

    pub fn active_keepalives(&self) -> Vec<KeepaliveSlot> {
        self.keepalives.read().unwrap_or_else(|e| e.into_inner()).iter().copied().collect()
    }

    pub fn validation_status(&self) -> bool {
        self.validated.get()
    }

    /// Inbound: the modem or validation probe reports a new validation
    /// result.
    pub fn on_validation_status(&self, validated: bool) {
        self.validated.set(validated);
    }

    /// Inbound: the consumer no longer wants this network.
    pub fn on_network_unwanted(&self) {
        let _ = self.events_tx.send(AgentEvent::Unwanted);
    }

    /// Inbound: the consumer wants a fresh capabilities sample.
    pub fn on_bandwidth_update_requested(&self) {
        let _ = self.events_tx.send(AgentEvent::BandwidthUpdateRequested);
    }

    pub fn on_start_socket_keepalive(&self, request: KeepaliveRequest) {
        let _ = self.events_tx.send(AgentEvent::StartSocketKeepalive(request));
    }

    pub fn on_stop_socket_keepalive(&self, slot: KeepaliveSlot) {
        let _ = self.events_tx.send(AgentEvent::StopSocketKeepalive(slot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct CountingConsumer {
        unregistered: Arc<AtomicU32>,
    }

    #[async_trait::async_trait]
    impl ConnectivityConsumer for CountingConsumer {
        async fn send_network_capabilities(&self, _capabilities: NetworkCapabilities) {}
        async fn send_link_properties(&self, _properties: crate::model::LinkProperties) {}
        async fn send_network_score(&self, _score: NetworkScore) {}
        async fn send_network_info(&self, _info: NetworkInfo) {}
        async fn on_socket_keepalive_event(&self, _event: KeepaliveEvent) {}
        async fn unregister(&self) {
            self.unregistered.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_session() -> LocalSessionId {
        crate::model::SessionIdGenerator::new().next()
    }

    #[tokio::test]
    async fn taking_ownership_unregisters_previous_owner() {
        let (agent, _rx) = NetworkAgent::new(test_session());
        let first_unregistered = Arc::new(AtomicU32::new(0));
        let second_unregistered = Arc::new(AtomicU32::new(0));
        agent
            .take_ownership(Arc::new(CountingConsumer { unregistered: first_unregistered.clone() }))
            .await;
        agent
            .take_ownership(Arc::new(CountingConsumer { unregistered: second_unregistered.clone() }))
            .await;
        assert_eq!(first_unregistered.load(Ordering::SeqCst), 1);
        assert_eq!(second_unregistered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn network_unwanted_is_observable_on_the_event_channel() {
        let (agent, mut rx) = NetworkAgent::new(test_session());
        agent.on_network_unwanted();
        match rx.recv().await {
            Some(AgentEvent::Unwanted) => {}
            other => panic!("expected Unwanted, got {other:?}"),
        }
    }

    #[test]
    fn keepalive_started_then_stopped_tracks_active_set() {
        let (agent, _rx) = NetworkAgent::new(test_session());
        let slot = KeepaliveSlot(1);
        futures::executor::block_on(agent.notify_keepalive_event(KeepaliveEvent::Started(slot)));
        assert_eq!(agent.active_keepalives(), vec![slot]);
        futures::executor::block_on(agent.notify_keepalive_event(KeepaliveEvent::Stopped(slot)));
        assert!(agent.active_keepalives().is_empty());
    }

    #[test]
    fn keepalive_request_carries_an_interval() {
        let req = KeepaliveRequest { slot: KeepaliveSlot(2), interval: Duration::from_secs(10) };
        assert_eq!(req.interval, Duration::from_secs(10));
    }
}
