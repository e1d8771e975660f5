use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Modem-assigned session identifier. Stable for the session's lifetime,
/// reused by the modem after deactivation, unique within a transport.
pub type Cid = i32;

/// Local, monotonically increasing tag for a [`crate::connection::Session`].
/// Never reused, unlike [`Cid`] — this is what the engine uses to refer to a
/// session across a handover, where the `Cid` changes transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalSessionId(u64);

impl LocalSessionId {
    fn new(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for LocalSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Generates unique, monotonically increasing [`LocalSessionId`]s.
#[derive(Debug, Default)]
pub struct SessionIdGenerator {
    next: AtomicU64,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn next(&self) -> LocalSessionId {
        LocalSessionId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque, caller-supplied identifier for a [`crate::request::NetworkRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SIM slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotId(pub u8);

/// Subscription id associated with a slot's active SIM profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub i32);

/// Correlates an in-flight [`crate::radio::RadioFacade`] operation with its
/// eventual completion. Duplicate or late results for a consumed token are
/// dropped by the binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationToken(u64);

#[derive(Debug, Default)]
pub struct TokenGenerator {
    next: AtomicU64,
}

impl TokenGenerator {
    pub fn new() -> Self {
        Self { next: AtomicU64::new(1) }
    }

    pub fn next(&self) -> OperationToken {
        OperationToken(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
