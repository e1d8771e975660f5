use std::collections::HashMap;
use std::sync::RwLock;

use crate::model::{ApnType, RequestId, SlotId};

/// One outstanding caller request for packet data. `executed` tracks
/// whether this request currently contributes to its apn type's ref-count
/// — a request can lose and regain `executed` many times over its life
/// (e.g. demoted by a SIM switch, then re-executed once its slot wins
/// arbitration back) without ever leaving the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub id: RequestId,
    pub apn_type: ApnType,
    pub priority: i32,
    pub executed: bool,
}

/// Tracks every outstanding [`RequestInfo`] and the ref-count it contributes
/// per apn type. The ref-count discipline mirrors [`crate::model::ApnContext`]:
/// the first request for an apn type should trigger activation, the last
/// release should trigger teardown — everything in between is a no-op.
#[derive(Default)]
pub struct RequestRegistry {
    requests: RwLock<HashMap<RequestId, RequestInfo>>,
    ref_counts: RwLock<HashMap<ApnType, u32>>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `info` as executed, setting `info.executed = true`
    /// regardless of what the caller passed in. Returns `true` if this was
    /// the zero-to-one transition for its apn type — a request that was
    /// already executed (re-submitted with the same id) leaves the
    /// ref-count untouched and returns `false`.
    pub fn execute_request(&self, mut info: RequestInfo) -> bool {
        let apn_type = info.apn_type;
        let mut requests = self.requests.write().unwrap_or_else(|e| e.into_inner());
        let already_executed = requests.get(&info.id).is_some_and(|r| r.executed);
        info.executed = true;
        requests.insert(info.id.clone(), info);
        drop(requests);
        if already_executed {
            return false;
        }
        let mut counts = self.ref_counts.write().unwrap_or_else(|e| e.into_inner());
        let count = counts.entry(apn_type).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Unregisters the request named `id` entirely. Returns `None` if it
    /// wasn't known; otherwise `Some(true)` if releasing it was the
    /// one-to-zero transition for its apn type. A request that was
    /// registered but not currently `executed` (demoted) is removed
    /// without touching the ref-count.
    pub fn release_request(&self, id: &RequestId) -> Option<bool> {
        let info = self.requests.write().unwrap_or_else(|e| e.into_inner()).remove(id)?;
        if !info.executed {
            return Some(false);
        }
        let mut counts = self.ref_counts.write().unwrap_or_else(|e| e.into_inner());
        let count = counts.get_mut(&info.apn_type)?;
        *count -= 1;
        let released = *count == 0;
        if released {
            counts.remove(&info.apn_type);
        }
        Some(released)
    }

    /// Demotes every currently-executed request on this apn context,
    /// marking it not-executed and zeroing its apn type's ref-count —
    /// without unregistering it. Used when cross-slot SIM-switch
    /// arbitration hands this slot's modem attach to a different slot;
    /// demoted requests stay registered so `execute_request` re-triggers
    /// activation the next time this slot wins arbitration back.
    pub fn demote_all(&self) {
        let mut requests = self.requests.write().unwrap_or_else(|e| e.into_inner());
        for info in requests.values_mut() {
            info.executed = false;
        }
        drop(requests);
        self.ref_counts.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn ref_count(&self, apn_type: ApnType) -> u32 {
        self.ref_counts.read().unwrap_or_else(|e| e.into_inner()).get(&apn_type).copied().unwrap_or(0)
    }

    /// True if any apn type has at least one outstanding request. Used to
    /// decide whether the slot as a whole still needs `data_allowed`.
    pub fn has_any_active(&self) -> bool {
        !self.ref_counts.read().unwrap_or_else(|e| e.into_inner()).is_empty()
    }

    /// The highest-priority outstanding request for `apn_type`, if any.
    /// Ties favor whichever request happens to sort first by id, which is
    /// stable within a process run.
    pub fn top_priority_request(&self, apn_type: ApnType) -> Option<RequestInfo> {
        self.requests
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|r| r.apn_type == apn_type)
            .max_by(|a, b| a.priority.cmp(&b.priority).then_with(|| b.id.as_str().cmp(a.id.as_str())))
            .cloned()
    }

    /// The highest-priority outstanding request on this slot, across every
    /// apn type. Used by cross-slot SIM-switch arbitration, where the
    /// modem's single attach slot is contested by whichever request (of
    /// any apn type) on each slot ranks highest.
    pub fn top_priority_request_any(&self) -> Option<RequestInfo> {
        self.requests
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .max_by(|a, b| a.priority.cmp(&b.priority).then_with(|| b.id.as_str().cmp(a.id.as_str())))
            .cloned()
    }

    pub fn requests_for(&self, apn_type: ApnType) -> Vec<RequestInfo> {
        self.requests
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|r| r.apn_type == apn_type)
            .cloned()
            .collect()
    }
}

/// Picks which slot's top request for a given apn type should win when
/// more than one slot can serve it (e.g. choosing which SIM handles a
/// default-internet request after a SIM switch). `None` entries mean that
/// slot has no outstanding request for this apn type.
pub fn select_top_priority_slot(candidates: &[(SlotId, Option<RequestInfo>)]) -> Option<SlotId> {
    candidates
        .iter()
        .filter_map(|(slot, request)| request.as_ref().map(|r| (*slot, r.priority)))
        .max_by_key(|(_, priority)| *priority)
        .map(|(slot, _)| slot)
}
