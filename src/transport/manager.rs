use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::model::{ApnType, OperatingMode, SlotId, Transport};

/// What the caller should do in response to a preference update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoverDecision {
    /// Nothing to do — either the preferred transport didn't change, or
    /// there was no active session on this apn type to carry over.
    None,
    /// Move `apn_type` from `from` to `to`. The caller is responsible for
    /// actually running the handover and then calling
    /// [`TransportManager::complete_handover`].
    Required { apn_type: ApnType, from: Transport, to: Transport },
    /// A handover for `apn_type` is already underway; this update was
    /// queued and will be re-evaluated when that handover completes.
    Queued,
}

/// Tracks, per apn type, which transport is currently serving it and which
/// is preferred, and decides when that warrants a handover. Rules (in
/// order):
///
/// 1. In [`OperatingMode::Legacy`], transport selection is fixed at session
///    setup — this manager never initiates a handover.
/// 2. If a handover is already in flight for an apn type, a further update
///    for that type is queued rather than starting a second, overlapping
///    handover.
/// 3. Boot-in-airplane edge case: if no preference has ever been recorded
///    for this apn type and the new head access-network maps to WLAN, a
///    handover is needed even though nothing is currently active — there
///    may be requests outstanding that assumed the default of WWAN.
/// 4. If the current transport is already the most preferred one, the
///    preference is recorded but no handover is needed.
/// 5. If there's no active transport for the apn type yet, the preference
///    is simply adopted — there's nothing to hand over from.
pub struct TransportManager {
    slot: SlotId,
    mode: OperatingMode,
    preferred: RwLock<HashMap<ApnType, Vec<Transport>>>,
    current: RwLock<HashMap<ApnType, Transport>>,
    handover_in_progress: RwLock<HashSet<ApnType>>,
    queued: RwLock<HashMap<ApnType, Vec<Transport>>>,
}

impl TransportManager {
    pub fn new(slot: SlotId, mode: OperatingMode) -> Self {
        Self {
            slot,
            mode,
            preferred: RwLock::new(HashMap::new()),
            current: RwLock::new(HashMap::new()),
            handover_in_progress: RwLock::new(HashSet::new()),
            queued: RwLock::new(HashMap::new()),
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn current_transport(&self, apn_type: ApnType) -> Option<Transport> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).get(&apn_type).copied()
    }

    /// Registers that `apn_type` is now being served by `transport` without
    /// going through a handover decision — used right after a fresh
    /// activation picks its first transport.
    pub fn record_initial_transport(&self, apn_type: ApnType, transport: Transport) {
        self.current.write().unwrap_or_else(|e| e.into_inner()).insert(apn_type, transport);
    }

    pub fn record_teardown(&self, apn_type: ApnType) {
        self.current.write().unwrap_or_else(|e| e.into_inner()).remove(&apn_type);
    }

    /// Evaluates a fresh preference order for `apn_type`.
    pub fn evaluate(&self, apn_type: ApnType, new_preference: Vec<Transport>) -> HandoverDecision {
        if self.mode == OperatingMode::Legacy {
            return HandoverDecision::None;
        }

        if self.handover_in_progress.read().unwrap_or_else(|e| e.into_inner()).contains(&apn_type) {
            self.queued.write().unwrap_or_else(|e| e.into_inner()).insert(apn_type, new_preference);
            return HandoverDecision::Queued;
        }

        let previous_list_empty = self
            .preferred
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&apn_type)
            .map_or(true, |list| list.is_empty());

        let Some(&top) = new_preference.first() else {
            self.preferred.write().unwrap_or_else(|e| e.into_inner()).insert(apn_type, new_preference);
            return HandoverDecision::None;
        };

        if previous_list_empty && top == Transport::Wlan {
            self.preferred.write().unwrap_or_else(|e| e.into_inner()).insert(apn_type, new_preference);
            self.handover_in_progress.write().unwrap_or_else(|e| e.into_inner()).insert(apn_type);
            return HandoverDecision::Required { apn_type, from: Transport::Wwan, to: Transport::Wlan };
        }

        let current = self.current_transport(apn_type);
        self.preferred.write().unwrap_or_else(|e| e.into_inner()).insert(apn_type, new_preference);

        match current {
            Some(transport) if transport == top => HandoverDecision::None,
            Some(from) => {
                self.handover_in_progress.write().unwrap_or_else(|e| e.into_inner()).insert(apn_type);
                HandoverDecision::Required { apn_type, from, to: top }
            }
            None => {
                self.current.write().unwrap_or_else(|e| e.into_inner()).insert(apn_type, top);
                HandoverDecision::None
            }
        }
    }

    /// Marks a handover as finished. `succeeded = false` means the
    /// handover fell back to its original transport rather than completing
    /// — [`Self::current_transport`] is left unchanged in that case.
    ///
    /// Returns a queued preference to re-evaluate, if one accumulated while
    /// this handover was in flight. Queued updates only drain once there is
    /// no handover in progress for `apn_type`, per rule 2.
    pub fn complete_handover(&self, apn_type: ApnType, to: Transport, succeeded: bool) -> Option<Vec<Transport>> {
        self.handover_in_progress.write().unwrap_or_else(|e| e.into_inner()).remove(&apn_type);
        if succeeded {
            self.current.write().unwrap_or_else(|e| e.into_inner()).insert(apn_type, to);
        }
        self.queued.write().unwrap_or_else(|e| e.into_inner()).remove(&apn_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_mode_never_hands_over() {
        let manager = TransportManager::new(SlotId(0), OperatingMode::Legacy);
        manager.record_initial_transport(ApnType::DEFAULT, Transport::Wwan);
        let decision = manager.evaluate(ApnType::DEFAULT, vec![Transport::Wlan, Transport::Wwan]);
        assert_eq!(decision, HandoverDecision::None);
    }

    #[test]
    fn already_preferred_transport_needs_no_handover() {
        let manager = TransportManager::new(SlotId(0), OperatingMode::ApAssisted);
        manager.record_initial_transport(ApnType::DEFAULT, Transport::Wwan);
        let decision = manager.evaluate(ApnType::DEFAULT, vec![Transport::Wwan, Transport::Wlan]);
        assert_eq!(decision, HandoverDecision::None);
    }

    #[test]
    fn no_active_transport_just_adopts_a_non_wlan_preference() {
        let manager = TransportManager::new(SlotId(0), OperatingMode::ApAssisted);
        let decision = manager.evaluate(ApnType::DEFAULT, vec![Transport::Wwan, Transport::Wlan]);
        assert_eq!(decision, HandoverDecision::None);
        assert_eq!(manager.current_transport(ApnType::DEFAULT), Some(Transport::Wwan));
    }

    #[test]
    fn boot_in_airplane_mode_with_wlan_head_requires_handover() {
        let manager = TransportManager::new(SlotId(0), OperatingMode::ApAssisted);
        let decision = manager.evaluate(ApnType::DEFAULT, vec![Transport::Wlan, Transport::Wwan]);
        assert_eq!(
            decision,
            HandoverDecision::Required { apn_type: ApnType::DEFAULT, from: Transport::Wwan, to: Transport::Wlan }
        );
        assert_eq!(manager.current_transport(ApnType::DEFAULT), None);
    }

    #[test]
    fn preference_change_with_active_transport_requires_handover() {
        let manager = TransportManager::new(SlotId(0), OperatingMode::ApAssisted);
        manager.record_initial_transport(ApnType::DEFAULT, Transport::Wwan);
        let decision = manager.evaluate(ApnType::DEFAULT, vec![Transport::Wlan, Transport::Wwan]);
        assert_eq!(
            decision,
            HandoverDecision::Required { apn_type: ApnType::DEFAULT, from: Transport::Wwan, to: Transport::Wlan }
        );
    }

    #[test]
    fn update_during_in_flight_handover_is_queued_then_drains() {
        let manager = TransportManager::new(SlotId(0), OperatingMode::ApAssisted);
        manager.record_initial_transport(ApnType::DEFAULT, Transport::Wwan);
        let decision = manager.evaluate(ApnType::DEFAULT, vec![Transport::Wlan, Transport::Wwan]);
        assert!(matches!(decision, HandoverDecision::Required { .. }));

        let second = manager.evaluate(ApnType::DEFAULT, vec![Transport::Wwan, Transport::Wlan]);
        assert_eq!(second, HandoverDecision::Queued);

        let drained = manager.complete_handover(ApnType::DEFAULT, Transport::Wlan, true);
        assert_eq!(drained, Some(vec![Transport::Wwan, Transport::Wlan]));
        assert_eq!(manager.current_transport(ApnType::DEFAULT), Some(Transport::Wlan));
    }

    #[test]
    fn failed_handover_leaves_current_transport_unchanged() {
        let manager = TransportManager::new(SlotId(0), OperatingMode::ApAssisted);
        manager.record_initial_transport(ApnType::DEFAULT, Transport::Wwan);
        manager.evaluate(ApnType::DEFAULT, vec![Transport::Wlan, Transport::Wwan]);
        manager.complete_handover(ApnType::DEFAULT, Transport::Wlan, false);
        assert_eq!(manager.current_transport(ApnType::DEFAULT), Some(Transport::Wwan));
    }
}
