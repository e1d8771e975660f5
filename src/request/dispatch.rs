use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Attach state for a slot's overall "is data allowed" toggle — distinct
/// from any individual session's [`crate::connection::ConnectionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Attaching,
    Attached,
    Detaching,
    Emergency,
}

/// Drives the slot-wide `set_data_allowed` toggle. Every request is tagged
/// with a sequence number; a completion is only applied if its sequence
/// matches the most recently issued request, so a response to a
/// superseded (and possibly wrong-polarity) request is dropped instead of
/// clobbering a state the caller has already moved past.
pub struct DispatchStateMachine {
    state: RwLock<DispatchState>,
    next_sequence: AtomicU64,
    last_sent_sequence: AtomicU64,
    pre_emergency_state: RwLock<Option<DispatchState>>,
}

impl Default for DispatchStateMachine {
    fn default() -> Self {
        Self {
            state: RwLock::new(DispatchState::Idle),
            next_sequence: AtomicU64::new(1),
            last_sent_sequence: AtomicU64::new(0),
            pre_emergency_state: RwLock::new(None),
        }
    }
}

impl DispatchStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DispatchState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Issues a new `set_data_allowed(allowed)` request, superseding any
    /// request still outstanding. Returns the sequence number the caller
    /// must tag the eventual completion with.
    pub fn request_set_data_allowed(&self, allowed: bool) -> u64 {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        self.last_sent_sequence.store(sequence, Ordering::SeqCst);
        *self.state.write().unwrap_or_else(|e| e.into_inner()) =
            if allowed { DispatchState::Attaching } else { DispatchState::Detaching };
        sequence
    }

    /// Applies a `set_data_allowed` completion. Returns `false` (and
    /// leaves state untouched) if `sequence` is stale.
    pub fn complete_set_data_allowed(&self, sequence: u64, allowed: bool, success: bool) -> bool {
        if sequence != self.last_sent_sequence.load(Ordering::SeqCst) {
            return false;
        }
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = match (success, allowed) {
            (true, true) => DispatchState::Attached,
            (true, false) => DispatchState::Idle,
            // A failed transition reverts to the opposite terminal state of
            // what was attempted: a failed attach drops back to Idle, a
            // failed detach stays Attached.
            (false, true) => DispatchState::Idle,
            (false, false) => DispatchState::Attached,
        };
        true
    }

    /// Enters the emergency override, remembering the prior state so it
    /// can be restored once the emergency call ends.
    pub fn enter_emergency(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *self.pre_emergency_state.write().unwrap_or_else(|e| e.into_inner()) = Some(*state);
        *state = DispatchState::Emergency;
    }

    /// Leaves the emergency override, restoring whatever state preceded
    /// it (or `Idle` if none was recorded).
    pub fn exit_emergency(&self) {
        let restored = self.pre_emergency_state.write().unwrap_or_else(|e| e.into_inner()).take();
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = restored.unwrap_or(DispatchState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_attach_reaches_attached() {
        let dispatch = DispatchStateMachine::new();
        let sequence = dispatch.request_set_data_allowed(true);
        assert_eq!(dispatch.state(), DispatchState::Attaching);
        assert!(dispatch.complete_set_data_allowed(sequence, true, true));
        assert_eq!(dispatch.state(), DispatchState::Attached);
    }

    #[test]
    fn stale_completion_is_dropped() {
        let dispatch = DispatchStateMachine::new();
        let first = dispatch.request_set_data_allowed(true);
        let _second = dispatch.request_set_data_allowed(false);
        // The first request's completion arrives late, with the opposite
        // polarity of what's now outstanding — it must not be applied.
        assert!(!dispatch.complete_set_data_allowed(first, true, true));
        assert_eq!(dispatch.state(), DispatchState::Detaching);
    }

    #[test]
    fn failed_attach_reverts_to_idle() {
        let dispatch = DispatchStateMachine::new();
        let sequence = dispatch.request_set_data_allowed(true);
        assert!(dispatch.complete_set_data_allowed(sequence, true, false));
        assert_eq!(dispatch.state(), DispatchState::Idle);
    }

    #[test]
    fn failed_detach_reverts_to_attached() {
        let dispatch = DispatchStateMachine::new();
        let first = dispatch.request_set_data_allowed(true);
        dispatch.complete_set_data_allowed(first, true, true);
        let second = dispatch.request_set_data_allowed(false);
        assert!(dispatch.complete_set_data_allowed(second, false, false));
        assert_eq!(dispatch.state(), DispatchState::Attached);
    }

    #[test]
    fn emergency_override_restores_prior_state() {
        let dispatch = DispatchStateMachine::new();
        let sequence = dispatch.request_set_data_allowed(true);
        dispatch.complete_set_data_allowed(sequence, true, true);
        dispatch.enter_emergency();
        assert_eq!(dispatch.state(), DispatchState::Emergency);
        dispatch.exit_emergency();
        assert_eq!(dispatch.state(), DispatchState::Attached);
    }
}
