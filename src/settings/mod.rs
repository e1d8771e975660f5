//! The data-enabled AND gate: whether packet data is permitted right now is
//! the conjunction of four independent switches, each owned by a different
//! part of the system.

use std::sync::RwLock;

use futures::Stream;

use crate::common::Property;

/// Which input changed — surfaced so callers can log or react to a
/// specific switch rather than only the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEnabledInput {
    Internal,
    User,
    Policy,
    Carrier,
}

/// `enabled = internal && effective_user && policy && carrier`, where
/// `effective_user` is the real user switch unless the device is mid
/// provisioning, in which case a separate provisioning-specific value
/// substitutes for it. [`Self::is_enabled`]'s [`Property`] only notifies
/// watchers when the aggregate actually flips — toggling one input while
/// another keeps the aggregate pinned produces no notification.
pub struct DataEnabledSettings {
    internal: RwLock<bool>,
    user: RwLock<bool>,
    policy: RwLock<bool>,
    carrier: RwLock<bool>,
    provisioning: RwLock<bool>,
    provisioning_data_enabled: RwLock<bool>,
    enabled: Property<bool>,
}

impl DataEnabledSettings {
    /// All four switches start enabled — permissive default, matching a
    /// freshly provisioned device with no active restriction.
    pub fn new() -> Self {
        Self {
            internal: RwLock::new(true),
            user: RwLock::new(true),
            policy: RwLock::new(true),
            carrier: RwLock::new(true),
            provisioning: RwLock::new(false),
            provisioning_data_enabled: RwLock::new(false),
            enabled: Property::new(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn watch_enabled(&self) -> impl Stream<Item = bool> + Send {
        self.enabled.watch()
    }

    pub fn set_internal(&self, value: bool) {
        *self.internal.write().unwrap_or_else(|e| e.into_inner()) = value;
        self.recompute();
    }

    pub fn set_user(&self, value: bool) {
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = value;
        self.recompute();
    }

    pub fn set_policy(&self, value: bool) {
        *self.policy.write().unwrap_or_else(|e| e.into_inner()) = value;
        self.recompute();
    }

    pub fn set_carrier(&self, value: bool) {
        *self.carrier.write().unwrap_or_else(|e| e.into_inner()) = value;
        self.recompute();
    }

    /// Enters provisioning mode. While provisioning, `provisioning_enabled`
    /// substitutes for the user switch; the real user switch is untouched
    /// and resumes governing the gate on [`Self::exit_provisioning`].
    pub fn enter_provisioning(&self, provisioning_enabled: bool) {
        *self.provisioning.write().unwrap_or_else(|e| e.into_inner()) = true;
        *self.provisioning_data_enabled.write().unwrap_or_else(|e| e.into_inner()) = provisioning_enabled;
        self.recompute();
    }

    pub fn exit_provisioning(&self) {
        *self.provisioning.write().unwrap_or_else(|e| e.into_inner()) = false;
        self.recompute();
    }

    fn effective_user(&self) -> bool {
        if *self.provisioning.read().unwrap_or_else(|e| e.into_inner()) {
            *self.provisioning_data_enabled.read().unwrap_or_else(|e| e.into_inner())
        } else {
            *self.user.read().unwrap_or_else(|e| e.into_inner())
        }
    }

    fn recompute(&self) {
        let value = *self.internal.read().unwrap_or_else(|e| e.into_inner())
            && self.effective_user()
            && *self.policy.read().unwrap_or_else(|e| e.into_inner())
            && *self.carrier.read().unwrap_or_else(|e| e.into_inner());
        self.enabled.set(value);
    }
}

impl Default for DataEnabledSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_single_false_input_disables() {
        let settings = DataEnabledSettings::new();
        assert!(settings.is_enabled());
        settings.set_carrier(false);
        assert!(!settings.is_enabled());
        settings.set_carrier(true);
        assert!(settings.is_enabled());
    }

    #[test]
    fn provisioning_substitutes_for_user_switch() {
        let settings = DataEnabledSettings::new();
        settings.set_user(false);
        assert!(!settings.is_enabled());
        settings.enter_provisioning(true);
        assert!(settings.is_enabled());
        settings.exit_provisioning();
        assert!(!settings.is_enabled());
    }

    #[tokio::test]
    async fn aggregate_notifies_only_on_actual_flip() {
        use futures::StreamExt;
        let settings = DataEnabledSettings::new();
        let mut watch = Box::pin(settings.watch_enabled());
        assert_eq!(watch.next().await, Some(true));

        settings.set_policy(false);
        assert_eq!(watch.next().await, Some(false));

        // Flipping carrier while already disabled by policy keeps the
        // aggregate at `false` — no further notification should be queued
        // ahead of the next real flip.
        settings.set_carrier(false);
        settings.set_carrier(true);
        settings.set_policy(true);
        assert_eq!(watch.next().await, Some(true));
    }
}
