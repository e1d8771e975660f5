use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::apn::IpProtocol;
use super::ids::Cid;

/// Sentinel used by the modem for "never retry". Mirrors the modem's
/// `MAX_INT` convention literally rather than re-deriving it.
pub const NEVER_RETRY_SENTINEL: i64 = i64::MAX;

/// How the engine should treat `suggestedRetryMs` from a failed setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryHint {
    /// No delay was suggested; the local [`crate::connection::RetryManager`]
    /// decides.
    UseRetryManager,
    /// Permanent failure; never retry until an external trigger.
    Never,
    /// Retry after exactly this delay.
    After(Duration),
}

impl From<i64> for RetryHint {
    fn from(suggested_retry_ms: i64) -> Self {
        if suggested_retry_ms == NEVER_RETRY_SENTINEL {
            RetryHint::Never
        } else if suggested_retry_ms < 0 {
            RetryHint::UseRetryManager
        } else {
            RetryHint::After(Duration::from_millis(suggested_retry_ms as u64))
        }
    }
}

/// Classification of a modem-reported failure cause, driving whether the
/// engine retries, gives up permanently, or asks the radio to restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Permanent,
    RadioRestart,
}

/// A modem fail cause code. `0` is reserved for success and never
/// constructed here; see [`DataCallStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailCause(pub i32);

impl FailCause {
    /// Best-effort classification of a fail cause. Unknown causes default
    /// to transient, since retrying a session we don't understand is safer
    /// than abandoning it outright.
    pub fn classify(self) -> FailureClass {
        match self.0 {
            // Radio/modem needs to be restarted to recover.
            -2..=-1 => FailureClass::RadioRestart,
            // Well-known permanent failures (APN rejected by network,
            // user authentication failure, service not subscribed, protocol
            // mismatch) sit in a small low range by convention.
            8 | 27 | 33 | 34 => FailureClass::Permanent,
            _ => FailureClass::Transient,
        }
    }
}

/// Result of a `setup_data_call` / `get_data_call_list` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCallStatus {
    Success,
    Failed(FailCause),
}

impl DataCallStatus {
    pub fn from_raw(status: i32) -> Self {
        if status == 0 { DataCallStatus::Success } else { DataCallStatus::Failed(FailCause(status)) }
    }
}

/// Per-session link activity as reported by the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Inactive,
    Dormant,
    Active,
}

/// The `{ifname, addresses, DNS, routes, MTU, http-proxy}` tuple describing
/// a live session's network.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkProperties {
    pub ifname: String,
    pub addresses: Vec<IpAddr>,
    pub dnses: Vec<IpAddr>,
    pub gateways: Vec<IpAddr>,
    pub pcscf: Vec<IpAddr>,
    pub http_proxy: Option<String>,
    pub mtu: u32,
}

/// Describes how two [`LinkProperties`] differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPropertiesDelta {
    /// Nothing changed.
    Identical,
    /// Same interface, details differ, safe to apply in place.
    UpdateInPlace,
    /// Same interface, but an address family was dropped and re-added (or
    /// the interface name itself changed) — requires tearing the session
    /// down so the stack resets cleanly.
    RequiresCleanup,
}

impl LinkProperties {
    /// Compares `self` (old) against `new`.
    pub fn reconcile(&self, new: &LinkProperties) -> LinkPropertiesDelta {
        if self == new {
            return LinkPropertiesDelta::Identical;
        }
        if self.ifname != new.ifname {
            return LinkPropertiesDelta::RequiresCleanup;
        }
        if address_family_removed_and_readded(&self.addresses, &new.addresses) {
            return LinkPropertiesDelta::RequiresCleanup;
        }
        LinkPropertiesDelta::UpdateInPlace
    }
}

fn family_of(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 4,
        IpAddr::V6(_) => 6,
    }
}

/// True if some address family present in `old` is absent from `new`, but
/// a (possibly different) address of that same family appears again — i.e.
/// the family was dropped and then re-added, rather than just changed.
///
/// We approximate "removed and re-added" (which in the source requires
/// observing an intermediate state) as: the old address of that family is
/// gone, *and* a new address of that family is present but not equal to any
/// address of that family that was already there — i.e. the set of
/// addresses for that family changed at all while neither being a pure
/// superset nor staying identical is what the source treats as "interface
/// reset required".
fn address_family_removed_and_readded(old: &[IpAddr], new: &[IpAddr]) -> bool {
    for family in [4u8, 6u8] {
        let old_of_family: Vec<&IpAddr> = old.iter().filter(|a| family_of(a) == family).collect();
        let new_of_family: Vec<&IpAddr> = new.iter().filter(|a| family_of(a) == family).collect();
        if old_of_family.is_empty() || new_of_family.is_empty() {
            continue;
        }
        let removed = old_of_family.iter().any(|a| !new_of_family.contains(a));
        let added = new_of_family.iter().any(|a| !old_of_family.contains(a));
        if removed && added {
            return true;
        }
    }
    false
}

/// Result of a setup/deactivate/list-query modem operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCallResponse {
    pub status: DataCallStatus,
    pub suggested_retry: RetryHint,
    pub cid: Cid,
    pub link_status: LinkStatus,
    pub ip_type: IpProtocol,
    pub ifname: String,
    pub addresses: Vec<IpAddr>,
    pub dnses: Vec<IpAddr>,
    pub gateways: Vec<IpAddr>,
    pub pcscf: Vec<IpAddr>,
    pub mtu: u32,
}

/// Violated model invariant, surfaced synchronously by [`DataCallResponse::validate`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataCallResponseError {
    #[error("success response for cid {0} carries an empty interface name")]
    EmptyIfnameOnSuccess(Cid),
}

impl DataCallResponse {
    /// Invariant: if `status == Success` then `ifname` is non-empty.
    pub fn validate(&self) -> Result<(), DataCallResponseError> {
        if self.status == DataCallStatus::Success && self.ifname.is_empty() {
            return Err(DataCallResponseError::EmptyIfnameOnSuccess(self.cid));
        }
        Ok(())
    }

    pub fn link_properties(&self) -> LinkProperties {
        LinkProperties {
            ifname: self.ifname.clone(),
            addresses: self.addresses.clone(),
            dnses: self.dnses.clone(),
            gateways: self.gateways.clone(),
            pcscf: self.pcscf.clone(),
            http_proxy: None,
            mtu: self.mtu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_retry_sentinel_maps_to_never() {
        assert_eq!(RetryHint::from(NEVER_RETRY_SENTINEL), RetryHint::Never);
    }

    #[test]
    fn negative_suggestion_defers_to_retry_manager() {
        assert_eq!(RetryHint::from(-1), RetryHint::UseRetryManager);
    }

    #[test]
    fn non_negative_suggestion_is_used_literally() {
        assert_eq!(RetryHint::from(3000), RetryHint::After(Duration::from_millis(3000)));
        assert_eq!(RetryHint::from(0), RetryHint::After(Duration::from_millis(0)));
    }

    #[test]
    fn success_requires_nonempty_ifname() {
        let mut resp = DataCallResponse {
            status: DataCallStatus::Success,
            suggested_retry: RetryHint::Never,
            cid: 7,
            link_status: LinkStatus::Active,
            ip_type: IpProtocol::Ipv4,
            ifname: String::new(),
            addresses: vec![],
            dnses: vec![],
            gateways: vec![],
            pcscf: vec![],
            mtu: 1500,
        };
        assert!(resp.validate().is_err());
        resp.ifname = "rmnet0".into();
        assert!(resp.validate().is_ok());
    }

    #[test]
    fn identical_link_properties_need_no_change() {
        let a = LinkProperties { ifname: "rmnet0".into(), mtu: 1500, ..Default::default() };
        let b = a.clone();
        assert_eq!(a.reconcile(&b), LinkPropertiesDelta::Identical);
    }

    #[test]
    fn different_ifname_requires_cleanup() {
        let a = LinkProperties { ifname: "rmnet0".into(), ..Default::default() };
        let b = LinkProperties { ifname: "rmnet1".into(), ..Default::default() };
        assert_eq!(a.reconcile(&b), LinkPropertiesDelta::RequiresCleanup);
    }

    #[test]
    fn dns_only_change_updates_in_place() {
        let a = LinkProperties {
            ifname: "rmnet0".into(),
            dnses: vec!["8.8.8.8".parse().unwrap()],
            ..Default::default()
        };
        let b = LinkProperties {
            ifname: "rmnet0".into(),
            dnses: vec!["8.8.4.4".parse().unwrap()],
            ..Default::default()
        };
        assert_eq!(a.reconcile(&b), LinkPropertiesDelta::UpdateInPlace);
    }

    #[test]
    fn address_family_removed_and_readded_requires_cleanup() {
        let a = LinkProperties {
            ifname: "rmnet0".into(),
            addresses: vec!["10.0.0.2".parse().unwrap()],
            ..Default::default()
        };
        let b = LinkProperties {
            ifname: "rmnet0".into(),
            addresses: vec!["10.0.0.3".parse().unwrap()],
            ..Default::default()
        };
        assert_eq!(a.reconcile(&b), LinkPropertiesDelta::RequiresCleanup);
    }

    #[test]
    fn pure_addition_of_new_family_updates_in_place() {
        let a = LinkProperties {
            ifname: "rmnet0".into(),
            addresses: vec!["10.0.0.2".parse().unwrap()],
            ..Default::default()
        };
        let b = LinkProperties {
            ifname: "rmnet0".into(),
            addresses: vec!["10.0.0.2".parse().unwrap(), "fe80::1".parse().unwrap()],
            ..Default::default()
        };
        assert_eq!(a.reconcile(&b), LinkPropertiesDelta::UpdateInPlace);
    }
}
