use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::ids::LocalSessionId;

bitflags! {
    /// Functional roles a packet-data session can serve. Represented as a
    /// bitmask because an [`ApnProfile`] can support more than one at once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ApnType: u32 {
        const DEFAULT   = 1 << 0;
        const MMS       = 1 << 1;
        const SUPL      = 1 << 2;
        const DUN       = 1 << 3;
        const HIPRI     = 1 << 4;
        const FOTA      = 1 << 5;
        const IMS       = 1 << 6;
        const CBS       = 1 << 7;
        const IA        = 1 << 8;
        const EMERGENCY = 1 << 9;
        const ALL       = 1 << 10;
    }
}

impl ApnType {
    /// A request may only ever name exactly one functional role.
    pub fn single(self) -> Option<ApnType> {
        if self.bits().count_ones() == 1 { Some(self) } else { None }
    }
}

/// IP protocol family an [`ApnProfile`] requests for a data call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpProtocol {
    Ipv4,
    Ipv6,
    Ipv4v6,
}

/// Modem authentication scheme for an APN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthType {
    None,
    Pap,
    Chap,
    PapOrChap,
}

/// MVNO match rule, carried opaquely — the engine never interprets `data`,
/// only forwards it to the carrier configuration store for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MvnoMatchType {
    None,
    Spn,
    Imsi,
    Gid,
    IccId,
}

/// Immutable description of a requested APN configuration, as read from the
/// read-only APN database (see [`crate::apndb`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApnProfile {
    pub plmn_id: String,
    pub apn: String,
    pub proxy: Option<String>,
    pub port: Option<u16>,
    pub mmsc: Option<String>,
    pub mms_proxy: Option<String>,
    pub mms_port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub auth_type: AuthType,
    pub supported_types: ApnType,
    pub protocol: IpProtocol,
    pub roaming_protocol: IpProtocol,
    pub carrier_enabled: bool,
    pub network_type_bitmask: u32,
    pub profile_id: i32,
    pub mtu: u32,
    pub mvno_match_type: MvnoMatchType,
    pub mvno_match_data: Option<String>,
    pub apn_set_id: i32,
}

impl ApnProfile {
    /// `apn.canHandle(t) iff t in supportedTypes
    ///   or (t != IA and ALL in supportedTypes)
    ///   or (t == HIPRI and DEFAULT in supportedTypes)`
    pub fn can_handle(&self, t: ApnType) -> bool {
        if self.supported_types.contains(t) {
            return true;
        }
        if t != ApnType::IA && self.supported_types.contains(ApnType::ALL) {
            return true;
        }
        if t == ApnType::HIPRI && self.supported_types.contains(ApnType::DEFAULT) {
            return true;
        }
        false
    }
}

/// Live, ref-counted counterpart of an [`ApnProfile`]. Lives for the slot's
/// lifetime; the first ref-count increment requests a session, the last
/// decrement releases it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApnContext {
    pub apn_type: ApnType,
    pub profile: ApnProfile,
    ref_count: u32,
    pub session: Option<LocalSessionId>,
}

impl ApnContext {
    pub fn new(apn_type: ApnType, profile: ApnProfile) -> Self {
        Self { apn_type, profile, ref_count: 0, session: None }
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Increments the ref-count. Returns `true` if this was the
    /// zero-to-one transition that should request a session.
    pub fn acquire(&mut self) -> bool {
        self.ref_count += 1;
        self.ref_count == 1
    }

    /// Decrements the ref-count. Returns `true` if this was the
    /// one-to-zero transition that should release the session.
    ///
    /// No-op (returns `false`) if the ref-count is already zero.
    pub fn release(&mut self) -> bool {
        if self.ref_count == 0 {
            return false;
        }
        self.ref_count -= 1;
        self.ref_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(types: ApnType) -> ApnProfile {
        ApnProfile {
            plmn_id: "310260".into(),
            apn: "ims".into(),
            proxy: None,
            port: None,
            mmsc: None,
            mms_proxy: None,
            mms_port: None,
            user: None,
            password: None,
            auth_type: AuthType::None,
            supported_types: types,
            protocol: IpProtocol::Ipv4v6,
            roaming_protocol: IpProtocol::Ipv4v6,
            carrier_enabled: true,
            network_type_bitmask: 0,
            profile_id: 1,
            mtu: 1500,
            mvno_match_type: MvnoMatchType::None,
            mvno_match_data: None,
            apn_set_id: 0,
        }
    }

    #[test]
    fn can_handle_direct_membership() {
        let p = profile(ApnType::IMS);
        assert!(p.can_handle(ApnType::IMS));
        assert!(!p.can_handle(ApnType::MMS));
    }

    #[test]
    fn can_handle_all_except_initial_attach() {
        let p = profile(ApnType::ALL);
        assert!(p.can_handle(ApnType::MMS));
        assert!(p.can_handle(ApnType::IMS));
        assert!(!p.can_handle(ApnType::IA));
    }

    #[test]
    fn can_handle_hipri_via_default() {
        let p = profile(ApnType::DEFAULT);
        assert!(p.can_handle(ApnType::HIPRI));
    }

    #[test]
    fn can_handle_hipri_requires_default_specifically() {
        let p = profile(ApnType::MMS);
        assert!(!p.can_handle(ApnType::HIPRI));
    }

    #[test]
    fn ref_count_first_increment_requests_session() {
        let mut ctx = ApnContext::new(ApnType::DEFAULT, profile(ApnType::DEFAULT));
        assert!(ctx.acquire());
        assert!(!ctx.acquire());
        assert_eq!(ctx.ref_count(), 2);
    }

    #[test]
    fn ref_count_last_decrement_releases_session() {
        let mut ctx = ApnContext::new(ApnType::DEFAULT, profile(ApnType::DEFAULT));
        ctx.acquire();
        ctx.acquire();
        assert!(!ctx.release());
        assert!(ctx.release());
        assert_eq!(ctx.ref_count(), 0);
    }

    #[test]
    fn release_below_zero_is_a_no_op() {
        let mut ctx = ApnContext::new(ApnType::DEFAULT, profile(ApnType::DEFAULT));
        assert!(!ctx.release());
        assert_eq!(ctx.ref_count(), 0);
    }

    #[test]
    fn apn_type_single_rejects_multi_bit_masks() {
        assert_eq!(ApnType::IMS.single(), Some(ApnType::IMS));
        assert_eq!((ApnType::IMS | ApnType::MMS).single(), None);
    }
}
