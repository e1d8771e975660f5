use thiserror::Error;

use crate::model::{ApnProfile, ApnType, AuthType, IpProtocol, MvnoMatchType};

const CURRENT_VERSION: u32 = 5;

/// Column order for every version, after the leading `V<n>` token. Earlier
/// versions simply truncate this list from the right; missing trailing
/// fields are defaulted.
const FIELD_COUNT: usize = 28;

/// Errors while parsing a line of the APN database format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApnParseError {
    #[error("empty line")]
    Empty,
    #[error("missing version prefix")]
    MissingVersion,
    #[error("unsupported apn db version: {0}")]
    UnsupportedVersion(String),
    #[error("invalid integer in field {field}: {value}")]
    InvalidInt { field: &'static str, value: String },
    #[error("invalid apn type token: {0}")]
    InvalidApnType(String),
    #[error("invalid ip protocol: {0}")]
    InvalidProtocol(String),
    #[error("invalid auth type: {0}")]
    InvalidAuthType(String),
    #[error("invalid mvno type: {0}")]
    InvalidMvnoType(String),
}

/// Full row of the APN database, including columns that the core data
/// model doesn't carry (the human-readable carrier label and modem
/// connection-pooling hints). [`ApnRecord::profile`] is the [`ApnProfile`]
/// the rest of the engine actually consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct ApnRecord {
    pub carrier: String,
    pub mcc: String,
    pub mnc: String,
    pub profile: ApnProfile,
    pub legacy_bearer_bitmask: u32,
    pub modem_cognitive: bool,
    pub max_conns: i32,
    pub wait_time_s: i32,
    pub max_conns_time_s: i32,
}

fn types_to_string(types: ApnType) -> String {
    const TABLE: &[(ApnType, &str)] = &[
        (ApnType::DEFAULT, "default"),
        (ApnType::MMS, "mms"),
        (ApnType::SUPL, "supl"),
        (ApnType::DUN, "dun"),
        (ApnType::HIPRI, "hipri"),
        (ApnType::FOTA, "fota"),
        (ApnType::IMS, "ims"),
        (ApnType::CBS, "cbs"),
        (ApnType::IA, "ia"),
        (ApnType::EMERGENCY, "emergency"),
        (ApnType::ALL, "*"),
    ];
    if types.contains(ApnType::ALL) {
        return "*".to_string();
    }
    TABLE
        .iter()
        .filter(|(bit, name)| *name != "*" && types.contains(*bit))
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join("|")
}

fn string_to_types(s: &str) -> Result<ApnType, ApnParseError> {
    let mut acc = ApnType::empty();
    for token in s.split('|') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let bit = match token {
            "default" => ApnType::DEFAULT,
            "mms" => ApnType::MMS,
            "supl" => ApnType::SUPL,
            "dun" => ApnType::DUN,
            "hipri" => ApnType::HIPRI,
            "fota" => ApnType::FOTA,
            "ims" => ApnType::IMS,
            "cbs" => ApnType::CBS,
            "ia" => ApnType::IA,
            "emergency" => ApnType::EMERGENCY,
            "*" => ApnType::ALL,
            other => return Err(ApnParseError::InvalidApnType(other.to_string())),
        };
        acc |= bit;
    }
    Ok(acc)
}

fn protocol_to_string(p: IpProtocol) -> &'static str {
    match p {
        IpProtocol::Ipv4 => "IP",
        IpProtocol::Ipv6 => "IPV6",
        IpProtocol::Ipv4v6 => "IPV4V6",
    }
}

fn string_to_protocol(s: &str) -> Result<IpProtocol, ApnParseError> {
    match s {
        "IP" => Ok(IpProtocol::Ipv4),
        "IPV6" => Ok(IpProtocol::Ipv6),
        "IPV4V6" => Ok(IpProtocol::Ipv4v6),
        other => Err(ApnParseError::InvalidProtocol(other.to_string())),
    }
}

fn auth_to_int(a: AuthType) -> i32 {
    match a {
        AuthType::None => 0,
        AuthType::Pap => 1,
        AuthType::Chap => 2,
        AuthType::PapOrChap => 3,
    }
}

fn int_to_auth(v: i32) -> Result<AuthType, ApnParseError> {
    match v {
        0 => Ok(AuthType::None),
        1 => Ok(AuthType::Pap),
        2 => Ok(AuthType::Chap),
        3 => Ok(AuthType::PapOrChap),
        other => Err(ApnParseError::InvalidAuthType(other.to_string())),
    }
}

fn mvno_to_string(m: MvnoMatchType) -> &'static str {
    match m {
        MvnoMatchType::None => "none",
        MvnoMatchType::Spn => "spn",
        MvnoMatchType::Imsi => "imsi",
        MvnoMatchType::Gid => "gid",
        MvnoMatchType::IccId => "iccid",
    }
}

fn string_to_mvno(s: &str) -> Result<MvnoMatchType, ApnParseError> {
    match s {
        "" | "none" => Ok(MvnoMatchType::None),
        "spn" => Ok(MvnoMatchType::Spn),
        "imsi" => Ok(MvnoMatchType::Imsi),
        "gid" => Ok(MvnoMatchType::Gid),
        "iccid" => Ok(MvnoMatchType::IccId),
        other => Err(ApnParseError::InvalidMvnoType(other.to_string())),
    }
}

fn parse_int(field: &'static str, value: &str, default: i64) -> Result<i64, ApnParseError> {
    if value.is_empty() {
        return Ok(default);
    }
    value
        .parse::<i64>()
        .map_err(|_| ApnParseError::InvalidInt { field, value: value.to_string() })
}

fn opt_string(value: &str) -> Option<String> {
    if value.is_empty() { None } else { Some(value.to_string()) }
}

/// Parses one line of the APN database format. Accepts version prefixes
/// `V1` through `V5`; fields trailing beyond what the line's version
/// carries are defaulted.
pub fn parse_apn_line(line: &str) -> Result<ApnRecord, ApnParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ApnParseError::Empty);
    }

    let mut parts = line.split(',');
    let version_token = parts.next().ok_or(ApnParseError::MissingVersion)?;
    let version: u32 = version_token
        .strip_prefix('V')
        .and_then(|v| v.parse().ok())
        .filter(|v| (1..=5).contains(v))
        .ok_or_else(|| ApnParseError::UnsupportedVersion(version_token.to_string()))?;

    let mut fields: Vec<&str> = parts.collect();
    if fields.len() > FIELD_COUNT {
        fields.truncate(FIELD_COUNT);
    }
    while fields.len() < FIELD_COUNT {
        fields.push("");
    }
    let _ = version; // only gates which fields are *expected*; defaulting handles the rest uniformly

    let f = |i: usize| -> &str { fields[i] };

    let carrier = f(0).to_string();
    let apn = f(1).to_string();
    let proxy = opt_string(f(2));
    let port = opt_string(f(3)).and_then(|p| p.parse::<u16>().ok());
    let user = opt_string(f(4));
    let password = opt_string(f(5));
    // f(6) is "server", historically unused by the modem; parsed but not
    // carried in ApnProfile.
    let mmsc = opt_string(f(7));
    let mms_proxy = opt_string(f(8));
    let mms_port = opt_string(f(9)).and_then(|p| p.parse::<u16>().ok());
    let mcc = f(10).to_string();
    let mnc = f(11).to_string();
    let auth_type = int_to_auth(parse_int("authType", f(12), 0)? as i32)?;
    let supported_types = string_to_types(f(13))?;
    let protocol = if f(14).is_empty() { IpProtocol::Ipv4 } else { string_to_protocol(f(14))? };
    let roaming_protocol =
        if f(15).is_empty() { IpProtocol::Ipv4 } else { string_to_protocol(f(15))? };
    let carrier_enabled = f(16).is_empty() || f(16) == "1";
    let legacy_bearer_bitmask = parse_int("bearerBitmask", f(17), 0)? as u32;
    let profile_id = parse_int("profileId", f(18), 0)? as i32;
    let modem_cognitive = f(19) == "1";
    let max_conns = parse_int("maxConns", f(20), 0)? as i32;
    let wait_time_s = parse_int("waitTime", f(21), 0)? as i32;
    let max_conns_time_s = parse_int("maxConnsTime", f(22), 0)? as i32;
    let mtu = parse_int("mtu", f(23), 0)? as u32;
    let mvno_match_type = string_to_mvno(f(24))?;
    let mvno_match_data = opt_string(f(25));
    let network_type_bitmask = parse_int("networkTypeBitmask", f(26), legacy_bearer_bitmask as i64)? as u32;
    let apn_set_id = parse_int("apnSetId", f(27), 0)? as i32;

    let profile = ApnProfile {
        plmn_id: format!("{mcc}{mnc}"),
        apn,
        proxy,
        port,
        mmsc,
        mms_proxy,
        mms_port,
        user,
        password,
        auth_type,
        supported_types,
        protocol,
        roaming_protocol,
        carrier_enabled,
        network_type_bitmask,
        profile_id,
        mtu,
        mvno_match_type,
        mvno_match_data,
        apn_set_id,
    };

    Ok(ApnRecord {
        carrier,
        mcc,
        mnc,
        profile,
        legacy_bearer_bitmask,
        modem_cognitive,
        max_conns,
        wait_time_s,
        max_conns_time_s,
    })
}

/// Serializes an [`ApnRecord`] back to the current (`V5`) line format.
pub fn serialize_apn_line(record: &ApnRecord) -> String {
    let p = &record.profile;
    let fields: [String; FIELD_COUNT] = [
        record.carrier.clone(),
        p.apn.clone(),
        p.proxy.clone().unwrap_or_default(),
        p.port.map(|v| v.to_string()).unwrap_or_default(),
        p.user.clone().unwrap_or_default(),
        p.password.clone().unwrap_or_default(),
        String::new(), // server
        p.mmsc.clone().unwrap_or_default(),
        p.mms_proxy.clone().unwrap_or_default(),
        p.mms_port.map(|v| v.to_string()).unwrap_or_default(),
        record.mcc.clone(),
        record.mnc.clone(),
        auth_to_int(p.auth_type).to_string(),
        types_to_string(p.supported_types),
        protocol_to_string(p.protocol).to_string(),
        protocol_to_string(p.roaming_protocol).to_string(),
        if p.carrier_enabled { "1" } else { "0" }.to_string(),
        record.legacy_bearer_bitmask.to_string(),
        p.profile_id.to_string(),
        if record.modem_cognitive { "1" } else { "0" }.to_string(),
        record.max_conns.to_string(),
        record.wait_time_s.to_string(),
        record.max_conns_time_s.to_string(),
        p.mtu.to_string(),
        mvno_to_string(p.mvno_match_type).to_string(),
        p.mvno_match_data.clone().unwrap_or_default(),
        p.network_type_bitmask.to_string(),
        p.apn_set_id.to_string(),
    ];

    format!("V{CURRENT_VERSION},{}", fields.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ApnRecord {
        parse_apn_line(
            "V5,Example Carrier,ims,,,,,,,,310,260,0,ims,IPV4V6,IPV4V6,1,4294967295,0,0,0,0,0,1500,none,,4294967295,0",
        )
        .expect("parses")
    }

    #[test]
    fn round_trip_v5() {
        let record = sample();
        let serialized = serialize_apn_line(&record);
        let reparsed = parse_apn_line(&serialized).expect("reparses");
        assert_eq!(record, reparsed);
    }

    #[test]
    fn plmn_id_is_mcc_plus_mnc() {
        let record = sample();
        assert_eq!(record.profile.plmn_id, "310260");
    }

    #[test]
    fn pipe_separated_types_parse_to_bitmask() {
        let record =
            parse_apn_line("V5,C,apn,,,,,,,,,310,260,0,default|mms,IP,IP,1,0,0,0,0,0,0,1500,none,,0,0")
                .expect("parses");
        assert!(record.profile.supported_types.contains(ApnType::DEFAULT));
        assert!(record.profile.supported_types.contains(ApnType::MMS));
        assert!(!record.profile.supported_types.contains(ApnType::IMS));
    }

    #[test]
    fn lower_version_defaults_missing_trailing_fields() {
        // V1-style line with only the leading columns present.
        let record = parse_apn_line("V1,Carrier,apn,proxy.example,8080,user,pass").expect("parses");
        assert_eq!(record.profile.apn, "apn");
        assert_eq!(record.profile.proxy.as_deref(), Some("proxy.example"));
        assert_eq!(record.profile.mtu, 0);
        assert_eq!(record.profile.apn_set_id, 0);
        assert!(record.profile.carrier_enabled);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        assert_eq!(
            parse_apn_line("V9,Carrier,apn"),
            Err(ApnParseError::UnsupportedVersion("V9".to_string()))
        );
    }

    #[test]
    fn empty_line_is_rejected() {
        assert_eq!(parse_apn_line(""), Err(ApnParseError::Empty));
        assert_eq!(parse_apn_line("   "), Err(ApnParseError::Empty));
    }

    #[test]
    fn invalid_apn_type_token_is_rejected() {
        let err =
            parse_apn_line("V5,C,apn,,,,,,,,,310,260,0,bogus,IP,IP,1,0,0,0,0,0,0,1500,none,,0,0");
        assert_eq!(err, Err(ApnParseError::InvalidApnType("bogus".to_string())));
    }
}
