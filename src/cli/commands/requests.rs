use crate::config::EngineConfig;
use crate::model::ApnType;

use super::super::formatting::{format_header, format_muted};

const KNOWN_TYPES: &[(ApnType, &str)] = &[
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
];

/// Renders the apn-type priority order the dispatch arbitration uses, read
/// straight from config. This is the static table a live [`RequestRegistry`]
/// arbitrates over; without a running engine process there's no per-request
/// state to show, so this is what `dctl requests` can offer.
///
/// [`RequestRegistry`]: crate::request::RequestRegistry
pub fn render(config: &EngineConfig) -> String {
    let mut ranked: Vec<(&str, i32)> =
        KNOWN_TYPES.iter().map(|(apn_type, name)| (*name, config.apn_priority.priority_for(*apn_type))).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut out = String::new();
    out.push_str(&format_header("apn type priority order"));
    out.push('\n');
    if ranked.iter().all(|(_, priority)| *priority == 0) {
        out.push_str(&format!("  {}\n", format_muted("no priorities configured, all apn types rank equally")));
    }
    for (name, priority) in ranked {
        out.push_str(&format!("  {name:<12} {priority}\n"));
    }
    out
}
