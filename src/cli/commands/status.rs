use crate::config::EngineConfig;

use super::super::formatting::{format_header, format_label, format_muted};

/// Renders the resolved operating mode, attach toggle inputs, and carrier
/// overrides for the given config snapshot. Pure string formatting so it
/// can be unit tested without a live engine.
pub fn render(config: &EngineConfig, hal_major_version: u32) -> String {
    let mode = config.operating_mode.resolve(hal_major_version);
    let mut out = String::new();

    out.push_str(&format_header("general"));
    out.push('\n');
    out.push_str(&format!(
        "  {} {:?}\n  {} {}\n",
        format_label("log level:"),
        config.general.log_level,
        format_label("json logs:"),
        config.general.json_logs
    ));

    out.push_str(&format_header("operating mode"));
    out.push('\n');
    out.push_str(&format!(
        "  {} {:?} (hal major version {})\n",
        format_label("resolved:"),
        mode,
        hal_major_version
    ));
    if let Some(forced) = config.operating_mode.override_mode {
        out.push_str(&format!("  {} {:?}\n", format_label("override:"), forced));
    }

    out.push_str(&format_header("carrier overrides"));
    out.push('\n');
    if config.carriers.package_overrides.is_empty() {
        out.push_str(&format!("  {}\n", format_muted("none configured")));
    } else {
        let mut entries: Vec<_> = config.carriers.package_overrides.iter().collect();
        entries.sort_by_key(|(sub, _)| **sub);
        for (subscription, package) in entries {
            out.push_str(&format!("  sub {subscription} -> {package}\n"));
        }
    }

    out
}
