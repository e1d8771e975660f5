//! Styled terminal output for `dctl`, carried over from the config CLI's
//! formatting conventions.

/// ANSI color codes for terminal output.
pub struct Colors;

impl Colors {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const DIM: &'static str = "\x1b[2m";
    pub const GREEN: &'static str = "\x1b[32m";
    pub const YELLOW: &'static str = "\x1b[33m";
    pub const CYAN: &'static str = "\x1b[36m";
}

pub fn format_header(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::CYAN, text, Colors::RESET)
}

pub fn format_label(text: &str) -> String {
    format!("{}{}{}", Colors::BOLD, text, Colors::RESET)
}

pub fn format_muted(text: &str) -> String {
    format!("{}{}{}", Colors::DIM, text, Colors::RESET)
}

pub fn format_ok(text: &str) -> String {
    format!("{}{}{}", Colors::GREEN, text, Colors::RESET)
}

pub fn format_warn(text: &str) -> String {
    format!("{}{}{}", Colors::YELLOW, text, Colors::RESET)
}
