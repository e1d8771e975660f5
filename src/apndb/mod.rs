//! Read-only APN database input: parsing and serializing the versioned,
//! comma-separated APN line format described in the external interfaces.

mod format;

pub use format::{parse_apn_line, serialize_apn_line, ApnParseError};
