use thiserror::Error;

use crate::apndb::ApnParseError;
use crate::config::ConfigError;

/// Errors surfaced by the `dctl` command-line tool.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read '{path}': {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line} of '{path}': {source}")]
    ApnLine {
        path: String,
        line: usize,
        #[source]
        source: ApnParseError,
    },
}
