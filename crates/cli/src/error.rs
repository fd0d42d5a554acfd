//! CLI failures and their exit codes.
//!
//! 2 is clap's own parse failure. Ours start at 10:
//! - 10: profile, lookup or synthesis problem
//! - 11: file read or PNG write
//! - 12: bad preset name or `--dims`
//! - 13: profile JSON or output JSON

use thiserror::Error;
use tilenoise_core::NoiseError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(NoiseError),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Serialization(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

/// Core errors that are really about files, JSON or user input leave
/// `Config` for the matching exit code.
impl From<NoiseError> for CliError {
    fn from(e: NoiseError) -> Self {
        match e {
            NoiseError::Io(msg) => CliError::Io(msg),
            NoiseError::Parse(msg) => CliError::Serialization(msg),
            NoiseError::UnknownPreset(_) => CliError::Input(e.to_string()),
            other => CliError::Config(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
