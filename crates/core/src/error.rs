//! Error types for the tilenoise core.

use thiserror::Error;

/// Errors produced while configuring or running noise synthesis.
#[derive(Debug, Error)]
pub enum NoiseError {
    /// A buffer dimension was zero or the texel count overflowed.
    #[error("invalid dimensions: width, height and depth must be non-zero")]
    InvalidDimensions,

    /// Two buffers had incompatible shapes for an element-wise operation.
    #[error("dimension mismatch: {lhs:?} vs {rhs:?}")]
    DimensionMismatch { lhs: [usize; 3], rhs: [usize; 3] },

    /// A noise family name did not match any of the sixteen variants.
    #[error("unknown noise family: {0}")]
    UnknownNoiseFamily(String),

    /// A shape preset name was not recognized.
    #[error("unknown shape preset: {0}")]
    UnknownPreset(String),

    /// A profile name was not present in the library.
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    /// The cellular return type asks for a noise lookup but none is bound.
    #[error("profile '{0}' uses cellular noise lookup but has no lookup profile")]
    MissingLookup(String),

    /// Cellular lookup references form a cycle.
    #[error("cellular lookup cycle: {}", .0.join(" -> "))]
    LookupCycle(Vec<String>),

    /// A configuration field was outside its accepted range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// A profile document could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

impl NoiseError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        NoiseError::InvalidParameter {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for NoiseError {
    fn from(e: std::io::Error) -> Self {
        NoiseError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for NoiseError {
    fn from(e: serde_json::Error) -> Self {
        NoiseError::Parse(e.to_string())
    }
}
