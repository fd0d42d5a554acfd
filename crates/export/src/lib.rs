#![deny(unsafe_code)]
//! Field rendering and export: sizes a buffer from a profile, runs the 2D or
//! 3D synthesis pass, and converts the result to bytes or PNG.
//!
//! This crate sits between `tilenoise-core` (which defines profiles, the
//! evaluator and the synthesis passes) and front ends such as the CLI, so the
//! buffer-sizing and dimension dispatch live in one place.

pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

use tilenoise_core::error::NoiseError;
use tilenoise_core::evaluator::Sampler;
use tilenoise_core::field::FieldBuffer;
use tilenoise_core::profile::NoiseProfile;
use tilenoise_core::synth::{synthesize_2d, synthesize_3d, Synthesis};

/// Whether a texture is a single plane or a cube of slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimensionality {
    Planar,
    Volumetric,
}

impl Dimensionality {
    /// Maps an axis count (2 or 3) to a dimensionality.
    pub fn from_axes(axes: u8) -> Result<Self, NoiseError> {
        match axes {
            2 => Ok(Dimensionality::Planar),
            3 => Ok(Dimensionality::Volumetric),
            _ => Err(NoiseError::InvalidParameter {
                name: "dims".into(),
                reason: format!("expected 2 or 3, got {axes}"),
            }),
        }
    }

    pub fn axes(self) -> u8 {
        match self {
            Dimensionality::Planar => 2,
            Dimensionality::Volumetric => 3,
        }
    }
}

/// A synthesized buffer and how the pass ended.
#[derive(Debug)]
pub struct Rendered {
    pub buffer: FieldBuffer,
    pub outcome: Synthesis,
}

/// Allocates a buffer sized by `profile` and fills it.
///
/// `progress` is only consulted for volumetric renders, once per z slice.
pub fn render<S, F>(
    profile: &NoiseProfile,
    sampler: &S,
    dims: Dimensionality,
    progress: F,
) -> Result<Rendered, NoiseError>
where
    S: Sampler + ?Sized,
    F: FnMut(usize, usize) -> bool,
{
    let (buffer, outcome) = match dims {
        Dimensionality::Planar => {
            let mut buffer = profile.new_buffer_2d()?;
            let outcome = synthesize_2d(&mut buffer, profile, sampler)?;
            (buffer, outcome)
        }
        Dimensionality::Volumetric => {
            let mut buffer = profile.new_buffer_3d()?;
            let outcome = synthesize_3d(&mut buffer, profile, sampler, progress)?;
            (buffer, outcome)
        }
    };
    Ok(Rendered { buffer, outcome })
}
