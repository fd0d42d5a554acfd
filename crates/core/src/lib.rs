#![deny(unsafe_code)]
//! Core types for tilenoise, a shape-masked tileable noise synthesizer.
//!
//! Provides the `NoiseProfile`/`ProfileLibrary` configuration model, the
//! compiled `NoiseEvaluator` behind the `Sampler` trait, `Shape`/`ShapeField`
//! density masks with `Preset` templates, the `FieldBuffer` output grid, and
//! the wrap-around `synthesize_2d`/`synthesize_3d` passes.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod field;
pub mod preset;
pub mod profile;
pub mod shape;
pub mod synth;

pub use config::{
    CellularDistance, CellularReturn, FractalType, Interp, NoiseConfig, NoiseFamily, NoiseType,
};
pub use error::NoiseError;
pub use evaluator::{NoiseEvaluator, Sampler};
pub use field::{ColorFormat, FieldBuffer};
pub use preset::Preset;
pub use profile::{NoiseProfile, ProfileLibrary};
pub use shape::{Aabb, Shape, ShapeField, ShapeKind};
pub use synth::{normalize, synthesize_2d, synthesize_3d, Synthesis};
