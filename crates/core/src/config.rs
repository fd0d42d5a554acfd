//! Noise configuration: the parameters a [`NoiseEvaluator`] is compiled from.
//!
//! [`NoiseFamily`] is the user-facing selection (sixteen variants). It splits
//! into the evaluator's base [`NoiseType`] plus a "warp" flag that tells the
//! synthesizer to gradient-perturb coordinates before sampling.

use crate::error::NoiseError;
use crate::evaluator::NoiseEvaluator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interpolation used between lattice points of value noise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interp {
    Linear,
    Hermite,
    #[default]
    Quintic,
}

impl Interp {
    /// Applies the easing curve to `t` in `[0, 1]`.
    pub fn ease(self, t: f64) -> f64 {
        match self {
            Interp::Linear => t,
            Interp::Hermite => t * t * (3.0 - 2.0 * t),
            Interp::Quintic => t * t * t * (t * (t * 6.0 - 15.0) + 10.0),
        }
    }
}

/// Base noise types understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseType {
    Value,
    ValueFractal,
    Perlin,
    PerlinFractal,
    Simplex,
    SimplexFractal,
    Cellular,
    WhiteNoise,
    Cubic,
    CubicFractal,
}

impl NoiseType {
    /// Whether octaves are composited for this type.
    pub fn is_fractal(self) -> bool {
        matches!(
            self,
            NoiseType::ValueFractal
                | NoiseType::PerlinFractal
                | NoiseType::SimplexFractal
                | NoiseType::CubicFractal
        )
    }
}

/// The noise family selected in a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseFamily {
    Value,
    ValueFractal,
    ValueWarp,
    Perlin,
    PerlinFractal,
    PerlinWarp,
    #[default]
    Simplex,
    SimplexFractal,
    SimplexWarp,
    Cellular,
    CellularWarp,
    WhiteNoise,
    WhiteNoiseWarp,
    Cubic,
    CubicFractal,
    CubicWarp,
}

/// All families in declaration order.
const FAMILIES: [NoiseFamily; 16] = [
    NoiseFamily::Value,
    NoiseFamily::ValueFractal,
    NoiseFamily::ValueWarp,
    NoiseFamily::Perlin,
    NoiseFamily::PerlinFractal,
    NoiseFamily::PerlinWarp,
    NoiseFamily::Simplex,
    NoiseFamily::SimplexFractal,
    NoiseFamily::SimplexWarp,
    NoiseFamily::Cellular,
    NoiseFamily::CellularWarp,
    NoiseFamily::WhiteNoise,
    NoiseFamily::WhiteNoiseWarp,
    NoiseFamily::Cubic,
    NoiseFamily::CubicFractal,
    NoiseFamily::CubicWarp,
];

impl NoiseFamily {
    /// The evaluator's base noise type for this family.
    pub fn base(self) -> NoiseType {
        match self {
            NoiseFamily::Value | NoiseFamily::ValueWarp => NoiseType::Value,
            NoiseFamily::ValueFractal => NoiseType::ValueFractal,
            NoiseFamily::Perlin | NoiseFamily::PerlinWarp => NoiseType::Perlin,
            NoiseFamily::PerlinFractal => NoiseType::PerlinFractal,
            NoiseFamily::Simplex | NoiseFamily::SimplexWarp => NoiseType::Simplex,
            NoiseFamily::SimplexFractal => NoiseType::SimplexFractal,
            NoiseFamily::Cellular | NoiseFamily::CellularWarp => NoiseType::Cellular,
            NoiseFamily::WhiteNoise | NoiseFamily::WhiteNoiseWarp => NoiseType::WhiteNoise,
            NoiseFamily::Cubic | NoiseFamily::CubicWarp => NoiseType::Cubic,
            NoiseFamily::CubicFractal => NoiseType::CubicFractal,
        }
    }

    /// Whether sampling coordinates are gradient-perturbed first.
    pub fn is_warp(self) -> bool {
        matches!(
            self,
            NoiseFamily::ValueWarp
                | NoiseFamily::PerlinWarp
                | NoiseFamily::SimplexWarp
                | NoiseFamily::CellularWarp
                | NoiseFamily::WhiteNoiseWarp
                | NoiseFamily::CubicWarp
        )
    }

    /// Canonical snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            NoiseFamily::Value => "value",
            NoiseFamily::ValueFractal => "value_fractal",
            NoiseFamily::ValueWarp => "value_warp",
            NoiseFamily::Perlin => "perlin",
            NoiseFamily::PerlinFractal => "perlin_fractal",
            NoiseFamily::PerlinWarp => "perlin_warp",
            NoiseFamily::Simplex => "simplex",
            NoiseFamily::SimplexFractal => "simplex_fractal",
            NoiseFamily::SimplexWarp => "simplex_warp",
            NoiseFamily::Cellular => "cellular",
            NoiseFamily::CellularWarp => "cellular_warp",
            NoiseFamily::WhiteNoise => "white_noise",
            NoiseFamily::WhiteNoiseWarp => "white_noise_warp",
            NoiseFamily::Cubic => "cubic",
            NoiseFamily::CubicFractal => "cubic_fractal",
            NoiseFamily::CubicWarp => "cubic_warp",
        }
    }

    /// All sixteen canonical names.
    pub fn list_names() -> Vec<&'static str> {
        FAMILIES.iter().map(|f| f.name()).collect()
    }
}

impl FromStr for NoiseFamily {
    type Err = NoiseError;

    /// Accepts canonical names, with `-` allowed in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        FAMILIES
            .into_iter()
            .find(|f| f.name() == key)
            .ok_or_else(|| NoiseError::UnknownNoiseFamily(s.to_owned()))
    }
}

impl fmt::Display for NoiseFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How octaves are combined for fractal types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FractalType {
    #[default]
    Fbm,
    Billow,
    RigidMulti,
}

/// Distance metric between a sample and cellular feature points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellularDistance {
    #[default]
    Euclidean,
    Manhattan,
    /// Sum of the Euclidean and Manhattan distances.
    Natural,
}

/// What a cellular sample returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellularReturn {
    /// Hashed value of the nearest cell.
    #[default]
    CellValue,
    /// Another profile's noise sampled at the nearest feature point.
    NoiseLookup,
    Distance,
    Distance2,
    Distance2Add,
    Distance2Sub,
    Distance2Mul,
    Distance2Div,
}

/// Parameters of the noise evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub seed: i32,
    pub frequency: f64,
    pub interp: Interp,
    pub noise: NoiseFamily,
    pub octaves: u32,
    pub lacunarity: f64,
    pub gain: f64,
    pub fractal_type: FractalType,
    pub cellular_distance: CellularDistance,
    pub cellular_return: CellularReturn,
    /// Library name of the profile sampled for `CellularReturn::NoiseLookup`.
    pub cellular_lookup: Option<String>,
    pub cellular_distance_index0: usize,
    pub cellular_distance_index1: usize,
    pub cellular_jitter: f64,
    pub gradient_perturb_amp: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            frequency: 0.01,
            interp: Interp::Quintic,
            noise: NoiseFamily::Simplex,
            octaves: 3,
            lacunarity: 2.0,
            gain: 0.5,
            fractal_type: FractalType::Fbm,
            cellular_distance: CellularDistance::Euclidean,
            cellular_return: CellularReturn::CellValue,
            cellular_lookup: None,
            cellular_distance_index0: 0,
            cellular_distance_index1: 1,
            cellular_jitter: 0.45,
            gradient_perturb_amp: 1.0,
        }
    }
}

/// Largest accepted octave count.
pub const MAX_OCTAVES: u32 = 16;
/// Largest accepted per-octave frequency multiplier.
pub const MAX_LACUNARITY: f64 = 10.0;

impl NoiseConfig {
    /// Checks every field against its accepted range.
    pub fn validate(&self) -> Result<(), NoiseError> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(NoiseError::invalid("frequency", "must be a positive number"));
        }
        if self.octaves > MAX_OCTAVES {
            return Err(NoiseError::invalid(
                "octaves",
                format!("must be at most {MAX_OCTAVES}"),
            ));
        }
        if !(0.0..=MAX_LACUNARITY).contains(&self.lacunarity) {
            return Err(NoiseError::invalid(
                "lacunarity",
                format!("must be in [0, {MAX_LACUNARITY}]"),
            ));
        }
        let amplitude_sum = (1..self.octaves.max(1))
            .scan(1.0, |amp, _| {
                *amp *= self.gain;
                Some(*amp)
            })
            .fold(1.0, |sum, amp| sum + amp);
        if !(self.gain.is_finite() && amplitude_sum.is_finite() && amplitude_sum != 0.0) {
            return Err(NoiseError::invalid(
                "gain",
                "octave amplitudes must sum to a finite, non-zero value",
            ));
        }
        if self.cellular_distance_index0 > 3 || self.cellular_distance_index1 > 3 {
            return Err(NoiseError::invalid(
                "cellular_distance_index",
                "indices must be in 0..=3",
            ));
        }
        if !(-1.0..=1.0).contains(&self.cellular_jitter) {
            return Err(NoiseError::invalid("cellular_jitter", "must be in [-1, 1]"));
        }
        if !self.gradient_perturb_amp.is_finite() {
            return Err(NoiseError::invalid("gradient_perturb_amp", "must be finite"));
        }
        Ok(())
    }

    /// Whether compiling this config needs a lookup evaluator.
    pub fn needs_lookup(&self) -> bool {
        self.noise.base() == NoiseType::Cellular
            && self.cellular_return == CellularReturn::NoiseLookup
    }

    /// Compiles a lookup-free evaluator; see [`NoiseEvaluator::new`].
    pub fn compile(&self) -> Result<NoiseEvaluator, NoiseError> {
        NoiseEvaluator::new(self)
    }
}
