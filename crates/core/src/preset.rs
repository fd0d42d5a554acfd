//! Fixed shape-list templates.
//!
//! The tiling presets place spheres on the corners and midpoints of the unit
//! square (cube) so that their bounds spill over every edge; wrap-around
//! accumulation folds the overhang back in, which makes the output tile.

use crate::error::NoiseError;
use crate::shape::Shape;
use glam::DVec3;
use std::str::FromStr;

const PRESET_NAMES: &[&str] = &["single", "tiling-2d", "tiling-3d"];

/// Fade exponent used by the tiling spheres.
const TILING_FADE: f64 = 0.4;
/// Fade distance used by the tiling spheres.
const TILING_FADE_DISTANCE: f64 = 0.5;

/// Named shape-list template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// One hard box covering the whole texture.
    Single,
    /// Four wrap-aligned spheres in the z = 0 plane.
    Tiling2d,
    /// Eight wrap-aligned spheres.
    Tiling3d,
}

impl Preset {
    pub fn name(self) -> &'static str {
        match self {
            Preset::Single => "single",
            Preset::Tiling2d => "tiling-2d",
            Preset::Tiling3d => "tiling-3d",
        }
    }

    pub fn list_names() -> &'static [&'static str] {
        PRESET_NAMES
    }

    /// Parses a preset name; see the `FromStr` impl for accepted spellings.
    pub fn from_name(name: &str) -> Result<Self, NoiseError> {
        name.parse()
    }

    /// The shape list this preset stands for.
    pub fn shapes(self) -> Vec<Shape> {
        match self {
            Preset::Single => single(),
            Preset::Tiling2d => tiling_2d(),
            Preset::Tiling3d => tiling_3d(),
        }
    }
}

/// One box with no fade covering the whole unit cube.
pub fn single() -> Vec<Shape> {
    vec![Shape::cuboid(0.0, 0.01, DVec3::splat(0.5), DVec3::ONE)]
}

/// Four unit spheres on the half-grid of the `z = 0` plane.
pub fn tiling_2d() -> Vec<Shape> {
    [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(0.5, 0.0, 0.0),
        DVec3::new(0.0, 0.5, 0.0),
        DVec3::new(0.5, 0.5, 0.0),
    ]
    .into_iter()
    .map(tiling_sphere)
    .collect()
}

/// Eight unit spheres on every `{0, 0.5}^3` position.
pub fn tiling_3d() -> Vec<Shape> {
    [
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(0.5, 0.0, 0.0),
        DVec3::new(0.0, 0.5, 0.0),
        DVec3::new(0.0, 0.0, 0.5),
        DVec3::new(0.0, 0.5, 0.5),
        DVec3::new(0.5, 0.5, 0.0),
        DVec3::new(0.5, 0.0, 0.5),
        DVec3::new(0.5, 0.5, 0.5),
    ]
    .into_iter()
    .map(tiling_sphere)
    .collect()
}

fn tiling_sphere(position: DVec3) -> Shape {
    Shape::sphere(TILING_FADE, TILING_FADE_DISTANCE, position, 1.0)
}

impl FromStr for Preset {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "single" => Ok(Preset::Single),
            "tiling-2d" | "tiling2d" => Ok(Preset::Tiling2d),
            "tiling-3d" | "tiling3d" => Ok(Preset::Tiling3d),
            _ => Err(NoiseError::UnknownPreset(s.to_owned())),
        }
    }
}
