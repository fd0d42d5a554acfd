//! Shape regions that mask and fade noise contributions.
//!
//! A [`Shape`] is an immutable description stored in a profile. Before a
//! synthesis pass each shape is instantiated into a [`ShapeField`], which
//! caches the rotation, the local bounding planes and the axis-aligned bounds
//! so the per-texel [`ShapeField::density`] call stays cheap.
//!
//! All positions are in normalized texture space (`[0, 1]` per axis). The Y
//! axis is image-space: a GUI drawing with Y pointing up shows a shape at
//! `1 - position.y`.

use glam::{DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

/// The closed set of shape primitives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Oriented box.
    #[default]
    Box,
    /// Sphere with diameter `size.x`.
    Sphere,
}

/// Serializable description of a masking region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shape {
    pub kind: ShapeKind,
    /// Normalized center.
    pub position: DVec3,
    /// Euler angles in degrees, applied Z, then X, then Y. Boxes only.
    pub rotation: DVec3,
    pub size: DVec3,
    /// Thickness of the falloff band inside the surface, in `(0, 1]`.
    pub fade_distance: f64,
    /// Falloff exponent in `[0, 1]`; 0 gives a hard edge.
    pub fade: f64,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Box,
            position: DVec3::splat(0.5),
            rotation: DVec3::ZERO,
            size: DVec3::ONE,
            fade_distance: 0.01,
            fade: 0.0,
        }
    }
}

impl Shape {
    /// An unrotated box.
    pub fn cuboid(fade: f64, fade_distance: f64, position: DVec3, size: DVec3) -> Self {
        Self {
            kind: ShapeKind::Box,
            position,
            rotation: DVec3::ZERO,
            size,
            fade_distance,
            fade,
        }
    }

    /// A sphere of the given diameter.
    pub fn sphere(fade: f64, fade_distance: f64, position: DVec3, diameter: f64) -> Self {
        Self {
            kind: ShapeKind::Sphere,
            position,
            rotation: DVec3::ZERO,
            size: DVec3::splat(diameter),
            fade_distance,
            fade,
        }
    }

    /// Builds the evaluator for this shape, precomputing its rotation,
    /// planes and bounds.
    pub fn instantiate(&self) -> ShapeField {
        match self.kind {
            ShapeKind::Box => ShapeField::Box(BoxField::new(self)),
            ShapeKind::Sphere => ShapeField::Sphere(SphereField::new(self)),
        }
    }
}

/// Axis-aligned box in normalized texture space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Box with the given center and full extent.
    pub fn from_center_size(center: DVec3, size: DVec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

/// An instantiated shape ready for per-texel evaluation.
#[derive(Debug, Clone)]
pub enum ShapeField {
    Box(BoxField),
    Sphere(SphereField),
}

impl ShapeField {
    /// Mask strength at `point`, in `[0, 1]`.
    pub fn density(&self, point: DVec3) -> f64 {
        match self {
            ShapeField::Box(b) => b.density(point),
            ShapeField::Sphere(s) => s.density(point),
        }
    }

    /// Region outside of which `density` is always 0.
    pub fn bounds(&self) -> Aabb {
        match self {
            ShapeField::Box(b) => b.bounds,
            ShapeField::Sphere(s) => s.bounds,
        }
    }
}

/// `clamp(dist / fade_distance)^2`, raised to `fade`.
fn falloff(dist: f64, fade_distance: f64, fade: f64) -> f64 {
    let t = (dist / fade_distance).clamp(0.0, 1.0).powi(2);
    t.powf(fade)
}

/// A plane in Hessian normal form.
#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: DVec3,
    distance: f64,
}

impl Plane {
    fn from_normal_and_point(normal: DVec3, point: DVec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.distance
    }
}

/// Oriented box evaluator.
#[derive(Debug, Clone)]
pub struct BoxField {
    position: DVec3,
    inverse_rotation: DQuat,
    half_extents: DVec3,
    planes: [Plane; 6],
    bounds: Aabb,
    fade_distance: f64,
    fade: f64,
}

impl BoxField {
    fn new(shape: &Shape) -> Self {
        let rotation = DQuat::from_euler(
            EulerRot::YXZ,
            shape.rotation.y.to_radians(),
            shape.rotation.x.to_radians(),
            shape.rotation.z.to_radians(),
        );
        let half_extents = shape.size * 0.5;
        let corners = box_corners(half_extents);

        // Two opposite corners each anchor the three faces that meet there.
        let planes = [
            Plane::from_normal_and_point(corners[1] - corners[0], corners[0]),
            Plane::from_normal_and_point(corners[2] - corners[0], corners[0]),
            Plane::from_normal_and_point(corners[4] - corners[0], corners[0]),
            Plane::from_normal_and_point(corners[3] - corners[7], corners[7]),
            Plane::from_normal_and_point(corners[5] - corners[7], corners[7]),
            Plane::from_normal_and_point(corners[6] - corners[7], corners[7]),
        ];

        let (min, max) = corners.iter().map(|&c| rotation * c).fold(
            (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
            |(min, max), c| (min.min(c), max.max(c)),
        );

        Self {
            position: shape.position,
            inverse_rotation: rotation.inverse(),
            half_extents,
            planes,
            bounds: Aabb::from_center_size(shape.position, max - min),
            fade_distance: shape.fade_distance,
            fade: shape.fade,
        }
    }

    fn density(&self, point: DVec3) -> f64 {
        let local = self.inverse_rotation * (point - self.position);
        if local.abs().cmpgt(self.half_extents).any() {
            return 0.0;
        }
        let dist = self
            .planes
            .iter()
            .map(|p| p.signed_distance(local).abs())
            .fold(f64::MAX, f64::min);
        falloff(dist, self.fade_distance, self.fade)
    }
}

/// The eight corners of a centered box, ordered by (x, y, z) bits.
fn box_corners(half: DVec3) -> [DVec3; 8] {
    let (lo, hi) = (-half, half);
    [
        DVec3::new(lo.x, lo.y, lo.z),
        DVec3::new(lo.x, lo.y, hi.z),
        DVec3::new(lo.x, hi.y, lo.z),
        DVec3::new(lo.x, hi.y, hi.z),
        DVec3::new(hi.x, lo.y, lo.z),
        DVec3::new(hi.x, lo.y, hi.z),
        DVec3::new(hi.x, hi.y, lo.z),
        DVec3::new(hi.x, hi.y, hi.z),
    ]
}

/// Sphere evaluator.
#[derive(Debug, Clone)]
pub struct SphereField {
    position: DVec3,
    radius: f64,
    bounds: Aabb,
    fade_distance: f64,
    fade: f64,
}

impl SphereField {
    fn new(shape: &Shape) -> Self {
        Self {
            position: shape.position,
            radius: shape.size.x * 0.5,
            // The cube spans the diameter; iteration pruning depends on it.
            bounds: Aabb::from_center_size(shape.position, DVec3::splat(shape.size.x)),
            fade_distance: shape.fade_distance,
            fade: shape.fade,
        }
    }

    fn density(&self, point: DVec3) -> f64 {
        let dist = self.radius - (point - self.position).length();
        if dist < 0.0 {
            return 0.0;
        }
        falloff(dist, self.fade_distance, self.fade)
    }
}
