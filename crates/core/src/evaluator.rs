//! Deterministic coherent-noise evaluator compiled from a [`NoiseConfig`].
//!
//! The field synthesizer only sees the [`Sampler`] trait: a scalar sample at
//! a 2D or 3D coordinate plus an in-place gradient warp of a coordinate.
//! [`NoiseEvaluator`] is the production implementation. Perlin and simplex
//! lattices come from the `noise` crate; value, cubic, white and cellular
//! kernels are small hashed-lattice functions defined here because they need
//! controls (`Interp`, distance indices, jitter, lookups) the crate does not
//! expose.
//!
//! A compiled evaluator is immutable. Compile one per synthesis call; nothing
//! inside it is shared with the profile it came from.

use crate::config::{
    CellularDistance, CellularReturn, FractalType, Interp, NoiseConfig, NoiseType,
};
use crate::error::NoiseError;
use glam::{DVec2, DVec3};
use noise::{NoiseFn, OpenSimplex, Perlin};

/// Per-sample noise contract consumed by the field synthesizer.
pub trait Sampler {
    /// Scalar noise at a 2D coordinate, roughly in `[-1, 1]`.
    fn noise_2d(&self, x: f64, y: f64) -> f64;

    /// Scalar noise at a 3D coordinate, roughly in `[-1, 1]`.
    fn noise_3d(&self, x: f64, y: f64, z: f64) -> f64;

    /// Gradient-perturbs `point` in place.
    fn warp(&self, point: &mut DVec3);
}

const X_PRIME: i32 = 1619;
const Y_PRIME: i32 = 31337;
const Z_PRIME: i32 = 6971;

/// Catmull-Rom overshoot compensation per dimension.
const CUBIC_2D_BOUNDING: f64 = 1.0 / (1.5 * 1.5);
const CUBIC_3D_BOUNDING: f64 = 1.0 / (1.5 * 1.5 * 1.5);

/// Seed stride between the per-axis warp fields.
const WARP_AXIS_SEED_STRIDE: i32 = 7919;

/// A single-octave lattice.
#[derive(Debug, Clone)]
enum Kernel {
    Value(i32),
    Perlin(Perlin),
    Simplex(OpenSimplex),
    Cubic(i32),
    White(i32),
    Cellular(i32),
}

impl Kernel {
    fn new(kind: NoiseType, seed: i32) -> Self {
        match kind {
            NoiseType::Value | NoiseType::ValueFractal => Kernel::Value(seed),
            NoiseType::Perlin | NoiseType::PerlinFractal => {
                Kernel::Perlin(Perlin::new(seed as u32))
            }
            NoiseType::Simplex | NoiseType::SimplexFractal => {
                Kernel::Simplex(OpenSimplex::new(seed as u32))
            }
            NoiseType::Cubic | NoiseType::CubicFractal => Kernel::Cubic(seed),
            NoiseType::WhiteNoise => Kernel::White(seed),
            NoiseType::Cellular => Kernel::Cellular(seed),
        }
    }
}

#[derive(Debug, Clone)]
struct CellularParams {
    distance: CellularDistance,
    ret: CellularReturn,
    index0: usize,
    index1: usize,
    jitter: f64,
    lookup: Option<Box<NoiseEvaluator>>,
}

/// Fractal gradient perturbation: one Perlin field per axis per octave.
#[derive(Debug, Clone)]
struct Perturb {
    fields: Vec<[Perlin; 3]>,
    amp: f64,
    frequency: f64,
    lacunarity: f64,
    gain: f64,
}

impl Perturb {
    fn apply(&self, point: &mut DVec3) {
        let mut amp = self.amp;
        let mut frequency = self.frequency;
        for [fx, fy, fz] in &self.fields {
            let s = *point * frequency;
            let q = [s.x, s.y, s.z];
            *point += DVec3::new(fx.get(q), fy.get(q), fz.get(q)) * amp;
            amp *= self.gain;
            frequency *= self.lacunarity;
        }
    }
}

/// Compiled, immutable noise evaluator.
#[derive(Debug, Clone)]
pub struct NoiseEvaluator {
    kind: NoiseType,
    frequency: f64,
    interp: Interp,
    fractal_type: FractalType,
    lacunarity: f64,
    gain: f64,
    bounding: f64,
    /// One kernel per octave; a single kernel for non-fractal types.
    kernels: Vec<Kernel>,
    cellular: CellularParams,
    perturb: Perturb,
}

impl NoiseEvaluator {
    /// Compiles a config that does not use a cellular noise lookup.
    pub fn new(config: &NoiseConfig) -> Result<Self, NoiseError> {
        Self::with_lookup(config, None)
    }

    /// Compiles a config, binding `lookup` as the cellular lookup evaluator.
    ///
    /// Returns `NoiseError::MissingLookup` when the config samples a lookup
    /// and none is supplied.
    pub fn with_lookup(
        config: &NoiseConfig,
        lookup: Option<NoiseEvaluator>,
    ) -> Result<Self, NoiseError> {
        config.validate()?;
        if config.needs_lookup() && lookup.is_none() {
            return Err(NoiseError::MissingLookup(
                config
                    .cellular_lookup
                    .clone()
                    .unwrap_or_else(|| "<inline>".to_owned()),
            ));
        }

        let kind = config.noise.base();
        let octaves = config.octaves.max(1);
        let kernel_count = if kind.is_fractal() { octaves } else { 1 };
        let kernels = (0..kernel_count)
            .map(|i| Kernel::new(kind, config.seed.wrapping_add(i as i32)))
            .collect();
        let bounding = fractal_bounding(octaves, config.gain);

        let fields = (0..octaves)
            .map(|i| {
                let s = config.seed.wrapping_add(i as i32);
                [0, 1, 2].map(|axis| {
                    Perlin::new(s.wrapping_add(axis * WARP_AXIS_SEED_STRIDE) as u32)
                })
            })
            .collect();

        Ok(Self {
            kind,
            frequency: config.frequency,
            interp: config.interp,
            fractal_type: config.fractal_type,
            lacunarity: config.lacunarity,
            gain: config.gain,
            bounding,
            kernels,
            cellular: CellularParams {
                distance: config.cellular_distance,
                ret: config.cellular_return,
                index0: config.cellular_distance_index0,
                index1: config.cellular_distance_index1,
                jitter: config.cellular_jitter,
                lookup: lookup.map(Box::new),
            },
            perturb: Perturb {
                fields,
                amp: config.gradient_perturb_amp * bounding,
                frequency: config.frequency,
                lacunarity: config.lacunarity,
                gain: config.gain,
            },
        })
    }

    /// Runs the octave loop, or a single kernel for non-fractal types.
    ///
    /// `sample` receives a kernel and the frequency multiplier of its octave.
    fn composite(&self, sample: impl Fn(&Kernel, f64) -> f64) -> f64 {
        if !self.kind.is_fractal() {
            return sample(&self.kernels[0], 1.0);
        }
        let mut scale = 1.0;
        let mut amp = 1.0;
        let mut sum = 0.0;
        for (i, kernel) in self.kernels.iter().enumerate() {
            let n = sample(kernel, scale);
            let term = match self.fractal_type {
                FractalType::Fbm => n,
                FractalType::Billow => n.abs() * 2.0 - 1.0,
                FractalType::RigidMulti => 1.0 - n.abs(),
            };
            sum = match (i, self.fractal_type) {
                (0, _) => term,
                (_, FractalType::RigidMulti) => sum - term * amp,
                _ => sum + term * amp,
            };
            scale *= self.lacunarity;
            amp *= self.gain;
        }
        match self.fractal_type {
            FractalType::RigidMulti => sum,
            _ => sum * self.bounding,
        }
    }

    fn kernel_2d(&self, kernel: &Kernel, p: DVec2) -> f64 {
        match kernel {
            Kernel::Value(seed) => value_2d(*seed, self.interp, p),
            Kernel::Perlin(n) => n.get([p.x, p.y]),
            Kernel::Simplex(n) => n.get([p.x, p.y]),
            Kernel::Cubic(seed) => cubic_2d(*seed, p),
            Kernel::White(seed) => val_coord_2d(*seed, float_bits(p.x), float_bits(p.y)),
            Kernel::Cellular(seed) => self.cellular_2d(*seed, p),
        }
    }

    fn kernel_3d(&self, kernel: &Kernel, p: DVec3) -> f64 {
        match kernel {
            Kernel::Value(seed) => value_3d(*seed, self.interp, p),
            Kernel::Perlin(n) => n.get([p.x, p.y, p.z]),
            Kernel::Simplex(n) => n.get([p.x, p.y, p.z]),
            Kernel::Cubic(seed) => cubic_3d(*seed, p),
            Kernel::White(seed) => val_coord_3d(
                *seed,
                float_bits(p.x),
                float_bits(p.y),
                float_bits(p.z),
            ),
            Kernel::Cellular(seed) => self.cellular_3d(*seed, p),
        }
    }

    fn cellular_2d(&self, seed: i32, p: DVec2) -> f64 {
        let (bx, by) = (p.x.round() as i32, p.y.round() as i32);
        let mut nearest = Nearest::new();
        for xi in bx - 1..=bx + 1 {
            for yi in by - 1..=by + 1 {
                let feature = DVec2::new(xi as f64, yi as f64)
                    + cell_offset_2d(seed, xi, yi) * self.cellular.jitter;
                let d = self.cellular.distance.measure((feature - p).extend(0.0));
                nearest.offer(d, [xi, yi, 0], feature.extend(0.0));
            }
        }
        let [cx, cy, _] = nearest.cell;
        self.cellular_result(&nearest, val_coord_2d(seed, cx, cy), |lookup, f| {
            lookup.noise_2d(f.x, f.y)
        })
    }

    fn cellular_3d(&self, seed: i32, p: DVec3) -> f64 {
        let (bx, by, bz) = (p.x.round() as i32, p.y.round() as i32, p.z.round() as i32);
        let mut nearest = Nearest::new();
        for xi in bx - 1..=bx + 1 {
            for yi in by - 1..=by + 1 {
                for zi in bz - 1..=bz + 1 {
                    let feature = DVec3::new(xi as f64, yi as f64, zi as f64)
                        + cell_offset_3d(seed, xi, yi, zi) * self.cellular.jitter;
                    let d = self.cellular.distance.measure(feature - p);
                    nearest.offer(d, [xi, yi, zi], feature);
                }
            }
        }
        let [cx, cy, cz] = nearest.cell;
        self.cellular_result(&nearest, val_coord_3d(seed, cx, cy, cz), |lookup, f| {
            lookup.noise_3d(f.x, f.y, f.z)
        })
    }

    fn cellular_result(
        &self,
        nearest: &Nearest,
        cell_value: f64,
        lookup: impl FnOnce(&NoiseEvaluator, DVec3) -> f64,
    ) -> f64 {
        let d = &nearest.distances;
        let (d0, d1) = (d[self.cellular.index0], d[self.cellular.index1]);
        match self.cellular.ret {
            CellularReturn::CellValue => cell_value,
            CellularReturn::NoiseLookup => match &self.cellular.lookup {
                Some(l) => lookup(l, nearest.feature),
                None => cell_value,
            },
            CellularReturn::Distance => d[0] - 1.0,
            CellularReturn::Distance2 => d1 - 1.0,
            CellularReturn::Distance2Add => (d1 + d0) * 0.5 - 1.0,
            CellularReturn::Distance2Sub => d1 - d0 - 1.0,
            CellularReturn::Distance2Mul => d1 * d0 * 0.5 - 1.0,
            CellularReturn::Distance2Div => d0 / d1.max(f64::EPSILON) - 1.0,
        }
    }
}

impl Sampler for NoiseEvaluator {
    fn noise_2d(&self, x: f64, y: f64) -> f64 {
        let p = DVec2::new(x, y) * self.frequency;
        self.composite(|k, scale| self.kernel_2d(k, p * scale))
    }

    fn noise_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let p = DVec3::new(x, y, z) * self.frequency;
        self.composite(|k, scale| self.kernel_3d(k, p * scale))
    }

    fn warp(&self, point: &mut DVec3) {
        self.perturb.apply(point);
    }
}

impl CellularDistance {
    fn measure(self, v: DVec3) -> f64 {
        let manhattan = v.abs().element_sum();
        match self {
            CellularDistance::Euclidean => v.length(),
            CellularDistance::Manhattan => manhattan,
            CellularDistance::Natural => v.length() + manhattan,
        }
    }
}

/// The four smallest feature distances seen, and the closest cell.
struct Nearest {
    distances: [f64; 4],
    cell: [i32; 3],
    feature: DVec3,
}

impl Nearest {
    fn new() -> Self {
        Self {
            distances: [f64::MAX; 4],
            cell: [0; 3],
            feature: DVec3::ZERO,
        }
    }

    fn offer(&mut self, d: f64, cell: [i32; 3], feature: DVec3) {
        if d < self.distances[0] {
            self.cell = cell;
            self.feature = feature;
        }
        for i in (1..self.distances.len()).rev() {
            self.distances[i] = self.distances[i].min(d).max(self.distances[i - 1]);
        }
        self.distances[0] = self.distances[0].min(d);
    }
}

/// `1 / Σ gain^i` over the octaves.
fn fractal_bounding(octaves: u32, gain: f64) -> f64 {
    let (total, _) = (1..octaves).fold((1.0, gain), |(total, amp), _| (total + amp, amp * gain));
    1.0 / total
}

fn val_coord_2d(seed: i32, x: i32, y: i32) -> f64 {
    let n = seed ^ X_PRIME.wrapping_mul(x) ^ Y_PRIME.wrapping_mul(y);
    n.wrapping_mul(n).wrapping_mul(n).wrapping_mul(60493) as f64 / 2_147_483_648.0
}

fn val_coord_3d(seed: i32, x: i32, y: i32, z: i32) -> f64 {
    let n = seed ^ X_PRIME.wrapping_mul(x) ^ Y_PRIME.wrapping_mul(y) ^ Z_PRIME.wrapping_mul(z);
    n.wrapping_mul(n).wrapping_mul(n).wrapping_mul(60493) as f64 / 2_147_483_648.0
}

/// Folds the bit pattern of a coordinate into a lattice key.
fn float_bits(v: f64) -> i32 {
    let bits = v.to_bits();
    (bits ^ (bits >> 32)) as i32
}

fn cell_offset_2d(seed: i32, x: i32, y: i32) -> DVec2 {
    let alt = seed.wrapping_mul(31).wrapping_add(17);
    DVec2::new(val_coord_2d(seed, x, y), val_coord_2d(alt, x, y)) * 0.5
}

fn cell_offset_3d(seed: i32, x: i32, y: i32, z: i32) -> DVec3 {
    let alt = seed.wrapping_mul(31).wrapping_add(17);
    let alt2 = alt.wrapping_mul(31).wrapping_add(17);
    DVec3::new(
        val_coord_3d(seed, x, y, z),
        val_coord_3d(alt, x, y, z),
        val_coord_3d(alt2, x, y, z),
    ) * 0.5
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

fn cubic_lerp(a: f64, b: f64, c: f64, d: f64, t: f64) -> f64 {
    let p = (d - c) - (a - b);
    t * t * t * p + t * t * ((a - b) - p) + t * (c - a) + b
}

fn value_2d(seed: i32, interp: Interp, p: DVec2) -> f64 {
    let f = p.floor();
    let (xs, ys) = (interp.ease(p.x - f.x), interp.ease(p.y - f.y));
    let (x0, y0) = (f.x as i32, f.y as i32);
    let (x1, y1) = (x0.wrapping_add(1), y0.wrapping_add(1));
    let xf0 = lerp(val_coord_2d(seed, x0, y0), val_coord_2d(seed, x1, y0), xs);
    let xf1 = lerp(val_coord_2d(seed, x0, y1), val_coord_2d(seed, x1, y1), xs);
    lerp(xf0, xf1, ys)
}

fn value_3d(seed: i32, interp: Interp, p: DVec3) -> f64 {
    let f = p.floor();
    let t = DVec3::new(
        interp.ease(p.x - f.x),
        interp.ease(p.y - f.y),
        interp.ease(p.z - f.z),
    );
    let (x0, y0, z0) = (f.x as i32, f.y as i32, f.z as i32);
    let (x1, y1, z1) = (x0.wrapping_add(1), y0.wrapping_add(1), z0.wrapping_add(1));
    let plane = |z: i32| {
        let xf0 = lerp(val_coord_3d(seed, x0, y0, z), val_coord_3d(seed, x1, y0, z), t.x);
        let xf1 = lerp(val_coord_3d(seed, x0, y1, z), val_coord_3d(seed, x1, y1, z), t.x);
        lerp(xf0, xf1, t.y)
    };
    lerp(plane(z0), plane(z1), t.z)
}

fn cubic_2d(seed: i32, p: DVec2) -> f64 {
    let f = p.floor();
    let (x1, y1) = (f.x as i32, f.y as i32);
    let (xs, ys) = (p.x - f.x, p.y - f.y);
    let row = |y: i32| {
        cubic_lerp(
            val_coord_2d(seed, x1.wrapping_sub(1), y),
            val_coord_2d(seed, x1, y),
            val_coord_2d(seed, x1.wrapping_add(1), y),
            val_coord_2d(seed, x1.wrapping_add(2), y),
            xs,
        )
    };
    cubic_lerp(
        row(y1.wrapping_sub(1)),
        row(y1),
        row(y1.wrapping_add(1)),
        row(y1.wrapping_add(2)),
        ys,
    ) * CUBIC_2D_BOUNDING
}

fn cubic_3d(seed: i32, p: DVec3) -> f64 {
    let f = p.floor();
    let (x1, y1, z1) = (f.x as i32, f.y as i32, f.z as i32);
    let s = p - f;
    let row = |y: i32, z: i32| {
        cubic_lerp(
            val_coord_3d(seed, x1.wrapping_sub(1), y, z),
            val_coord_3d(seed, x1, y, z),
            val_coord_3d(seed, x1.wrapping_add(1), y, z),
            val_coord_3d(seed, x1.wrapping_add(2), y, z),
            s.x,
        )
    };
    let plane = |z: i32| {
        cubic_lerp(
            row(y1.wrapping_sub(1), z),
            row(y1, z),
            row(y1.wrapping_add(1), z),
            row(y1.wrapping_add(2), z),
            s.y,
        )
    };
    cubic_lerp(
        plane(z1.wrapping_sub(1)),
        plane(z1),
        plane(z1.wrapping_add(1)),
        plane(z1.wrapping_add(2)),
        s.z,
    ) * CUBIC_3D_BOUNDING
}
