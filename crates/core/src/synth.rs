//! Shape-masked, wrap-around accumulation of noise into a field buffer.
//!
//! Each shape is visited in order. Every integer index inside the shape's
//! bounds (which may lie outside `[0, dim)`) is sampled at a reference
//! coordinate, masked by the shape density, and added into the texel the
//! index wraps to. Afterwards the whole buffer is rescaled by the running
//! extremes, which start at `(0, 1)` rather than at the first sample.

use crate::error::NoiseError;
use crate::evaluator::Sampler;
use crate::field::FieldBuffer;
use crate::profile::NoiseProfile;
use crate::shape::{Aabb, Shape, ShapeField};
use glam::DVec3;

/// Reference grid size; noise coordinates are `index * 256 / dim`.
const REFERENCE_SIZE: f64 = 256.0;

/// Outcome of a synthesis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Synthesis {
    /// Every shape was accumulated and the buffer normalized.
    Complete,
    /// The progress callback asked to stop. The buffer holds partial,
    /// unnormalized sums.
    Cancelled,
}

/// Running min/max of accumulated values.
#[derive(Debug, Clone, Copy)]
struct Extremes {
    min: f64,
    max: f64,
    non_finite: bool,
}

impl Extremes {
    fn seeded() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            non_finite: false,
        }
    }

    fn include(&mut self, v: f64) {
        if !v.is_finite() {
            self.non_finite = true;
            return;
        }
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    /// The normalization range, or NaN bounds once any sum was non-finite.
    fn range(&self) -> (f64, f64) {
        if self.non_finite {
            (f64::NAN, f64::NAN)
        } else {
            (self.min, self.max)
        }
    }
}

/// Half-open integer index ranges covering a shape's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexRange {
    lo: [i64; 3],
    hi: [i64; 3],
}

impl IndexRange {
    /// `[trunc(min * dim), trunc(max * dim))` per axis.
    fn covering(bounds: &Aabb, dims: [usize; 3]) -> Self {
        let lo = bounds.min.to_array();
        let hi = bounds.max.to_array();
        Self {
            lo: [0, 1, 2].map(|a| (lo[a] * dims[a] as f64) as i64),
            hi: [0, 1, 2].map(|a| (hi[a] * dims[a] as f64) as i64),
        }
    }
}

/// Per-call state shared by the 2D and 3D loops.
struct Accumulator<'a, S: ?Sized> {
    buffer: &'a mut FieldBuffer,
    sampler: &'a S,
    base_value: f64,
    warp: bool,
    extremes: Extremes,
}

impl<S: Sampler + ?Sized> Accumulator<'_, S> {
    fn add(&mut self, texel: usize, fade: f64, noise: f64) {
        let v = fade * (self.base_value + noise) + self.buffer.value(texel);
        self.extremes.include(v);
        self.buffer.set_value(texel, v);
    }

    fn sample_2d(&mut self, field: &ShapeField, x: i64, y: i64) {
        let [w, h, _] = self.buffer.dims();
        let mut p = DVec3::new(reference(x, w), reference(y, h), 1.0);
        if self.warp {
            self.sampler.warp(&mut p);
        }
        let noise = self.sampler.noise_2d(p.x, p.y);
        let fade = field.density(DVec3::new(unit(x, w), unit(y, h), 0.0));
        let texel = self.buffer.wrapped_index(x, y, 0);
        self.add(texel, fade, noise);
    }

    fn sample_3d(&mut self, field: &ShapeField, x: i64, y: i64, z: i64) {
        let [w, h, d] = self.buffer.dims();
        let mut p = DVec3::new(reference(x, w), reference(y, h), reference(z, d));
        if self.warp {
            self.sampler.warp(&mut p);
        }
        let noise = self.sampler.noise_3d(p.x, p.y, p.z);
        let fade = field.density(DVec3::new(unit(x, w), unit(y, h), unit(z, d)));
        let texel = self.buffer.wrapped_index(x, y, z);
        self.add(texel, fade, noise);
    }
}

fn reference(index: i64, dim: usize) -> f64 {
    index as f64 * REFERENCE_SIZE / dim as f64
}

fn unit(index: i64, dim: usize) -> f64 {
    index as f64 / dim as f64
}

/// Estimated sample count for progress reporting: the truncated bounds
/// volume (area when `volumetric` is false) of every shape, summed.
fn estimate_samples(shapes: &[Shape], dims: [usize; 3], volumetric: bool) -> usize {
    shapes
        .iter()
        .map(|shape| {
            let size = shape.instantiate().bounds().size();
            let area = size.x * dims[0] as f64 * size.y * dims[1] as f64;
            let volume = if volumetric {
                area * size.z * dims[2] as f64
            } else {
                area
            };
            volume as usize
        })
        .sum()
}

/// Accumulates every shape of `profile` into a 2D buffer and normalizes it.
///
/// The buffer must have depth 1. Noise is sampled with `noise_2d` at
/// reference coordinates (with z fixed at 1 for warping); shape density is
/// evaluated in the `z = 0` plane.
pub fn synthesize_2d<S: Sampler + ?Sized>(
    buffer: &mut FieldBuffer,
    profile: &NoiseProfile,
    sampler: &S,
) -> Result<Synthesis, NoiseError> {
    if buffer.depth() != 1 {
        return Err(NoiseError::invalid(
            "buffer",
            format!("2D synthesis needs depth 1, got {}", buffer.depth()),
        ));
    }
    profile.validate()?;
    let dims = buffer.dims();
    buffer.clear();
    log::debug!(
        "synthesizing {}x{} field from {} shapes (~{} samples)",
        dims[0],
        dims[1],
        profile.shapes.len(),
        estimate_samples(&profile.shapes, dims, false)
    );

    let mut acc = Accumulator {
        buffer,
        sampler,
        base_value: profile.base_value,
        warp: profile.config.noise.is_warp(),
        extremes: Extremes::seeded(),
    };
    for (n, shape) in profile.shapes.iter().enumerate() {
        let field = shape.instantiate();
        let range = IndexRange::covering(&field.bounds(), dims);
        log::debug!("shape {n} ({:?}): {range:?}", shape.kind);
        for y in range.lo[1]..range.hi[1] {
            for x in range.lo[0]..range.hi[0] {
                acc.sample_2d(&field, x, y);
            }
        }
    }

    let (min, max) = acc.extremes.range();
    log::info!("accumulated range [{min}, {max}]");
    normalize(acc.buffer, min, max);
    Ok(Synthesis::Complete)
}

/// Accumulates every shape of `profile` into a 3D buffer and normalizes it.
///
/// `progress(processed, total)` runs once before each z slice of each shape,
/// with the number of samples taken so far and the estimated total; returning
/// `true` stops synthesis and yields [`Synthesis::Cancelled`] without
/// normalizing.
pub fn synthesize_3d<S, F>(
    buffer: &mut FieldBuffer,
    profile: &NoiseProfile,
    sampler: &S,
    mut progress: F,
) -> Result<Synthesis, NoiseError>
where
    S: Sampler + ?Sized,
    F: FnMut(usize, usize) -> bool,
{
    profile.validate()?;
    let dims = buffer.dims();
    buffer.clear();
    let total = estimate_samples(&profile.shapes, dims, true);
    log::debug!(
        "synthesizing {}x{}x{} field from {} shapes (~{total} samples)",
        dims[0],
        dims[1],
        dims[2],
        profile.shapes.len()
    );

    let mut acc = Accumulator {
        buffer,
        sampler,
        base_value: profile.base_value,
        warp: profile.config.noise.is_warp(),
        extremes: Extremes::seeded(),
    };
    let mut processed = 0usize;
    for (n, shape) in profile.shapes.iter().enumerate() {
        let field = shape.instantiate();
        let range = IndexRange::covering(&field.bounds(), dims);
        log::debug!("shape {n} ({:?}): {range:?}", shape.kind);
        for z in range.lo[2]..range.hi[2] {
            if progress(processed, total) {
                log::info!("synthesis cancelled after {processed} of ~{total} samples");
                return Ok(Synthesis::Cancelled);
            }
            for y in range.lo[1]..range.hi[1] {
                for x in range.lo[0]..range.hi[0] {
                    acc.sample_3d(&field, x, y, z);
                    processed += 1;
                }
            }
        }
    }

    let (min, max) = acc.extremes.range();
    log::info!("accumulated range [{min}, {max}] over {processed} samples");
    normalize(acc.buffer, min, max);
    Ok(Synthesis::Complete)
}

/// Rescales every channel to `(v - min) / (max - min)`.
///
/// A non-finite or empty range zero-fills the buffer instead, and any
/// non-finite texel becomes 0.
pub fn normalize(buffer: &mut FieldBuffer, min: f64, max: f64) {
    let span = max - min;
    if !(min.is_finite() && max.is_finite() && span > 0.0) {
        log::warn!("degenerate value range [{min}, {max}]; zero-filling buffer");
        buffer.clear();
        return;
    }
    for v in buffer.data_mut() {
        *v = if v.is_finite() { (*v - min) / span } else { 0.0 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NoiseFamily;
    use crate::field::ColorFormat;
    use crate::preset::Preset;
    use std::cell::{Cell, RefCell};

    /// Returns the same value everywhere.
    struct Constant(f64);

    impl Sampler for Constant {
        fn noise_2d(&self, _x: f64, _y: f64) -> f64 {
            self.0
        }
        fn noise_3d(&self, _x: f64, _y: f64, _z: f64) -> f64 {
            self.0
        }
        fn warp(&self, _point: &mut DVec3) {}
    }

    /// Records every coordinate it is asked about.
    #[derive(Default)]
    struct Recording {
        samples: RefCell<Vec<DVec3>>,
        warps: RefCell<Vec<DVec3>>,
    }

    impl Sampler for Recording {
        fn noise_2d(&self, x: f64, y: f64) -> f64 {
            self.samples.borrow_mut().push(DVec3::new(x, y, 0.0));
            0.0
        }
        fn noise_3d(&self, x: f64, y: f64, z: f64) -> f64 {
            self.samples.borrow_mut().push(DVec3::new(x, y, z));
            0.0
        }
        fn warp(&self, point: &mut DVec3) {
            self.warps.borrow_mut().push(*point);
        }
    }

    /// Counts 3D samples.
    #[derive(Default)]
    struct Counting(Cell<usize>);

    impl Sampler for Counting {
        fn noise_2d(&self, _x: f64, _y: f64) -> f64 {
            0.0
        }
        fn noise_3d(&self, _x: f64, _y: f64, _z: f64) -> f64 {
            self.0.set(self.0.get() + 1);
            0.0
        }
        fn warp(&self, _point: &mut DVec3) {}
    }

    fn profile_with(shapes: Vec<Shape>) -> NoiseProfile {
        NoiseProfile {
            shapes,
            ..NoiseProfile::default()
        }
    }

    fn buffer_2d(n: usize) -> FieldBuffer {
        FieldBuffer::new_2d(n, n, ColorFormat::R8).unwrap()
    }

    // -- Basic accumulation --

    #[test]
    fn zero_shapes_gives_zero_field() {
        let mut buffer = buffer_2d(16);
        let result = synthesize_2d(&mut buffer, &profile_with(vec![]), &Constant(0.7)).unwrap();
        assert_eq!(result, Synthesis::Complete);
        assert!(buffer.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_shapes_3d_gives_zero_field() {
        let mut buffer = FieldBuffer::new_3d(8, 8, 8, ColorFormat::R8).unwrap();
        let result =
            synthesize_3d(&mut buffer, &profile_with(vec![]), &Constant(0.7), |_, _| false)
                .unwrap();
        assert_eq!(result, Synthesis::Complete);
        assert!(buffer.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn single_box_fills_every_texel_once() {
        let mut buffer = buffer_2d(16);
        let profile = NoiseProfile::from_preset(Preset::Single);
        let _ = synthesize_2d(&mut buffer, &profile, &Constant(0.5)).unwrap();
        assert!(buffer.values().all(|v| v == 0.5));
    }

    #[test]
    fn later_shapes_add_onto_earlier_ones() {
        let mut one = buffer_2d(16);
        let mut two = buffer_2d(16);
        let single = Preset::Single.shapes();
        let doubled = [single.clone(), single.clone()].concat();
        let _ = synthesize_2d(&mut one, &profile_with(single), &Constant(0.25)).unwrap();
        let _ = synthesize_2d(&mut two, &profile_with(doubled), &Constant(0.25)).unwrap();
        assert!(one.values().all(|v| v == 0.25));
        assert!(two.values().all(|v| v == 0.5));
    }

    #[test]
    fn base_value_shifts_samples() {
        let mut buffer = buffer_2d(8);
        let profile = NoiseProfile {
            base_value: 0.5,
            ..NoiseProfile::from_preset(Preset::Single)
        };
        let _ = synthesize_2d(&mut buffer, &profile, &Constant(0.25)).unwrap();
        assert!(buffer.values().all(|v| v == 0.75));
    }

    #[test]
    fn every_channel_holds_the_same_value() {
        let mut buffer = FieldBuffer::new_2d(8, 8, ColorFormat::Rgba32).unwrap();
        let profile = NoiseProfile::from_preset(Preset::Tiling2d);
        let eval = profile.apply().unwrap();
        let _ = synthesize_2d(&mut buffer, &profile, &eval).unwrap();
        for texel in buffer.data().chunks(4) {
            assert!(texel.iter().all(|&c| c == texel[0]));
        }
    }

    #[test]
    fn buffer_is_cleared_before_accumulating() {
        let mut buffer = buffer_2d(8);
        buffer.data_mut().fill(0.9);
        let _ = synthesize_2d(&mut buffer, &profile_with(vec![]), &Constant(0.0)).unwrap();
        assert!(buffer.values().all(|v| v == 0.0));
    }

    #[test]
    fn synthesize_2d_rejects_volume_buffer() {
        let mut buffer = FieldBuffer::new_3d(4, 4, 4, ColorFormat::R8).unwrap();
        let err = synthesize_2d(&mut buffer, &profile_with(vec![]), &Constant(0.0)).unwrap_err();
        assert!(matches!(err, NoiseError::InvalidParameter { .. }));
    }

    #[test]
    fn invalid_profile_fails_before_sampling() {
        let sampler = Counting::default();
        let mut buffer = FieldBuffer::new_3d(4, 4, 4, ColorFormat::R8).unwrap();
        let profile = NoiseProfile {
            base_value: -1.0,
            ..NoiseProfile::from_preset(Preset::Single)
        };
        assert!(synthesize_3d(&mut buffer, &profile, &sampler, |_, _| false).is_err());
        assert_eq!(sampler.0.get(), 0);
    }

    // -- Wrap-around --

    #[test]
    fn shape_at_origin_reaches_both_edges() {
        let n = 32;
        let mut buffer = buffer_2d(n);
        let shape = Shape::sphere(1.0, 0.5, DVec3::ZERO, 0.5);
        let _ = synthesize_2d(&mut buffer, &profile_with(vec![shape]), &Constant(1.0)).unwrap();
        let last = n as i64 - 1;
        assert!(buffer.get(0, 0, 0) > 0.0);
        assert!(buffer.get(last, 0, 0) > 0.0);
        assert!(buffer.get(0, last, 0) > 0.0);
        assert!(buffer.get(last, last, 0) > 0.0);
        assert_eq!(buffer.get(n as i64 / 2, n as i64 / 2, 0), 0.0);
    }

    #[test]
    fn wrapped_contributions_match_mirrored_ones() {
        let n = 32;
        let mut buffer = buffer_2d(n);
        let shape = Shape::sphere(1.0, 0.5, DVec3::ZERO, 0.5);
        let _ = synthesize_2d(&mut buffer, &profile_with(vec![shape]), &Constant(1.0)).unwrap();
        for k in 1..4 {
            assert_eq!(buffer.get(k, 0, 0), buffer.get(-k, 0, 0));
            assert_eq!(buffer.get(0, k, 0), buffer.get(0, -k, 0));
        }
    }

    #[test]
    fn tiling_2d_preset_has_no_seam() {
        let n = 32;
        let mut buffer = buffer_2d(n);
        let profile = NoiseProfile::from_preset(Preset::Tiling2d);
        let _ = synthesize_2d(&mut buffer, &profile, &Constant(1.0)).unwrap();

        let last = n as i64 - 1;
        let mut interior = 0.0f64;
        let mut seam = 0.0f64;
        for a in 0..n as i64 {
            for b in 0..last {
                interior = interior
                    .max((buffer.get(b, a, 0) - buffer.get(b + 1, a, 0)).abs())
                    .max((buffer.get(a, b, 0) - buffer.get(a, b + 1, 0)).abs());
            }
            seam = seam
                .max((buffer.get(last, a, 0) - buffer.get(0, a, 0)).abs())
                .max((buffer.get(a, last, 0) - buffer.get(a, 0, 0)).abs());
        }
        assert!(seam <= interior + 1e-12, "seam {seam} vs interior {interior}");
    }

    #[test]
    fn volume_wraps_across_the_z_edge() {
        let (w, h, d) = (8, 4, 6);
        let mut buffer = FieldBuffer::new_3d(w, h, d, ColorFormat::R8).unwrap();
        let shape = Shape::sphere(1.0, 0.5, DVec3::new(0.5, 0.5, 0.0), 0.5);
        let _ = synthesize_3d(
            &mut buffer,
            &profile_with(vec![shape]),
            &Constant(1.0),
            |_, _| false,
        )
        .unwrap();

        let last = d as i64 - 1;
        assert!(buffer.get(4, 2, 0) > 0.0);
        assert!(buffer.get(4, 2, last) > 0.0);
        for z in 1..last {
            for y in 0..h as i64 {
                for x in 0..w as i64 {
                    assert_eq!(buffer.get(x, y, z), 0.0, "texel ({x}, {y}, {z})");
                }
            }
        }
    }

    // -- Reference coordinates --

    #[test]
    fn reference_coordinates_do_not_depend_on_resolution() {
        let profile = NoiseProfile::from_preset(Preset::Single);
        let coarse = Recording::default();
        let fine = Recording::default();
        let _ = synthesize_2d(&mut buffer_2d(16), &profile, &coarse).unwrap();
        let _ = synthesize_2d(&mut buffer_2d(32), &profile, &fine).unwrap();

        let coarse = coarse.samples.into_inner();
        let fine = fine.samples.into_inner();
        assert_eq!(coarse.len(), 16 * 16);
        assert_eq!(fine.len(), 32 * 32);
        assert!(coarse.iter().all(|p| fine.contains(p)));
        assert!(fine.iter().all(|p| p.x >= 0.0 && p.x < 256.0 && p.y >= 0.0 && p.y < 256.0));
        assert_eq!(coarse[1], DVec3::new(16.0, 0.0, 0.0));
    }

    #[test]
    fn warp_only_runs_for_warp_families() {
        let plain = Recording::default();
        let warped = Recording::default();
        let mut profile = NoiseProfile::from_preset(Preset::Single);
        let _ = synthesize_2d(&mut buffer_2d(8), &profile, &plain).unwrap();
        profile.config.noise = NoiseFamily::SimplexWarp;
        let _ = synthesize_2d(&mut buffer_2d(8), &profile, &warped).unwrap();

        assert!(plain.warps.borrow().is_empty());
        let warps = warped.warps.into_inner();
        assert_eq!(warps.len(), 64);
        assert!(warps.iter().all(|p| p.z == 1.0));
    }

    #[test]
    fn volume_reference_coordinates_cover_z() {
        let sampler = Recording::default();
        let mut buffer = FieldBuffer::new_3d(4, 4, 8, ColorFormat::R8).unwrap();
        let profile = NoiseProfile::from_preset(Preset::Single);
        let _ = synthesize_3d(&mut buffer, &profile, &sampler, |_, _| false).unwrap();
        let samples = sampler.samples.into_inner();
        assert_eq!(samples.len(), 4 * 4 * 8);
        assert_eq!(samples[0], DVec3::ZERO);
        assert_eq!(samples[16], DVec3::new(0.0, 0.0, 32.0));
    }

    // -- Determinism --

    #[test]
    fn same_profile_gives_identical_fields() {
        let profile = NoiseProfile {
            config: crate::config::NoiseConfig {
                noise: NoiseFamily::PerlinFractal,
                ..Default::default()
            },
            ..NoiseProfile::from_preset(Preset::Tiling2d)
        };
        let mut a = buffer_2d(16);
        let mut b = buffer_2d(16);
        let _ = synthesize_2d(&mut a, &profile, &profile.apply().unwrap()).unwrap();
        let _ = synthesize_2d(&mut b, &profile, &profile.apply().unwrap()).unwrap();
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn same_profile_gives_identical_volumes() {
        let profile = NoiseProfile::from_preset(Preset::Tiling3d);
        let eval = profile.apply().unwrap();
        let mut a = FieldBuffer::new_3d(8, 8, 8, ColorFormat::R8).unwrap();
        let mut b = FieldBuffer::new_3d(8, 8, 8, ColorFormat::R8).unwrap();
        let _ = synthesize_3d(&mut a, &profile, &eval, |_, _| false).unwrap();
        let _ = synthesize_3d(&mut b, &profile, &eval, |_, _| false).unwrap();
        assert_eq!(a.data(), b.data());
        assert!(a.values().all(|v| (0.0..=1.0).contains(&v)));
    }

    // -- Progress and cancellation --

    #[test]
    fn progress_runs_once_per_slice() {
        let mut calls = Vec::new();
        let mut buffer = FieldBuffer::new_3d(4, 4, 4, ColorFormat::R8).unwrap();
        let profile = NoiseProfile::from_preset(Preset::Single);
        let result = synthesize_3d(&mut buffer, &profile, &Constant(0.5), |i, total| {
            calls.push((i, total));
            false
        })
        .unwrap();
        assert_eq!(result, Synthesis::Complete);
        assert_eq!(calls, vec![(0, 64), (16, 64), (32, 64), (48, 64)]);
    }

    #[test]
    fn cancelling_at_slice_k_stops_after_k_slices() {
        let k = 3;
        let sampler = Counting::default();
        let mut buffer = FieldBuffer::new_3d(8, 8, 8, ColorFormat::R8).unwrap();
        let profile = NoiseProfile::from_preset(Preset::Single);
        let mut slice = 0;
        let result = synthesize_3d(&mut buffer, &profile, &sampler, |_, _| {
            slice += 1;
            slice > k
        })
        .unwrap();
        assert_eq!(result, Synthesis::Cancelled);
        assert_eq!(sampler.0.get(), k * 8 * 8);
    }

    #[test]
    fn cancelled_buffer_is_not_normalized() {
        let mut buffer = FieldBuffer::new_3d(4, 4, 4, ColorFormat::R8).unwrap();
        let profile = NoiseProfile {
            base_value: 3.0,
            ..NoiseProfile::from_preset(Preset::Single)
        };
        let mut first = true;
        let result = synthesize_3d(&mut buffer, &profile, &Constant(0.0), |_, _| {
            let stop = !first;
            first = false;
            stop
        })
        .unwrap();
        assert_eq!(result, Synthesis::Cancelled);
        assert_eq!(buffer.get(0, 0, 0), 3.0);
        assert_eq!(buffer.get(0, 0, 1), 0.0);
    }

    // -- Normalization --

    #[test]
    fn normalize_with_unit_range_is_identity() {
        let mut buffer = buffer_2d(16);
        let profile = NoiseProfile::from_preset(Preset::Tiling2d);
        let _ = synthesize_2d(&mut buffer, &profile, &profile.apply().unwrap()).unwrap();
        let before = buffer.data().to_vec();
        normalize(&mut buffer, 0.0, 1.0);
        assert_eq!(buffer.data(), &before[..]);
    }

    #[test]
    fn normalize_rescales_range() {
        let mut buffer =
            FieldBuffer::from_data([3, 1, 1], ColorFormat::R8, vec![-1.0, 0.0, 3.0]).unwrap();
        normalize(&mut buffer, -1.0, 3.0);
        assert_eq!(buffer.data(), &[0.0, 0.25, 1.0]);
    }

    #[test]
    fn degenerate_range_zero_fills() {
        let mut buffer = FieldBuffer::from_data([2, 1, 1], ColorFormat::R8, vec![2.0, 2.0]).unwrap();
        normalize(&mut buffer, 2.0, 2.0);
        assert_eq!(buffer.data(), &[0.0, 0.0]);

        let mut buffer = buffer_2d(4);
        let profile = NoiseProfile::from_preset(Preset::Single);
        let _ = synthesize_2d(&mut buffer, &profile, &Constant(f64::INFINITY)).unwrap();
        assert!(buffer.values().all(|v| v == 0.0));
    }

    #[test]
    fn nan_samples_zero_fill_instead_of_propagating() {
        let mut buffer = buffer_2d(16);
        let profile = NoiseProfile::from_preset(Preset::Tiling2d);
        let result = synthesize_2d(&mut buffer, &profile, &Constant(f64::NAN)).unwrap();
        assert_eq!(result, Synthesis::Complete);
        assert!(buffer.data().iter().all(|&v| v == 0.0));

        let mut volume = FieldBuffer::new_3d(4, 4, 4, ColorFormat::R8).unwrap();
        let profile = NoiseProfile::from_preset(Preset::Single);
        let _ = synthesize_3d(&mut volume, &profile, &Constant(f64::NAN), |_, _| false).unwrap();
        assert!(volume.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalize_maps_non_finite_texels_to_zero() {
        let data = vec![f64::NAN, 0.5, f64::NEG_INFINITY, 1.0];
        let mut buffer = FieldBuffer::from_data([4, 1, 1], ColorFormat::R8, data).unwrap();
        normalize(&mut buffer, 0.0, 1.0);
        assert_eq!(buffer.data(), &[0.0, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn extreme_fractal_settings_stay_in_unit_range() {
        let profile = NoiseProfile {
            config: crate::config::NoiseConfig {
                noise: NoiseFamily::ValueFractal,
                octaves: 16,
                lacunarity: 10.0,
                gain: 2.0,
                ..Default::default()
            },
            ..NoiseProfile::from_preset(Preset::Single)
        };
        let mut buffer = buffer_2d(16);
        let _ = synthesize_2d(&mut buffer, &profile, &profile.apply().unwrap()).unwrap();
        assert!(buffer.values().all(|v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn overflowing_fractal_settings_are_rejected() {
        for config in [
            crate::config::NoiseConfig {
                noise: NoiseFamily::PerlinFractal,
                gain: 1e200,
                ..Default::default()
            },
            crate::config::NoiseConfig {
                noise: NoiseFamily::ValueFractal,
                lacunarity: 1e300,
                ..Default::default()
            },
        ] {
            let profile = NoiseProfile {
                config,
                ..NoiseProfile::from_preset(Preset::Single)
            };
            let err = synthesize_2d(&mut buffer_2d(16), &profile, &Constant(0.5)).unwrap_err();
            assert!(matches!(err, NoiseError::InvalidParameter { .. }));
        }
    }

    #[test]
    fn negative_samples_lower_the_minimum() {
        let mut buffer = buffer_2d(4);
        let profile = NoiseProfile::from_preset(Preset::Single);
        let _ = synthesize_2d(&mut buffer, &profile, &Constant(-0.5)).unwrap();
        assert!(buffer.values().all(|v| v == 0.0));
    }

    // -- Helpers --

    #[test]
    fn index_range_truncates_toward_zero() {
        let bounds = Aabb {
            min: DVec3::new(-0.26, 0.1, -0.5),
            max: DVec3::new(0.26, 1.0, 0.5),
        };
        let range = IndexRange::covering(&bounds, [10, 10, 4]);
        assert_eq!(range.lo, [-2, 1, -2]);
        assert_eq!(range.hi, [2, 10, 2]);
    }

    #[test]
    fn sample_estimate_uses_bounds_volume() {
        let shapes = Preset::Tiling3d.shapes();
        assert_eq!(estimate_samples(&shapes, [8, 8, 8], true), 8 * 512);
        assert_eq!(estimate_samples(&shapes[..1], [8, 8, 8], false), 64);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn output_stays_in_unit_range(
                noise in -2.0f64..2.0,
                base in 0.0f64..5.0,
                preset in 0usize..3,
            ) {
                let preset = [Preset::Single, Preset::Tiling2d, Preset::Tiling3d][preset];
                let profile = NoiseProfile {
                    base_value: base,
                    ..NoiseProfile::from_preset(preset)
                };
                let mut buffer = buffer_2d(8);
                let _ = synthesize_2d(&mut buffer, &profile, &Constant(noise)).unwrap();
                prop_assert!(buffer.values().all(|v| (0.0..=1.0).contains(&v)));
            }
        }
    }
}
