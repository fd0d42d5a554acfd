//! Pure-computation byte conversion of a [`FieldBuffer`].
//!
//! This module is always available (no feature gate) so hosts that upload
//! textures themselves can share the same quantization as the PNG path.

use tilenoise_core::field::{ColorFormat, FieldBuffer};

/// Quantizes a normalized value to a byte, clamping out-of-range input.
pub fn quantize(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Quantizes every channel of every texel, keeping the buffer's interleaving.
///
/// The result has `texel_count * channels` bytes in flat index order, which
/// for a 3D buffer is a vertical stack of its z slices.
pub fn texels_to_bytes(buffer: &FieldBuffer) -> Vec<u8> {
    buffer.data().iter().map(|&v| quantize(v)).collect()
}

/// Bytes laid out for the 8-bit image type matching the buffer's format.
///
/// `R8` and `Rgba32` map one-to-one. `A8` becomes gray+alpha pairs with a
/// white gray channel.
pub fn texels_to_image_bytes(buffer: &FieldBuffer) -> Vec<u8> {
    match buffer.format() {
        ColorFormat::R8 | ColorFormat::Rgba32 => texels_to_bytes(buffer),
        ColorFormat::A8 => buffer
            .data()
            .iter()
            .flat_map(|&a| [u8::MAX, quantize(a)])
            .collect(),
    }
}
