//! PNG output of a [`FieldBuffer`].
//!
//! This module is feature-gated behind `png` (default on) so hosts that only
//! need raw bytes do not pull in the `image` crate. The byte conversion
//! itself lives in [`crate::pixel`] (always available).
//!
//! A 3D buffer is written as a slice atlas: `width` wide and
//! `height * depth` tall, slice `z` occupying rows `z*height..(z+1)*height`.

use image::{GrayAlphaImage, GrayImage, ImageFormat, RgbaImage};
use std::path::Path;
use tilenoise_core::error::NoiseError;
use tilenoise_core::field::{ColorFormat, FieldBuffer};

use crate::pixel::texels_to_image_bytes;

/// Writes a buffer as an 8-bit PNG: gray for `R8`, gray+alpha for `A8`,
/// RGBA for `Rgba32`.
///
/// Returns `NoiseError::InvalidDimensions` if the image size overflows
/// `u32`, or `NoiseError::Io` on write failure.
pub fn write_png(buffer: &FieldBuffer, path: &Path) -> Result<(), NoiseError> {
    let w = u32::try_from(buffer.width()).map_err(|_| NoiseError::InvalidDimensions)?;
    let h = buffer
        .height()
        .checked_mul(buffer.depth())
        .and_then(|rows| u32::try_from(rows).ok())
        .ok_or(NoiseError::InvalidDimensions)?;
    let bytes = texels_to_image_bytes(buffer);
    let mismatch = || NoiseError::Io("pixel buffer size mismatch".into());

    let result = match buffer.format() {
        ColorFormat::R8 => GrayImage::from_raw(w, h, bytes)
            .ok_or_else(mismatch)?
            .save_with_format(path, ImageFormat::Png),
        ColorFormat::A8 => GrayAlphaImage::from_raw(w, h, bytes)
            .ok_or_else(mismatch)?
            .save_with_format(path, ImageFormat::Png),
        ColorFormat::Rgba32 => RgbaImage::from_raw(w, h, bytes)
            .ok_or_else(mismatch)?
            .save_with_format(path, ImageFormat::Png),
    };
    result.map_err(|e| NoiseError::Io(format!("{}: {e}", path.display())))?;
    log::debug!("wrote {w}x{h} {:?} png to {}", buffer.format(), path.display());
    Ok(())
}
