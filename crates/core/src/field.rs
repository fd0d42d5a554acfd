//! Dense 2D/3D texel buffer with toroidal addressing and replicated channels.
//!
//! A `FieldBuffer` stores `width * height * depth` texels in row-major,
//! slice-major layout (`x + width * y + width * height * z`). Each texel holds
//! one scalar replicated across the channel count of its [`ColorFormat`], so
//! the buffer can be handed to texture exporters without a repacking pass.
//! Coordinate access wraps, which is what lets shapes placed over an edge
//! spill onto the opposite edge.

use crate::error::NoiseError;
use serde::{Deserialize, Serialize};

/// Channel layout of the generated texture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorFormat {
    /// Single red channel.
    R8,
    /// Single alpha channel.
    A8,
    /// Four channels, each holding the same intensity.
    #[default]
    Rgba32,
}

impl ColorFormat {
    /// Number of stored values per texel.
    pub fn channels(self) -> usize {
        match self {
            ColorFormat::R8 | ColorFormat::A8 => 1,
            ColorFormat::Rgba32 => 4,
        }
    }
}

/// A dense grid of scalar intensities replicated over `format.channels()`.
#[derive(Debug, Clone)]
pub struct FieldBuffer {
    width: usize,
    height: usize,
    depth: usize,
    format: ColorFormat,
    data: Vec<f64>,
}

impl FieldBuffer {
    /// Creates a zero-filled 2D buffer (depth 1).
    pub fn new_2d(width: usize, height: usize, format: ColorFormat) -> Result<Self, NoiseError> {
        Self::new_3d(width, height, 1, format)
    }

    /// Creates a zero-filled 3D buffer.
    ///
    /// Returns `NoiseError::InvalidDimensions` if any dimension is zero or
    /// if the value count overflows `usize`.
    pub fn new_3d(
        width: usize,
        height: usize,
        depth: usize,
        format: ColorFormat,
    ) -> Result<Self, NoiseError> {
        let len = value_count(width, height, depth, format)?;
        Ok(Self {
            width,
            height,
            depth,
            format,
            data: vec![0.0; len],
        })
    }

    /// Creates a buffer from pre-built interleaved channel data.
    ///
    /// `data.len()` must equal `width * height * depth * channels`.
    pub fn from_data(
        dims: [usize; 3],
        format: ColorFormat,
        data: Vec<f64>,
    ) -> Result<Self, NoiseError> {
        let [width, height, depth] = dims;
        let expected = value_count(width, height, depth, format)?;
        if data.len() != expected {
            return Err(NoiseError::DimensionMismatch {
                lhs: dims,
                rhs: [data.len() / format.channels(), 1, 1],
            });
        }
        Ok(Self {
            width,
            height,
            depth,
            format,
            data,
        })
    }

    /// Buffer width in texels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Buffer height in texels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Buffer depth in texels (1 for 2D buffers).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `[width, height, depth]`.
    pub fn dims(&self) -> [usize; 3] {
        [self.width, self.height, self.depth]
    }

    /// Channel layout.
    pub fn format(&self) -> ColorFormat {
        self.format
    }

    /// Values stored per texel.
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Number of texels (not values).
    pub fn texel_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Read-only access to the interleaved channel data.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the interleaved channel data.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Resets every channel of every texel to 0.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Converts signed coordinates to a flat texel index using toroidal wrapping.
    pub fn wrapped_index(&self, x: i64, y: i64, z: i64) -> usize {
        let xi = x.rem_euclid(self.width as i64) as usize;
        let yi = y.rem_euclid(self.height as i64) as usize;
        let zi = z.rem_euclid(self.depth as i64) as usize;
        xi + self.width * (yi + self.height * zi)
    }

    /// Scalar of the texel at flat index `texel` (first channel).
    pub fn value(&self, texel: usize) -> f64 {
        self.data[texel * self.channels()]
    }

    /// Writes `value` into every channel of the texel at flat index `texel`.
    pub fn set_value(&mut self, texel: usize, value: f64) {
        let channels = self.channels();
        let start = texel * channels;
        self.data[start..start + channels].fill(value);
    }

    /// Scalar at `(x, y, z)` with toroidal wrapping.
    pub fn get(&self, x: i64, y: i64, z: i64) -> f64 {
        self.value(self.wrapped_index(x, y, z))
    }

    /// Iterates texel scalars (first channel) in flat index order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().step_by(self.channels()).copied()
    }
}

fn value_count(
    width: usize,
    height: usize,
    depth: usize,
    format: ColorFormat,
) -> Result<usize, NoiseError> {
    if width == 0 || height == 0 || depth == 0 {
        return Err(NoiseError::InvalidDimensions);
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(depth))
        .and_then(|n| n.checked_mul(format.channels()))
        .ok_or(NoiseError::InvalidDimensions)
}
