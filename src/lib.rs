//! Superpixel segmentation and camera buffer conversion.
//!
//! The segmentation engine is **SLIC** (*simple linear iterative
//! clustering*): seeds are laid out on a regular grid, pixels are assigned to
//! the nearest seed inside a bounded search window under a joint color and
//! spatial distance, and the seeds move to the mean of their members. After
//! the iteration budget a connectivity pass removes disconnected and
//! undersized fragments, and an edge map marks region boundaries.
//!
//! The crate also carries the BT.601 YUV 4:2:0 conversions and channel
//! shuffles a camera pipeline needs before segmentation, and exports the
//! whole surface through a C ABI (see [`ffi`]).
//!
//! Results are returned as owning handles ([`ImageData`], [`YuvData`],
//! [`Segmentation`]). Each handle frees its buffers when dropped or when
//! [`release`](Segmentation::release) is called on it.
//!
//! ## Usage
//!
//! ### Segmenting an RGBA buffer
//!
//! ```
//! use slic_buffers::{Segmentation, SlicConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (width, height) = (4, 4);
//! let rgba = [200u8, 30, 30, 255].repeat(16);
//! let segmentation = Segmentation::from_rgba(width, height, 16, &rgba, &SlicConfig::default())?;
//!
//! assert_eq!(segmentation.num_labels(), 1);
//! assert!(segmentation.edges().iter().all(|&e| e == slic_buffers::image::EDGE_OFF));
//! segmentation.release();
//! # Ok(())
//! # }
//! ```
//!
//! ### Converting camera frames
//!
//! ```
//! use slic_buffers::{ImageData, YuvData};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (width, height) = (2, 2);
//! let rgb = [16u8, 128, 240].repeat(4);
//! let yuv = YuvData::from_rgb24(width, height, &rgb, width * 3)?;
//! assert_eq!(yuv.y().len(), 4);
//! assert_eq!(yuv.u().len(), 1);
//!
//! let back = ImageData::yuv420_to_rgb24(width, height, &yuv.planes())?;
//! assert_eq!(back.data().len(), rgb.len());
//! yuv.release();
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]
#![forbid(
    missing_docs,
    non_ascii_idents,
    noop_method_call,
    unused_results
)]
#![warn(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use num_traits::{One, Unsigned, Zero};
use palette::{white_point::D65, Lab};
use std::ops::{Add, Div, Rem};

pub mod buffer;
pub mod channels;
pub mod connectivity;
pub mod error;
pub mod ffi;
pub mod image;
pub mod pack;
pub mod seed;
mod slic;
pub mod yuv;

pub use buffer::{ImageData, PixelFormat, PlaneView, Segmentation, YuvData};
pub use slic::{slic, slic_from_rgba, SlicConfig};

/// Perceptual color type used for distance computation.
pub type LabColor = Lab<D65, f64>;

/// Calculate the grid step, `S`, for a superpixel region size in pixels.
///
/// `S * S` is the approximate size of each superpixel. The step is the
/// rounded square root of `region_size` and never less than `1`.
#[inline]
fn calculate_grid_step(region_size: u32) -> f64 {
    f64::from(region_size).sqrt().round().max(1.0)
}

/// Calculate the squared distance between two `Lab` colors.
#[inline]
fn distance_lab(lhs: LabColor, rhs: LabColor) -> f64 {
    (rhs.l - lhs.l).powi(2) + (rhs.a - lhs.a).powi(2) + (rhs.b - lhs.b).powi(2)
}

/// Calculate the squared distance between two two-dimensional points.
#[inline]
fn distance_xy(lhs: (f64, f64), rhs: (f64, f64)) -> f64 {
    (rhs.0 - lhs.0).powi(2) + (rhs.1 - lhs.1).powi(2)
}

/// Calculate the squared joint distance `D²`.
#[inline]
fn distance_s(m_div_s: f64, d_lab: f64, d_xy: f64) -> f64 {
    d_lab + m_div_s * d_xy
}

/// Calculate the superpixel scaling factor.
///
/// `m_div_s` is `(m / s).powi(2)`.
#[inline]
fn m_div_s(m: f64, s: f64) -> f64 {
    (m / s).powi(2)
}

/// Calculates the quotient of `lhs` and `rhs`, rounding the result towards
/// positive infinity.
#[inline]
fn div_ceil<T>(lhs: T, rhs: T) -> T
where
    T: PartialOrd + Copy + Div + Rem + Add + Unsigned + Zero + One,
{
    let d = lhs / rhs;
    let r = lhs % rhs;
    if r > T::zero() && rhs > T::zero() {
        d + T::one()
    } else {
        d
    }
}

/// Number of pixels in a `width` by `height` image.
#[inline]
fn pixel_count(width: u32, height: u32) -> Result<usize, error::ScError> {
    if width == 0 || height == 0 {
        return Err(error::ScError::InvalidImageDimension);
    }
    usize::try_from(u64::from(width) * u64::from(height))
        .or(Err(error::ScError::General("Image too large")))
}

/// Checks if the index is in bounds and returns a reference to the data at that
/// point if it exists.
#[inline]
fn get_in_bounds<T>(width: i64, height: i64, x: i64, y: i64, image: &[T]) -> Option<&T> {
    if (0..width).contains(&x) && (0..height).contains(&y) {
        let i = u64::try_from(y)
            .ok()?
            .checked_mul(u64::try_from(width).ok()?)?
            .checked_add(u64::try_from(x).ok()?)
            .and_then(|i| usize::try_from(i).ok())?;
        image.get(i)
    } else {
        None
    }
}

/// A superpixel cluster center: color, position and member count.
#[derive(Debug, Clone, Copy)]
pub struct Superpixel<T> {
    /// Superpixel color.
    pub data: T,
    /// X-position coordinate.
    pub x: f64,
    /// Y-position coordinate.
    pub y: f64,
    /// Number of pixels assigned in the last assignment pass.
    pub members: usize,
}

impl<T: Default> Default for Superpixel<T> {
    #[inline]
    fn default() -> Self {
        Self {
            data: Default::default(),
            x: Default::default(),
            y: Default::default(),
            members: Default::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_step_rounds_square_root() {
        assert_eq!(calculate_grid_step(16), 4.0);
        assert_eq!(calculate_grid_step(5000), 71.0);
        assert_eq!(calculate_grid_step(7056), 84.0);
        assert_eq!(calculate_grid_step(0), 1.0);
    }

    #[test]
    fn ceil_division() {
        assert_eq!(div_ceil(100u32, 84), 2);
        assert_eq!(div_ceil(100u32, 100), 1);
        assert_eq!(div_ceil(4u32, 4), 1);
        assert_eq!(div_ceil(5u32, 4), 2);
    }

    #[test]
    fn bounds_checks_both_axes() {
        let data = [0, 1, 2, 3, 4, 5];
        assert_eq!(get_in_bounds(3, 2, 2, 1, &data), Some(&5));
        assert_eq!(get_in_bounds(3, 2, 3, 0, &data), None);
        assert_eq!(get_in_bounds(3, 2, 0, 2, &data), None);
        assert_eq!(get_in_bounds(3, 2, -1, 0, &data), None);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(
            pixel_count(0, 3),
            Err(error::ScError::InvalidImageDimension)
        ));
        assert_eq!(pixel_count(3, 2).ok(), Some(6));
    }
}
