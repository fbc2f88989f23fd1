//! BT.601 YUV 4:2:0 conversion kernels.
//!
//! All conversions use the limited-range BT.601 matrix in 8-bit fixed point:
//! luma spans `16..=235` and chroma `16..=240`. Chroma planes are subsampled
//! by two in both directions, rounding up, so odd widths and heights keep a
//! chroma sample for the last column and row.
use crate::channels::PixelFormat;
use crate::error::{Plane, ScError};
use crate::{div_ceil, pixel_count};

/// Borrowed planes of a YUV 4:2:0 image.
#[derive(Debug, Clone, Copy)]
pub struct Yuv420<'a> {
    /// Luma plane, `y_stride` bytes per row.
    pub y: &'a [u8],
    /// Blue-difference plane, `uv_stride` bytes per row.
    pub u: &'a [u8],
    /// Red-difference plane, `uv_stride` bytes per row.
    pub v: &'a [u8],
    /// Row stride of the luma plane.
    pub y_stride: u32,
    /// Row stride of both chroma planes.
    pub uv_stride: u32,
}

/// Mutable planes of a YUV 4:2:0 image.
#[derive(Debug)]
pub struct Yuv420Mut<'a> {
    /// Luma plane, `y_stride` bytes per row.
    pub y: &'a mut [u8],
    /// Blue-difference plane, `uv_stride` bytes per row.
    pub u: &'a mut [u8],
    /// Red-difference plane, `uv_stride` bytes per row.
    pub v: &'a mut [u8],
    /// Row stride of the luma plane.
    pub y_stride: u32,
    /// Row stride of both chroma planes.
    pub uv_stride: u32,
}

/// Dimensions of the chroma planes for a `width` by `height` image.
#[inline]
pub fn chroma_dimensions(width: u32, height: u32) -> (u32, u32) {
    (div_ceil(width, 2), div_ceil(height, 2))
}

/// Minimum number of bytes a plane of `rows` rows needs when each row holds
/// `row_len` bytes and rows start `stride` bytes apart.
///
/// Returns `None` when the stride is shorter than a row or the size
/// overflows.
pub fn required_len(stride: u32, rows: u32, row_len: usize) -> Option<usize> {
    let stride = usize::try_from(stride).ok()?;
    if stride < row_len || rows == 0 {
        return None;
    }
    let rows = usize::try_from(rows).ok()?;
    stride.checked_mul(rows - 1)?.checked_add(row_len)
}

fn check_plane(
    plane: Plane,
    len: usize,
    stride: u32,
    rows: u32,
    row_len: usize,
) -> Result<(), ScError> {
    let stride_ok = usize::try_from(stride).map_or(false, |s| s >= row_len);
    if !stride_ok {
        return Err(ScError::InvalidStride);
    }
    match required_len(stride, rows, row_len) {
        Some(required) if len >= required => Ok(()),
        _ => Err(ScError::MismatchedPlane(plane)),
    }
}

fn to_usize(value: u32) -> Result<usize, ScError> {
    usize::try_from(value).or(Err(ScError::General("Dimension too large")))
}

#[inline]
fn clamp_u8(value: i32) -> u8 {
    u8::try_from(value.clamp(0, 255)).unwrap_or(u8::MAX)
}

/// Luma of one RGB pixel.
#[inline]
pub fn rgb_to_y([r, g, b]: [u8; 3]) -> u8 {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    clamp_u8(((66 * r + 129 * g + 25 * b + 128) >> 8) + 16)
}

/// Chroma `(U, V)` of one RGB pixel.
#[inline]
pub fn rgb_to_uv([r, g, b]: [u8; 3]) -> (u8, u8) {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
    let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
    (clamp_u8(u), clamp_u8(v))
}

/// RGB of one YUV sample triple.
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = 298 * (i32::from(y) - 16);
    let d = i32::from(u) - 128;
    let e = i32::from(v) - 128;
    [
        clamp_u8((c + 409 * e + 128) >> 8),
        clamp_u8((c - 100 * d - 208 * e + 128) >> 8),
        clamp_u8((c + 516 * d + 128) >> 8),
    ]
}

/// Modify `output` to contain a packed `format` image converted from YUV
/// 4:2:0 planes. `output` holds `width * height * format.channels()` bytes
/// with no row padding.
pub fn yuv420_to_packed(
    output: &mut [u8],
    width: u32,
    height: u32,
    src: &Yuv420<'_>,
    format: PixelFormat,
) -> Result<(), ScError> {
    let count = pixel_count(width, height)?;
    let channels = format.channels();
    let expected = count.checked_mul(channels).ok_or("Output too large")?;
    if output.len() != expected {
        return Err(ScError::MismatchedPixelBuffer {
            expected,
            actual: output.len(),
        });
    }

    let (chroma_w, chroma_h) = chroma_dimensions(width, height);
    let (luma_row, chroma_row) = (to_usize(width)?, to_usize(chroma_w)?);
    check_plane(Plane::Y, src.y.len(), src.y_stride, height, luma_row)?;
    check_plane(Plane::U, src.u.len(), src.uv_stride, chroma_h, chroma_row)?;
    check_plane(Plane::V, src.v.len(), src.uv_stride, chroma_h, chroma_row)?;

    let width = to_usize(width)?;
    let y_stride = to_usize(src.y_stride)?;
    let uv_stride = to_usize(src.uv_stride)?;

    for (row, out_row) in output.chunks_exact_mut(width * channels).enumerate() {
        let y_row = &src.y[row * y_stride..row * y_stride + width];
        let uv_offset = (row / 2) * uv_stride;
        for (col, out) in out_row.chunks_exact_mut(channels).enumerate() {
            let uv_idx = uv_offset + col / 2;
            format.write(out, yuv_to_rgb(y_row[col], src.u[uv_idx], src.v[uv_idx]));
        }
    }

    Ok(())
}

/// Convert an RGB24 image with row stride `rgb_stride` into YUV 4:2:0
/// planes.
///
/// Each chroma sample is computed from the rounded mean RGB of its 2x2
/// block; blocks cut off by an odd edge average the pixels that exist.
pub fn rgb24_to_yuv420(
    width: u32,
    height: u32,
    rgb: &[u8],
    rgb_stride: u32,
    dst: &mut Yuv420Mut<'_>,
) -> Result<(), ScError> {
    let _ = pixel_count(width, height)?;
    let (chroma_w, chroma_h) = chroma_dimensions(width, height);
    let row_bytes = to_usize(width)?.checked_mul(3).ok_or("RGB row overflows")?;
    if usize::try_from(rgb_stride).map_or(true, |s| s < row_bytes) {
        return Err(ScError::InvalidStride);
    }
    let required = required_len(rgb_stride, height, row_bytes).ok_or("RGB buffer too large")?;
    if rgb.len() < required {
        return Err(ScError::MismatchedPixelBuffer {
            expected: required,
            actual: rgb.len(),
        });
    }
    let (luma_row, chroma_row) = (to_usize(width)?, to_usize(chroma_w)?);
    check_plane(Plane::Y, dst.y.len(), dst.y_stride, height, luma_row)?;
    check_plane(Plane::U, dst.u.len(), dst.uv_stride, chroma_h, chroma_row)?;
    check_plane(Plane::V, dst.v.len(), dst.uv_stride, chroma_h, chroma_row)?;

    let (width, height) = (to_usize(width)?, to_usize(height)?);
    let (chroma_w, chroma_h) = (to_usize(chroma_w)?, to_usize(chroma_h)?);
    let rgb_stride = to_usize(rgb_stride)?;
    let y_stride = to_usize(dst.y_stride)?;
    let uv_stride = to_usize(dst.uv_stride)?;

    let pixel = |x: usize, y: usize| -> [u8; 3] {
        let i = y * rgb_stride + x * 3;
        [rgb[i], rgb[i + 1], rgb[i + 2]]
    };

    for y in 0..height {
        for x in 0..width {
            dst.y[y * y_stride + x] = rgb_to_y(pixel(x, y));
        }
    }

    for cy in 0..chroma_h {
        for cx in 0..chroma_w {
            let mut sum = [0u32; 3];
            let mut count = 0u32;
            for y in (cy * 2)..(cy * 2 + 2).min(height) {
                for x in (cx * 2)..(cx * 2 + 2).min(width) {
                    let px = pixel(x, y);
                    sum[0] += u32::from(px[0]);
                    sum[1] += u32::from(px[1]);
                    sum[2] += u32::from(px[2]);
                    count += 1;
                }
            }
            let mean = sum.map(|s| u8::try_from((s + count / 2) / count).unwrap_or(u8::MAX));
            let (u, v) = rgb_to_uv(mean);
            dst.u[cy * uv_stride + cx] = u;
            dst.v[cy * uv_stride + cx] = v;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_colors() {
        assert_eq!(rgb_to_y([0, 0, 0]), 16);
        assert_eq!(rgb_to_y([255, 255, 255]), 235);
        assert_eq!(rgb_to_uv([128, 128, 128]), (128, 128));
        assert_eq!(yuv_to_rgb(16, 128, 128), [0, 0, 0]);
        assert_eq!(yuv_to_rgb(235, 128, 128), [255, 255, 255]);
    }

    #[test]
    fn primaries_survive_a_round_trip() {
        for rgb in [[255, 0, 0], [0, 255, 0], [0, 0, 255], [200, 120, 40]] {
            let (u, v) = rgb_to_uv(rgb);
            let back = yuv_to_rgb(rgb_to_y(rgb), u, v);
            for (a, b) in rgb.iter().zip(back.iter()) {
                assert!(a.abs_diff(*b) <= 4, "{rgb:?} -> {back:?}");
            }
        }
    }

    #[test]
    fn chroma_rounds_up_for_odd_sizes() {
        assert_eq!(chroma_dimensions(4, 4), (2, 2));
        assert_eq!(chroma_dimensions(5, 3), (3, 2));
        assert_eq!(chroma_dimensions(1, 1), (1, 1));
    }

    #[test]
    fn plane_length_accounts_for_stride() {
        assert_eq!(required_len(8, 3, 5), Some(21));
        assert_eq!(required_len(4, 3, 5), None);
        assert_eq!(required_len(4, 0, 4), None);
    }

    #[test]
    fn strided_luma_is_read_row_by_row() {
        // 2x2 image, luma rows padded to 4 bytes.
        let y = [235, 16, 0, 0, 16, 235, 0, 0];
        let src = Yuv420 {
            y: &y,
            u: &[128],
            v: &[128],
            y_stride: 4,
            uv_stride: 1,
        };
        let mut out = [0; 12];
        yuv420_to_packed(&mut out, 2, 2, &src, PixelFormat::Rgb24).unwrap();
        assert_eq!(out, [255, 255, 255, 0, 0, 0, 0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn short_chroma_plane_is_rejected() {
        let y = [16; 4];
        let src = Yuv420 {
            y: &y,
            u: &[],
            v: &[128],
            y_stride: 2,
            uv_stride: 1,
        };
        let mut out = [0; 12];
        assert!(matches!(
            yuv420_to_packed(&mut out, 2, 2, &src, PixelFormat::Rgb24),
            Err(ScError::MismatchedPlane(Plane::U))
        ));
    }

    #[test]
    fn chroma_averages_partial_blocks() {
        // 3x1 image: one full horizontal pair and one lone pixel.
        let rgb = [255, 0, 0, 255, 0, 0, 0, 0, 255];
        let (mut y, mut u, mut v) = ([0; 3], [0; 2], [0; 2]);
        let mut dst = Yuv420Mut {
            y: &mut y,
            u: &mut u,
            v: &mut v,
            y_stride: 3,
            uv_stride: 2,
        };
        rgb24_to_yuv420(3, 1, &rgb, 9, &mut dst).unwrap();
        assert_eq!((u[0], v[0]), rgb_to_uv([255, 0, 0]));
        assert_eq!((u[1], v[1]), rgb_to_uv([0, 0, 255]));
        assert_eq!(y[2], rgb_to_y([0, 0, 255]));
    }
}
