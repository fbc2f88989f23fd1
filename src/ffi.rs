//! C ABI for the conversion and segmentation entry points.
//!
//! Every `create` style function returns a heap record that the caller
//! must hand back to the matching release function exactly once:
//!
//! - [`RawImageData`] from [`yuv2rgb`], [`yuv2rgba`], [`yuv2bgr`],
//!   [`rgba2bgr`] and [`bgr2rgba`] goes to [`flush_imagedata`].
//! - [`RawYuvData`] from [`rgb2yuv`] goes to [`flush_yuvdata`].
//! - [`RawPixelData`] from [`superpixel`] goes to [`flush_pixel`].
//!
//! Invalid input (null pointers, zero dimensions, short strides) yields a
//! null pointer and a `warn` level log record. Release functions ignore
//! null.
#![allow(unsafe_code)]

use crate::buffer::{ImageData, Segmentation, YuvData};
use crate::error::ScError;
use crate::slic::SlicConfig;
use crate::yuv::{chroma_dimensions, required_len, Yuv420};

use log::warn;
use std::ptr;
use std::slice;

/// An interleaved color image.
#[repr(C)]
#[derive(Debug)]
pub struct RawImageData {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel bytes, no row padding.
    pub data: *mut u8,
    /// Length of `data` in bytes.
    pub len: usize,
}

/// A YUV 4:2:0 image. `y`, `u`, and `v` point into one allocation that
/// starts at `y` and is `len` bytes long.
#[repr(C)]
#[derive(Debug)]
pub struct RawYuvData {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Luma plane; also the start of the backing block.
    pub y: *mut u8,
    /// Blue-difference chroma plane.
    pub u: *mut u8,
    /// Red-difference chroma plane.
    pub v: *mut u8,
    /// Luma row stride.
    pub y_stride: u32,
    /// Chroma row stride.
    pub uv_stride: u32,
    /// Length of the backing block in bytes.
    pub len: usize,
}

/// A superpixel label map and its edge map.
#[repr(C)]
#[derive(Debug)]
pub struct RawPixelData {
    /// Region label of every pixel, row-major.
    pub region: *mut i32,
    /// `1` on region boundaries, `0` elsewhere, row-major.
    pub border: *mut i32,
    /// Number of elements in `region` and in `border`.
    pub len: usize,
}

fn into_raw_slice<T>(buffer: Vec<T>) -> (*mut T, usize) {
    let boxed = buffer.into_boxed_slice();
    let len = boxed.len();
    (Box::into_raw(boxed).cast::<T>(), len)
}

/// # Safety
///
/// `data` and `len` must come from [`into_raw_slice`] and not be freed yet.
unsafe fn free_raw_slice<T>(data: *mut T, len: usize) {
    if !data.is_null() {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(data, len)));
    }
}

/// # Safety
///
/// When not null, `data` must be valid for reads of `len` bytes.
unsafe fn input<'a>(data: *const u8, len: Option<usize>) -> Result<&'a [u8], ScError> {
    match len {
        _ if data.is_null() => Err(ScError::General("Null input buffer")),
        Some(len) => Ok(slice::from_raw_parts(data, len)),
        None => Err(ScError::InvalidStride),
    }
}

fn to_usize(value: u32) -> Option<usize> {
    usize::try_from(value).ok()
}

fn packed_len(width: u32, height: u32, channels: usize) -> Option<usize> {
    to_usize(width)?
        .checked_mul(to_usize(height)?)?
        .checked_mul(channels)
}

fn image_record(result: Result<ImageData, ScError>, entry: &str) -> *mut RawImageData {
    match result {
        Ok(image) => {
            let (width, height) = (image.width(), image.height());
            let (data, len) = into_raw_slice(image.into_data());
            Box::into_raw(Box::new(RawImageData {
                width,
                height,
                data,
                len,
            }))
        }
        Err(e) => {
            warn!("{entry}: {e}");
            ptr::null_mut()
        }
    }
}

/// # Safety
///
/// See [`yuv2rgb`].
unsafe fn yuv_planes<'a>(
    width: u32,
    height: u32,
    y: *const u8,
    u: *const u8,
    v: *const u8,
    y_stride: u32,
    uv_stride: u32,
) -> Result<Yuv420<'a>, ScError> {
    let (chroma_w, chroma_h) = chroma_dimensions(width, height);
    let luma_len = to_usize(width).and_then(|w| required_len(y_stride, height, w));
    let chroma_len = to_usize(chroma_w).and_then(|w| required_len(uv_stride, chroma_h, w));
    Ok(Yuv420 {
        y: input(y, luma_len)?,
        u: input(u, chroma_len)?,
        v: input(v, chroma_len)?,
        y_stride,
        uv_stride,
    })
}

/// Convert YUV 4:2:0 planes to RGB24.
///
/// # Safety
///
/// `y` must be readable for `y_stride * (height - 1) + width` bytes, and `u`
/// and `v` for `uv_stride * (ceil(height / 2) - 1) + ceil(width / 2)` bytes.
#[no_mangle]
pub unsafe extern "C" fn yuv2rgb(
    width: u32,
    height: u32,
    y: *const u8,
    u: *const u8,
    v: *const u8,
    y_stride: u32,
    uv_stride: u32,
) -> *mut RawImageData {
    let result = yuv_planes(width, height, y, u, v, y_stride, uv_stride)
        .and_then(|planes| ImageData::yuv420_to_rgb24(width, height, &planes));
    image_record(result, "yuv2rgb")
}

/// Convert YUV 4:2:0 planes to RGBA32 with opaque alpha.
///
/// # Safety
///
/// Same requirements as [`yuv2rgb`].
#[no_mangle]
pub unsafe extern "C" fn yuv2rgba(
    width: u32,
    height: u32,
    y: *const u8,
    u: *const u8,
    v: *const u8,
    y_stride: u32,
    uv_stride: u32,
) -> *mut RawImageData {
    let result = yuv_planes(width, height, y, u, v, y_stride, uv_stride)
        .and_then(|planes| ImageData::yuv420_to_rgba32(width, height, &planes));
    image_record(result, "yuv2rgba")
}

/// Convert YUV 4:2:0 planes to BGR24.
///
/// # Safety
///
/// Same requirements as [`yuv2rgb`].
#[no_mangle]
pub unsafe extern "C" fn yuv2bgr(
    width: u32,
    height: u32,
    y: *const u8,
    u: *const u8,
    v: *const u8,
    y_stride: u32,
    uv_stride: u32,
) -> *mut RawImageData {
    let result = yuv_planes(width, height, y, u, v, y_stride, uv_stride)
        .and_then(|planes| ImageData::yuv420_to_bgr24(width, height, &planes));
    image_record(result, "yuv2bgr")
}

/// Reorder RGBA32 into BGR24.
///
/// # Safety
///
/// `rgba` must be readable for `width * height * 4` bytes.
#[no_mangle]
pub unsafe extern "C" fn rgba2bgr(width: u32, height: u32, rgba: *const u8) -> *mut RawImageData {
    let result = input(rgba, packed_len(width, height, 4))
        .and_then(|rgba| ImageData::rgba32_to_bgr24(width, height, rgba));
    image_record(result, "rgba2bgr")
}

/// Reorder BGR24 into RGBA32 with opaque alpha.
///
/// # Safety
///
/// `bgr` must be readable for `width * height * 3` bytes.
#[no_mangle]
pub unsafe extern "C" fn bgr2rgba(width: u32, height: u32, bgr: *const u8) -> *mut RawImageData {
    let result = input(bgr, packed_len(width, height, 3))
        .and_then(|bgr| ImageData::bgr24_to_rgba32(width, height, bgr));
    image_record(result, "bgr2rgba")
}

/// Convert RGB24 with row stride `rgb_stride` to YUV 4:2:0.
///
/// The planes are packed (`y_stride = width`,
/// `uv_stride = ceil(width / 2)`) into one block starting at `y`.
///
/// # Safety
///
/// `rgb` must be readable for `rgb_stride * (height - 1) + width * 3` bytes.
#[no_mangle]
pub unsafe extern "C" fn rgb2yuv(
    width: u32,
    height: u32,
    rgb: *const u8,
    rgb_stride: u32,
) -> *mut RawYuvData {
    let rgb_len = packed_len(width, 1, 3).and_then(|row| required_len(rgb_stride, height, row));
    let result = input(rgb, rgb_len)
        .and_then(|rgb| YuvData::from_rgb24(width, height, rgb, rgb_stride));

    match result {
        Ok(yuv) => {
            let [y_view, u_view, v_view] = yuv.views();
            let (width, height) = (yuv.width(), yuv.height());
            let (block, len) = into_raw_slice(yuv.into_block());
            Box::into_raw(Box::new(RawYuvData {
                width,
                height,
                y: block.add(y_view.offset),
                u: block.add(u_view.offset),
                v: block.add(v_view.offset),
                y_stride: y_view.stride,
                uv_stride: u_view.stride,
                len,
            }))
        }
        Err(e) => {
            warn!("rgb2yuv: {e}");
            ptr::null_mut()
        }
    }
}

/// Segment an RGBA32 image into superpixels of roughly `size` pixels.
///
/// Uses compactness `10`, `20` iterations and connectivity enforcement.
///
/// # Safety
///
/// `rgba` must be readable for `width * height * 4` bytes.
#[no_mangle]
pub unsafe extern "C" fn superpixel(
    width: u32,
    height: u32,
    size: i32,
    rgba: *const u8,
) -> *mut RawPixelData {
    let result = u32::try_from(size)
        .or(Err(ScError::ZeroRegionSize))
        .and_then(|size| {
            let rgba = input(rgba, packed_len(width, height, 4))?;
            Segmentation::from_rgba(width, height, size, rgba, &SlicConfig::ffi())
        })
        .and_then(|segmentation| {
            let (labels, edges) = segmentation.into_parts();
            let region = labels
                .into_iter()
                .map(i32::try_from)
                .collect::<Result<Vec<i32>, _>>()
                .or(Err(ScError::General("Label exceeds i32")))?;
            let border = edges.into_iter().map(i32::from).collect::<Vec<i32>>();
            Ok((region, border))
        });

    match result {
        Ok((region, border)) => {
            let (region, len) = into_raw_slice(region);
            let (border, _) = into_raw_slice(border);
            Box::into_raw(Box::new(RawPixelData {
                region,
                border,
                len,
            }))
        }
        Err(e) => {
            warn!("superpixel: {e}");
            ptr::null_mut()
        }
    }
}

/// Release a record returned by one of the image conversions.
///
/// # Safety
///
/// `buf` must be null or a pointer returned by [`yuv2rgb`], [`yuv2rgba`],
/// [`yuv2bgr`], [`rgba2bgr`] or [`bgr2rgba`] that has not been released.
#[no_mangle]
pub unsafe extern "C" fn flush_imagedata(buf: *mut RawImageData) {
    if buf.is_null() {
        return;
    }
    let record = Box::from_raw(buf);
    free_raw_slice(record.data, record.len);
}

/// Release a record returned by [`rgb2yuv`], freeing its backing block once.
///
/// # Safety
///
/// `buf` must be null or a pointer returned by [`rgb2yuv`] that has not been
/// released. The plane pointers must not be freed separately.
#[no_mangle]
pub unsafe extern "C" fn flush_yuvdata(buf: *mut RawYuvData) {
    if buf.is_null() {
        return;
    }
    let record = Box::from_raw(buf);
    free_raw_slice(record.y, record.len);
}

/// Release a record returned by [`superpixel`], freeing both maps.
///
/// # Safety
///
/// `buf` must be null or a pointer returned by [`superpixel`] that has not
/// been released.
#[no_mangle]
pub unsafe extern "C" fn flush_pixel(buf: *mut RawPixelData) {
    if buf.is_null() {
        return;
    }
    let record = Box::from_raw(buf);
    free_raw_slice(record.region, record.len);
    free_raw_slice(record.border, record.len);
}
