//! Owning result handles.
//!
//! Every conversion and segmentation entry point allocates its output and
//! hands it back as one of the handles below. A handle owns all of its
//! buffers: dropping it, or calling `release`, frees them exactly once.
use crate::channels::{bgr24_to_rgba32, rgba32_to_bgr24};
use crate::error::ScError;
use crate::image::edge_map;
use crate::slic::{slic, SlicConfig};
use crate::yuv::{chroma_dimensions, rgb24_to_yuv420, yuv420_to_packed, Yuv420, Yuv420Mut};
use crate::{pixel_count, LabColor};

pub use crate::channels::PixelFormat;

fn zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, ScError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len)?;
    buffer.resize(len, T::default());
    Ok(buffer)
}

/// An interleaved 8-bit color image with no row padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl ImageData {
    fn alloc(width: u32, height: u32, format: PixelFormat) -> Result<Self, ScError> {
        let len = pixel_count(width, height)?
            .checked_mul(format.channels())
            .ok_or("Image length overflows")?;
        Ok(Self {
            width,
            height,
            format,
            data: zeroed(len)?,
        })
    }

    fn from_yuv420(
        width: u32,
        height: u32,
        src: &Yuv420<'_>,
        format: PixelFormat,
    ) -> Result<Self, ScError> {
        let mut image = Self::alloc(width, height, format)?;
        yuv420_to_packed(&mut image.data, width, height, src, format)?;
        Ok(image)
    }

    /// Convert YUV 4:2:0 planes to RGB24.
    pub fn yuv420_to_rgb24(width: u32, height: u32, src: &Yuv420<'_>) -> Result<Self, ScError> {
        Self::from_yuv420(width, height, src, PixelFormat::Rgb24)
    }

    /// Convert YUV 4:2:0 planes to RGBA32 with opaque alpha.
    pub fn yuv420_to_rgba32(width: u32, height: u32, src: &Yuv420<'_>) -> Result<Self, ScError> {
        Self::from_yuv420(width, height, src, PixelFormat::Rgba32)
    }

    /// Convert YUV 4:2:0 planes to BGR24.
    pub fn yuv420_to_bgr24(width: u32, height: u32, src: &Yuv420<'_>) -> Result<Self, ScError> {
        Self::from_yuv420(width, height, src, PixelFormat::Bgr24)
    }

    /// Reorder an RGBA32 buffer into BGR24, dropping alpha.
    pub fn rgba32_to_bgr24(width: u32, height: u32, rgba: &[u8]) -> Result<Self, ScError> {
        let mut image = Self::alloc(width, height, PixelFormat::Bgr24)?;
        let expected = image.data.len() / 3 * 4;
        if rgba.len() != expected {
            return Err(ScError::MismatchedPixelBuffer {
                expected,
                actual: rgba.len(),
            });
        }
        rgba32_to_bgr24(&mut image.data, rgba)?;
        Ok(image)
    }

    /// Reorder a BGR24 buffer into RGBA32 with opaque alpha.
    pub fn bgr24_to_rgba32(width: u32, height: u32, bgr: &[u8]) -> Result<Self, ScError> {
        let mut image = Self::alloc(width, height, PixelFormat::Rgba32)?;
        let expected = image.data.len() / 4 * 3;
        if bgr.len() != expected {
            return Err(ScError::MismatchedPixelBuffer {
                expected,
                actual: bgr.len(),
            });
        }
        bgr24_to_rgba32(&mut image.data, bgr)?;
        Ok(image)
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte layout of [`data`](Self::data).
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Pixel bytes, `width * height * format.channels()` long.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take ownership of the pixel bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Free the image.
    pub fn release(self) {}
}

/// A non-owning view into the backing block of a [`YuvData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneView {
    /// Byte offset of the plane in the block.
    pub offset: usize,
    /// Length of the plane in bytes.
    pub len: usize,
    /// Row stride of the plane.
    pub stride: u32,
}

impl PlaneView {
    fn slice<'a>(&self, block: &'a [u8]) -> &'a [u8] {
        &block[self.offset..self.offset + self.len]
    }
}

/// A YUV 4:2:0 image whose three planes share one allocation.
///
/// The block holds the Y plane followed by the U and V planes, each packed
/// without row padding. The plane views only describe ranges of the block;
/// releasing the image frees the block once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YuvData {
    width: u32,
    height: u32,
    block: Vec<u8>,
    y: PlaneView,
    u: PlaneView,
    v: PlaneView,
}

impl YuvData {
    /// Convert an RGB24 image with row stride `rgb_stride` to YUV 4:2:0.
    pub fn from_rgb24(
        width: u32,
        height: u32,
        rgb: &[u8],
        rgb_stride: u32,
    ) -> Result<Self, ScError> {
        let luma_len = pixel_count(width, height)?;
        let (chroma_w, chroma_h) = chroma_dimensions(width, height);
        let chroma_len = pixel_count(chroma_w, chroma_h)?;
        let total = chroma_len
            .checked_mul(2)
            .and_then(|c| c.checked_add(luma_len))
            .ok_or("YUV block length overflows")?;

        let mut block = zeroed(total)?;
        let y = PlaneView {
            offset: 0,
            len: luma_len,
            stride: width,
        };
        let u = PlaneView {
            offset: luma_len,
            len: chroma_len,
            stride: chroma_w,
        };
        let v = PlaneView {
            offset: luma_len + chroma_len,
            len: chroma_len,
            stride: chroma_w,
        };

        {
            let (y_plane, chroma) = block.split_at_mut(luma_len);
            let (u_plane, v_plane) = chroma.split_at_mut(chroma_len);
            let mut dst = Yuv420Mut {
                y: y_plane,
                u: u_plane,
                v: v_plane,
                y_stride: y.stride,
                uv_stride: u.stride,
            };
            rgb24_to_yuv420(width, height, rgb, rgb_stride, &mut dst)?;
        }

        Ok(Self {
            width,
            height,
            block,
            y,
            u,
            v,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Luma plane.
    pub fn y(&self) -> &[u8] {
        self.y.slice(&self.block)
    }

    /// Blue-difference chroma plane.
    pub fn u(&self) -> &[u8] {
        self.u.slice(&self.block)
    }

    /// Red-difference chroma plane.
    pub fn v(&self) -> &[u8] {
        self.v.slice(&self.block)
    }

    /// Luma row stride.
    pub fn y_stride(&self) -> u32 {
        self.y.stride
    }

    /// Chroma row stride.
    pub fn uv_stride(&self) -> u32 {
        self.u.stride
    }

    /// Plane views into [`block`](Self::block), in Y, U, V order.
    pub fn views(&self) -> [PlaneView; 3] {
        [self.y, self.u, self.v]
    }

    /// The backing allocation of all three planes.
    pub fn block(&self) -> &[u8] {
        &self.block
    }

    /// Borrow the planes for conversion back to RGB.
    pub fn planes(&self) -> Yuv420<'_> {
        Yuv420 {
            y: self.y(),
            u: self.u(),
            v: self.v(),
            y_stride: self.y_stride(),
            uv_stride: self.uv_stride(),
        }
    }

    /// Take ownership of the backing block.
    pub fn into_block(self) -> Vec<u8> {
        self.block
    }

    /// Free the block and all three planes.
    pub fn release(self) {}
}

/// The result of superpixel segmentation: a label map and its edge map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    width: u32,
    height: u32,
    labels: Vec<usize>,
    edges: Vec<u8>,
    num_labels: usize,
}

impl Segmentation {
    /// Segment a 4-channel interleaved buffer (first three channels read as
    /// sRGB) into superpixels of roughly `region_size` pixels.
    pub fn from_rgba(
        width: u32,
        height: u32,
        region_size: u32,
        rgba: &[u8],
        config: &SlicConfig,
    ) -> Result<Self, ScError> {
        let packed = crate::pack::pack_rgba(width, height, rgba)?;
        Self::from_packed(width, height, region_size, &packed, config)
    }

    /// Segment a buffer of packed `0x00RRGGBB` pixels.
    pub fn from_packed(
        width: u32,
        height: u32,
        region_size: u32,
        packed: &[u32],
        config: &SlicConfig,
    ) -> Result<Self, ScError> {
        let lab = crate::pack::packed_to_lab(packed)?;
        Self::from_lab(width, height, region_size, &lab, config)
    }

    /// Segment a buffer that is already in `Lab`.
    pub fn from_lab(
        width: u32,
        height: u32,
        region_size: u32,
        image: &[LabColor],
        config: &SlicConfig,
    ) -> Result<Self, ScError> {
        let (labels, num_labels) = slic(width, height, region_size, image, config)?;
        let mut edges = zeroed(labels.len())?;
        edge_map(&mut edges, width, height, &labels)?;
        Ok(Self {
            width,
            height,
            labels,
            edges,
            num_labels,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Region label of every pixel, row-major.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Edge map of every pixel, row-major; see [`crate::image::edge_map`].
    pub fn edges(&self) -> &[u8] {
        &self.edges
    }

    /// Number of distinct labels.
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Take ownership of the label map and edge map.
    pub fn into_parts(self) -> (Vec<usize>, Vec<u8>) {
        (self.labels, self.edges)
    }

    /// Free the label map and edge map together.
    pub fn release(self) {}
}
