//! Interleaved pixel layouts and channel reordering.
use crate::error::ScError;

/// Byte layout of an interleaved 8-bit color buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Red, green, blue.
    Rgb24,
    /// Red, green, blue, alpha.
    Rgba32,
    /// Blue, green, red.
    Bgr24,
}

impl PixelFormat {
    /// Bytes per pixel.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb24 | Self::Bgr24 => 3,
            Self::Rgba32 => 4,
        }
    }

    /// Write one pixel into `out`, which holds exactly [`channels`] bytes.
    ///
    /// Alpha, when present, is fully opaque.
    ///
    /// [`channels`]: PixelFormat::channels
    #[inline]
    pub(crate) fn write(self, out: &mut [u8], [r, g, b]: [u8; 3]) {
        match self {
            Self::Rgb24 => out.copy_from_slice(&[r, g, b]),
            Self::Rgba32 => out.copy_from_slice(&[r, g, b, u8::MAX]),
            Self::Bgr24 => out.copy_from_slice(&[b, g, r]),
        }
    }
}

fn check_lengths(
    output: &[u8],
    out_channels: usize,
    input: &[u8],
    in_channels: usize,
) -> Result<(), ScError> {
    if input.len() % in_channels != 0 {
        return Err(ScError::General("Input is not a whole number of pixels"));
    }
    let expected = input.len() / in_channels * out_channels;
    if output.len() != expected {
        return Err(ScError::MismatchedPixelBuffer {
            expected,
            actual: output.len(),
        });
    }
    Ok(())
}

/// Modify `output` to contain the BGR24 reordering of an RGBA32 buffer.
/// Alpha is dropped.
pub fn rgba32_to_bgr24(output: &mut [u8], rgba: &[u8]) -> Result<(), ScError> {
    check_lengths(output, 3, rgba, 4)?;
    for (out, px) in output.chunks_exact_mut(3).zip(rgba.chunks_exact(4)) {
        PixelFormat::Bgr24.write(out, [px[0], px[1], px[2]]);
    }
    Ok(())
}

/// Modify `output` to contain the RGBA32 reordering of a BGR24 buffer.
/// Alpha is set to `255`.
pub fn bgr24_to_rgba32(output: &mut [u8], bgr: &[u8]) -> Result<(), ScError> {
    check_lengths(output, 4, bgr, 3)?;
    for (out, px) in output.chunks_exact_mut(4).zip(bgr.chunks_exact(3)) {
        PixelFormat::Rgba32.write(out, [px[2], px[1], px[0]]);
    }
    Ok(())
}
