//! Packing interleaved color buffers into one integer per pixel.
use crate::error::ScError;
use crate::{pixel_count, LabColor};

use palette::{FromColor, Srgb};

/// Pack a 4-channel interleaved buffer into `0x00RRGGBB` integers.
///
/// The first byte of each pixel lands in bits 16..24, the second in 8..16
/// and the third in 0..8. The fourth byte is ignored.
pub fn pack_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u32>, ScError> {
    let count = pixel_count(width, height)?;
    let expected = count.checked_mul(4).ok_or("RGBA buffer length overflows")?;
    if rgba.len() != expected {
        return Err(ScError::MismatchedPixelBuffer {
            expected,
            actual: rgba.len(),
        });
    }

    let mut packed = Vec::new();
    packed.try_reserve_exact(count)?;
    for px in rgba.chunks_exact(4) {
        packed.push(pack_pixel(px[0], px[1], px[2]));
    }

    Ok(packed)
}

/// Combine three channels into a single 24-bit value.
#[inline]
pub fn pack_pixel(first: u8, second: u8, third: u8) -> u32 {
    (u32::from(first) << 16) | (u32::from(second) << 8) | u32::from(third)
}

/// Split a packed value back into its three channels.
#[inline]
pub fn unpack(packed: u32) -> [u8; 3] {
    let [_, first, second, third] = packed.to_be_bytes();
    [first, second, third]
}

/// Convert packed sRGB pixels to `Lab` for distance computation.
pub fn packed_to_lab(packed: &[u32]) -> Result<Vec<LabColor>, ScError> {
    let mut lab = Vec::new();
    lab.try_reserve_exact(packed.len())?;
    lab.extend(packed.iter().map(|&p| {
        let [r, g, b] = unpack(p);
        LabColor::from_color(Srgb::new(r, g, b).into_format::<f64>())
    }));

    Ok(lab)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_channel_is_most_significant() {
        let packed = pack_rgba(2, 1, &[0x12, 0x34, 0x56, 0xff, 1, 2, 3, 0]).unwrap();
        assert_eq!(packed, vec![0x0012_3456, 0x0001_0203]);
        assert_eq!(unpack(packed[0]), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn alpha_is_ignored() {
        let a = pack_rgba(1, 1, &[9, 8, 7, 0]).unwrap();
        let b = pack_rgba(1, 1, &[9, 8, 7, 255]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn length_must_match_dimensions() {
        assert!(matches!(
            pack_rgba(2, 2, &[0; 15]),
            Err(ScError::MismatchedPixelBuffer {
                expected: 16,
                actual: 15
            })
        ));
        assert!(matches!(
            pack_rgba(0, 2, &[]),
            Err(ScError::InvalidImageDimension)
        ));
    }

    #[test]
    fn lab_lightness_spans_black_to_white() {
        let lab = packed_to_lab(&[0x0000_0000, 0x00ff_ffff]).unwrap();
        assert!(lab[0].l.abs() < 1e-6);
        assert!((lab[1].l - 100.0).abs() < 1e-3);
        assert!(lab[1].a.abs() < 1e-2 && lab[1].b.abs() < 1e-2);
    }
}
