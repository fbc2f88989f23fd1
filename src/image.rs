//! Functions for interacting with image labels.
use crate::error::ScError;
use crate::{get_in_bounds, pixel_count};
use fxhash::FxHashSet;

/// Edge map value of a boundary pixel.
pub const EDGE_ON: u8 = 1;
/// Edge map value of an interior pixel.
pub const EDGE_OFF: u8 = 0;

/// Count the number of unique labels in a slice of superpixel labels.
pub fn count_labels(labels: &[usize]) -> usize {
    labels.iter().copied().collect::<FxHashSet<usize>>().len()
}

/// Modify `output` to contain the edge map of a label map.
///
/// A pixel is [`EDGE_ON`] when any of its 4-connected neighbors carries a
/// different label, [`EDGE_OFF`] otherwise. Neighbors outside the image are
/// skipped, so the image border is not an edge by itself.
pub fn edge_map(
    output: &mut [u8],
    width: u32,
    height: u32,
    labels: &[usize],
) -> Result<(), ScError> {
    let expected = pixel_count(width, height)?;
    if labels.len() != expected || output.len() != expected {
        return Err(ScError::MismatchedPixelBuffer {
            expected,
            actual: if labels.len() != expected {
                labels.len()
            } else {
                output.len()
            },
        });
    }

    let width_i = i64::from(width);
    let height_i = i64::from(height);

    let mut cells = output.iter_mut();
    let mut label_iter = labels.iter();
    for y in 0..height_i {
        for x in 0..width_i {
            let label = label_iter.next().ok_or("Labels exhausted")?;
            let cell = cells.next().ok_or("Edge map exhausted")?;
            let neighbors = [
                get_in_bounds(width_i, height_i, x - 1, y, labels),
                get_in_bounds(width_i, height_i, x, y - 1, labels),
                get_in_bounds(width_i, height_i, x + 1, y, labels),
                get_in_bounds(width_i, height_i, x, y + 1, labels),
            ];

            *cell = if neighbors.iter().flatten().any(|&n| n != label) {
                EDGE_ON
            } else {
                EDGE_OFF
            };
        }
    }

    Ok(())
}
