//! Functions for initializing superpixel seeds.
use crate::error::{ScError, SeedErrorKind};
use crate::{distance_lab, div_ceil, get_in_bounds, LabColor, Superpixel};

use num_traits::ToPrimitive;

/// Initialize the superpixel seed centers on a regular grid.
///
/// Seeds are placed every `step` pixels, offset by half a step, and clamped
/// to the last row and column. There are `ceil(width / step)` seeds per row
/// and `ceil(height / step)` rows of seeds, pushed in row-major order.
///
/// `width`, `height`, and `step` must not be `0`.
pub fn init_seeds<T: Copy>(
    width: u32,
    height: u32,
    step: u32,
    image: &[T],
    seeds: &mut Vec<Superpixel<T>>,
) -> Result<(), ScError> {
    seeds.clear();
    if width == 0 || height == 0 {
        return Err(ScError::InvalidImageDimension);
    }
    if step == 0 {
        return Err(ScError::General("Seed step cannot be 0"));
    }

    let half_step = step / 2;
    let x_seeds = div_ceil(width, step);
    let y_seeds = div_ceil(height, step);

    let total_seeds = usize::try_from(u64::from(x_seeds) * u64::from(y_seeds))
        .or(Err(ScError::SeedError(SeedErrorKind::InvalidTotalSeeds)))?;
    seeds.try_reserve_exact(total_seeds)?;

    for ydx in 0..y_seeds {
        let y = ydx
            .saturating_mul(step)
            .saturating_add(half_step)
            .min(height - 1);
        for xdx in 0..x_seeds {
            let x = xdx
                .saturating_mul(step)
                .saturating_add(half_step)
                .min(width - 1);
            let i = usize::try_from(u64::from(y) * u64::from(width) + u64::from(x))
                .or(Err(ScError::SeedError(SeedErrorKind::InvalidImageIndex)))?;
            seeds.push(Superpixel {
                data: *image
                    .get(i)
                    .ok_or(ScError::SeedError(SeedErrorKind::InvalidImageIndex))?,
                x: f64::from(x),
                y: f64::from(y),
                members: 0,
            });
        }
    }

    Ok(())
}

/// Find the lowest gradient in a 3x3 neighborhood for a seed.
///
/// This step minimizes the chance that a noisy pixel is chosen as a seed.
pub fn perturb(
    seed: &mut Superpixel<LabColor>,
    width: i64,
    height: i64,
    image: &[LabColor],
) -> Result<(), ScError> {
    let mut min = f64::INFINITY;
    let default = LabColor::new(0.0, 0.0, 0.0);
    // Seed positions are integral until the first center update.
    let sp_x = seed
        .x
        .to_i64()
        .ok_or(ScError::SeedError(SeedErrorKind::PerturbConversion))?;
    let sp_y = seed
        .y
        .to_i64()
        .ok_or(ScError::SeedError(SeedErrorKind::PerturbConversion))?;

    // Gradient equation is
    // fn gradient() -> f64 {
    //     (I[x + 1, y] - I[x - 1, y]).powi(2) +
    //     (I[x, y + 1] - I[x, y - 1]).powi(2)
    // }
    for ydx in -1..=1 {
        for xdx in -1..=1 {
            let (cx, cy) = (sp_x + xdx, sp_y + ydx);
            let color = if let Some(color) = get_in_bounds(width, height, cx, cy, image) {
                *color
            } else {
                continue;
            };

            let a = *get_in_bounds(width, height, cx + 1, cy, image).unwrap_or(&default);
            let b = *get_in_bounds(width, height, cx - 1, cy, image).unwrap_or(&default);
            let c = *get_in_bounds(width, height, cx, cy + 1, image).unwrap_or(&default);
            let d = *get_in_bounds(width, height, cx, cy - 1, image).unwrap_or(&default);

            let gradient = distance_lab(a, b) + distance_lab(c, d);
            if gradient < min {
                min = gradient;
                seed.data = color;
                seed.x = f64::from(
                    u32::try_from(cx)
                        .or(Err(ScError::SeedError(SeedErrorKind::PerturbConversion)))?,
                );
                seed.y = f64::from(
                    u32::try_from(cy)
                        .or(Err(ScError::SeedError(SeedErrorKind::PerturbConversion)))?,
                );
            }
        }
    }

    Ok(())
}
