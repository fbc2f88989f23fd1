use crate::connectivity::{compact_labels, enforce_connectivity};
use crate::error::ScError;
use crate::pack::{pack_rgba, packed_to_lab};
use crate::seed::{init_seeds, perturb};
use crate::{
    calculate_grid_step, distance_lab, distance_s, distance_xy, m_div_s, pixel_count, LabColor,
    Superpixel,
};

use log::{debug, trace};
use num_traits::ToPrimitive;

/// Parameters for SLIC segmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicConfig {
    /// Compactness weight, `m`. Higher values give more regular, square
    /// regions at the expense of color fidelity. Defaults to `10`.
    pub compactness: f64,
    /// Upper bound on assignment/update iterations. Iteration stops earlier
    /// when an assignment pass changes no label. Defaults to `10`.
    pub max_iterations: u32,
    /// Repair the label map so that every region is 4-connected and no
    /// region is smaller than the minimum region size. Defaults to `true`.
    pub enforce_connectivity: bool,
    /// Move each seed to the lowest-gradient pixel of its 3x3 neighborhood
    /// before iterating. Defaults to `false`.
    pub perturb_seeds: bool,
    /// Fragments with fewer pixels than this are merged into a neighbor.
    /// `None` uses a quarter of the region size.
    pub min_region_size: Option<usize>,
}

impl SlicConfig {
    /// Iteration budget used by the exported C entry point.
    pub const FFI_ITERATIONS: u32 = 20;

    /// The configuration the exported C entry point segments with.
    #[must_use]
    pub fn ffi() -> Self {
        Self {
            max_iterations: Self::FFI_ITERATIONS,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), ScError> {
        if !self.compactness.is_finite() || self.compactness <= 0.0 {
            return Err(ScError::InvalidCompactness);
        }
        Ok(())
    }
}

impl Default for SlicConfig {
    #[inline]
    fn default() -> Self {
        Self {
            compactness: 10.0,
            max_iterations: 10,
            enforce_connectivity: true,
            perturb_seeds: false,
            min_region_size: None,
        }
    }
}

/// Information for tracking image pixels' nearest superpixel cluster and
/// distance to that cluster during SLIC.
#[derive(Debug, Clone, Default)]
struct SlicInfo {
    /// Best squared joint distance found in the current pass.
    pub distances: Vec<f64>,
    /// Nearest superpixel labels.
    pub labels: Vec<usize>,
}

impl SlicInfo {
    fn with_len(len: usize) -> Result<Self, ScError> {
        let mut info = Self::default();
        info.distances.try_reserve_exact(len)?;
        info.labels.try_reserve_exact(len)?;
        info.distances.resize(len, f64::INFINITY);
        info.labels.resize(len, usize::MAX);
        Ok(info)
    }
}

/// Struct used for accumulating and calculating superpixel clusters in SLIC.
#[derive(Debug, Clone, Copy, Default)]
struct SlicUpdate {
    l: f64,
    a: f64,
    b: f64,
    x: f64,
    y: f64,
    count: usize,
}

/// Calculate SLIC labels from a buffer of 4-channel interleaved bytes.
///
/// The first three channels of each pixel are read as sRGB; the fourth is
/// ignored. Returns the label map and the number of labels.
pub fn slic_from_rgba(
    width: u32,
    height: u32,
    region_size: u32,
    rgba: &[u8],
    config: &SlicConfig,
) -> Result<(Vec<usize>, usize), ScError> {
    let packed = pack_rgba(width, height, rgba)?;
    let lab = packed_to_lab(&packed)?;
    slic(width, height, region_size, &lab, config)
}

/// Calculate SLIC.
///
/// `region_size` is the desired superpixel area in pixels; the seed grid
/// step is its rounded square root. Returns the label map and the number
/// of labels. With connectivity enforcement the labels are dense,
/// `0..num_labels`, and every region is 4-connected.
///
/// Centers are evaluated in a fixed order and a pixel only moves to a
/// center whose distance is strictly smaller than the best found so far, so
/// equal inputs always give equal outputs.
///
/// ## Reference
///
/// *Achanta, R., Shaji, A., Smith, K., Lucchi, A., Fua, P., & Süsstrunk, S. SLIC
/// Superpixels Compared to State-of-the-art Superpixel Methods. IEEE Transactions
/// on Pattern Analysis and Machine Intelligence, vol. 34, num. 11, p. 2274 – 2282,
/// May 2012.*
pub fn slic(
    width: u32,
    height: u32,
    region_size: u32,
    image: &[LabColor],
    config: &SlicConfig,
) -> Result<(Vec<usize>, usize), ScError> {
    config.validate()?;
    if region_size == 0 {
        return Err(ScError::ZeroRegionSize);
    }
    let expected = pixel_count(width, height)?;
    if image.len() != expected {
        return Err(ScError::MismatchedPixelBuffer {
            expected,
            actual: image.len(),
        });
    }

    let step_f = calculate_grid_step(region_size);
    let step = step_f.to_u32().ok_or(ScError::InvalidGridInterval)?;
    let m_s_term = m_div_s(config.compactness, step_f);

    let mut clusters = Vec::new();
    init_seeds(width, height, step, image, &mut clusters)?;
    if config.perturb_seeds {
        for seed in &mut clusters {
            perturb(seed, i64::from(width), i64::from(height), image)?;
        }
    }
    debug!(
        "slic: {}x{} image, step {}, {} seeds",
        width,
        height,
        step,
        clusters.len()
    );

    let mut info = SlicInfo::with_len(image.len())?;
    let mut previous = Vec::new();
    previous.try_reserve_exact(image.len())?;
    previous.extend_from_slice(&info.labels);
    let mut updates = Vec::new();

    for iteration in 0..config.max_iterations.max(1) {
        info.distances.fill(f64::INFINITY);
        assign_labels(&clusters, width, height, step_f, m_s_term, image, &mut info)?;

        let changed = info
            .labels
            .iter()
            .zip(&previous)
            .filter(|(now, before)| now != before)
            .count();

        update_centers(&mut clusters, &mut updates, width, image, &mut info.labels)?;
        previous.copy_from_slice(&info.labels);
        trace!(
            "slic: iteration {}, {} labels changed, {} centers",
            iteration,
            changed,
            clusters.len()
        );

        if changed == 0 {
            debug!("slic: converged after {} iterations", iteration + 1);
            break;
        }
    }

    let num_labels = if config.enforce_connectivity {
        let min_region_size = match config.min_region_size {
            Some(size) => size,
            None => usize::try_from(region_size / 4).or(Err("Invalid minimum region size"))?,
        };
        enforce_connectivity(width, height, min_region_size, &mut info.labels)?
    } else {
        compact_labels(&mut info.labels)?
    };
    debug!("slic: {} labels", num_labels);

    Ok((info.labels, num_labels))
}

/// Pixel range `[center - step, center + step)` along one axis, clamped to
/// `0..limit`.
fn search_range(center: f64, step: f64, limit: f64) -> Result<(u32, u32), ScError> {
    let lo = (center - step).max(0.0).to_u32();
    let hi = (center + step).min(limit).to_u32();
    match (lo, hi) {
        (Some(lo), Some(hi)) => Ok((lo, hi)),
        _ => Err(ScError::General("Search window out of range")),
    }
}

/// Search a `2S x 2S` window around every center and claim the pixels it is
/// strictly closer to than any center evaluated before it.
fn assign_labels(
    clusters: &[Superpixel<LabColor>],
    width: u32,
    height: u32,
    step: f64,
    m_s_term: f64,
    image: &[LabColor],
    info: &mut SlicInfo,
) -> Result<(), ScError> {
    let width_f = f64::from(width);
    let height_f = f64::from(height);

    for (center_index, center) in clusters.iter().enumerate() {
        let (x_lo, x_hi) = search_range(center.x, step, width_f)?;
        let (y_lo, y_hi) = search_range(center.y, step, height_f)?;

        for y in y_lo..y_hi {
            let row = usize::try_from(u64::from(y) * u64::from(width))
                .or(Err("Index out of bounds for finding new neighbors"))?;
            for x in x_lo..x_hi {
                let idx = row + usize::try_from(x).or(Err("Invalid column index"))?;
                let color = *image.get(idx).ok_or("Image index out of bounds")?;

                let distance = distance_s(
                    m_s_term,
                    distance_lab(color, center.data),
                    distance_xy((f64::from(x), f64::from(y)), (center.x, center.y)),
                );

                let best = info
                    .distances
                    .get_mut(idx)
                    .ok_or("Distance index out of bounds")?;
                if distance < *best {
                    *best = distance;
                    *info.labels.get_mut(idx).ok_or("Label out of bounds")? = center_index;
                }
            }
        }
    }

    Ok(())
}

/// Move every center to the mean color and position of its members.
///
/// Centers left without members are removed and the label map is renumbered
/// so the remaining centers keep their relative order.
fn update_centers(
    clusters: &mut Vec<Superpixel<LabColor>>,
    updates: &mut Vec<SlicUpdate>,
    width: u32,
    image: &[LabColor],
    labels: &mut [usize],
) -> Result<(), ScError> {
    updates.clear();
    updates.try_reserve_exact(clusters.len())?;
    updates.resize(clusters.len(), SlicUpdate::default());

    let width = usize::try_from(width).or(Err("Invalid image width"))?;
    for (idx, (&label, color)) in labels.iter().zip(image).enumerate() {
        if let Some(update) = updates.get_mut(label) {
            let (x, y) = (idx % width, idx / width);
            update.l += color.l;
            update.a += color.a;
            update.b += color.b;
            update.x += x.to_f64().ok_or("Update X out of bounds")?;
            update.y += y.to_f64().ok_or("Update Y out of bounds")?;
            update.count += 1;
        }
    }

    for (update, center) in updates.iter().zip(clusters.iter_mut()) {
        center.members = update.count;
        if update.count == 0 {
            continue;
        }
        let count = update.count.to_f64().ok_or("Member count out of bounds")?;
        center.data = LabColor::new(update.l / count, update.a / count, update.b / count);
        center.x = update.x / count;
        center.y = update.y / count;
    }

    if clusters.iter().any(|center| center.members == 0) {
        let mut remap = Vec::new();
        remap.try_reserve_exact(clusters.len())?;
        let mut next = 0_usize;
        for center in clusters.iter() {
            if center.members == 0 {
                remap.push(usize::MAX);
            } else {
                remap.push(next);
                next += 1;
            }
        }
        clusters.retain(|center| center.members > 0);
        for label in labels.iter_mut() {
            if let Some(&new_label) = remap.get(*label) {
                *label = new_label;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(x: f64, y: f64, data: LabColor) -> Superpixel<LabColor> {
        Superpixel {
            data,
            x,
            y,
            members: 0,
        }
    }

    #[test]
    fn equal_distance_goes_to_earlier_center() {
        let gray = LabColor::new(50.0, 0.0, 0.0);
        let image = vec![gray; 3];
        let clusters = [center(0.0, 0.0, gray), center(2.0, 0.0, gray)];
        let mut info = SlicInfo::with_len(3).unwrap();
        assign_labels(&clusters, 3, 1, 2.0, 25.0, &image, &mut info).unwrap();
        assert_eq!(info.labels, vec![0, 0, 1]);

        let reversed = [clusters[1], clusters[0]];
        let mut info = SlicInfo::with_len(3).unwrap();
        assign_labels(&reversed, 3, 1, 2.0, 25.0, &image, &mut info).unwrap();
        assert_eq!(info.labels, vec![1, 0, 0]);
    }

    #[test]
    fn color_outweighs_position_at_low_compactness() {
        let dark = LabColor::new(10.0, 0.0, 0.0);
        let light = LabColor::new(90.0, 0.0, 0.0);
        let image = vec![dark, light, light, light];
        let clusters = [center(0.0, 0.0, dark), center(3.0, 0.0, light)];
        let mut info = SlicInfo::with_len(4).unwrap();
        assign_labels(&clusters, 4, 1, 4.0, m_div_s(1.0, 4.0), &image, &mut info).unwrap();
        assert_eq!(info.labels, vec![0, 1, 1, 1]);
    }

    #[test]
    fn window_limits_search() {
        let gray = LabColor::new(50.0, 0.0, 0.0);
        let image = vec![gray; 8];
        let clusters = [center(0.0, 0.0, gray)];
        let mut info = SlicInfo::with_len(8).unwrap();
        assign_labels(&clusters, 8, 1, 2.0, 25.0, &image, &mut info).unwrap();
        assert_eq!(&info.labels[..2], &[0, 0]);
        assert!(info.labels[2..].iter().all(|&l| l == usize::MAX));
    }

    #[test]
    fn search_range_is_clamped_to_image() {
        assert_eq!(search_range(99.0, 99.0, 100.0).unwrap(), (0, 100));
        assert_eq!(search_range(49.0, 99.0, 100.0).unwrap(), (0, 100));
        assert_eq!(search_range(10.5, 4.0, 100.0).unwrap(), (6, 14));
    }

    #[test]
    fn centers_move_to_member_mean() {
        let image = vec![
            LabColor::new(10.0, 2.0, -2.0),
            LabColor::new(30.0, 4.0, -4.0),
            LabColor::new(80.0, 0.0, 0.0),
        ];
        let mut clusters = vec![center(0.0, 0.0, image[0]), center(2.0, 0.0, image[2])];
        let mut labels = vec![0, 0, 1];
        let mut updates = Vec::new();
        update_centers(&mut clusters, &mut updates, 3, &image, &mut labels).unwrap();
        assert_eq!(clusters[0].members, 2);
        assert_eq!(clusters[0].x, 0.5);
        assert_eq!(clusters[0].data.l, 20.0);
        assert_eq!(clusters[0].data.a, 3.0);
        assert_eq!(clusters[1].x, 2.0);
    }

    #[test]
    fn empty_centers_are_removed() {
        let gray = LabColor::new(50.0, 0.0, 0.0);
        let image = vec![gray; 4];
        let mut clusters = vec![
            center(0.0, 0.0, gray),
            center(1.0, 0.0, gray),
            center(3.0, 0.0, gray),
        ];
        let mut labels = vec![2, 0, 2, 2];
        let mut updates = Vec::new();
        update_centers(&mut clusters, &mut updates, 4, &image, &mut labels).unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(labels, vec![1, 0, 1, 1]);
        assert_eq!(clusters[1].members, 3);
    }

    #[test]
    fn rejects_bad_parameters() {
        let image = vec![LabColor::new(0.0, 0.0, 0.0); 4];
        let config = SlicConfig::default();
        assert!(matches!(
            slic(2, 2, 0, &image, &config),
            Err(ScError::ZeroRegionSize)
        ));
        assert!(matches!(
            slic(0, 2, 4, &image, &config),
            Err(ScError::InvalidImageDimension)
        ));
        assert!(matches!(
            slic(3, 2, 4, &image, &config),
            Err(ScError::MismatchedPixelBuffer { .. })
        ));
        let config = SlicConfig {
            compactness: f64::NAN,
            ..SlicConfig::default()
        };
        assert!(matches!(
            slic(2, 2, 4, &image, &config),
            Err(ScError::InvalidCompactness)
        ));
    }

    #[test]
    fn region_larger_than_image_gives_one_label() {
        let image = vec![LabColor::new(40.0, 10.0, 10.0); 9];
        let (labels, n) = slic(3, 3, 100, &image, &SlicConfig::default()).unwrap();
        assert_eq!(n, 1);
        assert!(labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn ffi_config_runs_twenty_iterations() {
        let config = SlicConfig::ffi();
        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.compactness, 10.0);
        assert!(config.enforce_connectivity);
    }
}
