//! Label map repair: 4-connected regions and dense label numbering.
use crate::error::ScError;
use crate::pixel_count;

use fxhash::FxHashMap;

/// Adjacent pixels, clockwise order West-North-East-South.
const NEIGHBORS: [(i64, i64); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

/// Index of the neighbor of `idx` at offset `(dx, dy)`, if it is in bounds.
#[inline]
fn neighbor_index(width: usize, height: usize, idx: usize, dx: i64, dy: i64) -> Option<usize> {
    let x = i64::try_from(idx % width).ok()? + dx;
    let y = i64::try_from(idx / width).ok()? + dy;
    let x = usize::try_from(x).ok().filter(|&x| x < width)?;
    let y = usize::try_from(y).ok().filter(|&y| y < height)?;
    y.checked_mul(width)?.checked_add(x)
}

/// Find the root of a component, compressing the path on the way.
fn find(parents: &mut [usize], component: usize) -> usize {
    let mut root = component;
    while parents[root] != root {
        root = parents[root];
    }
    let mut node = component;
    while parents[node] != root {
        let next = parents[node];
        parents[node] = root;
        node = next;
    }
    root
}

/// 4-connected components of a label map, numbered in raster order of their
/// first pixel.
struct Components {
    /// Component id of every pixel.
    ids: Vec<usize>,
    /// Pixel indices grouped by component.
    pixels: Vec<usize>,
    /// Offsets of each component in `pixels`, plus a trailing end offset.
    starts: Vec<usize>,
}

impl Components {
    fn find(width: usize, height: usize, labels: &[usize]) -> Result<Self, ScError> {
        let mut ids = Vec::new();
        ids.try_reserve_exact(labels.len())?;
        ids.resize(labels.len(), usize::MAX);
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(labels.len())?;
        let mut starts = Vec::new();

        for start in 0..labels.len() {
            if ids[start] != usize::MAX {
                continue;
            }
            let id = starts.len();
            let label = labels[start];
            starts.push(pixels.len());
            ids[start] = id;
            pixels.push(start);

            // The pixel list doubles as the flood fill queue.
            let mut head = pixels.len() - 1;
            while head < pixels.len() {
                let idx = pixels[head];
                head += 1;
                for &(dx, dy) in &NEIGHBORS {
                    if let Some(n) = neighbor_index(width, height, idx, dx, dy) {
                        if ids[n] == usize::MAX && labels[n] == label {
                            ids[n] = id;
                            pixels.push(n);
                        }
                    }
                }
            }
        }
        starts.push(pixels.len());

        Ok(Self {
            ids,
            pixels,
            starts,
        })
    }

    fn len(&self) -> usize {
        self.starts.len() - 1
    }

    fn pixels_of(&self, component: usize) -> &[usize] {
        &self.pixels[self.starts[component]..self.starts[component + 1]]
    }
}

/// Relabel the label map so that every region is 4-connected and holds at
/// least `min_region_size` pixels, then number regions densely.
///
/// Components are visited in raster order of their first pixel. A component
/// whose region is smaller than `min_region_size` is merged into the
/// neighboring region it shares the most edge contacts with; ties go to the
/// region with the lowest component id. A region with no neighbors covers the
/// whole image and is kept regardless of its size.
///
/// Returns the number of labels; the labels are `0..count` in raster order of
/// first appearance.
pub fn enforce_connectivity(
    width: u32,
    height: u32,
    min_region_size: usize,
    labels: &mut [usize],
) -> Result<usize, ScError> {
    let expected = pixel_count(width, height)?;
    if labels.len() != expected {
        return Err(ScError::MismatchedPixelBuffer {
            expected,
            actual: labels.len(),
        });
    }
    let width = usize::try_from(width).or(Err("Invalid image width"))?;
    let height = usize::try_from(height).or(Err("Invalid image height"))?;

    let components = Components::find(width, height, labels)?;
    let count = components.len();

    let mut parents: Vec<usize> = (0..count).collect();
    let mut sizes: Vec<usize> = (0..count).map(|c| components.pixels_of(c).len()).collect();

    // Shared pixel edges between neighboring components, gathered in one pass.
    // Keys go stale as components merge and are resolved through `find`.
    let mut contacts: Vec<FxHashMap<usize, usize>> = Vec::new();
    contacts.try_reserve_exact(count)?;
    contacts.resize_with(count, FxHashMap::default);
    for (idx, &id) in components.ids.iter().enumerate() {
        for &(dx, dy) in &NEIGHBORS {
            if let Some(n) = neighbor_index(width, height, idx, dx, dy) {
                let other = components.ids[n];
                if other != id {
                    *contacts[id].entry(other).or_insert(0) += 1;
                }
            }
        }
    }

    for component in 0..count {
        if find(&mut parents, component) != component || sizes[component] >= min_region_size {
            continue;
        }

        let mut by_root = FxHashMap::<usize, usize>::default();
        for (other, shared) in std::mem::take(&mut contacts[component]) {
            let root = find(&mut parents, other);
            if root != component {
                *by_root.entry(root).or_insert(0) += shared;
            }
        }

        let target = by_root
            .iter()
            .max_by(|lhs, rhs| lhs.1.cmp(rhs.1).then(rhs.0.cmp(lhs.0)))
            .map(|(&root, _)| root);
        match target {
            Some(target) => {
                parents[component] = target;
                sizes[target] += sizes[component];

                // Fold the smaller map into the larger one.
                let mut merged = std::mem::take(&mut contacts[target]);
                if merged.len() < by_root.len() {
                    std::mem::swap(&mut merged, &mut by_root);
                }
                for (root, shared) in by_root {
                    if root != target {
                        *merged.entry(root).or_insert(0) += shared;
                    }
                }
                contacts[target] = merged;
            }
            None => contacts[component] = by_root,
        }
    }

    let mut dense = Vec::new();
    dense.try_reserve_exact(count)?;
    dense.resize(count, usize::MAX);
    let mut next = 0_usize;
    for (label, &id) in labels.iter_mut().zip(&components.ids) {
        let root = find(&mut parents, id);
        if dense[root] == usize::MAX {
            dense[root] = next;
            next += 1;
        }
        *label = dense[root];
    }

    Ok(next)
}

/// Renumber labels densely in raster order of first appearance without
/// touching region shapes. Returns the number of labels.
pub fn compact_labels(labels: &mut [usize]) -> Result<usize, ScError> {
    let mut map = FxHashMap::<usize, usize>::default();
    map.try_reserve(labels.len().min(1 << 16))?;
    for label in labels.iter_mut() {
        let next = map.len();
        *label = *map.entry(*label).or_insert(next);
    }
    Ok(map.len())
}
