use slic_buffers::image::{count_labels, EDGE_OFF, EDGE_ON};
use slic_buffers::{slic_from_rgba, Segmentation, SlicConfig};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn two_bands(width: usize, height: usize, top: [u8; 3], bottom: [u8; 3]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let [r, g, b] = if y < height / 2 { top } else { bottom };
        for _ in 0..width {
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }
    rgba
}

#[test]
fn solid_image_is_one_region() {
    init_logger();
    let rgba = [120u8, 64, 200, 255].repeat(16);
    let seg = Segmentation::from_rgba(4, 4, 16, &rgba, &SlicConfig::default()).unwrap();

    assert_eq!(seg.num_labels(), 1);
    assert!(seg.labels().iter().all(|&l| l == 0));
    assert!(seg.edges().iter().all(|&e| e == EDGE_OFF));
}

#[test]
fn top_and_bottom_halves_split_along_the_boundary() {
    init_logger();
    let (width, height) = (100, 100);
    let rgba = two_bands(width, height, [255, 0, 0], [0, 0, 255]);

    // Four seeds settle into a 51/49 column split; the narrower right-hand
    // regions fall below the minimum size and merge sideways.
    let seg = Segmentation::from_rgba(100, 100, 9900, &rgba, &SlicConfig::ffi()).unwrap();

    assert_eq!(seg.num_labels(), 2);
    assert_eq!(count_labels(seg.labels()), 2);
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let expected_label = usize::from(y >= height / 2);
            assert_eq!(seg.labels()[i], expected_label, "label at ({x}, {y})");

            let expected_edge = if y == 49 || y == 50 {
                EDGE_ON
            } else {
                EDGE_OFF
            };
            assert_eq!(seg.edges()[i], expected_edge, "edge at ({x}, {y})");
        }
    }
}

#[test]
fn repeated_runs_agree() {
    init_logger();
    let (width, height) = (37, 23);
    let mut rgba = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width) as u8;
            let g = (y * 255 / height) as u8;
            let b = ((x * y) % 256) as u8;
            rgba.extend_from_slice(&[r, g, b, 255]);
        }
    }

    let config = SlicConfig::ffi();
    let first = slic_from_rgba(37, 23, 30, &rgba, &config).unwrap();
    let second = slic_from_rgba(37, 23, 30, &rgba, &config).unwrap();
    assert_eq!(first, second);
    assert!(first.1 > 1);
}

#[test]
fn alpha_channel_does_not_affect_labels() {
    let opaque = two_bands(20, 20, [30, 160, 40], [200, 200, 20]);
    let mut clear = opaque.clone();
    clear.chunks_exact_mut(4).for_each(|px| px[3] = 0);

    let config = SlicConfig::default();
    let lhs = slic_from_rgba(20, 20, 25, &opaque, &config).unwrap();
    let rhs = slic_from_rgba(20, 20, 25, &clear, &config).unwrap();
    assert_eq!(lhs, rhs);
}

#[test]
fn disabled_enforcement_still_gives_dense_labels() {
    let rgba = two_bands(16, 16, [0, 0, 0], [255, 255, 255]);
    let config = SlicConfig {
        enforce_connectivity: false,
        ..SlicConfig::default()
    };
    let (labels, count) = slic_from_rgba(16, 16, 16, &rgba, &config).unwrap();

    let mut seen = vec![false; count];
    let mut next = 0;
    for &l in &labels {
        assert!(l < count);
        if !seen[l] {
            assert_eq!(l, next, "labels are numbered by first appearance");
            seen[l] = true;
            next += 1;
        }
    }
    assert_eq!(next, count);
}

#[test]
fn invalid_arguments_are_errors() {
    let rgba = [0u8; 64];
    let config = SlicConfig::default();
    assert!(Segmentation::from_rgba(0, 4, 16, &rgba, &config).is_err());
    assert!(Segmentation::from_rgba(4, 4, 0, &rgba, &config).is_err());
    let short = &rgba[..60];
    assert!(Segmentation::from_rgba(4, 4, 16, short, &config).is_err());

    let bad = SlicConfig {
        compactness: 0.0,
        ..SlicConfig::default()
    };
    assert!(Segmentation::from_rgba(4, 4, 16, &rgba, &bad).is_err());
}
