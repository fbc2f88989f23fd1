use slic_buffers::yuv::{rgb_to_y, yuv_to_rgb};
use slic_buffers::{ImageData, PixelFormat, YuvData};

/// RGB24 image where every aligned 2x2 block has one color.
fn blocky_rgb(width: usize, height: usize) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let (bx, by) = (x / 2, y / 2);
            rgb.push((20 + bx * 37 % 200) as u8);
            rgb.push((30 + by * 53 % 190) as u8);
            rgb.push((25 + (bx + by) * 29 % 200) as u8);
        }
    }
    rgb
}

#[test]
fn rgb_round_trip_through_yuv_is_close() {
    let (width, height) = (10, 6);
    let rgb = blocky_rgb(width, height);
    let yuv = YuvData::from_rgb24(10, 6, &rgb, 30).unwrap();
    let back = ImageData::yuv420_to_rgb24(10, 6, &yuv.planes()).unwrap();

    assert_eq!(back.format(), PixelFormat::Rgb24);
    assert_eq!(back.data().len(), rgb.len());
    for (i, (&a, &b)) in rgb.iter().zip(back.data()).enumerate() {
        assert!(a.abs_diff(b) <= 6, "byte {i}: {a} vs {b}");
    }
}

#[test]
fn odd_dimensions_use_rounded_up_chroma() {
    let rgb = blocky_rgb(5, 3);
    let yuv = YuvData::from_rgb24(5, 3, &rgb, 15).unwrap();
    assert_eq!(yuv.y().len(), 15);
    assert_eq!(yuv.u().len(), 3 * 2);
    assert_eq!(yuv.uv_stride(), 3);

    let rgba = ImageData::yuv420_to_rgba32(5, 3, &yuv.planes()).unwrap();
    assert_eq!(rgba.data().len(), 5 * 3 * 4);
    assert!(rgba.data().chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn yuv_output_formats_share_colors() {
    let rgb = blocky_rgb(4, 4);
    let yuv = YuvData::from_rgb24(4, 4, &rgb, 12).unwrap();
    let planes = yuv.planes();

    let as_rgb = ImageData::yuv420_to_rgb24(4, 4, &planes).unwrap();
    let as_bgr = ImageData::yuv420_to_bgr24(4, 4, &planes).unwrap();
    let as_rgba = ImageData::yuv420_to_rgba32(4, 4, &planes).unwrap();

    for ((rgb, bgr), rgba) in as_rgb
        .data()
        .chunks_exact(3)
        .zip(as_bgr.data().chunks_exact(3))
        .zip(as_rgba.data().chunks_exact(4))
    {
        assert_eq!(rgb, [bgr[2], bgr[1], bgr[0]]);
        assert_eq!(rgb, &rgba[..3]);
    }
}

#[test]
fn rgba_bgr_round_trip_is_exact_apart_from_alpha() {
    let (width, height) = (7, 3);
    let rgba: Vec<u8> = (0..width * height * 4)
        .map(|i| if i % 4 == 3 { 255 } else { (i * 13) as u8 })
        .collect();

    let bgr = ImageData::rgba32_to_bgr24(7, 3, &rgba).unwrap();
    let back = ImageData::bgr24_to_rgba32(7, 3, bgr.data()).unwrap();
    assert_eq!(back.format(), PixelFormat::Rgba32);
    assert_eq!(back.into_data(), rgba);
}

#[test]
fn limited_range_extremes() {
    assert_eq!(rgb_to_y([0, 0, 0]), 16);
    assert_eq!(rgb_to_y([255, 255, 255]), 235);
    assert_eq!(yuv_to_rgb(16, 128, 128), [0, 0, 0]);
    assert_eq!(yuv_to_rgb(235, 128, 128), [255, 255, 255]);
}
