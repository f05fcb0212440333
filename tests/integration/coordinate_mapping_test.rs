// Preview and export agree on where every watermark goes.

use super::test_harness::system_font_library;
use image::{DynamicImage, Rgba, RgbaImage};
use rstest::rstest;
use watermark_studio::export::ExportCompositor;
use watermark_studio::preview::PreviewCompositor;
use watermark_studio::watermark::{
    compute_fit, native_placement, preview_placement, ImageDimensions, Point, Viewport,
    WatermarkImageCache, WatermarkPainter, WatermarkSettings,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_reference_scenario() {
    let viewport = Viewport::new(800.0, 600.0);
    let image = ImageDimensions::new(1600, 1200);

    let fit = compute_fit(viewport, image);
    assert!(close(fit.scale, 0.45));

    let placement = native_placement(&WatermarkSettings::default(), viewport, image);
    assert!(close(placement.position.x, 800.0));
    assert!(close(placement.position.y, 600.0));
    assert!(close(placement.size, 48.0 / 0.45));
    assert!(close(placement.size, 106.666_666_666_666_67));
}

#[rstest]
#[case(800.0, 600.0, 1600, 1200)]
#[case(800.0, 600.0, 300, 3000)]
#[case(1920.0, 1080.0, 640, 480)]
#[case(375.0, 812.0, 4032, 3024)]
#[case(1000.0, 1000.0, 1, 1)]
fn test_center_maps_to_native_center(
    #[case] vw: f64,
    #[case] vh: f64,
    #[case] iw: u32,
    #[case] ih: u32,
) {
    let viewport = Viewport::new(vw, vh);
    let image = ImageDimensions::new(iw, ih);

    let fit = compute_fit(viewport, image);
    let (_, _, shown_w, shown_h) = fit.displayed_rect(image);
    assert!(shown_w <= vw * 0.9 + 1e-9);
    assert!(shown_h <= vh * 0.9 + 1e-9);

    let placement = native_placement(&WatermarkSettings::default(), viewport, image);
    assert!(close(placement.position.x, iw as f64 / 2.0));
    assert!(close(placement.position.y, ih as f64 / 2.0));
}

#[rstest]
#[case(0.0, 0.0)]
#[case(12.5, 87.5)]
#[case(50.0, 95.0)]
#[case(100.0, 100.0)]
fn test_preview_and_export_positions_agree(#[case] x: f64, #[case] y: f64) {
    let viewport = Viewport::new(1280.0, 720.0);
    let image = ImageDimensions::new(3000, 2000);
    let settings = WatermarkSettings::default()
        .with_position(x, y)
        .with_font_size(64.0)
        .with_rotation(-45.0);

    let preview = PreviewCompositor::new(viewport).layout(image, &[settings.clone()], None);
    let shown = preview.watermarks[0].placement;
    let native = native_placement(&settings, viewport, image);

    // Mapping the native placement forward lands on the preview placement
    let back = preview.fit.native_to_viewport(native.position, image);
    assert!(close(back.x, shown.position.x));
    assert!(close(back.y, shown.position.y));
    assert!(close(native.size * preview.fit.scale, shown.size));
    assert_eq!(native.rotation_radians, shown.rotation_radians);
    assert_eq!(shown, preview_placement(&settings, viewport));
}

#[test]
fn test_same_settings_fit_each_image_in_batch() {
    // One watermark record, two very different photos
    let viewport = Viewport::new(800.0, 600.0);
    let settings = WatermarkSettings::default().with_position(75.0, 25.0);

    let wide = native_placement(&settings, viewport, ImageDimensions::new(4000, 1000));
    let tall = native_placement(&settings, viewport, ImageDimensions::new(500, 2000));

    // wide: scale 0.18, viewport (600, 150)
    assert!(close(wide.position.x, 200.0 / 0.18 + 2000.0));
    assert!(close(wide.position.y, -150.0 / 0.18 + 500.0));
    // tall: scale 0.27, same viewport point
    assert!(close(tall.position.x, 200.0 / 0.27 + 250.0));
    assert!(close(tall.position.y, -150.0 / 0.27 + 1000.0));
}

#[tokio::test]
async fn test_image_watermark_pixels_at_mapped_position() {
    let dir = tempfile::tempdir().unwrap();
    let logo = dir.path().join("logo.png");
    RgbaImage::from_pixel(20, 20, Rgba([0, 255, 0, 255]))
        .save(&logo)
        .unwrap();

    // 800x600 viewport, 400x300 photo: scale 1.8
    let viewport = Viewport::new(800.0, 600.0);
    let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 300, Rgba([0, 0, 0, 255])));
    // Scale 36% in preview -> 0.2 native -> 4x4 footprint
    let settings = WatermarkSettings::image()
        .with_image_source(&logo)
        .with_font_size(36.0)
        .with_opacity(1.0)
        .with_position(65.0, 40.0);

    let fonts = watermark_studio::watermark::FontLibrary::new();
    let cache = WatermarkImageCache::default();
    let painter = WatermarkPainter::new(&fonts, &cache);
    let (canvas, summary) = ExportCompositor::new(viewport)
        .render(&photo, &[settings.clone()], &painter)
        .await
        .unwrap();
    assert_eq!(summary.drawn, 1);

    let placement = native_placement(&settings, viewport, ImageDimensions::new(400, 300));
    // (520 - 400) / 1.8 + 200, (240 - 300) / 1.8 + 150
    assert!(close(placement.position.x, 200.0 + 120.0 / 1.8));
    assert!(close(placement.position.y, 150.0 - 60.0 / 1.8));

    let cx = placement.position.x.floor() as u32;
    let cy = placement.position.y.floor() as u32;
    assert_eq!(canvas.get_pixel(cx, cy)[1], 255);
    assert_eq!(*canvas.get_pixel(cx + 6, cy), Rgba([0, 0, 0, 255]));
    assert_eq!(*canvas.get_pixel(cx, cy + 6), Rgba([0, 0, 0, 255]));
}

#[tokio::test]
async fn test_text_watermark_rendered_around_native_center() {
    let fonts_dir = tempfile::tempdir().unwrap();
    let Some(fonts) = system_font_library(fonts_dir.path()).await else {
        return;
    };
    assert_eq!(fonts.available()[0].family, "Test Sans");

    let viewport = Viewport::new(800.0, 600.0);
    let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1600, 1200, Rgba([0, 0, 0, 255])));
    let settings = WatermarkSettings::text("WWWW")
        .with_font_family("Test Sans")
        .with_opacity(1.0);

    let cache = WatermarkImageCache::default();
    let painter = WatermarkPainter::new(&fonts, &cache);
    let (canvas, summary) = ExportCompositor::new(viewport)
        .render(&photo, &[settings], &painter)
        .await
        .unwrap();
    assert_eq!(summary.drawn, 1);

    // Ink bounding box is centered near (800, 600) and about 106px tall
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (u32::MAX, u32::MAX, 0, 0);
    for (x, y, pixel) in canvas.enumerate_pixels() {
        if pixel[0] > 128 {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    let center = Point::new((min_x + max_x) as f64 / 2.0, (min_y + max_y) as f64 / 2.0);
    assert!((center.x - 800.0).abs() < 10.0, "center x {}", center.x);
    assert!((center.y - 600.0).abs() < 30.0, "center y {}", center.y);
    assert!(max_y - min_y < 107);
    assert!(max_y - min_y > 40);
}
