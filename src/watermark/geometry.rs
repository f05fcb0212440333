//! Coordinate mapping between preview space and native image space.
//!
//! Both renderers consume this module; neither derives placement math on its
//! own. The interactive preview shows the image scaled to fit 90% of the
//! viewport and centered in it, while watermark coordinates are percentages
//! of the viewport. Export replays that fit for each image and inverts it:
//!
//! ```text
//! viewport px = (x / 100) * viewport_w
//! native px   = (viewport px - viewport_w / 2) / preview_scale + image_w / 2
//! ```
//!
//! # Example
//!
//! ```
//! use watermark_studio::watermark::geometry::{compute_fit, ImageDimensions, Viewport};
//!
//! let fit = compute_fit(Viewport::new(800.0, 600.0), ImageDimensions::new(1600, 1200));
//! assert!((fit.scale - 0.45).abs() < 1e-12);
//! assert_eq!((fit.center_x, fit.center_y), (400.0, 300.0));
//! ```

use super::settings::{WatermarkKind, WatermarkSettings};
use crate::constants::{MAX_VIEWPORT_DIMENSION, PREVIEW_FIT_RATIO};
use serde::{Deserialize, Serialize};

/// Native dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Size of the preview viewport in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Positive, finite and no larger than [`MAX_VIEWPORT_DIMENSION`] per side.
    pub fn is_usable(&self) -> bool {
        let side_ok = |side: f64| side.is_finite() && side > 0.0 && side <= MAX_VIEWPORT_DIMENSION;
        side_ok(self.width) && side_ok(self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_VIEWPORT_WIDTH as f64,
            crate::constants::DEFAULT_VIEWPORT_HEIGHT as f64,
        )
    }
}

/// A point in some pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The preview's fit-to-viewport transform for one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    /// Uniform scale from native pixels to viewport pixels
    pub scale: f64,
    /// Viewport x of the image center
    pub center_x: f64,
    /// Viewport y of the image center
    pub center_y: f64,
}

/// Compute the uniform scale that fits `image` inside 90% of `viewport`,
/// centered.
pub fn compute_fit(viewport: Viewport, image: ImageDimensions) -> FitTransform {
    // Guard zero-sized images so the scale stays finite
    let image_w = image.width.max(1) as f64;
    let image_h = image.height.max(1) as f64;

    let scale = f64::min(
        viewport.width * PREVIEW_FIT_RATIO / image_w,
        viewport.height * PREVIEW_FIT_RATIO / image_h,
    );

    FitTransform {
        scale,
        center_x: viewport.width / 2.0,
        center_y: viewport.height / 2.0,
    }
}

impl FitTransform {
    /// On-screen footprint of the image: (left, top, width, height).
    pub fn displayed_rect(&self, image: ImageDimensions) -> (f64, f64, f64, f64) {
        let width = image.width as f64 * self.scale;
        let height = image.height as f64 * self.scale;
        (
            self.center_x - width / 2.0,
            self.center_y - height / 2.0,
            width,
            height,
        )
    }

    /// Map a viewport pixel into the image's native pixel space.
    pub fn viewport_to_native(&self, point: Point, image: ImageDimensions) -> Point {
        Point::new(
            (point.x - self.center_x) / self.scale + image.width as f64 / 2.0,
            (point.y - self.center_y) / self.scale + image.height as f64 / 2.0,
        )
    }

    /// Map a native pixel back into viewport space.
    pub fn native_to_viewport(&self, point: Point, image: ImageDimensions) -> Point {
        Point::new(
            (point.x - image.width as f64 / 2.0) * self.scale + self.center_x,
            (point.y - image.height as f64 / 2.0) * self.scale + self.center_y,
        )
    }

    /// Convert a viewport-pixel length into native pixels.
    pub fn native_length(&self, viewport_length: f64) -> f64 {
        viewport_length / self.scale
    }
}

/// Percentage position to viewport pixels.
pub fn to_viewport_point(x_percent: f64, y_percent: f64, viewport: Viewport) -> Point {
    Point::new(
        x_percent / 100.0 * viewport.width,
        y_percent / 100.0 * viewport.height,
    )
}

/// Viewport pixels back to a percentage position.
pub fn to_normalized(point: Point, viewport: Viewport) -> (f64, f64) {
    // A collapsed viewport reads as 1px so the division stays finite
    let width = if viewport.width > 0.0 { viewport.width } else { 1.0 };
    let height = if viewport.height > 0.0 { viewport.height } else { 1.0 };
    (point.x / width * 100.0, point.y / height * 100.0)
}

/// Where and how large a watermark is drawn in some pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Anchor position of the watermark
    pub position: Point,
    /// Rotation in radians, clockwise
    pub rotation_radians: f64,
    /// Text size in pixels (text) or scale factor (image)
    pub size: f64,
}

/// Placement of a watermark in the live viewport.
///
/// Sizes are viewport pixels as-is; the preview never rescales them.
pub fn preview_placement(settings: &WatermarkSettings, viewport: Viewport) -> Placement {
    Placement {
        position: to_viewport_point(settings.x, settings.y, viewport),
        rotation_radians: settings.rotation.to_radians(),
        size: base_size(settings),
    }
}

/// Placement of a watermark on an image's native pixel buffer.
///
/// Rebuilds the preview fit for `image` inside `viewport` and inverts it for
/// both the position and the size.
pub fn native_placement(
    settings: &WatermarkSettings,
    viewport: Viewport,
    image: ImageDimensions,
) -> Placement {
    let fit = compute_fit(viewport, image);
    let preview = preview_placement(settings, viewport);

    Placement {
        position: fit.viewport_to_native(preview.position, image),
        rotation_radians: preview.rotation_radians,
        size: fit.native_length(preview.size),
    }
}

fn base_size(settings: &WatermarkSettings) -> f64 {
    match settings.kind {
        WatermarkKind::Text => settings.font_size,
        WatermarkKind::Image => settings.image_scale(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_fit_scale_reference_scenario() {
        let fit = compute_fit(Viewport::new(800.0, 600.0), ImageDimensions::new(1600, 1200));
        assert!(approx(fit.scale, 0.45));
        assert_eq!(fit.center_x, 400.0);
        assert_eq!(fit.center_y, 300.0);
    }

    #[test]
    fn test_fit_is_limited_by_tighter_axis() {
        // Wide image: width is the constraint
        let fit = compute_fit(Viewport::new(1000.0, 1000.0), ImageDimensions::new(2000, 500));
        assert!(approx(fit.scale, 0.45));

        // Tall image: height is the constraint
        let fit = compute_fit(Viewport::new(1000.0, 1000.0), ImageDimensions::new(500, 3000));
        assert!(approx(fit.scale, 0.3));
    }

    #[rstest]
    #[case(800.0, 600.0, 1600, 1200)]
    #[case(1280.0, 720.0, 4000, 3000)]
    #[case(375.0, 812.0, 6000, 4000)]
    #[case(1920.0, 1080.0, 320, 240)]
    #[case(640.0, 480.0, 1, 9000)]
    fn test_fit_never_exceeds_ninety_percent(
        #[case] vw: f64,
        #[case] vh: f64,
        #[case] iw: u32,
        #[case] ih: u32,
    ) {
        let fit = compute_fit(Viewport::new(vw, vh), ImageDimensions::new(iw, ih));
        let (_, _, w, h) = fit.displayed_rect(ImageDimensions::new(iw, ih));
        assert!(w <= vw * 0.9 + 1e-9);
        assert!(h <= vh * 0.9 + 1e-9);
        // One of the axes touches the 90% bound
        assert!(approx(w, vw * 0.9) || approx(h, vh * 0.9));
    }

    #[rstest]
    #[case(800.0, 600.0, 1600, 1200)]
    #[case(1280.0, 720.0, 4000, 3000)]
    #[case(375.0, 812.0, 6000, 4000)]
    #[case(1920.0, 1080.0, 321, 243)]
    fn test_viewport_center_maps_to_native_center(
        #[case] vw: f64,
        #[case] vh: f64,
        #[case] iw: u32,
        #[case] ih: u32,
    ) {
        let image = ImageDimensions::new(iw, ih);
        let wm = WatermarkSettings::default().with_position(50.0, 50.0);
        let placement = native_placement(&wm, Viewport::new(vw, vh), image);
        assert!(approx(placement.position.x, iw as f64 / 2.0));
        assert!(approx(placement.position.y, ih as f64 / 2.0));
    }

    #[test]
    fn test_text_reference_scenario() {
        let wm = WatermarkSettings::text("Sample").with_font_size(48.0);
        let placement = native_placement(
            &wm,
            Viewport::new(800.0, 600.0),
            ImageDimensions::new(1600, 1200),
        );
        assert!(approx(placement.position.x, 800.0));
        assert!(approx(placement.position.y, 600.0));
        assert!(approx(placement.size, 48.0 / 0.45));
        assert!((placement.size - 106.7).abs() < 0.05);
        assert_eq!(placement.rotation_radians, 0.0);
    }

    #[test]
    fn test_offset_position_is_scaled_relative_to_center() {
        // 10% of an 800px viewport right of center = 80 viewport px = 80/0.45 native px
        let wm = WatermarkSettings::default().with_position(60.0, 50.0);
        let placement = native_placement(
            &wm,
            Viewport::new(800.0, 600.0),
            ImageDimensions::new(1600, 1200),
        );
        assert!(approx(placement.position.x, 800.0 + 80.0 / 0.45));
        assert!(approx(placement.position.y, 600.0));
    }

    #[test]
    fn test_image_watermark_scale_is_inverted() {
        let wm = WatermarkSettings::image().with_font_size(50.0);
        let placement = native_placement(
            &wm,
            Viewport::new(800.0, 600.0),
            ImageDimensions::new(1600, 1200),
        );
        assert!(approx(placement.size, 0.5 / 0.45));
    }

    #[test]
    fn test_rotation_converted_to_radians() {
        let wm = WatermarkSettings::default().with_rotation(-90.0);
        let placement = preview_placement(&wm, Viewport::default());
        assert!(approx(placement.rotation_radians, -std::f64::consts::FRAC_PI_2));
    }

    #[test]
    fn test_preview_placement_uses_viewport_pixels() {
        let wm = WatermarkSettings::default()
            .with_position(25.0, 75.0)
            .with_font_size(48.0);
        let placement = preview_placement(&wm, Viewport::new(800.0, 600.0));
        assert_eq!(placement.position, Point::new(200.0, 450.0));
        assert_eq!(placement.size, 48.0);
    }

    #[test]
    fn test_normalize_round_trip() {
        let viewport = Viewport::new(1024.0, 768.0);
        let point = to_viewport_point(33.0, 66.0, viewport);
        let (x, y) = to_normalized(point, viewport);
        assert!(approx(x, 33.0));
        assert!(approx(y, 66.0));
    }

    #[test]
    fn test_native_and_viewport_are_inverse() {
        let image = ImageDimensions::new(3000, 2000);
        let fit = compute_fit(Viewport::new(900.0, 700.0), image);
        let p = Point::new(123.0, 456.0);
        let back = fit.native_to_viewport(fit.viewport_to_native(p, image), image);
        assert!(approx(back.x, p.x));
        assert!(approx(back.y, p.y));
    }

    #[test]
    fn test_viewport_usable_bounds() {
        assert!(Viewport::new(800.0, 600.0).is_usable());
        assert!(Viewport::new(8192.0, 8192.0).is_usable());
        assert!(!Viewport::new(0.0, 600.0).is_usable());
        assert!(!Viewport::new(800.0, f64::NAN).is_usable());
        assert!(!Viewport::new(1e6, 1e6).is_usable());
        assert!(!Viewport::new(800.0, 8193.0).is_usable());
    }

    #[test]
    fn test_zero_sized_image_keeps_scale_finite() {
        let fit = compute_fit(Viewport::new(800.0, 600.0), ImageDimensions::new(0, 0));
        assert!(fit.scale.is_finite());
    }
}
