//! Preview compositor.
//!
//! Lays out the interactive editing view: the photo fitted to 90% of the
//! viewport and centered, watermarks placed at viewport percentages with
//! their sizes taken as viewport pixels. Direct manipulation results are
//! folded back into normalized settings here.

use crate::constants::{MAX_VIEWPORT_DIMENSION, PREVIEW_BACKGROUND};
use crate::error::{Result, StudioError};
use crate::watermark::geometry::{
    compute_fit, preview_placement, to_normalized, FitTransform, ImageDimensions, Placement,
    Point, Viewport,
};
use crate::watermark::painter::{PaintSummary, WatermarkPainter};
use crate::watermark::settings::WatermarkSettings;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

/// A watermark as laid out in the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewWatermark {
    /// Position in the owning image's watermark list (z-order)
    pub index: usize,
    pub placement: Placement,
    /// Whether this is the active (focused) watermark
    pub active: bool,
}

/// The full layout of one preview frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewLayout {
    pub viewport: Viewport,
    pub fit: FitTransform,
    /// Image footprint: (left, top, width, height) in viewport pixels
    pub image_rect: (f64, f64, f64, f64),
    pub watermarks: Vec<PreviewWatermark>,
}

/// End state of a drag/rotate/resize gesture on a watermark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Manipulation {
    /// Rendered center in viewport pixels
    pub center: Point,
    /// Rendered angle in degrees (any range)
    pub angle_degrees: f64,
    /// Horizontal scale applied during the gesture
    pub scale_x: f64,
}

/// Normalized values written back to the owning settings record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingsUpdate {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub font_size: f64,
}

impl SettingsUpdate {
    pub fn apply_to(&self, settings: &mut WatermarkSettings) {
        settings.x = self.x;
        settings.y = self.y;
        settings.rotation = self.rotation;
        settings.font_size = self.font_size;
    }
}

/// Interactive view state: the live viewport size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PreviewCompositor {
    viewport: Viewport,
}

impl PreviewCompositor {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Track a container resize. Unusable sizes are ignored.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if !viewport.is_usable() {
            tracing::debug!(?viewport, "Ignoring unusable viewport size");
            return false;
        }
        self.viewport = viewport;
        true
    }

    /// Fit-to-viewport transform for an image of the given native size.
    pub fn fit(&self, image: ImageDimensions) -> FitTransform {
        compute_fit(self.viewport, image)
    }

    /// Lay out an image and its watermarks for display.
    pub fn layout(
        &self,
        image: ImageDimensions,
        watermarks: &[WatermarkSettings],
        active: Option<usize>,
    ) -> PreviewLayout {
        let fit = self.fit(image);

        PreviewLayout {
            viewport: self.viewport,
            fit,
            image_rect: fit.displayed_rect(image),
            watermarks: watermarks
                .iter()
                .enumerate()
                .map(|(index, settings)| PreviewWatermark {
                    index,
                    placement: preview_placement(settings, self.viewport),
                    active: active == Some(index),
                })
                .collect(),
        }
    }

    /// Convert a finished gesture into normalized settings.
    ///
    /// Position is re-divided by the current viewport; rotation is wrapped
    /// into [-180, 180); size is the effective size after scaling, kept
    /// within the kind's editable range.
    pub fn manipulation_end(
        &self,
        settings: &WatermarkSettings,
        manipulation: Manipulation,
    ) -> SettingsUpdate {
        let (x, y) = to_normalized(manipulation.center, self.viewport);
        let scale = if manipulation.scale_x.is_finite() && manipulation.scale_x > 0.0 {
            manipulation.scale_x
        } else {
            1.0
        };
        let size_range = settings.size_range();

        SettingsUpdate {
            x: x.clamp(0.0, 100.0),
            y: y.clamp(0.0, 100.0),
            rotation: wrap_degrees(manipulation.angle_degrees),
            font_size: (settings.font_size * scale).clamp(*size_range.start(), *size_range.end()),
        }
    }

    /// Rasterize a preview frame at viewport resolution.
    ///
    /// A viewport outside the accepted bounds is `CanvasUnavailable`.
    pub async fn render_frame(
        &self,
        image: &DynamicImage,
        watermarks: &[WatermarkSettings],
        painter: &WatermarkPainter<'_>,
    ) -> Result<(RgbaImage, PaintSummary)> {
        let width = self.viewport.width.round().max(1.0) as u32;
        let height = self.viewport.height.round().max(1.0) as u32;
        if !self.viewport.is_usable() {
            return Err(StudioError::CanvasUnavailable {
                width,
                height,
                reason: format!(
                    "preview viewport must be positive and at most {} per side",
                    MAX_VIEWPORT_DIMENSION
                ),
            });
        }
        let mut frame = RgbaImage::from_pixel(width, height, Rgba(PREVIEW_BACKGROUND));

        let dims = ImageDimensions::new(image.width(), image.height());
        let (left, top, shown_w, shown_h) = self.fit(dims).displayed_rect(dims);
        let shown_w = shown_w.round().max(1.0) as u32;
        let shown_h = shown_h.round().max(1.0) as u32;

        let scaled = imageops::resize(&image.to_rgba8(), shown_w, shown_h, FilterType::Triangle);
        imageops::overlay(&mut frame, &scaled, left.round() as i64, top.round() as i64);

        let summary = painter
            .paint(
                &mut frame,
                watermarks
                    .iter()
                    .map(|settings| (settings, preview_placement(settings, self.viewport))),
            )
            .await;

        Ok((frame, summary))
    }
}

/// Wrap an angle into [-180, 180).
fn wrap_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}
