//! Native-resolution export compositor.
//!
//! Rebuilds the preview's fit transform for each photo, inverts it, and draws
//! the watermarks onto a full-size copy of the photo.

use crate::constants::DEFAULT_MAX_PIXELS;
use crate::error::{Result, StudioError};
use crate::watermark::geometry::{native_placement, ImageDimensions, Viewport};
use crate::watermark::painter::{PaintSummary, WatermarkPainter};
use crate::watermark::settings::WatermarkSettings;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, RgbaImage};
use std::io::Cursor;

/// Renders watermarked photos at native resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportCompositor {
    viewport: Viewport,
    max_pixels: u64,
}

impl ExportCompositor {
    /// `viewport` is the preview viewport the watermarks were placed in.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Check that a native canvas can be allocated for `dims`.
    pub fn check_canvas(&self, dims: ImageDimensions) -> Result<()> {
        if dims.width == 0 || dims.height == 0 {
            return Err(StudioError::CanvasUnavailable {
                width: dims.width,
                height: dims.height,
                reason: "zero dimension".to_string(),
            });
        }
        if dims.pixel_count() > self.max_pixels {
            return Err(StudioError::CanvasUnavailable {
                width: dims.width,
                height: dims.height,
                reason: format!("exceeds pixel budget of {}", self.max_pixels),
            });
        }
        Ok(())
    }

    /// Draw `watermarks` back to front onto a native copy of `image`.
    ///
    /// Watermarks that cannot be drawn are skipped; with none drawn the
    /// output pixels equal the source pixels.
    pub async fn render(
        &self,
        image: &DynamicImage,
        watermarks: &[WatermarkSettings],
        painter: &WatermarkPainter<'_>,
    ) -> Result<(RgbaImage, PaintSummary)> {
        let dims = ImageDimensions::new(image.width(), image.height());
        self.check_canvas(dims)?;

        let mut canvas = image.to_rgba8();
        let summary = painter
            .paint(
                &mut canvas,
                watermarks
                    .iter()
                    .map(|settings| (settings, native_placement(settings, self.viewport, dims))),
            )
            .await;

        tracing::debug!(
            width = dims.width,
            height = dims.height,
            drawn = summary.drawn,
            skipped = summary.skipped,
            "Rendered export canvas"
        );

        Ok((canvas, summary))
    }
}

/// Serialize a composited canvas to PNG bytes.
pub fn encode_png(canvas: &RgbaImage, name: &str) -> Result<Vec<u8>> {
    let mut output = Cursor::new(Vec::new());
    PngEncoder::new(&mut output)
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| StudioError::serialization(name, e))?;

    Ok(output.into_inner())
}
