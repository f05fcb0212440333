//! Turns watermark settings into drawn layers.
//!
//! The preview and export paths differ only in the [`Placement`] they feed
//! in; sprite construction and blending are shared here. Watermarks that
//! cannot be drawn (undecodable image, unknown color, no font) are skipped
//! with a warning and the remaining ones are still drawn.

use super::compositor::{blend_layer, scale_sprite, WatermarkLayer};
use super::fonts::FontLibrary;
use super::geometry::Placement;
use super::image_source::WatermarkImageCache;
use super::settings::{WatermarkKind, WatermarkSettings};
use super::text_renderer::{parse_hex_color, render_text, TextRenderOptions};
use crate::error::{Result, StudioError};
use image::RgbaImage;
use std::sync::Arc;

/// Outcome of painting a list of watermarks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintSummary {
    pub drawn: usize,
    pub skipped: usize,
}

/// Builds and blends watermark layers.
#[derive(Clone, Copy)]
pub struct WatermarkPainter<'a> {
    fonts: &'a FontLibrary,
    images: &'a WatermarkImageCache,
}

impl<'a> WatermarkPainter<'a> {
    pub fn new(fonts: &'a FontLibrary, images: &'a WatermarkImageCache) -> Self {
        Self { fonts, images }
    }

    /// Build the layer for one watermark at `placement`.
    ///
    /// `Ok(None)` means there is nothing visible to draw.
    pub async fn layer(
        &self,
        settings: &WatermarkSettings,
        placement: &Placement,
    ) -> Result<Option<WatermarkLayer>> {
        let opacity = settings.opacity.clamp(0.0, 1.0) as f32;

        match settings.kind {
            WatermarkKind::Text => {
                let color = parse_hex_color(&settings.color)?;
                let font = self.fonts.resolve(&settings.font_family).ok_or_else(|| {
                    StudioError::Font(format!(
                        "No font available for family '{}'",
                        settings.font_family
                    ))
                })?;

                let options = TextRenderOptions {
                    text: settings.text.clone(),
                    font_size: placement.size as f32,
                    color,
                    alignment: settings.alignment,
                };

                Ok(render_text(font, &options)?.map(|rendered| {
                    rendered.into_layer(placement.position, placement.rotation_radians, opacity)
                }))
            }
            WatermarkKind::Image => {
                let Some(source) = settings.image_source.as_deref() else {
                    return Ok(None);
                };

                let cached = self.images.fetch(source).await?;
                let scale = placement.size;
                if !scale.is_finite() || scale <= 0.0 {
                    return Ok(None);
                }

                // Shrinking resamples into a smaller sprite; enlarging samples
                // the cached decode directly inside the blend
                let layer = if scale < 1.0 {
                    match scale_sprite(&cached.image, scale) {
                        Some(sprite) => WatermarkLayer::centered(
                            sprite,
                            placement.position,
                            placement.rotation_radians,
                            opacity,
                        ),
                        None => return Ok(None),
                    }
                } else {
                    WatermarkLayer::centered(
                        Arc::clone(&cached.image),
                        placement.position,
                        placement.rotation_radians,
                        opacity,
                    )
                    .with_scale(scale)
                };
                Ok(Some(layer))
            }
        }
    }

    /// Draw watermarks back to front onto `target`.
    ///
    /// Each watermark gets its own layer; nothing carries over between them.
    pub async fn paint<'w, I>(&self, target: &mut RgbaImage, watermarks: I) -> PaintSummary
    where
        I: IntoIterator<Item = (&'w WatermarkSettings, Placement)>,
    {
        let mut summary = PaintSummary::default();

        for (index, (settings, placement)) in watermarks.into_iter().enumerate() {
            match self.layer(settings, &placement).await {
                Ok(Some(layer)) => {
                    blend_layer(target, &layer);
                    summary.drawn += 1;
                }
                Ok(None) => {
                    tracing::debug!(index, kind = ?settings.kind, "Watermark has nothing to draw");
                }
                Err(e) => {
                    tracing::warn!(
                        index,
                        kind = ?settings.kind,
                        error = %e,
                        "Skipping watermark that could not be drawn"
                    );
                    summary.skipped += 1;
                }
            }
        }

        summary
    }
}
