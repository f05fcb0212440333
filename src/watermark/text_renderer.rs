//! Text watermark rendering.
//!
//! Renders a single line of text to an RGBA sprite with a transparent
//! background. The sprite carries an anchor point that follows 2D canvas
//! text semantics: horizontally per [`TextAlignment`], vertically on the
//! middle of the em box (`textBaseline = "middle"`). The compositor places
//! that anchor on the watermark position and rotates around it.
//!
//! # Example
//!
//! ```ignore
//! use watermark_studio::watermark::text_renderer::{render_text, parse_hex_color, TextRenderOptions};
//!
//! let options = TextRenderOptions {
//!     text: "Copyright 2025".to_string(),
//!     font_size: 106.7,
//!     color: parse_hex_color("#FFFFFF")?,
//!     alignment: TextAlignment::Center,
//! };
//!
//! let sprite = render_text(&font, &options)?;
//! ```

use super::compositor::WatermarkLayer;
use super::geometry::Point;
use super::settings::TextAlignment;
use crate::constants::MAX_TEXT_SPRITE_PIXELS;
use crate::error::{Result, StudioError};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// Transparent padding around rendered glyphs, in pixels.
const PADDING: u32 = 2;

/// Parsed RGB color from hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }
}

/// Options for text rendering.
#[derive(Debug, Clone)]
pub struct TextRenderOptions {
    /// The text to render.
    pub text: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text color (RGB).
    pub color: Color,
    /// Horizontal anchoring.
    pub alignment: TextAlignment,
}

impl Default for TextRenderOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 48.0,
            color: Color::white(),
            alignment: TextAlignment::Center,
        }
    }
}

/// A rendered text sprite and the point that lands on the watermark position.
#[derive(Debug, Clone)]
pub struct RenderedText {
    pub image: RgbaImage,
    pub anchor: Point,
}

impl RenderedText {
    /// Turn the sprite into a compositor layer.
    pub fn into_layer(self, position: Point, rotation_radians: f64, opacity: f32) -> WatermarkLayer {
        WatermarkLayer {
            image: Arc::new(self.image),
            anchor: self.anchor,
            scale: 1.0,
            position,
            rotation_radians,
            opacity,
        }
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
pub fn parse_hex_color(hex: &str) -> Result<Color> {
    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| StudioError::InvalidSettings(format!("Color must start with '#': {hex}")))?;

    let component = |s: &str| -> Result<u8> {
        u8::from_str_radix(s, 16)
            .map_err(|_| StudioError::InvalidSettings(format!("Invalid hex digit in color {hex}")))
    };

    match digits.len() {
        3 => {
            // Double each component: 0xF -> 0xFF, 0xA -> 0xAA
            let r = component(&digits[0..1])?;
            let g = component(&digits[1..2])?;
            let b = component(&digits[2..3])?;
            Ok(Color::new(r * 17, g * 17, b * 17))
        }
        6 => Ok(Color::new(
            component(&digits[0..2])?,
            component(&digits[2..4])?,
            component(&digits[4..6])?,
        )),
        n => Err(StudioError::InvalidSettings(format!(
            "Color must be #RGB or #RRGGBB format, got {} characters",
            n
        ))),
    }
}

/// Glyph scale for a CSS-style font size, where `font_size` is the em size.
fn em_scale(font: &FontArc, font_size: f32) -> PxScale {
    match font.units_per_em() {
        Some(units_per_em) if units_per_em > 0.0 => {
            PxScale::from(font_size * font.height_unscaled() / units_per_em)
        }
        _ => PxScale::from(font_size),
    }
}

/// Calculate the advance width and line height (ascent to descent) of
/// rendered text.
pub fn measure_text(font: &FontArc, text: &str, font_size: f32) -> (f32, f32) {
    let scaled_font = font.as_scaled(em_scale(font, font_size));

    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        // Add kerning if there's a previous glyph
        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }

        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    (width, scaled_font.ascent() - scaled_font.descent())
}

/// Render text to an RGBA sprite.
///
/// Returns `Ok(None)` for empty text or a size too small to produce pixels.
pub fn render_text(font: &FontArc, options: &TextRenderOptions) -> Result<Option<RenderedText>> {
    if options.text.is_empty() || !options.font_size.is_finite() || options.font_size <= 0.0 {
        return Ok(None);
    }

    let scale = em_scale(font, options.font_size);
    let scaled_font = font.as_scaled(scale);
    let (text_width, em_height) = measure_text(font, &options.text, options.font_size);

    let canvas_width = text_width.ceil() as u32 + PADDING * 2;
    let canvas_height = em_height.ceil() as u32 + PADDING * 2;
    let too_large = canvas_width > 65_535
        || canvas_height > 65_535
        || canvas_width as u64 * canvas_height as u64 > MAX_TEXT_SPRITE_PIXELS;
    if text_width <= 0.0 || too_large {
        return Err(StudioError::CanvasUnavailable {
            width: canvas_width,
            height: canvas_height,
            reason: format!("text sprite for '{}' is out of range", options.text),
        });
    }

    let mut image = RgbaImage::new(canvas_width, canvas_height);

    let origin_x = PADDING as f32;
    let baseline_y = PADDING as f32 + scaled_font.ascent();

    let mut cursor_x = origin_x;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in options.text.chars() {
        let glyph_id = scaled_font.glyph_id(c);

        if let Some(prev) = prev_glyph {
            cursor_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));

        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();

            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;

                if x >= 0 && y >= 0 && x < canvas_width as i32 && y < canvas_height as i32 {
                    let pixel_alpha = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                    let existing = image.get_pixel_mut(x as u32, y as u32);
                    // Overlapping glyph edges keep the strongest coverage
                    if pixel_alpha > existing[3] {
                        *existing =
                            Rgba([options.color.r, options.color.g, options.color.b, pixel_alpha]);
                    }
                }
            });
        }

        cursor_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    let anchor_x = match options.alignment {
        TextAlignment::Left => origin_x as f64,
        TextAlignment::Center => (origin_x + text_width / 2.0) as f64,
        TextAlignment::Right => (origin_x + text_width) as f64,
    };
    let anchor_y = PADDING as f64 + em_height as f64 / 2.0;

    Ok(Some(RenderedText {
        image,
        anchor: Point::new(anchor_x, anchor_y),
    }))
}
