//! Watermark settings records.
//!
//! A [`WatermarkSettings`] is the value type the editor produces for every
//! placed watermark. Position, opacity and rotation are always normalized so
//! the same record is valid on images of any native resolution:
//! - `x`, `y` are percentages (0-100) of the preview viewport
//! - `opacity` is a fraction (0-1)
//! - `rotation` is in degrees (-180 to 180)
//!
//! For image watermarks `font_size` doubles as a percentage scale factor.

use crate::constants::{
    DEFAULT_COLOR, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_OPACITY,
    DEFAULT_WATERMARK_TEXT, MAX_FONT_SIZE, MAX_IMAGE_SCALE_PERCENT, MIN_FONT_SIZE,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_text() -> String {
    DEFAULT_WATERMARK_TEXT.to_string()
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_opacity() -> f64 {
    DEFAULT_OPACITY
}

fn default_center() -> f64 {
    50.0
}

/// Which kind of watermark a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkKind {
    Text,
    Image,
}

/// Horizontal anchoring of text relative to its position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    /// Text starts at the anchor
    Left,
    /// Text is centered on the anchor
    #[default]
    Center,
    /// Text ends at the anchor
    Right,
}

/// Settings for one placed watermark.
///
/// ```yaml
/// - type: text
///   text: "© Studio"
///   font_size: 48
///   x: 50
///   y: 90
/// - type: image
///   image_source: ./logo.png
///   font_size: 25   # percent
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSettings {
    #[serde(rename = "type")]
    pub kind: WatermarkKind,

    /// Text content (text watermarks)
    #[serde(default = "default_text")]
    pub text: String,

    /// Registered font family name (text watermarks)
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Text size in viewport pixels, or image scale in percent
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    /// Text color as hex string
    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub alignment: TextAlignment,

    /// Path of the watermark image (image watermarks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_source: Option<PathBuf>,

    /// Display label of the watermark image, usually its file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_label: Option<String>,

    /// Opacity from 0.0 (transparent) to 1.0 (opaque)
    #[serde(default = "default_opacity")]
    pub opacity: f64,

    /// Rotation in degrees, clockwise
    #[serde(default)]
    pub rotation: f64,

    /// Horizontal center as a percentage of the viewport width
    #[serde(default = "default_center")]
    pub x: f64,

    /// Vertical center as a percentage of the viewport height
    #[serde(default = "default_center")]
    pub y: f64,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self::text(DEFAULT_WATERMARK_TEXT)
    }
}

impl WatermarkSettings {
    /// A centered text watermark with default styling.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: WatermarkKind::Text,
            text: text.into(),
            font_family: default_font_family(),
            font_size: DEFAULT_FONT_SIZE,
            color: default_color(),
            alignment: TextAlignment::Center,
            image_source: None,
            image_label: None,
            opacity: DEFAULT_OPACITY,
            rotation: 0.0,
            x: 50.0,
            y: 50.0,
        }
    }

    /// A centered image watermark with no source bound yet.
    pub fn image() -> Self {
        Self {
            kind: WatermarkKind::Image,
            text: String::new(),
            ..Self::text("")
        }
    }

    /// A fresh record of the given kind, as the editor's "add" action creates.
    pub fn new(kind: WatermarkKind) -> Self {
        match kind {
            WatermarkKind::Text => Self::default(),
            WatermarkKind::Image => Self::image(),
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_alignment(mut self, alignment: TextAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    /// Bind an image source, replacing any previous one.
    pub fn with_image_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.bind_image_source(source);
        self
    }

    /// Replace the image source and derive the label from its file name.
    pub fn bind_image_source(&mut self, source: impl Into<PathBuf>) {
        let source = source.into();
        self.image_label = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.image_source = Some(source);
    }

    /// Image watermark scale as a plain factor (`font_size` percent / 100).
    pub fn image_scale(&self) -> f64 {
        self.font_size / 100.0
    }

    /// Valid range of `font_size` for this kind.
    pub fn size_range(&self) -> std::ops::RangeInclusive<f64> {
        match self.kind {
            WatermarkKind::Text => MIN_FONT_SIZE..=MAX_FONT_SIZE,
            WatermarkKind::Image => 0.0..=MAX_IMAGE_SCALE_PERCENT,
        }
    }

    /// Validate the record's normalized ranges and per-kind fields.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value, range) in [
            ("x", self.x, 0.0..=100.0),
            ("y", self.y, 0.0..=100.0),
            ("opacity", self.opacity, 0.0..=1.0),
            ("rotation", self.rotation, -180.0..=180.0),
        ] {
            // Check for NaN/Infinity and valid range
            if !value.is_finite() || !range.contains(&value) {
                return Err(format!(
                    "Watermark {} must be a finite value between {} and {}, got {}",
                    name,
                    range.start(),
                    range.end(),
                    value
                ));
            }
        }

        let size_range = self.size_range();
        if !self.font_size.is_finite() || !size_range.contains(&self.font_size) {
            return Err(format!(
                "Watermark font_size must be between {} and {} for {:?} watermarks, got {}",
                size_range.start(),
                size_range.end(),
                self.kind,
                self.font_size
            ));
        }

        match self.kind {
            WatermarkKind::Text => {
                if self.text.is_empty() {
                    return Err("Text watermark 'text' field cannot be empty".to_string());
                }
                validate_hex_color(&self.color)
            }
            WatermarkKind::Image => Ok(()),
        }
    }
}

/// Validate hex color format (#RGB or #RRGGBB).
fn validate_hex_color(color: &str) -> Result<(), String> {
    if let Some(hex_part) = color.strip_prefix('#') {
        let len = hex_part.len();
        if (len != 3 && len != 6) || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!(
                "Text watermark color must be in #RGB or #RRGGBB format with valid hex characters, got '{}'",
                color
            ));
        }
        Ok(())
    } else {
        Err(format!(
            "Text watermark color must be a hex string starting with '#', got '{}'",
            color
        ))
    }
}
