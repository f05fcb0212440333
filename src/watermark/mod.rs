//! Watermark model and drawing primitives.
//!
//! This module holds everything both compositors share:
//!
//! - [`settings`]: the normalized per-watermark record
//! - [`geometry`]: the fit-to-viewport transform and its inverse
//! - [`compositor`]: layer blending with translate/rotate/opacity
//! - [`text_renderer`]: single-line text sprites with canvas-style anchors
//! - [`fonts`]: the font library loaded from a manifest
//! - [`image_source`]: image decoding and the watermark image cache
//! - [`painter`]: settings to layers, shared by preview and export
//!
//! # Coordinate convention
//!
//! Watermark `x`/`y` are percentages of the preview viewport. The preview
//! shows each photo fitted to 90% of that viewport and centered, so export
//! rebuilds the same fit per photo and maps viewport pixels back to native
//! pixels. Sizes go through the same inverse scale.

pub mod compositor;
pub mod fonts;
pub mod geometry;
pub mod image_source;
pub mod painter;
pub mod settings;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{blend_layer, scale_sprite, WatermarkLayer};
pub use fonts::{family_name_from_file, FontInfo, FontLibrary};
pub use geometry::{
    compute_fit, native_placement, preview_placement, to_normalized, to_viewport_point,
    FitTransform, ImageDimensions, Placement, Point, Viewport,
};
pub use image_source::{decode_image, is_supported_image, load_image, WatermarkImageCache};
pub use painter::{PaintSummary, WatermarkPainter};
pub use settings::{TextAlignment, WatermarkKind, WatermarkSettings};
pub use text_renderer::{parse_hex_color, render_text, Color, RenderedText, TextRenderOptions};
