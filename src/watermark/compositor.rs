//! Watermark compositor for blending watermarks onto images.
//!
//! Every watermark, text or image, ends up as a [`WatermarkLayer`]: an RGBA
//! sprite plus an anchor point inside it. Compositing a layer mirrors a 2D
//! canvas `save / globalAlpha / translate / rotate / draw / restore` sequence:
//! the anchor lands on `position`, the sprite is scaled and rotated around
//! it, and the layer opacity multiplies the sprite's own alpha. Layers never
//! share transform state.
//!
//! Scaling happens inside the inverse mapping, so an enlarged sprite is never
//! materialized: only target pixels under the layer are visited.
//!
//! # Example
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use watermark_studio::watermark::compositor::{blend_layer, WatermarkLayer};
//! use watermark_studio::watermark::geometry::Point;
//!
//! let mut photo = RgbaImage::from_pixel(800, 600, Rgba([0, 0, 0, 255]));
//! let logo = RgbaImage::from_pixel(64, 32, Rgba([255, 255, 255, 255]));
//! blend_layer(&mut photo, &WatermarkLayer::centered(logo, Point::new(400.0, 300.0), 0.0, 0.7));
//! assert_ne!(*photo.get_pixel(400, 300), Rgba([0, 0, 0, 255]));
//! ```

use super::geometry::Point;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// A watermark layer to be composited onto an image.
#[derive(Clone)]
pub struct WatermarkLayer {
    /// The watermark sprite, shared with the image cache where possible.
    pub image: Arc<RgbaImage>,
    /// Point inside the sprite (sprite pixels) that is placed on `position`.
    pub anchor: Point,
    /// Target pixels per sprite pixel.
    pub scale: f64,
    /// Target-space position of the anchor.
    pub position: Point,
    /// Clockwise rotation around the anchor.
    pub rotation_radians: f64,
    /// Opacity to apply (0.0 to 1.0). Applied on top of the sprite's alpha.
    pub opacity: f32,
}

impl WatermarkLayer {
    /// A layer whose sprite is centered on `position`.
    pub fn centered(
        image: impl Into<Arc<RgbaImage>>,
        position: Point,
        rotation_radians: f64,
        opacity: f32,
    ) -> Self {
        let image = image.into();
        let anchor = Point::new(image.width() as f64 / 2.0, image.height() as f64 / 2.0);
        Self {
            image,
            anchor,
            scale: 1.0,
            position,
            rotation_radians,
            opacity,
        }
    }

    /// Draw the sprite `scale` target pixels per sprite pixel.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Target-space width and height of the unrotated layer.
    pub fn footprint(&self) -> (f64, f64) {
        (
            self.image.width() as f64 * self.scale,
            self.image.height() as f64 * self.scale,
        )
    }
}

impl std::fmt::Debug for WatermarkLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkLayer")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("anchor", &self.anchor)
            .field("scale", &self.scale)
            .field("position", &self.position)
            .field("rotation_radians", &self.rotation_radians)
            .field("opacity", &self.opacity)
            .finish()
    }
}

/// Resample a sprite by a uniform factor.
///
/// Returns `None` when the result would have no pixels.
pub fn scale_sprite(sprite: &RgbaImage, scale: f64) -> Option<RgbaImage> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }

    let width = (sprite.width() as f64 * scale).round() as u32;
    let height = (sprite.height() as f64 * scale).round() as u32;
    if width == 0 || height == 0 {
        return None;
    }

    if width == sprite.width() && height == sprite.height() {
        return Some(sprite.clone());
    }

    Some(imageops::resize(sprite, width, height, FilterType::Triangle))
}

/// Blend a single watermark layer onto the target image.
pub fn blend_layer(target: &mut RgbaImage, layer: &WatermarkLayer) {
    let sprite_w = layer.image.width() as f64;
    let sprite_h = layer.image.height() as f64;
    let scale = layer.scale;
    if sprite_w == 0.0 || sprite_h == 0.0 || layer.opacity <= 0.0 {
        return;
    }
    if !scale.is_finite() || scale <= 0.0 {
        return;
    }

    let (sin, cos) = layer.rotation_radians.sin_cos();
    let (ax, ay) = (layer.anchor.x, layer.anchor.y);
    let (px, py) = (layer.position.x, layer.position.y);

    // Bounding box of the rotated sprite in target space
    let corners = [(0.0, 0.0), (sprite_w, 0.0), (0.0, sprite_h), (sprite_w, sprite_h)];
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for (cx, cy) in corners {
        let rx = (cx - ax) * scale;
        let ry = (cy - ay) * scale;
        let x = rx * cos - ry * sin + px;
        let y = rx * sin + ry * cos + py;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    let x_start = min_x.floor().max(0.0) as u32;
    let y_start = min_y.floor().max(0.0) as u32;
    let x_end = (max_x.ceil().max(0.0) as u32).min(target.width());
    let y_end = (max_y.ceil().max(0.0) as u32).min(target.height());

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            // Inverse-rotate and unscale the pixel center into sprite space
            let dx = tx as f64 + 0.5 - px;
            let dy = ty as f64 + 0.5 - py;
            let sx = (dx * cos + dy * sin) / scale + ax;
            let sy = (-dx * sin + dy * cos) / scale + ay;

            let sample = sample_bilinear(&layer.image, sx - 0.5, sy - 0.5);
            if sample[3] == 0 {
                continue;
            }

            let target_pixel = target.get_pixel_mut(tx, ty);
            *target_pixel = blend_pixels(*target_pixel, sample, layer.opacity);
        }
    }
}

/// Bilinear sample with transparent pixels outside the sprite.
///
/// Interpolates premultiplied color so transparent neighbours do not darken
/// the edges.
fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let fetch = |xi: i64, yi: i64| -> [f64; 4] {
        if xi < 0 || yi < 0 || xi >= image.width() as i64 || yi >= image.height() as i64 {
            return [0.0; 4];
        }
        let p = image.get_pixel(xi as u32, yi as u32);
        let a = p[3] as f64 / 255.0;
        [p[0] as f64 * a, p[1] as f64 * a, p[2] as f64 * a, p[3] as f64]
    };

    let weights = [
        ((x0, y0), (1.0 - fx) * (1.0 - fy)),
        ((x0 + 1, y0), fx * (1.0 - fy)),
        ((x0, y0 + 1), (1.0 - fx) * fy),
        ((x0 + 1, y0 + 1), fx * fy),
    ];

    let mut acc = [0.0f64; 4];
    for ((xi, yi), w) in weights {
        if w == 0.0 {
            continue;
        }
        let p = fetch(xi, yi);
        for c in 0..4 {
            acc[c] += p[c] * w;
        }
    }

    let alpha = acc[3];
    if alpha < 0.5 {
        return Rgba([0, 0, 0, 0]);
    }

    let unpremultiply = |c: f64| -> u8 { (c * 255.0 / alpha).round().clamp(0.0, 255.0) as u8 };
    Rgba([
        unpremultiply(acc[0]),
        unpremultiply(acc[1]),
        unpremultiply(acc[2]),
        alpha.round().clamp(0.0, 255.0) as u8,
    ])
}

/// Blend two pixels using alpha compositing with additional opacity.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    // Apply additional opacity to foreground alpha
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if fg_alpha <= 0.0 {
        return background;
    }
    let bg_alpha = background[3] as f32 / 255.0;

    // Porter-Duff "over" operator
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
