//! Image decoding and the watermark image cache.
//!
//! Photos and watermark images are plain files on disk. Reading suspends the
//! current task; decoding happens inline on the same task.
//!
//! # Caching
//!
//! Batch exports usually stamp the same logo on every photo, so decoded
//! watermark images are cached as RGBA keyed by path. A failed decode is not
//! cached and is retried on the next request.

use crate::constants::DEFAULT_WATERMARK_CACHE_ENTRIES;
use crate::error::{Result, StudioError};
use image::{DynamicImage, ImageFormat, RgbaImage};
use moka::future::Cache;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Formats the studio accepts as photos or watermark images.
pub const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Whether a path looks like a supported image by its extension.
pub fn is_supported_image(path: &Path) -> bool {
    ImageFormat::from_path(path)
        .map(|format| SUPPORTED_FORMATS.contains(&format))
        .unwrap_or(false)
}

/// Detect image format from bytes or filename extension.
pub fn detect_image_format(data: &[u8], name: &str) -> Result<ImageFormat> {
    // Try to detect from magic bytes first
    if let Ok(format) = image::guess_format(data) {
        return Ok(format);
    }

    // Fall back to extension
    ImageFormat::from_path(name)
        .ok()
        .filter(|format| SUPPORTED_FORMATS.contains(format))
        .ok_or_else(|| StudioError::decode(name, "unsupported image format"))
}

/// Decode an in-memory image.
pub fn decode_image(data: &[u8], name: &str) -> Result<DynamicImage> {
    let format = detect_image_format(data, name)?;
    image::load(Cursor::new(data), format).map_err(|e| StudioError::decode(name, e))
}

/// Read and decode an image file.
pub async fn load_image(path: &Path) -> Result<DynamicImage> {
    let name = path.display().to_string();
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| StudioError::decode(name.clone(), e))?;
    decode_image(&data, &name)
}

/// Decoded watermark image shared between watermarks and images.
#[derive(Clone)]
pub struct CachedImage {
    pub image: Arc<RgbaImage>,
}

impl std::fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedImage")
            .field("dimensions", &self.image.dimensions())
            .finish()
    }
}

impl CachedImage {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }
}

/// Cache of decoded watermark images keyed by source path.
#[derive(Clone)]
pub struct WatermarkImageCache {
    cache: Cache<PathBuf, CachedImage>,
}

impl Default for WatermarkImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_WATERMARK_CACHE_ENTRIES)
    }
}

impl WatermarkImageCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    /// Fetch a decoded watermark image, decoding it on first use.
    pub async fn fetch(&self, source: &Path) -> Result<CachedImage> {
        if let Some(cached) = self.cache.get(source).await {
            return Ok(cached);
        }

        let image = load_image(source).await?;
        let cached = CachedImage::new(image.to_rgba8());
        self.cache.insert(source.to_path_buf(), cached.clone()).await;

        tracing::debug!(
            source = %source.display(),
            width = cached.image.width(),
            height = cached.image.height(),
            "Watermark image decoded"
        );

        Ok(cached)
    }

    /// Check if an image is cached.
    pub async fn is_cached(&self, source: &Path) -> bool {
        self.cache.get(source).await.is_some()
    }

    /// Drop the cached decode of one source so the next fetch rereads it.
    pub async fn invalidate(&self, source: &Path) {
        self.cache.invalidate(source).await;
    }

    /// Clear all cached images.
    pub async fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
