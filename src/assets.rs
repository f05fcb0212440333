//! Photos loaded into the studio.
//!
//! An [`ImageAsset`] is created for every accepted file with a fresh
//! identifier. Native dimensions are unknown until the file is decoded.

use crate::error::{Result, StudioError};
use crate::watermark::geometry::ImageDimensions;
use crate::watermark::image_source::{is_supported_image, load_image};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A photo in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub id: Uuid,
    /// Pixel source on disk
    pub path: PathBuf,
    /// Display name (the file name)
    pub name: String,
    dimensions: Option<ImageDimensions>,
}

impl ImageAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            id: Uuid::new_v4(),
            path,
            name,
            dimensions: None,
        }
    }

    /// Native size, once the asset has been decoded.
    pub fn dimensions(&self) -> Option<ImageDimensions> {
        self.dimensions
    }

    /// Decode the pixel source and remember its native size.
    pub async fn decode(&mut self) -> Result<DynamicImage> {
        let image = self.decode_detached().await?;
        self.dimensions = Some(ImageDimensions::new(image.width(), image.height()));
        Ok(image)
    }

    /// Decode without touching the stored dimensions.
    pub async fn decode_detached(&self) -> Result<DynamicImage> {
        load_image(&self.path).await.map_err(|e| match e {
            StudioError::DecodeFailure { message, .. } => StudioError::decode(&self.name, message),
            other => other,
        })
    }

    /// File name without its last extension.
    pub fn base_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((base, _)) if !base.is_empty() => base,
            _ => &self.name,
        }
    }
}

/// Assets for every supported image directly inside `dir`, sorted by name.
pub async fn scan_directory(dir: &Path) -> Result<Vec<ImageAsset>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_supported_image(&path) {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(StudioError::NoImagesFound(dir.display().to_string()));
    }

    paths.sort();
    tracing::info!(directory = %dir.display(), images = paths.len(), "Scanned image folder");

    Ok(paths.into_iter().map(ImageAsset::new).collect())
}

/// Assets for the supported images in a free selection, in selection order.
pub fn from_selection<I, P>(paths: I) -> Result<Vec<ImageAsset>>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let assets: Vec<ImageAsset> = paths
        .into_iter()
        .map(Into::<PathBuf>::into)
        .filter(|path| {
            let keep = is_supported_image(path);
            if !keep {
                tracing::debug!(path = %path.display(), "Ignoring non-image file");
            }
            keep
        })
        .map(ImageAsset::new)
        .collect();

    if assets.is_empty() {
        return Err(StudioError::NoImagesFound("selection".to_string()));
    }

    Ok(assets)
}
