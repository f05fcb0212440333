//! Studio orchestrator.
//!
//! Owns the loaded batch, the per-image watermark assignment and the editing
//! state (current image, active watermark). All mutating actions are refused
//! with [`StudioError::ExportInProgress`] while an export runs.

use crate::assets::{from_selection, scan_directory, ImageAsset};
use crate::constants::{DEFAULT_COMPRESSION_LEVEL, DEFAULT_MAX_PIXELS};
use crate::error::{Result, StudioError};
use crate::export::{BatchExporter, ExportCompositor, ExportItem, ExportObserver, ExportReport};
use crate::preview::{Manipulation, PreviewCompositor, PreviewLayout};
use crate::watermark::fonts::{FontInfo, FontLibrary};
use crate::watermark::geometry::Viewport;
use crate::watermark::image_source::{is_supported_image, WatermarkImageCache};
use crate::watermark::painter::WatermarkPainter;
use crate::watermark::settings::{WatermarkKind, WatermarkSettings};
use chrono::NaiveDate;
use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Export tuning carried by the studio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub compression_level: i64,
    pub max_pixels: u64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

pub struct Studio {
    images: Vec<ImageAsset>,
    current: Option<usize>,
    assignments: HashMap<Uuid, Vec<WatermarkSettings>>,
    selected: Option<usize>,
    exporting: bool,
    fonts: FontLibrary,
    image_cache: WatermarkImageCache,
    preview: PreviewCompositor,
    export_options: ExportOptions,
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("images", &self.images.len())
            .field("current", &self.current)
            .field("selected", &self.selected)
            .field("exporting", &self.exporting)
            .field("viewport", &self.preview.viewport())
            .finish()
    }
}

impl Studio {
    pub fn new(fonts: FontLibrary, viewport: Viewport) -> Self {
        Self {
            images: Vec::new(),
            current: None,
            assignments: HashMap::new(),
            selected: None,
            exporting: false,
            fonts,
            image_cache: WatermarkImageCache::default(),
            preview: PreviewCompositor::new(viewport),
            export_options: ExportOptions::default(),
        }
    }

    pub fn with_export_options(mut self, options: ExportOptions) -> Self {
        self.export_options = options;
        self
    }

    pub fn with_image_cache(mut self, cache: WatermarkImageCache) -> Self {
        self.image_cache = cache;
        self
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.exporting {
            return Err(StudioError::ExportInProgress);
        }
        Ok(())
    }

    // --- accessors ---

    pub fn images(&self) -> &[ImageAsset] {
        &self.images
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_image(&self) -> Option<&ImageAsset> {
        self.images.get(self.current?)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn available_fonts(&self) -> &[FontInfo] {
        self.fonts.available()
    }

    pub fn viewport(&self) -> Viewport {
        self.preview.viewport()
    }

    /// Watermarks assigned to an image, back to front.
    pub fn watermarks_for(&self, id: Uuid) -> &[WatermarkSettings] {
        self.assignments.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn current_watermarks(&self) -> &[WatermarkSettings] {
        self.current_image()
            .map(|asset| self.watermarks_for(asset.id))
            .unwrap_or(&[])
    }

    fn current_id(&self) -> Result<Uuid> {
        self.current_image()
            .map(|asset| asset.id)
            .ok_or_else(|| StudioError::NoSelection("no image loaded".to_string()))
    }

    fn current_list_mut(&mut self) -> Result<&mut Vec<WatermarkSettings>> {
        let id = self.current_id()?;
        Ok(self.assignments.entry(id).or_default())
    }

    fn watermark_mut(&mut self, index: usize) -> Result<&mut WatermarkSettings> {
        self.current_list_mut()?
            .get_mut(index)
            .ok_or_else(|| StudioError::NoSelection(format!("no watermark at index {}", index)))
    }

    // --- image input ---

    /// Replace the batch with the images in `dir`.
    ///
    /// Assignments are reset; the first image becomes current.
    pub async fn load_folder(&mut self, dir: &Path) -> Result<usize> {
        self.ensure_idle()?;
        let assets = scan_directory(dir).await?;

        self.assignments = assets
            .iter()
            .map(|asset| (asset.id, Vec::new()))
            .collect();
        self.images = assets;
        self.current = Some(0);
        self.selected = None;

        Ok(self.images.len())
    }

    /// Append a free selection of files to the batch.
    pub fn add_images<I, P>(&mut self, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.ensure_idle()?;
        let assets = from_selection(paths)?;
        let added = assets.len();

        for asset in assets {
            self.assignments.insert(asset.id, Vec::new());
            self.images.push(asset);
        }
        if self.current.is_none() {
            self.current = Some(0);
        }

        tracing::info!(added, total = self.images.len(), "Images added");
        Ok(added)
    }

    // --- navigation ---

    /// Make image `index` current and clear the active watermark.
    pub fn navigate(&mut self, index: usize) -> Result<()> {
        self.ensure_idle()?;
        if index >= self.images.len() {
            return Err(StudioError::NoSelection(format!(
                "image index {} out of range ({} images)",
                index,
                self.images.len()
            )));
        }
        self.current = Some(index);
        self.selected = None;
        Ok(())
    }

    /// Move to the next image. Returns false at the end of the batch.
    pub fn next(&mut self) -> Result<bool> {
        match self.current {
            Some(index) if index + 1 < self.images.len() => {
                self.navigate(index + 1)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Move to the previous image. Returns false at the start of the batch.
    pub fn previous(&mut self) -> Result<bool> {
        match self.current {
            Some(index) if index > 0 => {
                self.navigate(index - 1)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // --- watermark editing ---

    /// Add a fresh watermark of `kind` to the current image and make it active.
    pub fn add_watermark(&mut self, kind: WatermarkKind) -> Result<usize> {
        self.add_configured_watermark(WatermarkSettings::new(kind))
    }

    /// Add a fully specified watermark to the current image and make it active.
    pub fn add_configured_watermark(&mut self, settings: WatermarkSettings) -> Result<usize> {
        self.ensure_idle()?;
        settings.validate().map_err(StudioError::InvalidSettings)?;

        let list = self.current_list_mut()?;
        list.push(settings);
        let index = list.len() - 1;
        self.selected = Some(index);
        Ok(index)
    }

    /// Set the active watermark on the current image.
    pub fn select_watermark(&mut self, index: Option<usize>) -> Result<()> {
        self.ensure_idle()?;
        if let Some(index) = index {
            if index >= self.current_watermarks().len() {
                return Err(StudioError::NoSelection(format!(
                    "no watermark at index {}",
                    index
                )));
            }
        }
        self.selected = index;
        Ok(())
    }

    /// Replace a watermark of the current image in place.
    pub fn update_watermark(&mut self, index: usize, settings: WatermarkSettings) -> Result<()> {
        self.ensure_idle()?;
        settings.validate().map_err(StudioError::InvalidSettings)?;
        *self.watermark_mut(index)? = settings;
        Ok(())
    }

    /// Fold a finished drag/rotate/resize gesture into a watermark.
    pub fn apply_manipulation(&mut self, index: usize, manipulation: Manipulation) -> Result<()> {
        self.ensure_idle()?;
        let preview = self.preview;
        let watermark = self.watermark_mut(index)?;
        preview
            .manipulation_end(watermark, manipulation)
            .apply_to(watermark);
        self.selected = Some(index);
        Ok(())
    }

    /// Remove a watermark from the current image.
    pub fn delete_watermark(&mut self, index: usize) -> Result<WatermarkSettings> {
        self.ensure_idle()?;
        let list = self.current_list_mut()?;
        if index >= list.len() {
            return Err(StudioError::NoSelection(format!(
                "no watermark at index {}",
                index
            )));
        }
        let removed = list.remove(index);

        self.selected = match self.selected {
            Some(selected) if selected == index => None,
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };
        Ok(removed)
    }

    /// Copy the current image's watermarks onto every other image.
    ///
    /// Each image gets its own copies; later edits do not propagate.
    pub fn batch_copy(&mut self) -> Result<usize> {
        self.ensure_idle()?;
        let source_id = self.current_id()?;
        let source = self.watermarks_for(source_id).to_vec();
        if source.is_empty() {
            return Err(StudioError::NoSelection(
                "the current image has no watermarks to copy".to_string(),
            ));
        }

        let mut copied = 0;
        for asset in &self.images {
            if asset.id != source_id {
                self.assignments.insert(asset.id, source.clone());
                copied += 1;
            }
        }

        tracing::info!(watermarks = source.len(), images = copied, "Watermarks copied to batch");
        Ok(copied)
    }

    /// Bind an image file to the active image watermark.
    pub async fn bind_watermark_image(&mut self, source: &Path) -> Result<()> {
        self.ensure_idle()?;
        let index = self
            .selected
            .ok_or_else(|| StudioError::NoSelection("no active watermark".to_string()))?;

        if self.current_watermarks().get(index).map(|wm| wm.kind) != Some(WatermarkKind::Image) {
            return Err(StudioError::InvalidSettings(
                "the active watermark is not an image watermark".to_string(),
            ));
        }
        if !is_supported_image(source) {
            return Err(StudioError::decode(
                source.display().to_string(),
                "unsupported image format",
            ));
        }

        // The file may have changed on disk since it was last decoded
        self.image_cache.invalidate(source).await;
        self.image_cache.fetch(source).await?;
        self.watermark_mut(index)?.bind_image_source(source);
        Ok(())
    }

    // --- preview ---

    /// Track a change of the preview container size.
    pub fn resize_viewport(&mut self, viewport: Viewport) -> bool {
        self.preview.resize(viewport)
    }

    /// Layout of the current image and its watermarks.
    ///
    /// Decodes the current image on first use to learn its native size.
    pub async fn preview_layout(&mut self) -> Result<PreviewLayout> {
        let index = self
            .current
            .ok_or_else(|| StudioError::NoSelection("no image loaded".to_string()))?;

        let dims = match self.images[index].dimensions() {
            Some(dims) => dims,
            None => {
                self.images[index].decode().await?;
                self.images[index]
                    .dimensions()
                    .ok_or_else(|| StudioError::decode(&self.images[index].name, "no dimensions"))?
            }
        };

        Ok(self
            .preview
            .layout(dims, self.current_watermarks(), self.selected))
    }

    /// Rasterize the current preview frame.
    pub async fn render_preview(&self) -> Result<RgbaImage> {
        let asset = self
            .current_image()
            .ok_or_else(|| StudioError::NoSelection("no image loaded".to_string()))?;
        let image = asset.decode_detached().await?;
        let painter = WatermarkPainter::new(&self.fonts, &self.image_cache);

        let (frame, _) = self
            .preview
            .render_frame(&image, self.watermarks_for(asset.id), &painter)
            .await?;
        Ok(frame)
    }

    // --- export ---

    /// Raise the export flag. Fails if an export is already running.
    pub fn begin_export(&mut self) -> Result<()> {
        self.ensure_idle()?;
        if self.images.is_empty() {
            return Err(StudioError::NoImagesFound("studio".to_string()));
        }
        self.exporting = true;
        Ok(())
    }

    /// Lower the export flag.
    pub fn end_export(&mut self) {
        self.exporting = false;
    }

    /// Export the whole batch; requires [`Studio::begin_export`].
    pub async fn run_export(
        &self,
        output_dir: &Path,
        date: NaiveDate,
        observer: &mut dyn ExportObserver,
    ) -> Result<ExportReport> {
        if !self.exporting {
            return Err(StudioError::NoSelection("export was not started".to_string()));
        }

        let items: Vec<ExportItem> = self
            .images
            .iter()
            .map(|asset| ExportItem {
                asset,
                watermarks: self.watermarks_for(asset.id),
            })
            .collect();

        let compositor = ExportCompositor::new(self.preview.viewport())
            .with_max_pixels(self.export_options.max_pixels);
        let exporter = BatchExporter::new(
            compositor,
            WatermarkPainter::new(&self.fonts, &self.image_cache),
            self.export_options.compression_level,
        );

        exporter
            .export_to_path(&items, output_dir, date, observer)
            .await
    }

    /// Export the whole batch into `output_dir`, holding the export flag
    /// for the duration.
    pub async fn export_archive(
        &mut self,
        output_dir: &Path,
        date: NaiveDate,
        observer: &mut dyn ExportObserver,
    ) -> Result<ExportReport> {
        self.begin_export()?;
        let result = self.run_export(output_dir, date, observer).await;
        self.end_export();
        result
    }
}
