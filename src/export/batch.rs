//! Sequential batch export into a single archive.
//!
//! Images are decoded, rendered, encoded and written one at a time, so at
//! most one native raster is alive. A failure on one image is reported to
//! the observer and the batch moves on; only archive failures stop it.

use super::archive::{archive_file_name, archive_stem, ArchiveWriter};
use super::renderer::{encode_png, ExportCompositor};
use crate::assets::ImageAsset;
use crate::error::{Result, StudioError};
use crate::watermark::painter::WatermarkPainter;
use crate::watermark::settings::WatermarkSettings;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

/// Receives export notifications.
pub trait ExportObserver {
    /// Called after every image, successful or not. `processed` only grows.
    fn on_progress(&mut self, processed: usize, total: usize);

    /// Called when one image could not be exported.
    fn on_item_failed(&mut self, name: &str, error: &StudioError);
}

/// Observer that logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExportObserver for TracingObserver {
    fn on_progress(&mut self, processed: usize, total: usize) {
        tracing::info!(processed, total, "Export progress");
    }

    fn on_item_failed(&mut self, name: &str, error: &StudioError) {
        tracing::warn!(image = %name, error = %error, "Image skipped during export");
    }
}

/// One image and the watermarks assigned to it.
#[derive(Debug, Clone, Copy)]
pub struct ExportItem<'a> {
    pub asset: &'a ImageAsset,
    pub watermarks: &'a [WatermarkSettings],
}

/// An image that was left out of the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFailure {
    pub name: String,
    pub message: String,
}

/// Outcome of a batch export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub processed: usize,
    pub total: usize,
    pub failures: Vec<ExportFailure>,
    /// Entry file names inside the archive folder
    pub entries: Vec<String>,
    pub archive_path: Option<PathBuf>,
}

impl ExportReport {
    pub fn exported(&self) -> usize {
        self.entries.len()
    }
}

/// Drives the export compositor over a batch.
pub struct BatchExporter<'a> {
    compositor: ExportCompositor,
    painter: WatermarkPainter<'a>,
    compression_level: i64,
}

impl<'a> BatchExporter<'a> {
    pub fn new(
        compositor: ExportCompositor,
        painter: WatermarkPainter<'a>,
        compression_level: i64,
    ) -> Self {
        Self {
            compositor,
            painter,
            compression_level,
        }
    }

    /// Render one image to PNG bytes.
    async fn export_item(&self, item: &ExportItem<'_>) -> Result<Vec<u8>> {
        let image = item.asset.decode_detached().await?;
        let (canvas, _) = self
            .compositor
            .render(&image, item.watermarks, &self.painter)
            .await?;
        encode_png(&canvas, &item.asset.name)
    }

    /// Export every item into a zip written to `writer`.
    pub async fn export<W: Write + Seek>(
        &self,
        items: &[ExportItem<'_>],
        writer: W,
        folder: &str,
        observer: &mut dyn ExportObserver,
    ) -> Result<(W, ExportReport)> {
        if items.is_empty() {
            return Err(StudioError::NoImagesFound("export batch".to_string()));
        }

        let total = items.len();
        let mut archive = ArchiveWriter::new(writer, folder, self.compression_level)?;
        let mut report = ExportReport {
            total,
            ..Default::default()
        };

        tracing::info!(total, folder = %folder, "Starting batch export");

        for item in items {
            match self.export_item(item).await {
                Ok(png) => {
                    archive.add_png(item.asset.base_name(), &png)?;
                }
                Err(e) if e.is_fatal_for_batch() => return Err(e),
                Err(e) => {
                    observer.on_item_failed(&item.asset.name, &e);
                    report.failures.push(ExportFailure {
                        name: item.asset.name.clone(),
                        message: e.to_string(),
                    });
                }
            }

            report.processed += 1;
            observer.on_progress(report.processed, total);
        }

        let (writer, entries) = archive.finish()?;
        report.entries = entries;

        tracing::info!(
            exported = report.exported(),
            failed = report.failures.len(),
            total,
            "Batch export finished"
        );

        Ok((writer, report))
    }

    /// Export into `watermarked-images-{date}.zip` inside `output_dir`.
    pub async fn export_to_path(
        &self,
        items: &[ExportItem<'_>],
        output_dir: &Path,
        date: NaiveDate,
        observer: &mut dyn ExportObserver,
    ) -> Result<ExportReport> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| archive_error(output_dir, e))?;

        let path = output_dir.join(archive_file_name(date));
        let file = std::fs::File::create(&path).map_err(|e| archive_error(&path, e))?;

        let written = async {
            let (writer, report) = self
                .export(items, BufWriter::new(file), &archive_stem(date), observer)
                .await?;
            writer
                .into_inner()
                .map_err(|e| archive_error(&path, e.error()))?
                .sync_all()
                .map_err(|e| archive_error(&path, e))?;
            Ok::<_, StudioError>(report)
        }
        .await;

        match written {
            Ok(mut report) => {
                tracing::info!(archive = %path.display(), "Archive written");
                report.archive_path = Some(path);
                Ok(report)
            }
            Err(e) => {
                // No partial archive is left behind
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(
                        archive = %path.display(),
                        error = %remove_err,
                        "Could not remove incomplete archive"
                    );
                }
                Err(e)
            }
        }
    }
}

fn archive_error(path: &Path, error: impl std::fmt::Display) -> StudioError {
    StudioError::ArchiveCreationFailure(format!("{}: {}", path.display(), error))
}
