// Batch export through the studio: failure isolation, archive layout,
// determinism and pixel preservation.

use super::test_harness::{gradient, read_archive_images, write_corrupt, write_png};
use chrono::NaiveDate;
use std::path::Path;
use watermark_studio::export::{ExportObserver, TracingObserver};
use watermark_studio::watermark::{FontLibrary, Viewport, WatermarkKind, WatermarkSettings};
use watermark_studio::{Studio, StudioError};

fn export_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

#[derive(Default)]
struct CountingObserver {
    progress: Vec<usize>,
    failures: Vec<String>,
}

impl ExportObserver for CountingObserver {
    fn on_progress(&mut self, processed: usize, _total: usize) {
        self.progress.push(processed);
    }

    fn on_item_failed(&mut self, name: &str, error: &StudioError) {
        assert!(matches!(error, StudioError::DecodeFailure { .. }));
        self.failures.push(name.to_string());
    }
}

async fn studio_for(dir: &Path) -> Studio {
    let mut studio = Studio::new(FontLibrary::new(), Viewport::new(800.0, 600.0));
    studio.load_folder(dir).await.unwrap();
    studio
}

#[tokio::test]
async fn test_second_image_corrupt_exports_other_two() {
    let photos = tempfile::tempdir().unwrap();
    write_png(&photos.path().join("1-first.png"), &gradient(120, 80));
    write_corrupt(&photos.path().join("2-second.png"));
    write_png(&photos.path().join("3-third.png"), &gradient(60, 90));

    let mut studio = studio_for(photos.path()).await;
    let out = tempfile::tempdir().unwrap();
    let mut observer = CountingObserver::default();

    let report = studio
        .export_archive(out.path(), export_date(), &mut observer)
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.processed, 3);
    assert_eq!(report.exported(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "2-second.png");
    assert_eq!(observer.progress, vec![1, 2, 3]);
    assert_eq!(observer.failures, vec!["2-second.png"]);

    let archive = out.path().join("watermarked-images-2024-06-15.zip");
    let images = read_archive_images(&archive);
    let names: Vec<&str> = images.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "watermarked-images-2024-06-15/1-first_watermarked.png",
            "watermarked-images-2024-06-15/3-third_watermarked.png",
        ]
    );
    // Native resolution is kept
    assert_eq!((images[0].1.width(), images[0].1.height()), (120, 80));
    assert_eq!((images[1].1.width(), images[1].1.height()), (60, 90));
}

#[tokio::test]
async fn test_zero_watermarks_exports_source_pixels() {
    let photos = tempfile::tempdir().unwrap();
    let source = gradient(97, 41);
    write_png(&photos.path().join("plain.png"), &source);

    let mut studio = studio_for(photos.path()).await;
    let out = tempfile::tempdir().unwrap();
    studio
        .export_archive(out.path(), export_date(), &mut TracingObserver)
        .await
        .unwrap();

    let images = read_archive_images(&out.path().join("watermarked-images-2024-06-15.zip"));
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].1.to_rgba8(), source);
}

#[tokio::test]
async fn test_export_twice_is_pixel_identical() {
    let photos = tempfile::tempdir().unwrap();
    write_png(&photos.path().join("a.png"), &gradient(300, 200));
    write_png(&photos.path().join("b.png"), &gradient(150, 400));
    // Kept outside the photo folder so it is not loaded as a photo
    let assets = tempfile::tempdir().unwrap();
    let logo = assets.path().join("logo.png");
    write_png(&logo, &gradient(30, 12));

    let mut studio = studio_for(photos.path()).await;
    studio.add_watermark(WatermarkKind::Image).unwrap();
    studio.bind_watermark_image(&logo).await.unwrap();
    studio
        .update_watermark(
            0,
            WatermarkSettings::image()
                .with_image_source(&logo)
                .with_rotation(33.0)
                .with_position(30.0, 60.0)
                .with_font_size(120.0)
                .with_opacity(0.8),
        )
        .unwrap();
    studio.batch_copy().unwrap();

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    studio
        .export_archive(first.path(), export_date(), &mut TracingObserver)
        .await
        .unwrap();
    studio
        .export_archive(second.path(), export_date(), &mut TracingObserver)
        .await
        .unwrap();

    let name = "watermarked-images-2024-06-15.zip";
    let a = read_archive_images(&first.path().join(name));
    let b = read_archive_images(&second.path().join(name));
    assert_eq!(a.len(), 2);
    for ((name_a, img_a), (name_b, img_b)) in a.iter().zip(b.iter()) {
        assert_eq!(name_a, name_b);
        assert_eq!(img_a.to_rgba8(), img_b.to_rgba8());
    }
    // The watermark actually changed the photos
    assert_ne!(a[0].1.to_rgba8(), gradient(300, 200));
}

#[tokio::test]
async fn test_batch_copy_survives_later_edits() {
    let photos = tempfile::tempdir().unwrap();
    for name in ["a.png", "b.png", "c.png"] {
        write_png(&photos.path().join(name), &gradient(10, 10));
    }

    let mut studio = studio_for(photos.path()).await;
    studio
        .add_configured_watermark(WatermarkSettings::text("original").with_rotation(10.0))
        .unwrap();
    studio.batch_copy().unwrap();

    // Edit the copy on the second image
    studio.navigate(1).unwrap();
    studio
        .update_watermark(0, WatermarkSettings::text("edited"))
        .unwrap();

    let ids: Vec<_> = studio.images().iter().map(|a| a.id).collect();
    assert_eq!(studio.watermarks_for(ids[0])[0].text, "original");
    assert_eq!(studio.watermarks_for(ids[0])[0].rotation, 10.0);
    assert_eq!(studio.watermarks_for(ids[1])[0].text, "edited");
    assert_eq!(studio.watermarks_for(ids[2])[0].text, "original");
}

#[tokio::test]
async fn test_duplicate_names_from_selection_are_numbered() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write_png(&first.path().join("photo.png"), &gradient(8, 8));
    write_png(&second.path().join("photo.png"), &gradient(9, 9));

    let mut studio = Studio::new(FontLibrary::new(), Viewport::default());
    studio
        .add_images([first.path().join("photo.png"), second.path().join("photo.png")])
        .unwrap();

    let out = tempfile::tempdir().unwrap();
    let report = studio
        .export_archive(out.path(), export_date(), &mut TracingObserver)
        .await
        .unwrap();
    assert_eq!(
        report.entries,
        vec!["photo_watermarked.png", "photo_watermarked-2.png"]
    );
}
