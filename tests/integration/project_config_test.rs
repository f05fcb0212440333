// Project files drive a full export the way the CLI runs it.

use super::test_harness::{gradient, read_archive_images, write_png};
use chrono::NaiveDate;
use std::io::Write;
use watermark_studio::config::ProjectConfig;
use watermark_studio::export::TracingObserver;
use watermark_studio::watermark::{FontLibrary, WatermarkImageCache, WatermarkKind};
use watermark_studio::{ExportOptions, Studio};

#[tokio::test]
async fn test_project_file_exports_every_photo() {
    let project = tempfile::tempdir().unwrap();
    let photos = project.path().join("photos");
    std::fs::create_dir(&photos).unwrap();
    write_png(&photos.join("one.png"), &gradient(200, 100));
    write_png(&photos.join("two.png"), &gradient(100, 200));
    write_png(&project.path().join("logo.png"), &gradient(16, 16));

    let config_path = project.path().join("watermark.yaml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    file.write_all(
        br#"
viewport:
  width: 640
  height: 480
images:
  directory: photos
export:
  output_dir: out
  compression_level: 1
watermarks:
  - type: image
    image_source: logo.png
    font_size: 100
    x: 80
    y: 80
    opacity: 0.5
"#,
    )
    .unwrap();
    drop(file);

    let config = ProjectConfig::from_file(&config_path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.export.output_dir, project.path().join("out"));

    let mut studio = Studio::new(FontLibrary::new(), config.viewport)
        .with_export_options(ExportOptions {
            compression_level: config.export.compression_level,
            max_pixels: config.export.max_pixels,
        })
        .with_image_cache(WatermarkImageCache::new(config.export.watermark_cache_entries));
    studio
        .load_folder(config.images.directory.as_ref().unwrap())
        .await
        .unwrap();
    for watermark in &config.watermarks {
        studio.add_configured_watermark(watermark.clone()).unwrap();
    }
    studio.batch_copy().unwrap();

    for asset in studio.images() {
        let watermarks = studio.watermarks_for(asset.id);
        assert_eq!(watermarks.len(), 1);
        assert_eq!(watermarks[0].kind, WatermarkKind::Image);
    }

    let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
    let report = studio
        .export_archive(&config.export.output_dir, date, &mut TracingObserver)
        .await
        .unwrap();
    assert_eq!(report.exported(), 2);
    assert!(report.failures.is_empty());

    let images = read_archive_images(
        &project
            .path()
            .join("out")
            .join("watermarked-images-2025-01-31.zip"),
    );
    assert_eq!(images.len(), 2);
    assert_ne!(images[0].1.to_rgba8(), gradient(200, 100));
}

#[test]
fn test_invalid_watermark_in_project_is_rejected() {
    let yaml = r#"
images:
  files: [a.png]
watermarks:
  - type: text
    text: ""
"#;
    let config = ProjectConfig::from_yaml_with_env(yaml).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.contains("watermarks[0]"));
}
