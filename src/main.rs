use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use watermark_studio::config::ProjectConfig;
use watermark_studio::export::TracingObserver;
use watermark_studio::watermark::{FontLibrary, WatermarkImageCache, WatermarkKind};
use watermark_studio::{ExportOptions, Studio, StudioError};

/// Watermark Studio - batch watermarking with a preview-faithful export
#[derive(Parser, Debug)]
#[command(name = "watermark-studio")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the project file
    #[arg(short, long, default_value = "watermark.yaml")]
    config: PathBuf,

    /// Directory to write the archive into (overrides export.output_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Render the first image's preview frame to this PNG instead of exporting
    #[arg(long)]
    preview: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load project configuration from file
    let mut config = ProjectConfig::from_file(&args.config)
        .map_err(StudioError::Config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    config.validate().map_err(StudioError::Config)?;

    if let Some(output) = args.output {
        config.export.output_dir = output;
    }

    watermark_studio::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    tracing::info!(
        config_file = %args.config.display(),
        viewport_width = config.viewport.width,
        viewport_height = config.viewport.height,
        watermarks = config.watermarks.len(),
        output_dir = %config.export.output_dir.display(),
        "Configuration loaded successfully"
    );

    if args.test {
        println!("configuration {} is valid", args.config.display());
        return Ok(());
    }

    let fonts = match &config.fonts {
        Some(fonts) => FontLibrary::load_or_empty(&fonts.directory, &fonts.manifest).await,
        None => FontLibrary::new(),
    };
    let has_text = config
        .watermarks
        .iter()
        .any(|wm| wm.kind == WatermarkKind::Text);
    if fonts.is_empty() && has_text {
        tracing::warn!("No fonts loaded; text watermarks will be skipped");
    }

    let mut studio = Studio::new(fonts, config.viewport)
        .with_export_options(ExportOptions {
            compression_level: config.export.compression_level,
            max_pixels: config.export.max_pixels,
        })
        .with_image_cache(WatermarkImageCache::new(
            config.export.watermark_cache_entries,
        ));

    match &config.images.directory {
        Some(dir) => studio.load_folder(dir).await?,
        None => studio.add_images(config.images.files.iter().cloned())?,
    };

    for watermark in &config.watermarks {
        studio.add_configured_watermark(watermark.clone())?;
    }
    if !config.watermarks.is_empty() && studio.images().len() > 1 {
        studio.batch_copy()?;
    }

    if let Some(path) = args.preview {
        let frame = studio.render_preview().await?;
        frame
            .save(&path)
            .with_context(|| format!("Failed to write preview {}", path.display()))?;
        tracing::info!(preview = %path.display(), "Preview frame written");
        return Ok(());
    }

    let report = studio
        .export_archive(
            &config.export.output_dir,
            chrono::Local::now().date_naive(),
            &mut TracingObserver,
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.failures.is_empty() {
        tracing::warn!(
            failed = report.failures.len(),
            total = report.total,
            "Some images were not exported"
        );
    }

    Ok(())
}
