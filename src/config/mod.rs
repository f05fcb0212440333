// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_COMPRESSION_LEVEL, DEFAULT_FONT_MANIFEST, DEFAULT_MAX_PIXELS,
    DEFAULT_WATERMARK_CACHE_ENTRIES, MAX_VIEWPORT_DIMENSION,
};
use crate::watermark::geometry::Viewport;
use crate::watermark::settings::WatermarkSettings;

pub mod logging;

pub use logging::{LogFormat, LoggingConfig};

/// A watermarking project: which photos, which fonts, which watermarks, and
/// where the archive goes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Preview viewport the watermark positions refer to
    #[serde(default)]
    pub viewport: Viewport,
    pub images: ImagesConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts: Option<FontsConfig>,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Watermarks placed on the first image and copied to every other one
    #[serde(default)]
    pub watermarks: Vec<WatermarkSettings>,
}

/// Where the photos come from: a folder scan or an explicit file list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
}

fn default_font_manifest() -> String {
    DEFAULT_FONT_MANIFEST.to_string()
}

/// Font directory and its manifest file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontsConfig {
    pub directory: PathBuf,
    #[serde(default = "default_font_manifest")]
    pub manifest: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_compression_level() -> i64 {
    DEFAULT_COMPRESSION_LEVEL
}

fn default_max_pixels() -> u64 {
    DEFAULT_MAX_PIXELS
}

fn default_watermark_cache_entries() -> u64 {
    DEFAULT_WATERMARK_CACHE_ENTRIES
}

/// Archive output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the dated archive is written into (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Deflate level, 0-9 (default: 6)
    #[serde(default = "default_compression_level")]
    pub compression_level: i64,
    /// Largest native canvas, in pixels, an image may have
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,
    /// Decoded watermark images kept in memory
    #[serde(default = "default_watermark_cache_entries")]
    pub watermark_cache_entries: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            compression_level: default_compression_level(),
            max_pixels: default_max_pixels(),
            watermark_cache_entries: default_watermark_cache_entries(),
        }
    }
}

impl ProjectConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            })
        });

        if let Some(var_name) = missing {
            return Err(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            ));
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    /// Load a project file. Relative paths inside it are taken relative to
    /// the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let mut config = Self::from_yaml_with_env(&yaml)?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Anchor every relative path at `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        if let Some(dir) = self.images.directory.as_mut() {
            anchor(dir);
        }
        self.images.files.iter_mut().for_each(anchor);
        if let Some(fonts) = self.fonts.as_mut() {
            anchor(&mut fonts.directory);
        }
        anchor(&mut self.export.output_dir);
        for watermark in &mut self.watermarks {
            if let Some(source) = watermark.image_source.as_mut() {
                anchor(source);
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.viewport.is_usable() {
            return Err(format!(
                "Viewport width and height must be positive and at most {}, got {}x{}",
                MAX_VIEWPORT_DIMENSION, self.viewport.width, self.viewport.height
            ));
        }

        match (&self.images.directory, self.images.files.is_empty()) {
            (Some(_), false) => {
                return Err("images: set either 'directory' or 'files', not both".to_string())
            }
            (None, true) => {
                return Err("images: one of 'directory' or 'files' is required".to_string())
            }
            _ => {}
        }

        if let Some(fonts) = &self.fonts {
            if fonts.manifest.is_empty() {
                return Err("fonts.manifest cannot be empty".to_string());
            }
        }

        if !(0..=9).contains(&self.export.compression_level) {
            return Err(format!(
                "export.compression_level must be between 0 and 9, got {}",
                self.export.compression_level
            ));
        }
        if self.export.max_pixels == 0 {
            return Err("export.max_pixels must be greater than 0".to_string());
        }
        if self.export.watermark_cache_entries == 0 {
            return Err("export.watermark_cache_entries must be greater than 0".to_string());
        }

        self.logging.validate()?;

        for (index, watermark) in self.watermarks.iter().enumerate() {
            watermark
                .validate()
                .map_err(|e| format!("watermarks[{}]: {}", index, e))?;
        }

        Ok(())
    }
}
