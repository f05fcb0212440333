// Test utilities shared by the integration tests

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use watermark_studio::watermark::FontLibrary;
use zip::ZipArchive;

/// Deterministic, non-uniform test photo.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 3 % 256) as u8, ((x + y) % 256) as u8, 255])
    })
}

pub fn write_png(path: &Path, image: &RgbaImage) {
    image.save_with_format(path, ImageFormat::Png).unwrap();
}

pub fn write_corrupt(path: &Path) {
    std::fs::write(path, b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();
}

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// A TrueType font installed on this machine, if any.
pub fn system_font_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("WATERMARK_STUDIO_TEST_FONT") {
        return Some(path.into());
    }
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// A font library with the system font registered as "Test Sans".
///
/// Goes through the manifest loader like a real project does.
pub async fn system_font_library(dir: &Path) -> Option<FontLibrary> {
    let font = system_font_path()?;
    std::fs::copy(font, dir.join("TestSans.ttf")).ok()?;
    std::fs::write(dir.join("fonts.json"), r#"["TestSans.ttf"]"#).ok()?;
    FontLibrary::load(dir, "fonts.json").await.ok()
}

/// Decoded image entries of an archive, keyed by entry path.
pub fn read_archive_images(path: &Path) -> Vec<(String, DynamicImage)> {
    let mut archive = ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    let mut images = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        let image = image::load(Cursor::new(data), ImageFormat::Png).unwrap();
        images.push((name, image));
    }

    images.sort_by(|a, b| a.0.cmp(&b.0));
    images
}
