//! Font library loaded from a font manifest.
//!
//! The manifest is a JSON array of font file names living next to it:
//!
//! ```json
//! ["Montserrat-mOBm.ttf", "PlayfairDisplay.otf", "BebasNeueDemo.ttf"]
//! ```
//!
//! Each file is parsed and registered under a family name derived from its
//! file name before it shows up in [`FontLibrary::available`]. A font that
//! fails to load is logged and skipped; it never blocks the others.

use crate::error::{Result, StudioError};
use ab_glyph::FontArc;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// A registered, usable font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontInfo {
    /// Display name (same as family)
    pub name: String,
    /// Family name watermarks refer to
    pub family: String,
    /// Source file name from the manifest
    pub file: String,
}

/// Registered fonts keyed by family, plus the ordered capability list.
#[derive(Clone, Default)]
pub struct FontLibrary {
    fonts: HashMap<String, FontArc>,
    available: Vec<FontInfo>,
}

impl std::fmt::Debug for FontLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontLibrary")
            .field("available", &self.available)
            .finish()
    }
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fonts, continuing with an empty library when the manifest is
    /// missing or unreadable.
    pub async fn load_or_empty(dir: &Path, manifest: &str) -> Self {
        match Self::load(dir, manifest).await {
            Ok(library) => library,
            Err(e) => {
                tracing::warn!(
                    directory = %dir.display(),
                    error = %e,
                    "Font manifest unavailable, continuing without fonts"
                );
                Self::new()
            }
        }
    }

    /// Load every font listed in `manifest` inside `dir`.
    ///
    /// Fails only when the manifest itself cannot be read or parsed.
    pub async fn load(dir: &Path, manifest: &str) -> Result<Self> {
        let manifest_path = dir.join(manifest);
        let raw = tokio::fs::read_to_string(&manifest_path).await.map_err(|e| {
            StudioError::Font(format!(
                "Could not read font manifest {}: {}",
                manifest_path.display(),
                e
            ))
        })?;
        let files: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
            StudioError::Font(format!(
                "Invalid font manifest {}: {}",
                manifest_path.display(),
                e
            ))
        })?;

        let mut library = Self::new();
        for file in files {
            let bytes = match tokio::fs::read(dir.join(&file)).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(font = %file, error = %e, "Failed to load font");
                    continue;
                }
            };

            if let Err(e) = library.register(&file, bytes) {
                tracing::warn!(font = %file, error = %e, "Failed to load font");
            }
        }

        tracing::info!(
            fonts = library.available.len(),
            manifest = %manifest_path.display(),
            "Font library loaded"
        );

        Ok(library)
    }

    /// Parse and register one font file under its derived family name.
    pub fn register(&mut self, file: &str, bytes: Vec<u8>) -> Result<FontInfo> {
        let family = family_name_from_file(file);
        if family.is_empty() {
            return Err(StudioError::Font(format!(
                "Cannot derive a family name from '{}'",
                file
            )));
        }

        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| StudioError::Font(format!("Failed to parse {}: {}", file, e)))?;

        if self.fonts.contains_key(&family) {
            return Err(StudioError::Font(format!(
                "Family '{}' is already registered",
                family
            )));
        }

        self.fonts.insert(family.clone(), font);
        let info = FontInfo {
            name: family.clone(),
            family,
            file: file.to_string(),
        };
        self.available.push(info.clone());
        Ok(info)
    }

    /// Fonts ready for use, in manifest order.
    pub fn available(&self) -> &[FontInfo] {
        &self.available
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    /// Look up a family, case-insensitively, falling back to the first
    /// registered font.
    pub fn resolve(&self, family: &str) -> Option<&FontArc> {
        if let Some(font) = self.fonts.get(family) {
            return Some(font);
        }

        let by_case = self
            .available
            .iter()
            .find(|info| info.family.eq_ignore_ascii_case(family));
        if let Some(info) = by_case {
            return self.fonts.get(&info.family);
        }

        let fallback = self.available.first()?;
        tracing::debug!(
            requested = %family,
            fallback = %fallback.family,
            "Font family not registered, using fallback"
        );
        self.fonts.get(&fallback.family)
    }
}

fn rewrite(
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
    text: String,
    replacement: &str,
) -> String {
    match cell.get_or_init(|| Regex::new(pattern).ok()) {
        Some(re) => re.replace_all(&text, replacement).into_owned(),
        None => text,
    }
}

/// Derive a readable family name from a font file name.
///
/// `"BebasNeueDemo-xY3z.otf"` becomes `"Bebas Neue"`.
pub fn family_name_from_file(file: &str) -> String {
    static EXTENSION: OnceLock<Option<Regex>> = OnceLock::new();
    static RANDOM_SUFFIX: OnceLock<Option<Regex>> = OnceLock::new();
    static LOWER_UPPER: OnceLock<Option<Regex>> = OnceLock::new();
    static ACRONYM: OnceLock<Option<Regex>> = OnceLock::new();
    static DEMO: OnceLock<Option<Regex>> = OnceLock::new();

    let name = rewrite(&EXTENSION, r"(?i)\.(ttf|otf|woff|woff2)$", file.to_string(), "");
    let name = rewrite(&RANDOM_SUFFIX, r"-[a-zA-Z0-9]{3,5}$", name, "");
    let name = rewrite(&LOWER_UPPER, r"([a-z])([A-Z])", name, "$1 $2");
    let name = rewrite(&ACRONYM, r"([A-Z]+)([A-Z][a-z])", name, "$1 $2");
    let name = rewrite(&DEMO, r"(?i)Demo$", name, "");
    name.trim().to_string()
}
