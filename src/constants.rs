// Constants module - centralized default values for configuration
//
// Layout constants shared by the preview and export paths live here so the
// two renderers can never drift apart on a magic number.

// =============================================================================
// Preview layout
// =============================================================================

/// Fraction of the viewport an image may occupy on each axis (10% margin)
pub const PREVIEW_FIT_RATIO: f64 = 0.9;

/// Default viewport width in pixels
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 800;

/// Default viewport height in pixels
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 600;

/// Largest viewport side accepted from a resize or a project file (8K)
pub const MAX_VIEWPORT_DIMENSION: f64 = 8192.0;

/// Backdrop color of the interactive preview
pub const PREVIEW_BACKGROUND: [u8; 4] = [0x1a, 0x1a, 0x2e, 0xff];

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default watermark text
pub const DEFAULT_WATERMARK_TEXT: &str = "Watermark";

/// Default font family
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

/// Default font size in viewport pixels (also the default image scale percent)
pub const DEFAULT_FONT_SIZE: f64 = 48.0;

/// Default watermark color
pub const DEFAULT_COLOR: &str = "#ffffff";

/// Default watermark opacity
pub const DEFAULT_OPACITY: f64 = 0.7;

/// Smallest text size the editor offers
pub const MIN_FONT_SIZE: f64 = 8.0;

/// Largest text size the editor offers
pub const MAX_FONT_SIZE: f64 = 200.0;

/// Largest image watermark scale in percent
pub const MAX_IMAGE_SCALE_PERCENT: f64 = 200.0;

// =============================================================================
// Export defaults
// =============================================================================

/// Folder (and archive file) name prefix; a `-YYYY-MM-DD` suffix is appended
pub const ARCHIVE_NAME_PREFIX: &str = "watermarked-images";

/// Suffix appended to each exported file's base name
pub const OUTPUT_NAME_SUFFIX: &str = "_watermarked";

/// Default deflate level for archive entries
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 6;

/// Default pixel budget for a single native canvas (100 megapixels)
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;

/// Largest text sprite rasterized in one piece
pub const MAX_TEXT_SPRITE_PIXELS: u64 = DEFAULT_MAX_PIXELS;

/// Capacity of the decoded watermark image cache
pub const DEFAULT_WATERMARK_CACHE_ENTRIES: u64 = 64;

// =============================================================================
// Font defaults
// =============================================================================

/// Default font manifest file name inside the font directory
pub const DEFAULT_FONT_MANIFEST: &str = "fonts.json";
