// Error types module

use thiserror::Error;

/// Centralized error type for the studio
///
/// The first five kinds are the ones the export pipeline distinguishes when
/// deciding whether a failure is isolated to one image or aborts the batch.
#[derive(Error, Debug)]
pub enum StudioError {
    /// A folder or selection produced zero image files
    #[error("No images found in {0}")]
    NoImagesFound(String),

    /// An image or watermark-image source could not be decoded
    #[error("Failed to decode {name}: {message}")]
    DecodeFailure { name: String, message: String },

    /// The native rendering surface could not be created
    #[error("Canvas unavailable for {width}x{height}: {reason}")]
    CanvasUnavailable {
        width: u32,
        height: u32,
        reason: String,
    },

    /// The output archive could not be created or written
    #[error("Failed to create archive: {0}")]
    ArchiveCreationFailure(String),

    /// A composited raster could not be encoded
    #[error("Failed to encode {name}: {message}")]
    SerializationFailure { name: String, message: String },

    /// Invalid project configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Font registration failure
    #[error("Font error: {0}")]
    Font(String),

    /// A watermark record violates its value ranges
    #[error("Invalid watermark settings: {0}")]
    InvalidSettings(String),

    /// An editing action needs a loaded image or selected watermark
    #[error("Nothing selected: {0}")]
    NoSelection(String),

    /// A mutating action was attempted while an export is running
    #[error("An export is in progress")]
    ExportInProgress,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    pub fn decode(name: impl Into<String>, message: impl ToString) -> Self {
        Self::DecodeFailure {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn serialization(name: impl Into<String>, message: impl ToString) -> Self {
        Self::SerializationFailure {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Whether this failure aborts a whole batch rather than a single image.
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self, Self::ArchiveCreationFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
