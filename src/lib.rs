// Watermark Studio Library
//
// Places text and image watermarks on a batch of photos, previewed at
// viewport resolution and exported at native resolution into one archive.

pub mod assets;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod logging;
pub mod preview;
pub mod studio;
pub mod watermark;

pub use error::{Result, StudioError};
pub use studio::{ExportOptions, Studio};
