//! Export pipeline.
//!
//! - [`renderer`]: native-resolution compositing and PNG encoding
//! - [`archive`]: the dated zip layout
//! - [`batch`]: sequential export of a whole batch with progress reporting

pub mod archive;
pub mod batch;
pub mod renderer;

pub use archive::{archive_file_name, archive_stem, ArchiveWriter};
pub use batch::{
    BatchExporter, ExportFailure, ExportItem, ExportObserver, ExportReport, TracingObserver,
};
pub use renderer::{encode_png, ExportCompositor};
