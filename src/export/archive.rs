//! Zip archive of exported images.
//!
//! Every entry lives under one dated folder:
//!
//! ```text
//! watermarked-images-2024-05-01/
//! watermarked-images-2024-05-01/beach_watermarked.png
//! watermarked-images-2024-05-01/beach_watermarked-2.png
//! ```

use crate::constants::{ARCHIVE_NAME_PREFIX, OUTPUT_NAME_SUFFIX};
use crate::error::{Result, StudioError};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Folder and archive stem for an export made on `date`.
pub fn archive_stem(date: NaiveDate) -> String {
    format!("{}-{}", ARCHIVE_NAME_PREFIX, date.format("%Y-%m-%d"))
}

/// File name of the archive written for `date`.
pub fn archive_file_name(date: NaiveDate) -> String {
    format!("{}.zip", archive_stem(date))
}

/// Streams PNG entries into a zip archive.
pub struct ArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    folder: String,
    options: SimpleFileOptions,
    used_names: HashSet<String>,
    entries: Vec<String>,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// Start an archive and write its folder entry.
    pub fn new(writer: W, folder: impl Into<String>, compression_level: i64) -> Result<Self> {
        let folder = folder.into();
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level));

        let mut zip = ZipWriter::new(writer);
        zip.add_directory(format!("{}/", folder), options)
            .map_err(|e| StudioError::ArchiveCreationFailure(e.to_string()))?;

        Ok(Self {
            zip,
            folder,
            options,
            used_names: HashSet::new(),
            entries: Vec::new(),
        })
    }

    /// Pick a free `{base}_watermarked.png` name, numbering repeats.
    fn entry_name(&mut self, base_name: &str) -> String {
        let mut candidate = format!("{}{}.png", base_name, OUTPUT_NAME_SUFFIX);
        let mut counter = 2;
        while self.used_names.contains(&candidate) {
            candidate = format!("{}{}-{}.png", base_name, OUTPUT_NAME_SUFFIX, counter);
            counter += 1;
        }
        self.used_names.insert(candidate.clone());
        candidate
    }

    /// Add one exported PNG. Returns the entry's file name within the folder.
    pub fn add_png(&mut self, base_name: &str, data: &[u8]) -> Result<String> {
        let name = self.entry_name(base_name);
        let path = format!("{}/{}", self.folder, name);

        self.zip
            .start_file(path.as_str(), self.options)
            .map_err(|e| StudioError::ArchiveCreationFailure(e.to_string()))?;
        self.zip
            .write_all(data)
            .map_err(|e| StudioError::ArchiveCreationFailure(e.to_string()))?;

        tracing::debug!(entry = %path, bytes = data.len(), "Added archive entry");
        self.entries.push(name.clone());
        Ok(name)
    }

    /// Entry file names written so far, in order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Write the central directory and hand back the writer.
    pub fn finish(self) -> Result<(W, Vec<String>)> {
        let writer = self
            .zip
            .finish()
            .map_err(|e| StudioError::ArchiveCreationFailure(e.to_string()))?;
        Ok((writer, self.entries))
    }
}
