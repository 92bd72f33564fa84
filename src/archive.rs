//! In-memory ZIP packaging for multi-artifact outputs.
//!
//! An [`AssetArchive`] is built incrementally, one uniquely named entry at a
//! time, and finalized exactly once into a [`PackagedArchive`]. `finish`
//! consumes the builder, so nothing can be added afterwards.

use crate::imaging::ImagingError;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ZIP_CONTENT_TYPE: &str = "application/zip";

pub struct AssetArchive {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    names: Vec<String>,
    seen: HashSet<String>,
}

/// A finalized archive and the names it holds, in insertion order.
#[derive(Debug, Clone)]
pub struct PackagedArchive {
    pub bytes: Vec<u8>,
    pub entry_names: Vec<String>,
}

impl AssetArchive {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            names: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Add a deflated entry. Names must be unique within the archive.
    pub fn add(&mut self, name: &str, payload: &[u8]) -> Result<(), ImagingError> {
        if !self.seen.insert(name.to_string()) {
            return Err(ImagingError::EncodingFailure(format!(
                "duplicate archive entry '{name}'"
            )));
        }
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(name, options)
            .map_err(ImagingError::encode)?;
        self.writer.write_all(payload).map_err(ImagingError::encode)?;
        self.names.push(name.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn finish(self) -> Result<PackagedArchive, ImagingError> {
        let cursor = self.writer.finish().map_err(ImagingError::encode)?;
        Ok(PackagedArchive {
            bytes: cursor.into_inner(),
            entry_names: self.names,
        })
    }
}

impl Default for AssetArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn entries_round_trip_in_order() {
        let mut archive = AssetArchive::new();
        archive.add("a.txt", b"alpha").unwrap();
        archive.add("b/c.bin", &[1, 2, 3]).unwrap();
        assert_eq!(archive.len(), 2);

        let packaged = archive.finish().unwrap();
        assert_eq!(packaged.entry_names, vec!["a.txt", "b/c.bin"]);

        let mut zip = ZipArchive::new(Cursor::new(packaged.bytes)).unwrap();
        assert_eq!(zip.len(), 2);
        let mut text = String::new();
        zip.by_name("a.txt").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "alpha");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut archive = AssetArchive::new();
        archive.add("favicon.ico", b"1").unwrap();
        assert!(matches!(
            archive.add("favicon.ico", b"2"),
            Err(ImagingError::EncodingFailure(_))
        ));
        assert_eq!(archive.finish().unwrap().entry_names.len(), 1);
    }

    #[test]
    fn empty_archive_is_valid_zip() {
        let archive = AssetArchive::default();
        assert!(archive.is_empty());
        let packaged = archive.finish().unwrap();
        assert_eq!(ZipArchive::new(Cursor::new(packaged.bytes)).unwrap().len(), 0);
    }
}
