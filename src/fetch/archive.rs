//! KMZ bundle access.

use std::io::{Cursor, Read};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{IngestError, Result};

/// Conventional path of the main document inside a KMZ bundle
pub const DEFAULT_ENTRY_PATH: &str = "doc.kml";

/// An in-memory KMZ (zip) bundle
pub struct Bundle {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl Bundle {
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive })
    }

    /// Number of entries in the bundle
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Stream one entry, decompressing on the fly
    pub fn entry(&mut self, path: &str) -> Result<impl Read + '_> {
        match self.archive.by_name(path) {
            Ok(file) => Ok(file),
            Err(ZipError::FileNotFound) => Err(IngestError::MissingEntry(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Build a zip bundle in memory
#[cfg(test)]
pub(crate) fn bundle_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in entries {
        writer.start_file(*path, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_entry() {
        let bytes = bundle_bytes(&[("files/icon.png", "png"), ("doc.kml", "<kml/>")]);
        let mut bundle = Bundle::open(bytes).unwrap();
        assert_eq!(bundle.len(), 2);

        let mut content = String::new();
        bundle
            .entry(DEFAULT_ENTRY_PATH)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<kml/>");
    }

    #[test]
    fn test_missing_entry() {
        let bytes = bundle_bytes(&[("other.kml", "<kml/>")]);
        let mut bundle = Bundle::open(bytes).unwrap();
        let result = bundle.entry(DEFAULT_ENTRY_PATH).map(|_| ());
        assert!(matches!(result, Err(IngestError::MissingEntry(p)) if p == "doc.kml"));
    }

    #[test]
    fn test_not_a_zip() {
        let result = Bundle::open(b"<kml></kml>".to_vec());
        assert!(matches!(result, Err(IngestError::Archive(_))));
    }
}
