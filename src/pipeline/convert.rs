//! Source bytes to SQL batch.

use std::io::{BufRead, BufReader};

use url::Url;

use crate::error::Result;
use crate::fetch::Bundle;
use crate::kml::{DocumentWalker, WalkStats};
use crate::models::ImportRun;
use crate::sql::{BatchBuilder, BatchOptions};

/// The batch produced for one document
#[derive(Debug, Clone)]
pub struct Conversion {
    pub sql: String,
    pub stats: WalkStats,
}

/// Walk a KML document and render its areas as one batch
pub fn document_to_sql<R: BufRead>(
    import: &ImportRun,
    document: R,
    options: BatchOptions,
) -> Result<Conversion> {
    let mut builder = BatchBuilder::new(import, options);
    let stats = DocumentWalker::new(import.id).walk(document, |area| builder.add(&area))?;
    let sql = builder.finish()?;
    Ok(Conversion { sql, stats })
}

/// Convert fetched source bytes.
///
/// Locators ending in `.kml` carry the document itself; anything else is
/// opened as a KMZ bundle and `entry_path` is read from it.
pub fn source_to_sql(
    import: &ImportRun,
    bytes: Vec<u8>,
    entry_path: &str,
    options: BatchOptions,
) -> Result<Conversion> {
    if is_bare_document(&import.name) {
        return document_to_sql(import, bytes.as_slice(), options);
    }

    let mut bundle = Bundle::open(bytes)?;
    let entry = bundle.entry(entry_path)?;
    document_to_sql(import, BufReader::new(entry), options)
}

fn is_bare_document(locator: &str) -> bool {
    let path = match Url::parse(locator) {
        Ok(url) => url.path().to_string(),
        Err(_) => locator.to_string(),
    };
    path.to_ascii_lowercase().ends_with(".kml")
}
