//! Error types for the ingest pipeline.
//!
//! Every variant is scoped to a single source: the orchestrator records it as
//! that source's failure and moves on to the next one.

use thiserror::Error;

/// Errors raised while turning one source into an artifact
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to fetch {locator}: {reason}")]
    Fetch { locator: String, reason: String },

    #[error("archive has no entry named {0}")]
    MissingEntry(String),

    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("malformed document at byte {position}: {source}")]
    MalformedDocument {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("refusing to render an insert into {0} without rows")]
    EmptyInsert(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker task failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
