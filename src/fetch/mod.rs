//! Source acquisition: fetching bundles and opening their documents.

mod archive;
mod client;

pub use archive::{Bundle, DEFAULT_ENTRY_PATH};
pub use client::{FetchSettings, SourceFetcher};

#[cfg(test)]
pub(crate) use archive::bundle_bytes;
