//! Airspace - KMZ airspace boundary feeds to PostGIS batches
//!
//! This library provides the extraction pipeline used by the ingest binary:
//! KML walking, geometry and description parsing, SQL batch building and
//! per-source orchestration.

pub mod discord;
pub mod error;
pub mod fetch;
pub mod kml;
pub mod models;
pub mod pipeline;
pub mod sql;

pub use error::{IngestError, Result};
pub use models::{Area, AreaAttributes, ImportRun};
