//! Core data models for the ingest pipeline.

pub mod area;
pub mod import;

pub use area::{Area, AreaAttributes};
pub use import::ImportRun;
