//! Artifact, manifest and combined-file writing.

use std::io::Write;
use std::path::Path;

use tempfile::Builder;

use super::RunSummary;

/// File name of the run manifest inside the output directory
pub const MANIFEST_NAME: &str = "manifest.json";

/// Write a file by writing a sibling temp file and renaming it over the
/// target, so readers never observe a partially written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = Builder::new()
        .prefix(".airspace-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write `manifest.json` describing every source of the run
pub fn write_manifest(out_dir: &Path, summary: &RunSummary) -> std::io::Result<()> {
    let json = serde_json::to_vec_pretty(summary)?;
    write_atomic(&out_dir.join(MANIFEST_NAME), &json)
}

/// Concatenate the written artifacts, in source order, into one file
pub fn write_combined(path: &Path, summary: &RunSummary) -> std::io::Result<usize> {
    let mut parts = Vec::new();
    for artifact in summary.artifacts() {
        parts.push(std::fs::read_to_string(artifact)?);
    }
    write_atomic(path, parts.join("\n").as_bytes())?;
    Ok(parts.len())
}
