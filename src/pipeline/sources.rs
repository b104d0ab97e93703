//! Source list files.

use std::path::Path;

use anyhow::{Context, Result};

/// Parse a newline-separated list of locators.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_source_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a source list file
pub fn load_source_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read source list {}", path.display()))?;
    Ok(parse_source_list(&content))
}
