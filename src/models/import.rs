//! Import run identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ingestion of one source document.
///
/// The id is derived from the source locator (UUID v5 in the URL namespace),
/// so processing the same locator twice always targets the same rows and the
/// same artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRun {
    pub id: Uuid,
    pub name: String,
}

impl ImportRun {
    /// Create the import run for a source locator
    pub fn from_locator(locator: &str) -> Self {
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_URL, locator.as_bytes()),
            name: locator.to_string(),
        }
    }

    /// File name of the SQL artifact written for this run
    pub fn artifact_name(&self) -> String {
        format!("{}.sql", self.id)
    }
}
