//! Project document sources
//!
//! The document store is an external collaborator keyed by project id,
//! returning at most one document per key. [`DocumentSource`] is the seam;
//! callers construct a source once and pass it where it is needed.
//!
//! - [`JsonDirSource`] reads `<dir>/<project_id>.json` files
//! - [`MemorySource`] holds documents in memory (tests, embedding)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::RawProjectDocument;

/// Read access to raw project documents.
pub trait DocumentSource: Send + Sync {
    /// Fetch the document for a project, `None` if it does not exist.
    fn fetch(&self, project_id: &str) -> Result<Option<RawProjectDocument>>;

    /// List known project ids, sorted.
    fn list_projects(&self) -> Result<Vec<String>>;

    /// Fetch a document that must exist.
    fn require(&self, project_id: &str) -> Result<RawProjectDocument> {
        self.fetch(project_id)?
            .ok_or_else(|| Error::DocumentNotFound(project_id.to_string()))
    }
}

/// Documents stored as one JSON file per project.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    /// Create a source over `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this source reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a document from an explicit file path.
    ///
    /// The file stem is the fallback project id. The JSON must be
    /// well-formed, but its shape is not checked.
    pub fn read_file(path: &Path) -> Result<RawProjectDocument> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("project")
            .to_string();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open {}: {}", path.display(), e),
            ))
        })?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Ok(RawProjectDocument::from_value(&stem, value))
    }

    fn path_for(&self, project_id: &str) -> Option<PathBuf> {
        // Ids become file names, so path separators are never valid
        if project_id.is_empty()
            || project_id.contains(['/', '\\'])
            || project_id == "."
            || project_id == ".."
        {
            return None;
        }
        Some(self.root.join(format!("{}.json", project_id)))
    }
}

impl DocumentSource for JsonDirSource {
    fn fetch(&self, project_id: &str) -> Result<Option<RawProjectDocument>> {
        let Some(path) = self.path_for(project_id) else {
            tracing::warn!(project_id, "Rejected project id");
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let mut doc = Self::read_file(&path)?;
        // The file name is authoritative for lookups
        doc.id = project_id.to_string();
        tracing::debug!(project_id, path = %path.display(), "Loaded project document");
        Ok(Some(doc))
    }

    fn list_projects(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let pattern = self.root.join("*.json");
        let entries = glob::glob(&pattern.to_string_lossy())
            .map_err(|e| Error::Config(format!("Invalid documents directory pattern: {}", e)))?;

        let mut ids: Vec<String> = entries
            .flatten()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Documents held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: BTreeMap<String, RawProjectDocument>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document, keyed by its id.
    pub fn insert(&mut self, doc: RawProjectDocument) {
        self.documents.insert(doc.id.clone(), doc);
    }
}

impl DocumentSource for MemorySource {
    fn fetch(&self, project_id: &str) -> Result<Option<RawProjectDocument>> {
        Ok(self.documents.get(project_id).cloned())
    }

    fn list_projects(&self) -> Result<Vec<String>> {
        Ok(self.documents.keys().cloned().collect())
    }
}
