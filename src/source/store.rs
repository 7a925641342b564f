//! Synchronous boundary stores
//!
//! Hosts with async fetching drive `GeometrySource::begin_load`/`complete`
//! directly; hosts with the files at hand use a store and `ChoroplethMap::load_from_store`.

use anyhow::Context;
use std::collections::HashMap;
use std::path::PathBuf;

/// Idempotent read of one subdivision's boundary document
pub trait BoundaryStore {
    /// `Ok(None)` when the subdivision has no file
    fn fetch(&self, subdivision: &str) -> anyhow::Result<Option<String>>;
}

/// Reads `<root>/<subdivision><suffix>`
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    suffix: String,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), suffix: ".topo.json".to_string() }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn path_for(&self, subdivision: &str) -> PathBuf {
        self.root.join(format!("{}{}", subdivision, self.suffix))
    }
}

impl BoundaryStore for DirectoryStore {
    fn fetch(&self, subdivision: &str) -> anyhow::Result<Option<String>> {
        // Keys come from data; never let them walk out of the root
        if subdivision.is_empty() || subdivision.contains(['/', '\\']) || subdivision.contains("..") {
            return Ok(None);
        }
        let path = self.path_for(subdivision);
        match std::fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }
}

/// In-memory documents keyed by subdivision
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subdivision: impl Into<String>, body: impl Into<String>) {
        self.documents.insert(subdivision.into(), body.into());
    }
}

impl BoundaryStore for MemoryStore {
    fn fetch(&self, subdivision: &str) -> anyhow::Result<Option<String>> {
        Ok(self.documents.get(subdivision).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_store_missing_file_is_none() {
        let dir = std::env::temp_dir().join(format!("choropleth-store-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("06.topo.json"), "{}").unwrap();

        let store = DirectoryStore::new(&dir);
        assert_eq!(store.fetch("06").unwrap().as_deref(), Some("{}"));
        assert!(store.fetch("41").unwrap().is_none());
        assert!(store.fetch("../06").unwrap().is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.insert("06", "body");
        assert_eq!(store.fetch("06").unwrap().as_deref(), Some("body"));
        assert!(store.fetch("07").unwrap().is_none());
    }
}
