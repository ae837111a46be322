//! VD-020: Output sinks for generated documents.

use crate::core::error::DatagenError;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// True when `relative` names a file strictly below its root: no empty,
/// `.` or `..` components and no backslashes.
pub fn is_contained(relative: &str) -> bool {
    !relative.contains('\\')
        && relative
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..")
}

/// Destination for generated files, addressed by `/`-separated relative paths.
pub trait OutputSink {
    fn write(&mut self, relative: &str, contents: &str) -> Result<(), DatagenError>;
}

/// Writes files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative output path below the root. Paths that would
    /// leave the root are refused.
    pub fn target(&self, relative: &str) -> Result<PathBuf, DatagenError> {
        if !is_contained(relative) {
            return Err(DatagenError::io(
                self.root.join(relative).display(),
                "path escapes the output directory",
            ));
        }
        Ok(relative
            .split('/')
            .fold(self.root.clone(), |acc, part| acc.join(part)))
    }
}

impl OutputSink for DirectorySink {
    /// Atomic write: temp file + rename, creating parent directories.
    fn write(&mut self, relative: &str, contents: &str) -> Result<(), DatagenError> {
        let path = self.target(relative)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatagenError::io(parent.display(), e))?;
        }

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents).map_err(|e| DatagenError::io(tmp_path.display(), e))?;
        std::fs::rename(&tmp_path, &path).map_err(|e| {
            DatagenError::io(
                path.display(),
                format!("cannot rename {}: {}", tmp_path.display(), e),
            )
        })?;
        Ok(())
    }
}

/// Keeps written files in memory (tests and dry runs).
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub files: IndexMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, relative: &str) -> Option<&str> {
        self.files.get(relative).map(String::as_str)
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, relative: &str, contents: &str) -> Result<(), DatagenError> {
        self.files.insert(relative.to_string(), contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vd020_target_path() {
        let sink = DirectorySink::new("/out");
        assert_eq!(
            sink.target("data/slab-to-block/recipes/a__b.json").unwrap(),
            PathBuf::from("/out/data/slab-to-block/recipes/a__b.json")
        );
    }

    #[test]
    fn test_vd020_contained_paths() {
        assert!(is_contained("increased-stair-yield/data/a/recipes/x.json"));
        assert!(!is_contained("data/a/recipes/../../../x.json"));
        assert!(!is_contained("/etc/x.json"));
        assert!(!is_contained("data//x.json"));
        assert!(!is_contained("./x.json"));
        assert!(!is_contained("data\\..\\x.json"));
    }

    #[test]
    fn test_vd020_write_outside_root_refused() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        let mut sink = DirectorySink::new(&root);
        let err = sink.write("data/../../escaped.json", "{}").unwrap_err();
        assert!(err.to_string().contains("escapes"));
        assert!(!dir.path().join("escaped.json").exists());
        assert!(!root.exists());
    }

    #[test]
    fn test_vd020_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.write("data/slab-to-block/recipes/a__b.json", "{}").unwrap();

        let written = dir.path().join("data/slab-to-block/recipes/a__b.json");
        assert_eq!(std::fs::read_to_string(&written).unwrap(), "{}");
        assert!(!dir
            .path()
            .join("data/slab-to-block/recipes/a__b.json.tmp")
            .exists());
    }

    #[test]
    fn test_vd020_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.write("x.json", "1").unwrap();
        sink.write("x.json", "2").unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("x.json")).unwrap(), "2");
    }

    #[test]
    fn test_vd020_memory_sink() {
        let mut sink = MemorySink::new();
        sink.write("a.json", "{}").unwrap();
        assert_eq!(sink.get("a.json"), Some("{}"));
        assert!(sink.get("b.json").is_none());
    }
}
