//! VD-012: Unpacked archive reader (a directory laid out like a jar).

use super::ModArchive;
use crate::core::error::DatagenError;
use std::path::{Path, PathBuf};

pub struct DirArchive {
    name: String,
    root: PathBuf,
    entries: Vec<String>,
}

impl DirArchive {
    /// Index every regular file below `root`.
    pub fn open(root: &Path) -> Result<Self, DatagenError> {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());
        let pattern = format!("{}/**/*", glob::Pattern::escape(&root.to_string_lossy()));
        let paths = glob::glob(&pattern).map_err(|e| DatagenError::Archive {
            archive: name.clone(),
            detail: e.to_string(),
        })?;

        let mut entries = Vec::new();
        for path in paths.flatten() {
            if !path.is_file() {
                continue;
            }
            if let Ok(rel) = path.strip_prefix(root) {
                let parts: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
                    .collect();
                entries.push(parts.join("/"));
            }
        }
        entries.sort();

        Ok(Self {
            name,
            root: root.to_path_buf(),
            entries,
        })
    }
}

impl ModArchive for DirArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> Vec<String> {
        self.entries.clone()
    }

    fn read_text(&mut self, path: &str) -> Result<Option<String>, DatagenError> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Ok(None);
        }
        std::fs::read_to_string(&full)
            .map(Some)
            .map_err(|e| DatagenError::io(full.display(), e))
    }
}
