//! VD-011: Zipped archive reader (`.jar` and `.zip`).

use super::ModArchive;
use crate::core::error::DatagenError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// A `.jar` or `.zip` mod archive opened from disk.
pub struct JarArchive {
    name: String,
    inner: ZipArchive<File>,
}

impl JarArchive {
    pub fn open(path: &Path) -> Result<Self, DatagenError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let file = File::open(path).map_err(|e| DatagenError::io(path.display(), e))?;
        let inner = ZipArchive::new(file).map_err(|e| DatagenError::Archive {
            archive: name.clone(),
            detail: e.to_string(),
        })?;
        Ok(Self { name, inner })
    }
}

impl ModArchive for JarArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = self
            .inner
            .file_names()
            .filter(|n| !n.ends_with('/'))
            .map(str::to_string)
            .collect();
        entries.sort();
        entries
    }

    fn read_text(&mut self, path: &str) -> Result<Option<String>, DatagenError> {
        let mut member = match self.inner.by_name(path) {
            Ok(member) => member,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(DatagenError::Archive {
                    archive: self.name.clone(),
                    detail: format!("cannot read {}: {}", path, e),
                })
            }
        };
        let mut text = String::new();
        member
            .read_to_string(&mut text)
            .map_err(|e| DatagenError::Archive {
                archive: self.name.clone(),
                detail: format!("cannot read {}: {}", path, e),
            })?;
        Ok(Some(text))
    }
}
