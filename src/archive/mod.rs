//! VD-010: Zipped and unpacked mod archives.
//!
//! The pipeline only needs three things from an archive: its name, the list
//! of member paths, and a member's text. Members are addressed by
//! `/`-separated archive-relative paths.

pub mod dir;
pub mod jar;

use crate::core::error::DatagenError;
use crate::output::is_contained;
use indexmap::IndexMap;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static RECIPE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data/[^/]+/recipes/.+\.json$").expect("static regex"));

static ITEM_TAG_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data/[^/]+/tags/items/.+\.json$").expect("static regex"));

/// A readable mod archive.
pub trait ModArchive {
    /// Display name (usually the archive's file name).
    fn name(&self) -> &str;

    /// Every member path, sorted.
    fn entries(&self) -> Vec<String>;

    /// Read a member as UTF-8 text. `Ok(None)` when the member does not exist.
    fn read_text(&mut self, path: &str) -> Result<Option<String>, DatagenError>;

    fn contains(&self, path: &str) -> bool {
        self.entries().iter().any(|e| e == path)
    }
}

/// Is this member a recipe document?
///
/// Members with `..`, `.` or empty components never match; their paths are
/// reused for output files.
pub fn is_recipe_path(path: &str) -> bool {
    RECIPE_PATH.is_match(path) && is_contained(path)
}

/// Is this member an item tag document?
pub fn is_item_tag_path(path: &str) -> bool {
    ITEM_TAG_PATH.is_match(path) && is_contained(path)
}

/// Find mod archives in a directory, sorted by file name.
///
/// `.jar`/`.zip` files and sub-directories (unpacked archives) are returned;
/// anything else is skipped.
pub fn discover(mods_dir: &Path) -> Result<Vec<PathBuf>, DatagenError> {
    let read_dir =
        std::fs::read_dir(mods_dir).map_err(|e| DatagenError::io(mods_dir.display(), e))?;
    let mut found: Vec<PathBuf> = Vec::new();
    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.is_dir() || has_archive_extension(&path) {
            found.push(path);
        } else {
            tracing::debug!("skipping non-archive {}", path.display());
        }
    }
    found.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(found)
}

fn has_archive_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("jar") | Some("zip")
    )
}

/// Open a discovered archive, picking the reader by path type.
pub fn open(path: &Path) -> Result<Box<dyn ModArchive>, DatagenError> {
    if path.is_dir() {
        Ok(Box::new(dir::DirArchive::open(path)?))
    } else {
        Ok(Box::new(jar::JarArchive::open(path)?))
    }
}

/// An archive held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    name: String,
    files: IndexMap<String, String>,
}

impl MemoryArchive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: IndexMap::new(),
        }
    }

    /// Add a member, builder style.
    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }
}

impl ModArchive for MemoryArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = self.files.keys().cloned().collect();
        entries.sort();
        entries
    }

    fn read_text(&mut self, path: &str) -> Result<Option<String>, DatagenError> {
        Ok(self.files.get(path).cloned())
    }

    fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}
