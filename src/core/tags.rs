//! VD-003: Item tag loading and recursive resolution.
//!
//! Tag documents from every archive are merged into a [`TagIndex`]; a tag
//! declared by several archives contributes all of their values. Resolution
//! flattens a tag into concrete item identifiers, following `#` references
//! depth-first. Results are memoised per tag for the lifetime of a resolver.

use super::error::DatagenError;
use super::types::{ItemId, TagDeclaration, TagPath};
use crate::archive::{is_item_tag_path, ModArchive};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// One archive's declaration of a tag.
#[derive(Debug, Clone, PartialEq)]
pub struct TagContribution {
    pub archive: String,
    pub declaration: TagDeclaration,
}

/// The "load declaration by path" capability the resolver works against.
pub trait TagSource {
    /// Every declaration of `path`, in archive order. Empty when undeclared.
    fn declarations(&self, path: &TagPath) -> &[TagContribution];
}

/// Item tag documents collected from a set of archives.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    tags: IndexMap<String, Vec<TagContribution>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one archive's declaration of the tag stored at `document_path`.
    pub fn insert(
        &mut self,
        archive: impl Into<String>,
        document_path: impl Into<String>,
        declaration: TagDeclaration,
    ) {
        self.tags
            .entry(document_path.into())
            .or_default()
            .push(TagContribution {
                archive: archive.into(),
                declaration,
            });
    }

    /// Read every item tag document in an archive. Returns how many were added.
    ///
    /// Unreadable or unparseable tag documents are logged and skipped. A
    /// declaration asking for replace semantics aborts the ingest.
    pub fn ingest(&mut self, archive: &mut dyn ModArchive) -> Result<usize, DatagenError> {
        let mut added = 0;
        for path in archive.entries() {
            if !is_item_tag_path(&path) {
                continue;
            }
            let text = match archive.read_text(&path) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("skipping unreadable tag {}: {}", path, e);
                    continue;
                }
            };
            match serde_json::from_str::<TagDeclaration>(&text) {
                Ok(declaration) => {
                    if declaration.replace.asserts_replace() {
                        return Err(DatagenError::ReplaceUnsupported {
                            archive: archive.name().to_string(),
                            path,
                        });
                    }
                    self.insert(archive.name(), path, declaration);
                    added += 1;
                }
                Err(e) => {
                    tracing::warn!("skipping tag {} in {}: {}", path, archive.name(), e);
                }
            }
        }
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl TagSource for TagIndex {
    fn declarations(&self, path: &TagPath) -> &[TagContribution] {
        self.tags
            .get(&path.document_path())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Flattens tags into item sets, with memoisation and cycle detection.
pub struct TagResolver<'a, S: TagSource + ?Sized> {
    source: &'a S,
    memo: FxHashMap<TagPath, BTreeSet<ItemId>>,
    stack: Vec<TagPath>,
}

impl<'a, S: TagSource + ?Sized> TagResolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            memo: FxHashMap::default(),
            stack: Vec::new(),
        }
    }

    /// Resolve `path` into the set of concrete items it denotes.
    ///
    /// An undeclared root resolves to the empty set; the caller decides
    /// whether that is worth reporting. An undeclared nested reference
    /// contributes nothing and is warned about unless marked optional.
    pub fn resolve(&mut self, path: &TagPath) -> Result<BTreeSet<ItemId>, DatagenError> {
        if let Some(done) = self.memo.get(path) {
            return Ok(done.clone());
        }
        if let Some(pos) = self.stack.iter().position(|p| p == path) {
            let mut chain: Vec<String> = self.stack[pos..].iter().map(|p| p.to_string()).collect();
            chain.push(path.to_string());
            return Err(DatagenError::TagCycle {
                chain: chain.join(" -> "),
            });
        }

        let source = self.source;
        let contributions = source.declarations(path);
        if contributions.is_empty() {
            self.memo.insert(path.clone(), BTreeSet::new());
            return Ok(BTreeSet::new());
        }

        for contribution in contributions {
            if contribution.declaration.replace.asserts_replace() {
                return Err(DatagenError::ReplaceUnsupported {
                    archive: contribution.archive.clone(),
                    path: path.document_path(),
                });
            }
        }

        self.stack.push(path.clone());
        let mut items = BTreeSet::new();
        for contribution in contributions {
            for value in &contribution.declaration.values {
                match value.reference() {
                    Some(nested) => {
                        if source.declarations(&nested).is_empty() {
                            if value.is_required() {
                                tracing::warn!(
                                    "tag {} referenced from {} is not declared",
                                    nested,
                                    path
                                );
                            } else {
                                tracing::debug!(
                                    "optional tag {} referenced from {} is not declared",
                                    nested,
                                    path
                                );
                            }
                        }
                        let nested_items = match self.resolve(&nested) {
                            Ok(set) => set,
                            Err(e) => {
                                self.stack.pop();
                                return Err(e);
                            }
                        };
                        items.extend(nested_items);
                    }
                    None => {
                        items.insert(ItemId::new(value.raw()));
                    }
                }
            }
        }
        self.stack.pop();

        self.memo.insert(path.clone(), items.clone());
        Ok(items)
    }
}
