//! VD-005: Mapping reconciliation, one base block per variant.
//!
//! The first mapping recorded for a variant wins. A later recipe that
//! disagrees is a conflict: reported when it comes from crafting (or a
//! seed), silently dropped when it comes from stonecutting, since one item
//! can legitimately be cut from several blocks.

use super::types::{Classification, ItemId, RecipeOrigin, VariantKind};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// What happened to a recorded classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First mapping for this variant.
    Mapped,
    /// Same base as the existing mapping.
    Unchanged,
    /// Different base; reported and discarded.
    Conflict,
    /// Different base from a stonecutting recipe; discarded quietly.
    SuppressedConflict,
}

/// A reported disagreement about a variant's base block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConflict {
    pub kind: VariantKind,
    pub variant: ItemId,
    pub kept: ItemId,
    pub rejected: ItemId,
    /// Where the rejected mapping came from (recipe path or "seed").
    pub source: String,
}

#[derive(Debug, Clone, Default)]
pub struct MappingReconciler {
    slabs: IndexMap<ItemId, ItemId>,
    stairs: IndexMap<ItemId, ItemId>,
    conflicts: Vec<MappingConflict>,
}

impl MappingReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a known mapping before any recipe is read.
    pub fn seed(&mut self, kind: VariantKind, variant: ItemId, base: ItemId) -> RecordOutcome {
        let seeded = Classification {
            kind,
            variant,
            base,
            origin: RecipeOrigin::Seed,
        };
        self.record(&seeded, "seed")
    }

    /// Record a classified recipe. `source` identifies it in diagnostics.
    pub fn record(&mut self, found: &Classification, source: &str) -> RecordOutcome {
        let mapping = match found.kind {
            VariantKind::Slab => &mut self.slabs,
            VariantKind::Stair => &mut self.stairs,
        };

        let Some(existing) = mapping.get(&found.variant) else {
            mapping.insert(found.variant.clone(), found.base.clone());
            return RecordOutcome::Mapped;
        };
        if *existing == found.base {
            return RecordOutcome::Unchanged;
        }

        if found.origin == RecipeOrigin::Stonecutting {
            debug!(
                "{} {} can also be stonecut from {} ({}); keeping {}",
                found.kind, found.variant, found.base, source, existing
            );
            return RecordOutcome::SuppressedConflict;
        }

        warn!(
            "{} {} is already mapped to {}, but {} maps it to {}",
            found.kind, found.variant, existing, source, found.base
        );
        self.conflicts.push(MappingConflict {
            kind: found.kind,
            variant: found.variant.clone(),
            kept: existing.clone(),
            rejected: found.base.clone(),
            source: source.to_string(),
        });
        RecordOutcome::Conflict
    }

    /// The variant → base mapping for one kind, in first-seen order.
    pub fn mapping(&self, kind: VariantKind) -> &IndexMap<ItemId, ItemId> {
        match kind {
            VariantKind::Slab => &self.slabs,
            VariantKind::Stair => &self.stairs,
        }
    }

    pub fn base_of(&self, kind: VariantKind, variant: &ItemId) -> Option<&ItemId> {
        self.mapping(kind).get(variant)
    }

    /// Conflicts reported so far.
    pub fn conflicts(&self) -> &[MappingConflict] {
        &self.conflicts
    }
}
