//! VD-006: Recipe synthesis — variant-to-block and buffed stair recipes.
//!
//! Variant-to-block recipes are shaped `##` (slabs) or `##`/`##` (stairs)
//! recipes yielding one base block. They carry a mod-loaded condition for
//! every non-vanilla namespace involved. Stair recipes found in the archives
//! are re-emitted unchanged except for a higher yield.

use super::types::*;
use crate::output::is_contained;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::warn;

pub const DEFAULT_CONDITION_TYPE: &str = "forge:mod_loaded";
pub const DEFAULT_STAIR_YIELD: u32 = 8;

/// Directory (datapack root) holding the buffed stair recipes.
pub const STAIR_YIELD_DIR: &str = "increased-stair-yield";

const KEY_SYMBOL: &str = "#";

/// Knobs for generated documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisSettings {
    pub condition_type: String,
    pub stair_yield: u32,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            condition_type: DEFAULT_CONDITION_TYPE.to_string(),
            stair_yield: DEFAULT_STAIR_YIELD,
        }
    }
}

/// A generated recipe together with its output path.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRecipe {
    pub path: String,
    pub recipe: GeneratedRecipe,
}

/// Result of synthesizing one variant kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Synthesis {
    pub recipes: Vec<PlannedRecipe>,
    /// Declared variants with no known base block.
    pub unresolved: Vec<ItemId>,
}

/// Build a variant-to-block recipe for every declared variant with a base.
///
/// Variants are visited in the declared set's (sorted) order, so output is
/// deterministic for a given input.
pub fn synthesize_to_block(
    kind: VariantKind,
    mapping: &IndexMap<ItemId, ItemId>,
    declared: &BTreeSet<ItemId>,
    settings: &SynthesisSettings,
) -> Synthesis {
    let mut synthesis = Synthesis::default();
    for variant in declared {
        let Some(base) = mapping.get(variant) else {
            warn!("could not find matching block for {} {}", kind, variant);
            synthesis.unresolved.push(variant.clone());
            continue;
        };
        let path = to_block_path(kind, variant);
        if !is_contained(&path) {
            warn!("skipping {} {}: id is not usable as a file name", kind, variant);
            continue;
        }
        synthesis.recipes.push(PlannedRecipe {
            path,
            recipe: to_block_recipe(kind, variant, base, settings),
        });
    }
    synthesis
}

/// The shaped recipe turning `variants_per_block` variants back into a block.
pub fn to_block_recipe(
    kind: VariantKind,
    variant: &ItemId,
    base: &ItemId,
    settings: &SynthesisSettings,
) -> GeneratedRecipe {
    let mut key = IndexMap::new();
    key.insert(KEY_SYMBOL.to_string(), Ingredient::item(variant.clone()));
    GeneratedRecipe {
        recipe_type: SHAPED_RECIPE_TYPE.to_string(),
        group: kind.group().to_string(),
        pattern: kind.to_block_pattern(),
        key,
        result: ItemStack {
            item: base.clone(),
            count: 1,
        },
        conditions: mod_conditions(variant, base, &settings.condition_type),
    }
}

/// Mod-loaded conditions for the non-vanilla namespaces of `variant` and
/// `base`, variant first, without duplicates.
pub fn mod_conditions(
    variant: &ItemId,
    base: &ItemId,
    condition_type: &str,
) -> Vec<ModLoadedCondition> {
    let mut mods: Vec<&str> = Vec::new();
    for id in [variant, base] {
        let ns = id.namespace();
        if ns != VANILLA_NAMESPACE && !mods.contains(&ns) {
            mods.push(ns);
        }
    }
    mods.into_iter()
        .map(|modid| ModLoadedCondition {
            condition_type: condition_type.to_string(),
            modid: modid.to_string(),
        })
        .collect()
}

/// Output path of a variant-to-block recipe.
pub fn to_block_path(kind: VariantKind, variant: &ItemId) -> String {
    format!(
        "data/{}/recipes/{}.json",
        kind.purpose_dir(),
        variant.file_stem()
    )
}

/// Copy of a stair recipe document with its result count raised.
pub fn increase_stair_yield(original: &serde_json::Value, stair_yield: u32) -> serde_json::Value {
    let mut buffed = original.clone();
    if let Some(result) = buffed
        .get_mut("result")
        .and_then(serde_json::Value::as_object_mut)
    {
        result.insert("count".to_string(), serde_json::Value::from(stair_yield));
    }
    buffed
}

/// Output path of a buffed stair recipe, mirroring its archive path.
pub fn stair_yield_path(archive_path: &str) -> String {
    format!("{}/{}", STAIR_YIELD_DIR, archive_path)
}

/// Render a document as 2-space indented JSON.
pub fn render<T: serde::Serialize>(doc: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(doc)
}
