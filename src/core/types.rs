//! VD-001: Identifiers, tag declarations, and recipe document types.
//!
//! Recipe documents are modelled as a tagged enum over the two recipe kinds
//! the classifier understands, with everything else collapsing into
//! [`RecipeDocument::Other`]. Generated recipes have their own serialize-only
//! types so the output field order is fixed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace that never needs a mod-loaded condition.
pub const VANILLA_NAMESPACE: &str = "minecraft";

/// Marker that turns a tag value into a reference to another tag.
pub const TAG_REFERENCE_PREFIX: char = '#';

/// Item that stands for "no ingredient" in recipe keys.
pub const AIR: &str = "minecraft:air";

// ============================================================================
// Identifiers
// ============================================================================

/// A namespaced item identifier (`namespace:name`).
///
/// Identity is exact string equality. An identifier without a separator
/// belongs to the vanilla namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace part, split at the first `:`.
    pub fn namespace(&self) -> &str {
        match self.0.find(':') {
            Some(idx) => &self.0[..idx],
            None => VANILLA_NAMESPACE,
        }
    }

    /// Name part after the first `:` (the whole string when unqualified).
    pub fn name(&self) -> &str {
        match self.0.find(':') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    pub fn is_vanilla(&self) -> bool {
        self.namespace() == VANILLA_NAMESPACE
    }

    /// Filesystem-safe stem: the first `:` becomes `__`.
    pub fn file_stem(&self) -> String {
        self.0.replacen(':', "__", 1)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

// ============================================================================
// Variant kinds
// ============================================================================

/// The two shaped sub-units of a block this tool knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantKind {
    Slab,
    Stair,
}

impl VariantKind {
    pub fn all() -> &'static [VariantKind] {
        &[Self::Slab, Self::Stair]
    }

    /// Root item tag listing every variant of this kind.
    pub fn root_tag(&self) -> TagPath {
        match self {
            Self::Slab => TagPath::new(VANILLA_NAMESPACE, "slabs"),
            Self::Stair => TagPath::new(VANILLA_NAMESPACE, "stairs"),
        }
    }

    /// How many variants are crafted back into one block.
    pub fn variants_per_block(&self) -> u32 {
        match self {
            Self::Slab => 2,
            Self::Stair => 4,
        }
    }

    /// Crafting pattern that consumes [`Self::variants_per_block`] items.
    pub fn to_block_pattern(&self) -> Vec<String> {
        match self {
            Self::Slab => vec!["##".to_string()],
            Self::Stair => vec!["##".to_string(), "##".to_string()],
        }
    }

    /// Recipe group for generated variant-to-block recipes.
    pub fn group(&self) -> &'static str {
        match self {
            Self::Slab => "slab_to_block",
            Self::Stair => "stair_to_block",
        }
    }

    /// Output directory name for generated variant-to-block recipes.
    pub fn purpose_dir(&self) -> &'static str {
        match self {
            Self::Slab => "slab-to-block",
            Self::Stair => "stair-to-block",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "slab" | "slabs" => Some(Self::Slab),
            "stair" | "stairs" => Some(Self::Stair),
            _ => None,
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slab => write!(f, "slab"),
            Self::Stair => write!(f, "stair"),
        }
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Logical location of an item tag: namespace plus tag name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagPath {
    pub namespace: String,
    pub name: String,
}

impl TagPath {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse a `#namespace:name` reference. Returns `None` for plain values.
    pub fn from_reference(value: &str) -> Option<Self> {
        let target = value.strip_prefix(TAG_REFERENCE_PREFIX)?;
        let id = ItemId::new(target);
        Some(Self::new(id.namespace(), id.name()))
    }

    /// Archive-relative path of the tag document.
    pub fn document_path(&self) -> String {
        format!("data/{}/tags/items/{}.json", self.namespace, self.name)
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.namespace, self.name)
    }
}

/// A tag declaration document: `{ "replace": ..., "values": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagDeclaration {
    #[serde(default)]
    pub replace: ReplaceFlag,
    #[serde(default)]
    pub values: Vec<TagValue>,
}

/// `replace` shows up both as a JSON bool and as a string in the wild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplaceFlag {
    Bool(bool),
    Text(String),
}

impl Default for ReplaceFlag {
    fn default() -> Self {
        Self::Bool(false)
    }
}

impl ReplaceFlag {
    /// True when the declaration asks to replace rather than append.
    ///
    /// Only the string `"true"` counts; a JSON bool is read as an append.
    pub fn asserts_replace(&self) -> bool {
        match self {
            Self::Bool(_) => false,
            Self::Text(s) => s == "true",
        }
    }
}

/// One entry of a tag's `values` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Plain(String),
    Entry {
        id: String,
        #[serde(default = "default_required")]
        required: bool,
    },
}

fn default_required() -> bool {
    true
}

impl TagValue {
    pub fn raw(&self) -> &str {
        match self {
            Self::Plain(s) => s,
            Self::Entry { id, .. } => id,
        }
    }

    /// False only for entries marked `"required": false`.
    pub fn is_required(&self) -> bool {
        match self {
            Self::Plain(_) => true,
            Self::Entry { required, .. } => *required,
        }
    }

    /// The referenced tag, if this value is a `#` reference.
    pub fn reference(&self) -> Option<TagPath> {
        TagPath::from_reference(self.raw())
    }
}

// ============================================================================
// Recipe documents (input)
// ============================================================================

/// A recipe document, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum RecipeDocument {
    #[serde(rename = "minecraft:crafting_shaped", alias = "crafting_shaped")]
    Shaped(ShapedRecipe),
    #[serde(rename = "minecraft:stonecutting", alias = "stonecutting")]
    Stonecutting(StonecuttingRecipe),
    #[serde(other)]
    Other,
}

/// Shaped crafting: a grid pattern, a symbol key, and a result stack.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShapedRecipe {
    pub pattern: Vec<String>,
    pub key: IndexMap<String, IngredientSpec>,
    pub result: ItemStack,
}

/// Stonecutting: one ingredient, one result, optional top-level count.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StonecuttingRecipe {
    pub ingredient: IngredientSpec,
    pub result: StonecuttingResult,
    #[serde(default)]
    pub count: Option<u32>,
}

impl StonecuttingRecipe {
    /// Effective yield: top-level `count`, then the result stack's count, then 1.
    pub fn yield_count(&self) -> u32 {
        match (&self.count, &self.result) {
            (Some(count), _) => *count,
            (None, StonecuttingResult::Stack(stack)) => stack.count,
            (None, StonecuttingResult::Id(_)) => 1,
        }
    }
}

/// Stonecutting results are either a bare id or a full stack.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StonecuttingResult {
    Id(ItemId),
    Stack(ItemStack),
}

impl StonecuttingResult {
    pub fn item(&self) -> &ItemId {
        match self {
            Self::Id(id) => id,
            Self::Stack(stack) => &stack.item,
        }
    }
}

/// An item plus a count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    #[serde(alias = "id")]
    pub item: ItemId,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

/// Key entry of a recipe: a single ingredient or a list of alternatives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IngredientSpec {
    Single(Ingredient),
    Alternatives(Vec<Ingredient>),
}

impl IngredientSpec {
    /// The concrete item this ingredient names, if it names exactly one.
    pub fn concrete_item(&self) -> Option<&ItemId> {
        match self {
            Self::Single(ingredient) => ingredient
                .item
                .as_ref()
                .filter(|id| !id.as_str().is_empty() && id.as_str() != AIR),
            Self::Alternatives(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Ingredient {
    pub fn item(id: ItemId) -> Self {
        Self {
            item: Some(id),
            tag: None,
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Which kind of recipe produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeOrigin {
    Crafting,
    Stonecutting,
    /// Pre-loaded override, not read from any archive.
    Seed,
}

/// A recipe recognised as producing a variant from its base block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: VariantKind,
    pub variant: ItemId,
    pub base: ItemId,
    pub origin: RecipeOrigin,
}

// ============================================================================
// Generated recipes (output)
// ============================================================================

/// Output type of every generated variant-to-block recipe.
pub const SHAPED_RECIPE_TYPE: &str = "minecraft:crafting_shaped";

/// A shaped recipe written by the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedRecipe {
    #[serde(rename = "type")]
    pub recipe_type: String,
    pub group: String,
    pub pattern: Vec<String>,
    pub key: IndexMap<String, Ingredient>,
    pub result: ItemStack,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ModLoadedCondition>,
}

/// Load condition gating a recipe on a mod being present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModLoadedCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub modid: String,
}
