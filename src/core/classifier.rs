//! VD-004: Recipe classification — recognise slab and stair recipes.
//!
//! A recipe is a slab candidate when it is:
//! - stonecutting with a yield of 2 from a concrete item, or
//! - shaped crafting with the single row `XXX` and a yield of 6.
//!
//! A recipe is a stair candidate when it is shaped crafting with the
//! three-row staircase (`X  `/`XX `/`XXX`, or its mirror) and a yield of 4.
//! Stair shapes are checked before slab shapes. Everything else is inert.

use super::types::*;
use tracing::debug;

pub const SLAB_CRAFTING_YIELD: u32 = 6;
pub const SLAB_STONECUTTING_YIELD: u32 = 2;
pub const STAIR_CRAFTING_YIELD: u32 = 4;

const EMPTY_CELL: char = ' ';

/// Interpret a parsed JSON value as a recipe document.
///
/// Documents that claim a known `type` but don't fit its shape are treated
/// as unrecognized rather than as errors.
pub fn parse_recipe(value: &serde_json::Value) -> RecipeDocument {
    match serde_json::from_value::<RecipeDocument>(value.clone()) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("unrecognized recipe shape: {}", e);
            RecipeDocument::Other
        }
    }
}

/// Classify a recipe as a slab or stair recipe, extracting variant and base.
pub fn classify(doc: &RecipeDocument) -> Option<Classification> {
    match doc {
        RecipeDocument::Shaped(shaped) => {
            classify_stair(shaped).or_else(|| classify_crafted_slab(shaped))
        }
        RecipeDocument::Stonecutting(cut) => classify_stonecut_slab(cut),
        RecipeDocument::Other => None,
    }
}

fn classify_stair(recipe: &ShapedRecipe) -> Option<Classification> {
    let symbol = stair_symbol(&recipe.pattern)?;
    crafted(recipe, symbol, VariantKind::Stair, STAIR_CRAFTING_YIELD)
}

fn classify_crafted_slab(recipe: &ShapedRecipe) -> Option<Classification> {
    let symbol = slab_symbol(&recipe.pattern)?;
    crafted(recipe, symbol, VariantKind::Slab, SLAB_CRAFTING_YIELD)
}

fn crafted(
    recipe: &ShapedRecipe,
    symbol: char,
    kind: VariantKind,
    expected_yield: u32,
) -> Option<Classification> {
    if recipe.result.count != expected_yield {
        return None;
    }
    let base = recipe
        .key
        .get(symbol.to_string().as_str())?
        .concrete_item()?;
    Some(Classification {
        kind,
        variant: recipe.result.item.clone(),
        base: base.clone(),
        origin: RecipeOrigin::Crafting,
    })
}

fn classify_stonecut_slab(recipe: &StonecuttingRecipe) -> Option<Classification> {
    if recipe.yield_count() != SLAB_STONECUTTING_YIELD {
        return None;
    }
    let base = recipe.ingredient.concrete_item()?;
    Some(Classification {
        kind: VariantKind::Slab,
        variant: recipe.result.item().clone(),
        base: base.clone(),
        origin: RecipeOrigin::Stonecutting,
    })
}

/// The symbol of a `XXX` single-row pattern.
pub fn slab_symbol(pattern: &[String]) -> Option<char> {
    let [row] = pattern else {
        return None;
    };
    let cells: Vec<char> = row.chars().collect();
    let [a, b, c] = cells.as_slice() else {
        return None;
    };
    (*a != EMPTY_CELL && a == b && b == c).then_some(*a)
}

/// The symbol of a 3x3 staircase pattern, left- or right-aligned.
pub fn stair_symbol(pattern: &[String]) -> Option<char> {
    if pattern.len() != 3 {
        return None;
    }
    let grid: Vec<Vec<char>> = pattern.iter().map(|row| row.chars().collect()).collect();
    if grid.iter().any(|row| row.len() != 3) {
        return None;
    }
    // Bottom row is always full, so its first cell names the symbol.
    let symbol = grid[2][0];
    if symbol == EMPTY_CELL {
        return None;
    }
    let matches = |mirrored: bool| {
        (0..3).all(|r| (0..3).all(|c| grid[r][c] == staircase_cell(r, c, mirrored, symbol)))
    };
    (matches(false) || matches(true)).then_some(symbol)
}

/// Expected cell of the staircase: row `r` holds `r + 1` filled cells.
fn staircase_cell(row: usize, col: usize, mirrored: bool, symbol: char) -> char {
    let filled = if mirrored { col >= 2 - row } else { col <= row };
    if filled {
        symbol
    } else {
        EMPTY_CELL
    }
}
