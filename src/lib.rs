//! Variant Datagen — slab and stair recipe generation for modpacks.
//!
//! Scans mod archives for slab/stair tags and the recipes that craft them,
//! works out which block each variant comes from, and writes recipes that
//! turn the variants back into blocks.

pub mod archive;
pub mod cli;
pub mod core;
pub mod output;
