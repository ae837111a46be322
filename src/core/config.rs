//! VD-007: `datagen.yaml` parsing and validation.
//!
//! Every field is optional. CLI flags override whatever the file says.

use super::error::DatagenError;
use super::synth::{SynthesisSettings, DEFAULT_CONDITION_TYPE, DEFAULT_STAIR_YIELD};
use super::types::{ItemId, VariantKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "datagen.yaml";

/// Settings for one datagen run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatagenConfig {
    /// Directory holding the mod archives
    pub mods_dir: PathBuf,

    /// Directory the generated files are written under
    pub out_dir: PathBuf,

    /// Condition `type` used for mod-loaded gating
    pub condition_type: String,

    /// Result count written into buffed stair recipes
    pub stair_yield: u32,

    /// Known mappings that recipes can't reveal
    pub seeds: Seeds,
}

impl Default for DatagenConfig {
    fn default() -> Self {
        Self {
            mods_dir: PathBuf::from("mods"),
            out_dir: PathBuf::from("."),
            condition_type: DEFAULT_CONDITION_TYPE.to_string(),
            stair_yield: DEFAULT_STAIR_YIELD,
            seeds: Seeds::default(),
        }
    }
}

impl DatagenConfig {
    pub fn synthesis(&self) -> SynthesisSettings {
        SynthesisSettings {
            condition_type: self.condition_type.clone(),
            stair_yield: self.stair_yield,
        }
    }
}

/// Seed mappings per variant kind, applied in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Seeds {
    pub slabs: IndexMap<ItemId, ItemId>,
    pub stairs: IndexMap<ItemId, ItemId>,
}

impl Seeds {
    pub fn for_kind(&self, kind: VariantKind) -> &IndexMap<ItemId, ItemId> {
        match kind {
            VariantKind::Slab => &self.slabs,
            VariantKind::Stair => &self.stairs,
        }
    }
}

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Load a config file from disk.
pub fn load_config(path: &Path) -> Result<DatagenConfig, DatagenError> {
    let content = std::fs::read_to_string(path).map_err(|e| DatagenError::Config {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    parse_config(&content).map_err(|detail| DatagenError::Config {
        path: path.display().to_string(),
        detail,
    })
}

/// Parse a config from a YAML string.
pub fn parse_config(yaml: &str) -> Result<DatagenConfig, String> {
    serde_yaml_ng::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &DatagenConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.condition_type.trim().is_empty() {
        errors.push(ValidationError {
            message: "condition_type must not be empty".to_string(),
        });
    }

    if config.stair_yield == 0 {
        errors.push(ValidationError {
            message: "stair_yield must be at least 1".to_string(),
        });
    }

    for kind in VariantKind::all() {
        for (variant, base) in config.seeds.for_kind(*kind) {
            if variant == base {
                errors.push(ValidationError {
                    message: format!("{} seed {} maps to itself", kind, variant),
                });
            }
            for id in [variant, base] {
                if !id.as_str().contains(':') || id.name().is_empty() {
                    errors.push(ValidationError {
                        message: format!("{} seed entry '{}' is not a namespaced id", kind, id),
                    });
                }
            }
        }
    }

    errors
}
