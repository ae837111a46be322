//! VD-030: CLI subcommands — generate, classify, tags.

use crate::archive;
use crate::core::config::{self, DatagenConfig, DEFAULT_CONFIG_FILE};
use crate::core::tags::{TagIndex, TagResolver};
use crate::core::types::VariantKind;
use crate::core::{classifier, pipeline};
use crate::output::{DirectorySink, MemorySink};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate slab/stair-to-block recipes from a directory of mods
    Generate {
        /// Directory containing mod jars (overrides config)
        #[arg(short, long)]
        mods_dir: Option<PathBuf>,

        /// Directory to write generated data under (overrides config)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Path to datagen.yaml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show what would be written without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify a single recipe JSON file
    Classify {
        /// Path to the recipe file
        file: PathBuf,
    },

    /// Print the variants one archive declares through its tags
    Tags {
        /// Mod jar, zip, or unpacked directory
        archive: PathBuf,

        /// Variant kind: slab or stair
        #[arg(short, long, default_value = "slab")]
        kind: String,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Generate {
            mods_dir,
            out_dir,
            config,
            dry_run,
        } => cmd_generate(mods_dir, out_dir, config.as_deref(), dry_run),
        Commands::Classify { file } => cmd_classify(&file),
        Commands::Tags { archive, kind } => cmd_tags(&archive, &kind),
    }
}

/// Load the config (explicit path, or `datagen.yaml` if present) and apply overrides.
fn resolve_config(
    config_path: Option<&Path>,
    mods_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
) -> Result<DatagenConfig, String> {
    let mut cfg = match config_path {
        Some(path) => config::load_config(path).map_err(|e| e.to_string())?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            config::load_config(Path::new(DEFAULT_CONFIG_FILE)).map_err(|e| e.to_string())?
        }
        None => DatagenConfig::default(),
    };
    if let Some(dir) = mods_dir {
        cfg.mods_dir = dir;
    }
    if let Some(dir) = out_dir {
        cfg.out_dir = dir;
    }

    let errors = config::validate_config(&cfg);
    if errors.is_empty() {
        return Ok(cfg);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(format!("{} config error(s)", errors.len()))
}

fn cmd_generate(
    mods_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    config_path: Option<&Path>,
    dry_run: bool,
) -> Result<(), String> {
    let cfg = resolve_config(config_path, mods_dir, out_dir)?;

    let report = if dry_run {
        let mut sink = MemorySink::new();
        pipeline::run(&cfg, &mut sink).map_err(|e| e.to_string())?
    } else {
        let mut sink = DirectorySink::new(&cfg.out_dir);
        pipeline::run(&cfg, &mut sink).map_err(|e| e.to_string())?
    };

    if dry_run {
        for path in &report.written {
            println!("  + {}", cfg.out_dir.join(path).display());
        }
        println!();
    }

    for (kind, id) in &report.unresolved {
        println!("  ? {} {} has no known base block", kind, id);
    }

    println!(
        "{}: {} archives, {} recipes scanned ({} slab, {} stair candidates)",
        if dry_run { "Dry run" } else { "Generated" },
        report.archives,
        report.recipes_scanned,
        report.slab_candidates,
        report.stair_candidates
    );
    println!(
        "  {} slab-to-block, {} stair-to-block, {} increased stair yield; {} conflicts, {} unresolved.",
        report.slab_outputs,
        report.stair_outputs,
        report.stair_yield_outputs,
        report.conflicts,
        report.unresolved.len()
    );
    Ok(())
}

fn cmd_classify(file: &Path) -> Result<(), String> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| format!("cannot read {}: {}", file.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("invalid JSON in {}: {}", file.display(), e))?;

    match classifier::classify(&classifier::parse_recipe(&value)) {
        Some(found) => println!("{}: {} <- {}", found.kind, found.variant, found.base),
        None => println!("none"),
    }
    Ok(())
}

fn cmd_tags(path: &Path, kind: &str) -> Result<(), String> {
    let kind = VariantKind::parse(kind)
        .ok_or_else(|| format!("unknown variant kind '{}' (expected slab or stair)", kind))?;
    let mut opened = archive::open(path).map_err(|e| e.to_string())?;

    let mut index = TagIndex::new();
    index.ingest(opened.as_mut()).map_err(|e| e.to_string())?;
    let mut resolver = TagResolver::new(&index);
    let items = resolver
        .resolve(&kind.root_tag())
        .map_err(|e| e.to_string())?;

    if items.is_empty() {
        println!("{} declares no {} variants", opened.name(), kind);
        return Ok(());
    }
    for item in &items {
        println!("{}", item);
    }
    println!();
    println!("{} {} variants", items.len(), kind);
    Ok(())
}
