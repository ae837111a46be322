//! VD-008: The datagen run — archives in, recipe documents out.
//!
//! A [`RunContext`] owns all state accumulated during a run: the merged tag
//! index, the reconciler, and the matched stair recipes. Archives are
//! ingested strictly one after another, and each archive's recipes in sorted
//! path order, so conflict resolution is deterministic.

use super::classifier;
use super::config::DatagenConfig;
use super::error::DatagenError;
use super::reconciler::MappingReconciler;
use super::synth::{self, SynthesisSettings};
use super::tags::{TagIndex, TagResolver};
use super::types::{ItemId, VariantKind};
use crate::archive::{self, is_recipe_path, ModArchive};
use crate::output::OutputSink;
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Counters and diagnostics from one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub archives: usize,
    pub recipes_scanned: usize,
    pub slab_candidates: usize,
    pub stair_candidates: usize,
    pub conflicts: usize,
    pub slab_outputs: usize,
    pub stair_outputs: usize,
    pub stair_yield_outputs: usize,
    pub unresolved: Vec<(VariantKind, ItemId)>,
    /// Every path handed to the output sink, in write order.
    pub written: Vec<String>,
}

impl RunReport {
    pub fn total_outputs(&self) -> usize {
        self.slab_outputs + self.stair_outputs + self.stair_yield_outputs
    }
}

/// State threaded through one run.
pub struct RunContext {
    settings: SynthesisSettings,
    tags: TagIndex,
    reconciler: MappingReconciler,
    /// Matched stair recipes keyed by archive-relative path.
    stair_recipes: IndexMap<String, serde_json::Value>,
    report: RunReport,
}

impl RunContext {
    /// Fresh context with the config's seeds already recorded.
    pub fn new(config: &DatagenConfig) -> Self {
        let mut reconciler = MappingReconciler::new();
        for kind in VariantKind::all() {
            for (variant, base) in config.seeds.for_kind(*kind) {
                reconciler.seed(*kind, variant.clone(), base.clone());
            }
        }
        Self {
            settings: config.synthesis(),
            tags: TagIndex::new(),
            reconciler,
            stair_recipes: IndexMap::new(),
            report: RunReport::default(),
        }
    }

    pub fn reconciler(&self) -> &MappingReconciler {
        &self.reconciler
    }

    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    /// Read one archive's tags and recipes into the context.
    ///
    /// Entries that cannot be read are logged and skipped; only tag
    /// precondition violations come back as errors.
    pub fn ingest(&mut self, archive: &mut dyn ModArchive) -> Result<(), DatagenError> {
        let name = archive.name().to_string();
        for kind in VariantKind::all() {
            let root = kind.root_tag().document_path();
            if !archive.contains(&root) {
                warn!("{} tag not found for mod {}", kind, name);
            }
        }
        self.tags.ingest(archive)?;

        let mut scanned = 0;
        for path in archive.entries() {
            if !is_recipe_path(&path) {
                continue;
            }
            let text = match archive.read_text(&path) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    warn!("skipping unreadable recipe {}: {}", path, e);
                    continue;
                }
            };
            scanned += 1;
            self.ingest_recipe(&name, &path, &text);
        }

        self.report.archives += 1;
        self.report.recipes_scanned += scanned;
        info!("{}: scanned {} recipes", name, scanned);
        Ok(())
    }

    /// Classify one recipe document and record what it reveals.
    fn ingest_recipe(&mut self, archive_name: &str, path: &str, text: &str) {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!("skipping malformed recipe {} in {}: {}", path, archive_name, e);
                return;
            }
        };
        let doc = classifier::parse_recipe(&value);
        let Some(found) = classifier::classify(&doc) else {
            return;
        };

        let source = format!("{} ({})", path, archive_name);
        self.reconciler.record(&found, &source);
        match found.kind {
            VariantKind::Slab => self.report.slab_candidates += 1,
            VariantKind::Stair => {
                self.report.stair_candidates += 1;
                if self.stair_recipes.insert(path.to_string(), value).is_some() {
                    debug!("stair recipe {} overridden by {}", path, archive_name);
                }
            }
        }
    }

    /// Resolve declared variants, synthesize every document, and write them.
    pub fn finish(mut self, sink: &mut dyn OutputSink) -> Result<RunReport, DatagenError> {
        let mut resolver = TagResolver::new(&self.tags);

        for kind in VariantKind::all() {
            let declared: BTreeSet<ItemId> = resolver.resolve(&kind.root_tag())?;
            info!("{} declared {} variants", kind, declared.len());
            let synthesis = synth::synthesize_to_block(
                *kind,
                self.reconciler.mapping(*kind),
                &declared,
                &self.settings,
            );
            for planned in &synthesis.recipes {
                let text = render(&planned.recipe, &planned.path)?;
                sink.write(&planned.path, &text)?;
                self.report.written.push(planned.path.clone());
            }
            match kind {
                VariantKind::Slab => self.report.slab_outputs += synthesis.recipes.len(),
                VariantKind::Stair => self.report.stair_outputs += synthesis.recipes.len(),
            }
            self.report
                .unresolved
                .extend(synthesis.unresolved.into_iter().map(|id| (*kind, id)));
        }

        for (archive_path, original) in &self.stair_recipes {
            let path = synth::stair_yield_path(archive_path);
            let buffed = synth::increase_stair_yield(original, self.settings.stair_yield);
            let text = render(&buffed, &path)?;
            sink.write(&path, &text)?;
            self.report.written.push(path);
            self.report.stair_yield_outputs += 1;
        }

        self.report.conflicts = self.reconciler.conflicts().len();
        info!("wrote {} recipes", self.report.total_outputs());
        Ok(self.report)
    }
}

fn render<T: serde::Serialize>(doc: &T, path: &str) -> Result<String, DatagenError> {
    synth::render(doc).map_err(|e| DatagenError::Json {
        path: path.to_string(),
        detail: e.to_string(),
    })
}

/// Run the whole pipeline over the archives in `config.mods_dir`.
pub fn run(config: &DatagenConfig, sink: &mut dyn OutputSink) -> Result<RunReport, DatagenError> {
    let mut ctx = RunContext::new(config);
    for path in archive::discover(&config.mods_dir)? {
        let mut opened = match archive::open(&path) {
            Ok(a) => a,
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };
        ctx.ingest(opened.as_mut())?;
    }
    ctx.finish(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use crate::output::MemorySink;
    use serde_json::{json, Value};

    const SLABS_TAG: &str = "data/minecraft/tags/items/slabs.json";
    const STAIRS_TAG: &str = "data/minecraft/tags/items/stairs.json";

    fn slab_recipe(base: &str, slab: &str) -> String {
        json!({
            "type": "minecraft:crafting_shaped",
            "pattern": ["###"],
            "key": { "#": { "item": base } },
            "result": { "item": slab, "count": 6 }
        })
        .to_string()
    }

    fn stonecut_recipe(base: &str, slab: &str) -> String {
        json!({
            "type": "minecraft:stonecutting",
            "ingredient": { "item": base },
            "result": slab,
            "count": 2
        })
        .to_string()
    }

    fn stair_recipe(base: &str, stairs: &str) -> String {
        json!({
            "type": "minecraft:crafting_shaped",
            "group": "stairs",
            "pattern": ["X  ", "XX ", "XXX"],
            "key": { "X": { "item": base } },
            "result": { "item": stairs, "count": 4 }
        })
        .to_string()
    }

    fn parse(sink: &MemorySink, path: &str) -> Value {
        serde_json::from_str(sink.get(path).unwrap()).unwrap()
    }

    fn run_memory(archives: Vec<MemoryArchive>, config: &DatagenConfig) -> Result<(RunReport, MemorySink), DatagenError> {
        let mut ctx = RunContext::new(config);
        for mut a in archives {
            ctx.ingest(&mut a)?;
        }
        let mut sink = MemorySink::new();
        let report = ctx.finish(&mut sink)?;
        Ok((report, sink))
    }

    #[test]
    fn test_vd008_end_to_end_slabs_and_stairs() {
        let quark = MemoryArchive::new("quark.jar")
            .with_file(SLABS_TAG, r##"{"replace": false, "values": ["quark:granite_slab", "#quark:vertical"]}"##)
            .with_file("data/quark/tags/items/vertical.json", r#"{"values": ["quark:vertical_granite_slab"]}"#)
            .with_file(STAIRS_TAG, r#"{"values": ["quark:granite_stairs"]}"#)
            .with_file("data/quark/recipes/granite_slab.json", slab_recipe("minecraft:granite", "quark:granite_slab"))
            .with_file("data/quark/recipes/granite_stairs.json", stair_recipe("minecraft:granite", "quark:granite_stairs"))
            .with_file("data/quark/recipes/smelt.json", r#"{"type": "minecraft:smelting"}"#);

        let (report, sink) = run_memory(vec![quark], &DatagenConfig::default()).unwrap();

        assert_eq!(report.archives, 1);
        assert_eq!(report.recipes_scanned, 3);
        assert_eq!(report.slab_outputs, 1);
        assert_eq!(report.stair_outputs, 1);
        assert_eq!(report.stair_yield_outputs, 1);
        assert_eq!(
            report.unresolved,
            vec![(VariantKind::Slab, ItemId::from("quark:vertical_granite_slab"))]
        );

        let slab = parse(&sink, "data/slab-to-block/recipes/quark__granite_slab.json");
        assert_eq!(slab["pattern"], json!(["##"]));
        assert_eq!(slab["result"], json!({"item": "minecraft:granite", "count": 1}));
        assert_eq!(slab["conditions"], json!([{"type": "forge:mod_loaded", "modid": "quark"}]));

        let stairs = parse(&sink, "data/stair-to-block/recipes/quark__granite_stairs.json");
        assert_eq!(stairs["pattern"], json!(["##", "##"]));
        assert_eq!(stairs["key"]["#"]["item"], "quark:granite_stairs");

        let buffed = parse(&sink, "increased-stair-yield/data/quark/recipes/granite_stairs.json");
        let mut expected: Value = serde_json::from_str(&stair_recipe("minecraft:granite", "quark:granite_stairs")).unwrap();
        expected["result"]["count"] = json!(8);
        assert_eq!(buffed, expected);
    }

    #[test]
    fn test_vd008_tagless_archive_recipes_map_variants_declared_elsewhere() {
        let tags = MemoryArchive::new("a.jar").with_file(SLABS_TAG, r#"{"values": ["b:stone_slab"]}"#);
        let recipes = MemoryArchive::new("b.jar")
            .with_file("data/b/recipes/stone_slab.json", slab_recipe("b:stone", "b:stone_slab"));

        let (report, sink) = run_memory(vec![tags, recipes], &DatagenConfig::default()).unwrap();
        assert_eq!(report.slab_outputs, 1);
        assert!(sink.get("data/slab-to-block/recipes/b__stone_slab.json").is_some());
    }

    #[test]
    fn test_vd008_tagless_archive_stairs_still_get_yield_copies() {
        let pack = MemoryArchive::new("notags.jar")
            .with_file("data/n/recipes/stairs.json", stair_recipe("n:block", "n:stairs"));

        let (report, sink) = run_memory(vec![pack], &DatagenConfig::default()).unwrap();
        assert_eq!(report.stair_outputs, 0);
        assert_eq!(report.stair_yield_outputs, 1);
        assert!(sink
            .get("increased-stair-yield/data/n/recipes/stairs.json")
            .is_some());
    }

    #[test]
    fn test_vd008_conflicts_across_archives() {
        let first = MemoryArchive::new("a.jar")
            .with_file(SLABS_TAG, r#"{"values": ["x:slab"]}"#)
            .with_file("data/a/recipes/slab.json", slab_recipe("x:one", "x:slab"));
        let second = MemoryArchive::new("b.jar")
            .with_file("data/b/recipes/slab.json", slab_recipe("x:two", "x:slab"))
            .with_file("data/b/recipes/slab_cut.json", stonecut_recipe("x:three", "x:slab"));

        let (report, sink) = run_memory(vec![first, second], &DatagenConfig::default()).unwrap();
        assert_eq!(report.conflicts, 1);
        let slab = parse(&sink, "data/slab-to-block/recipes/x__slab.json");
        assert_eq!(slab["result"]["item"], "x:one");
    }

    #[test]
    fn test_vd008_seed_maps_unclassifiable_variant() {
        let mut config = DatagenConfig::default();
        config
            .seeds
            .slabs
            .insert(ItemId::from("q:odd_slab"), ItemId::from("q:odd_block"));
        let pack = MemoryArchive::new("q.jar").with_file(SLABS_TAG, r#"{"values": ["q:odd_slab"]}"#);

        let (report, sink) = run_memory(vec![pack], &config).unwrap();
        assert!(report.unresolved.is_empty());
        let slab = parse(&sink, "data/slab-to-block/recipes/q__odd_slab.json");
        assert_eq!(slab["result"]["item"], "q:odd_block");
    }

    #[test]
    fn test_vd008_replace_true_aborts() {
        let pack = MemoryArchive::new("evil.jar")
            .with_file(SLABS_TAG, r#"{"replace": "true", "values": ["e:slab"]}"#);
        let err = run_memory(vec![pack], &DatagenConfig::default()).err().unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("evil.jar"));
    }

    #[test]
    fn test_vd008_malformed_recipe_is_skipped() {
        let pack = MemoryArchive::new("m.jar")
            .with_file(SLABS_TAG, r#"{"values": ["m:slab"]}"#)
            .with_file("data/m/recipes/broken.json", "{ nope")
            .with_file("data/m/recipes/slab.json", slab_recipe("m:block", "m:slab"));
        let (report, _) = run_memory(vec![pack], &DatagenConfig::default()).unwrap();
        assert_eq!(report.recipes_scanned, 2);
        assert_eq!(report.slab_outputs, 1);
    }

    #[test]
    fn test_vd008_custom_stair_yield() {
        let mut config = DatagenConfig::default();
        config.stair_yield = 6;
        let pack = MemoryArchive::new("m.jar")
            .with_file("data/m/recipes/stairs.json", stair_recipe("m:block", "m:stairs"));
        let (_, sink) = run_memory(vec![pack], &config).unwrap();
        let buffed = parse(&sink, "increased-stair-yield/data/m/recipes/stairs.json");
        assert_eq!(buffed["result"]["count"], 6);
    }

    #[test]
    fn test_vd008_deterministic_output() {
        let build = || {
            vec![
                MemoryArchive::new("a.jar")
                    .with_file(SLABS_TAG, r#"{"values": ["a:z_slab", "a:b_slab"]}"#)
                    .with_file("data/a/recipes/z.json", slab_recipe("a:z", "a:z_slab"))
                    .with_file("data/a/recipes/b.json", stonecut_recipe("a:b", "a:b_slab")),
            ]
        };
        let (r1, s1) = run_memory(build(), &DatagenConfig::default()).unwrap();
        let (r2, s2) = run_memory(build(), &DatagenConfig::default()).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(s1.files, s2.files);
        assert_eq!(
            r1.written,
            vec![
                "data/slab-to-block/recipes/a__b_slab.json",
                "data/slab-to-block/recipes/a__z_slab.json"
            ]
        );
    }

    #[test]
    fn test_vd008_run_over_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mods = dir.path().join("mods");
        std::fs::create_dir_all(&mods).unwrap();
        let recipe = stonecut_recipe("stone:smooth", "stone:smooth_slab");
        crate::archive::jar::tests::write_zip(
            &mods.join("stone.jar"),
            &[
                (SLABS_TAG, r#"{"values": ["stone:smooth_slab"]}"#),
                ("data/stone/recipes/smooth_slab.json", recipe.as_str()),
            ],
        );
        std::fs::write(mods.join("readme.txt"), "not a mod").unwrap();

        let config = DatagenConfig {
            mods_dir: mods,
            out_dir: dir.path().join("out"),
            ..DatagenConfig::default()
        };
        let mut sink = crate::output::DirectorySink::new(&config.out_dir);
        let report = run(&config, &mut sink).unwrap();

        assert_eq!(report.archives, 1);
        let written = std::fs::read_to_string(
            config.out_dir.join("data/slab-to-block/recipes/stone__smooth_slab.json"),
        )
        .unwrap();
        let doc: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(doc["result"]["item"], "stone:smooth");
        assert_eq!(doc["conditions"][0]["modid"], "stone");
    }

    #[test]
    fn test_vd008_broken_archive_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.jar"), b"nope").unwrap();
        let config = DatagenConfig {
            mods_dir: dir.path().to_path_buf(),
            ..DatagenConfig::default()
        };
        let mut sink = MemorySink::new();
        let report = run(&config, &mut sink).unwrap();
        assert_eq!(report.archives, 0);
        assert_eq!(report.total_outputs(), 0);
    }

    #[test]
    fn test_vd008_unreadable_entries_do_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        let mods = dir.path().join("mods");
        std::fs::create_dir_all(&mods).unwrap();
        let recipe = slab_recipe("a:block", "a:slab");
        crate::archive::jar::tests::write_zip_bytes(
            &mods.join("a.jar"),
            &[
                (SLABS_TAG, br#"{"values": ["a:slab"]}"#.as_slice()),
                (STAIRS_TAG, b"\xff\xfe{}".as_slice()),
                ("data/a/recipes/bad.json", b"\xff\xfe{}".as_slice()),
                ("data/a/recipes/slab.json", recipe.as_bytes()),
            ],
        );
        let config = DatagenConfig {
            mods_dir: mods,
            ..DatagenConfig::default()
        };

        let mut sink = MemorySink::new();
        let report = run(&config, &mut sink).unwrap();
        assert_eq!(report.archives, 1);
        assert_eq!(report.recipes_scanned, 1);
        assert_eq!(report.slab_outputs, 1);
        assert!(sink.get("data/slab-to-block/recipes/a__slab.json").is_some());
    }

    #[test]
    fn test_vd008_traversing_member_paths_stay_inside_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mods = dir.path().join("mods");
        let out = dir.path().join("nested").join("out");
        std::fs::create_dir_all(&mods).unwrap();
        let stairs = stair_recipe("a:block", "a:stairs");
        crate::archive::jar::tests::write_zip(
            &mods.join("a.jar"),
            &[
                ("data/a/recipes/../../../../escaped.json", stairs.as_str()),
                ("data/a/recipes/stairs.json", stairs.as_str()),
                (
                    "data/minecraft/tags/items/../../../../../tag.json",
                    r#"{"replace": "true", "values": []}"#,
                ),
            ],
        );
        let config = DatagenConfig {
            mods_dir: mods,
            out_dir: out.clone(),
            ..DatagenConfig::default()
        };

        let mut sink = crate::output::DirectorySink::new(&config.out_dir);
        let report = run(&config, &mut sink).unwrap();
        assert_eq!(report.recipes_scanned, 1);
        assert_eq!(
            report.written,
            vec!["increased-stair-yield/data/a/recipes/stairs.json"]
        );
        assert!(!dir.path().join("nested").join("escaped.json").exists());
        assert!(!dir.path().join("escaped.json").exists());
        assert!(out
            .join("increased-stair-yield/data/a/recipes/stairs.json")
            .exists());
    }
}
