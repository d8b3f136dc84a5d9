// Tue Aug 4 2026 - Alex

pub mod defaults;
pub mod flags;

pub use defaults::extract_defaults;
pub use flags::FlagExtractor;

use crate::analyzer::HlilAnalyzer;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A literal recovered from the IR: either a raw integer write or the
/// same bits reinterpreted as a float when the layout marks the field
/// float-typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            FieldValue::Int(v) => v as f64,
            FieldValue::Float(v) => v,
        }
    }
}

/// One observed write. A constructor may assign the same field more than
/// once across branches; occurrences are preserved, not collapsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultOccurrence {
    pub offset: u32,
    pub value: FieldValue,
}

/// Flag-bit operations against the entity's reserved flags field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpawnFlagOps {
    pub checks: BTreeSet<u32>,
    pub sets: BTreeSet<u32>,
    pub clears: BTreeSet<u32>,
    pub assignments: BTreeSet<u32>,
}

/// IR-side reconstruction of one classname's constructor behavior.
#[derive(Debug, Clone, Serialize)]
pub struct HlilSpawnInfo {
    #[serde(skip)]
    pub classname: String,
    pub function: String,
    pub defaults: BTreeMap<String, Vec<DefaultOccurrence>>,
    pub spawnflags: SpawnFlagOps,
}

/// Source-side counterpart: one resolved value per field.
#[derive(Debug, Clone, Serialize)]
pub struct RepoSpawnInfo {
    #[serde(skip)]
    pub classname: String,
    pub function: String,
    pub defaults: BTreeMap<String, f64>,
    pub spawnflags: SpawnFlagOps,
}

/// Build the IR-side manifest: for every mapped classname, recover the
/// constructor's literal defaults and flag operations from its statement
/// block. Per-classname work has no cross-block dependency, so it fans
/// out over the thread pool.
pub fn build_hlil_manifest(analyzer: &HlilAnalyzer) -> BTreeMap<String, HlilSpawnInfo> {
    let fields = analyzer.fields();
    let blocks = analyzer.corpus().function_blocks();
    let itemlist = analyzer.itemlist();
    let config = analyzer.config();
    let flag_extractor = FlagExtractor::new(config.flags_offset);

    let entries: Vec<(String, String)> = analyzer
        .spawn_map()
        .iter()
        .map(|(classname, function)| (classname.clone(), function.clone()))
        .collect();

    let infos: Vec<(String, HlilSpawnInfo)> = entries
        .par_iter()
        .map(|(classname, function)| {
            let mut info = HlilSpawnInfo {
                classname: classname.clone(),
                function: function.clone(),
                defaults: BTreeMap::new(),
                spawnflags: SpawnFlagOps::default(),
            };
            if let Some(block) = blocks.get(function) {
                info.defaults =
                    extract_defaults(block, fields, config.low_offset_threshold);
                info.spawnflags = flag_extractor.extract(block);
            }
            if info.defaults.is_empty() && function == &config.generic_item_function {
                info.defaults = itemlist_defaults(itemlist.get(classname));
            }
            (classname.clone(), info)
        })
        .collect();

    infos.into_iter().collect()
}

/// Synthetic defaults for a generic-item classname: one entry per raw
/// word of its item descriptor record.
fn itemlist_defaults(record: Option<&Vec<u32>>) -> BTreeMap<String, Vec<DefaultOccurrence>> {
    let mut defaults = BTreeMap::new();
    let values = match record {
        Some(values) => values,
        None => return defaults,
    };
    for (idx, &raw_value) in values.iter().enumerate() {
        let offset = (idx * 4) as u32;
        defaults.insert(
            format!("offset_0x{:x}", offset),
            vec![DefaultOccurrence {
                offset,
                value: FieldValue::Int(raw_value as i64),
            }],
        );
    }
    defaults
}
