// Tue Aug 4 2026 - Alex

use crate::config::Config;
use crate::corpus::{normalize_classname, patterns, Corpus, CorpusError};
use crate::image::BinaryImage;
use crate::layout::{self, FieldInfo};
use crate::spawn;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::BTreeMap;

/// Read-only analysis state over one dump: the merged corpus, the binary
/// image when one could be loaded, and the lazily-built derived tables.
/// Everything is computed at most once and never invalidated.
pub struct HlilAnalyzer {
    config: Config,
    corpus: Corpus,
    image: Option<BinaryImage>,
    fields: OnceCell<BTreeMap<u32, FieldInfo>>,
    spawn_map: OnceCell<IndexMap<String, String>>,
    itemlist: OnceCell<IndexMap<String, Vec<u32>>>,
}

impl HlilAnalyzer {
    /// Load the corpus (fatal if the primary dump is unreadable) and the
    /// binary image (never fatal: binary-backed passes degrade to no-ops
    /// when the image is missing or not a recognized container).
    pub fn new(config: Config) -> Result<Self, CorpusError> {
        let corpus = Corpus::load(&config.hlil_path)?;
        let image = match config.resolved_binary_path() {
            Some(path) => match BinaryImage::load(&path) {
                Ok(image) => Some(image),
                Err(e) => {
                    log::warn!(
                        "binary image {} unavailable ({}), text-only heuristics apply",
                        path.display(),
                        e
                    );
                    None
                }
            },
            None => None,
        };
        Ok(Self::from_parts(config, corpus, image))
    }

    /// Assemble an analyzer from already-loaded inputs.
    pub fn from_parts(config: Config, corpus: Corpus, image: Option<BinaryImage>) -> Self {
        Self {
            config,
            corpus,
            image,
            fields: OnceCell::new(),
            spawn_map: OnceCell::new(),
            itemlist: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn image(&self) -> Option<&BinaryImage> {
        self.image.as_ref()
    }

    /// The recovered field layout table, offset-keyed.
    pub fn fields(&self) -> &BTreeMap<u32, FieldInfo> {
        self.fields.get_or_init(|| layout::recover_fields(&self.corpus))
    }

    /// The item descriptor table read from the binary; empty without an
    /// image.
    pub fn itemlist(&self) -> &IndexMap<String, Vec<u32>> {
        self.itemlist.get_or_init(|| match self.image() {
            Some(image) => spawn::itemlist_entries(
                image,
                self.config.item_table_address,
                self.config.table_entry_size,
            ),
            None => IndexMap::new(),
        })
    }

    /// The classname -> constructor map, built by folding six extraction
    /// passes in priority order; earlier passes win, later passes only
    /// fill gaps.
    pub fn spawn_map(&self) -> &IndexMap<String, String> {
        self.spawn_map.get_or_init(|| {
            let literal_map = self.corpus.string_literals();
            let blocks = self.corpus.function_blocks();
            let mut entries: IndexMap<String, String> = IndexMap::new();

            // 1: adjacent name/function pointer declarations
            self.collect_adjacent_pairs(&mut entries);

            // 2: string-compare dispatch chains
            for block in blocks.values() {
                spawn::merge_absent(&mut entries, spawn::strcmp_entries(block));
            }

            // 3: dispatch tables and switches spelled out in the text
            let strcmp_call = Regex::new(&format!(
                r#"(?i){}\([^,]+,\s*"([^"]+)"\)"#,
                regex::escape(&self.config.strcmp_helper)
            ))
            .expect("strcmp helper pattern");
            let table_label = format!("data_{:08x}", self.config.spawn_table_address);
            for block in blocks.values() {
                spawn::merge_absent(&mut entries, spawn::table_entries(block, literal_map));
                let block_text = block.join("\n").to_lowercase();
                if block_text.contains("spawn function") && block_text.contains(&table_label) {
                    if let Some(image) = self.image() {
                        spawn::merge_absent(
                            &mut entries,
                            spawn::scan_spawn_table(
                                image,
                                literal_map,
                                self.config.spawn_table_address,
                                self.config.table_entry_size,
                                self.config.invalid_streak_limit,
                            ),
                        );
                    }
                }
                spawn::merge_absent(&mut entries, spawn::switch_entries(block, &strcmp_call));
            }

            // 4: spawn tables scanned directly in the image
            if let Some(image) = self.image() {
                for address in [
                    self.config.item_table_address,
                    self.config.spawn_table_address,
                ] {
                    spawn::merge_absent(
                        &mut entries,
                        spawn::scan_spawn_table(
                            image,
                            literal_map,
                            address,
                            self.config.table_entry_size,
                            self.config.invalid_streak_limit,
                        ),
                    );
                }
            }

            // 5: item descriptors not claimed by any direct constructor
            for classname in self.itemlist().keys() {
                if !entries.contains_key(classname) {
                    entries.insert(
                        classname.clone(),
                        self.config.generic_item_function.clone(),
                    );
                }
            }

            // 6: call-graph harvesting around the known dispatchers
            spawn::merge_absent(
                &mut entries,
                spawn::callgraph_entries(
                    blocks,
                    &self.config.dispatcher_routines,
                    &self.config.classname_prefixes,
                ),
            );

            entries
        })
    }

    /// Pass 1: a pointer-to-name declaration whose next statement is a
    /// pointer-to-function declaration. In split fragments the pairing
    /// also accepts the next routine declaration further down, skipping
    /// blanks and comment lines.
    fn collect_adjacent_pairs(&self, entries: &mut IndexMap<String, String>) {
        for source in self.corpus.sources() {
            for (idx, raw_line) in source.lines.iter().enumerate() {
                let caps = match patterns::NAME_PTR_DECL.captures(raw_line) {
                    Some(caps) => caps,
                    None => continue,
                };
                let classname = normalize_classname(&caps[3]);
                if entries.contains_key(&classname) {
                    continue;
                }
                let next_line = match source.lines[idx + 1..]
                    .iter()
                    .find(|candidate| !candidate.trim().is_empty())
                {
                    Some(line) => line,
                    None => continue,
                };
                if let Some(func_caps) = patterns::FUNC_PTR_DECL.captures(next_line) {
                    entries.insert(classname, func_caps[2].to_string());
                } else if source.is_split {
                    if let Some(func) = find_next_function_decl(&source.lines, idx + 1) {
                        entries.insert(classname, func);
                    }
                }
            }
        }
    }
}

fn find_next_function_decl(lines: &[String], start: usize) -> Option<String> {
    for candidate in &lines[start..] {
        let stripped = candidate.trim();
        if stripped.is_empty() {
            continue;
        }
        if stripped.starts_with('#')
            || stripped.starts_with("//")
            || stripped.starts_with("/*")
            || stripped.starts_with('*')
        {
            continue;
        }
        if let Some(caps) = patterns::SUB_DECL.captures(candidate) {
            return Some(caps[1].to_string());
        }
    }
    None
}
