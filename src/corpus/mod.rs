// Mon Aug 3 2026 - Alex

pub mod patterns;
pub mod source;

pub use source::SourceFile;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read primary corpus {path}: {source}")]
    PrimaryUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One record of the `interpreted/strings.json` sidecar left next to the
/// dump by the string classifier pass.
#[derive(Debug, Clone, Deserialize)]
pub struct InterpretedString {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Classnames are case-preserving but arrive with stray whitespace and
/// embedded terminators from raw byte reads.
pub fn normalize_classname(name: &str) -> String {
    name.trim().trim_matches('\0').to_string()
}

/// The merged line corpus: primary dump plus split fragments, with the
/// function-block index and string-literal map built lazily on first
/// access and never invalidated.
pub struct Corpus {
    root: PathBuf,
    sources: Vec<SourceFile>,
    lines: Vec<String>,
    blocks: OnceCell<IndexMap<String, Vec<String>>>,
    literals: OnceCell<HashMap<String, String>>,
    interpreted: OnceCell<Vec<InterpretedString>>,
}

impl Corpus {
    pub fn load(primary: &Path) -> Result<Self, CorpusError> {
        let sources = source::discover_sources(primary)?;
        let lines = sources
            .iter()
            .flat_map(|s| s.lines.iter().cloned())
            .collect();
        let root = primary
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            root,
            sources,
            lines,
            blocks: OnceCell::new(),
            literals: OnceCell::new(),
            interpreted: OnceCell::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Statement blocks keyed by routine identifier, in first-seen order.
    /// A block re-declared in a later fragment is unioned line-by-line
    /// into the existing block, skipping lines already recorded, so the
    /// merge is idempotent and order-preserving.
    pub fn function_blocks(&self) -> &IndexMap<String, Vec<String>> {
        self.blocks.get_or_init(|| {
            let mut blocks: IndexMap<String, Vec<String>> = IndexMap::new();

            for source in &self.sources {
                let mut current: Option<(String, Vec<String>)> = None;
                for raw_line in &source.lines {
                    let line = raw_line.trim().to_string();
                    if let Some(caps) = patterns::BLOCK_START.captures(raw_line) {
                        let prefix = caps.get(1).map_or("", |m| m.as_str());
                        if prefix.contains("return") || prefix.contains('=') {
                            // a reference, not a declaration
                            if let Some((_, body)) = current.as_mut() {
                                body.push(line);
                            }
                            continue;
                        }
                        if let Some((name, body)) = current.take() {
                            append_block(&mut blocks, name, body);
                        }
                        current = Some((caps[2].to_string(), vec![line]));
                    } else if let Some((_, body)) = current.as_mut() {
                        body.push(line);
                    }
                }
                if let Some((name, body)) = current {
                    append_block(&mut blocks, name, body);
                }
            }

            blocks
        })
    }

    /// Lowercased label/address -> string content, for resolving table
    /// entries and binary name pointers back to classnames. Extended by
    /// the interpreted-strings sidecar when one is present.
    pub fn string_literals(&self) -> &HashMap<String, String> {
        self.literals.get_or_init(|| {
            let mut map = HashMap::new();
            for line in &self.lines {
                let caps = match patterns::NAME_PTR_DECL.captures(line) {
                    Some(caps) => caps,
                    None => continue,
                };
                let name = caps[3].to_string();
                for key in [&caps[1], &caps[2]] {
                    let normalized = key.to_lowercase();
                    map.insert(normalized, name.clone());
                    if let Some(hex) = key.strip_prefix("data_") {
                        map.insert(format!("0x{}", hex.to_lowercase()), name.clone());
                    }
                }
            }

            for entry in self.interpreted_strings() {
                let value = match entry.value.as_deref() {
                    Some(value) if !value.is_empty() => value,
                    _ => continue,
                };
                for key in [entry.symbol.as_deref(), entry.address.as_deref()] {
                    if let Some(key) = key {
                        if !key.is_empty() {
                            map.insert(key.to_lowercase(), value.to_string());
                        }
                    }
                }
            }

            map
        })
    }

    pub fn interpreted_strings(&self) -> &[InterpretedString] {
        self.interpreted.get_or_init(|| {
            let sidecar = self.root.join("interpreted").join("strings.json");
            let text = match std::fs::read_to_string(&sidecar) {
                Ok(text) => text,
                Err(_) => return Vec::new(),
            };
            match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("malformed sidecar {}: {}", sidecar.display(), e);
                    Vec::new()
                }
            }
        })
    }
}

fn append_block(blocks: &mut IndexMap<String, Vec<String>>, name: String, lines: Vec<String>) {
    let existing = blocks.entry(name).or_default();
    for line in lines {
        if !existing.contains(&line) {
            existing.push(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_corpus(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_missing_primary_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Corpus::load(&tmp.path().join("absent.txt")).is_err());
    }

    #[test]
    fn test_block_segmentation_rejects_references() {
        let tmp = tempfile::tempdir().unwrap();
        let primary = write_corpus(
            tmp.path(),
            "game_hlil.txt",
            concat!(
                "10001000    void sub_10001000(void* arg1)\n",
                "10001004        *(arg1 + 0x11c) = 0x1\n",
                "10001008        return sub_10002000(arg1)\n",
                "10002000    int32_t x = sub_10003000(arg1)\n",
            ),
        );
        let corpus = Corpus::load(&primary).unwrap();
        let blocks = corpus.function_blocks();

        assert_eq!(blocks.len(), 1);
        let block = &blocks["sub_10001000"];
        // the return and assignment lines stay inside the open block
        assert_eq!(block.len(), 4);
        assert!(block[2].contains("return sub_10002000"));
    }

    #[test]
    fn test_split_fragments_merge_and_are_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let primary = write_corpus(
            tmp.path(),
            "game_hlil.txt",
            concat!(
                "10001000    void sub_10001000(void* arg1)\n",
                "10001004        *(arg1 + 0x11c) = 0x1\n",
            ),
        );
        let fragment = concat!(
            "10001000    void sub_10001000(void* arg1)\n",
            "10001008        *(arg1 + 0x11c) |= 0x2\n",
        );
        write_corpus(tmp.path(), "split/game_block0001_block.txt", fragment);
        // same fragment again deeper in the tree: union must not duplicate
        write_corpus(tmp.path(), "split/types/game_block0001_copy.txt", fragment);

        let corpus = Corpus::load(&primary).unwrap();
        assert_eq!(corpus.sources().len(), 3);
        assert!(corpus.sources()[1].is_split);

        let block = &corpus.function_blocks()["sub_10001000"];
        assert_eq!(
            *block,
            vec![
                "10001000    void sub_10001000(void* arg1)".to_string(),
                "10001004        *(arg1 + 0x11c) = 0x1".to_string(),
                "10001008        *(arg1 + 0x11c) |= 0x2".to_string(),
            ]
        );
    }

    #[test]
    fn test_string_literal_map_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let primary = write_corpus(
            tmp.path(),
            "game_hlil.txt",
            "10010000  char (* data_10010000)[0x7] = data_10020000 {\"widget\"}\n",
        );
        let corpus = Corpus::load(&primary).unwrap();
        let literals = corpus.string_literals();
        assert_eq!(literals["data_10010000"], "widget");
        assert_eq!(literals["data_10020000"], "widget");
        assert_eq!(literals["0x10010000"], "widget");
        assert_eq!(literals["0x10020000"], "widget");
    }

    #[test]
    fn test_interpreted_sidecar_extends_literals() {
        let tmp = tempfile::tempdir().unwrap();
        let primary = write_corpus(tmp.path(), "game_hlil.txt", "");
        write_corpus(
            tmp.path(),
            "interpreted/strings.json",
            r#"[{"value": "weapon_rtdu", "symbol": "data_10099000", "address": "0x10099000", "category": "weapon_descriptor"}]"#,
        );
        let corpus = Corpus::load(&primary).unwrap();
        assert_eq!(corpus.string_literals()["data_10099000"], "weapon_rtdu");
        assert_eq!(corpus.string_literals()["0x10099000"], "weapon_rtdu");
    }

    #[test]
    fn test_normalize_classname() {
        assert_eq!(normalize_classname(" widget\0"), "widget");
        assert_eq!(normalize_classname("widget"), "widget");
    }
}
