// Wed Aug 5 2026 - Alex

use crate::compare::ComparisonReport;
use crate::manifest::{HlilSpawnInfo, RepoSpawnInfo};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Assembles and writes the emitted documents. Pretty-printing is a
/// formatting choice only; the document content is identical either way.
pub struct ManifestWriter {
    pretty: bool,
}

impl ManifestWriter {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// `{ "hlil": {...}, "repo": {...} }` with one
    /// function/defaults/spawnflags object per classname.
    pub fn combined_document(
        &self,
        hlil: &BTreeMap<String, HlilSpawnInfo>,
        repo: &BTreeMap<String, RepoSpawnInfo>,
    ) -> Value {
        let mut hlil_map = Map::new();
        for (classname, info) in hlil {
            hlil_map.insert(
                classname.clone(),
                serde_json::to_value(info).unwrap_or(Value::Null),
            );
        }
        let mut repo_map = Map::new();
        for (classname, info) in repo {
            repo_map.insert(
                classname.clone(),
                serde_json::to_value(info).unwrap_or(Value::Null),
            );
        }
        json!({
            "hlil": Value::Object(hlil_map),
            "repo": Value::Object(repo_map),
        })
    }

    pub fn comparison_document(&self, comparison: &ComparisonReport) -> Value {
        serde_json::to_value(comparison).unwrap_or(Value::Null)
    }

    /// The stdout shape: both manifests plus the comparison in one
    /// document.
    pub fn full_document(&self, combined: Value, comparison: Value) -> Value {
        json!({
            "combined": combined,
            "comparison": comparison,
        })
    }

    pub fn render(&self, value: &Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap_or_default()
        } else {
            serde_json::to_string(value).unwrap_or_default()
        }
    }

    /// Files are always written indented; the pretty flag only governs
    /// stdout.
    pub fn write_to_file<P: AsRef<Path>>(&self, value: &Value, path: P) -> std::io::Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        let text = serde_json::to_string_pretty(value).unwrap_or_default();
        writer.write_all(text.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_stdout(&self, value: &Value) -> std::io::Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(self.render(value).as_bytes())?;
        if self.pretty {
            handle.write_all(b"\n")?;
        }
        Ok(())
    }
}

impl Default for ManifestWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{DefaultOccurrence, FieldValue, SpawnFlagOps};

    fn sample_manifests() -> (
        BTreeMap<String, HlilSpawnInfo>,
        BTreeMap<String, RepoSpawnInfo>,
    ) {
        let hlil = BTreeMap::from([(
            "widget".to_string(),
            HlilSpawnInfo {
                classname: "widget".to_string(),
                function: "sub_10001000".to_string(),
                defaults: BTreeMap::from([(
                    "speed".to_string(),
                    vec![DefaultOccurrence {
                        offset: 0x11c,
                        value: FieldValue::Float(200.0),
                    }],
                )]),
                spawnflags: SpawnFlagOps {
                    sets: [1].into_iter().collect(),
                    ..SpawnFlagOps::default()
                },
            },
        )]);
        let repo = BTreeMap::from([(
            "widget".to_string(),
            RepoSpawnInfo {
                classname: "widget".to_string(),
                function: "SP_widget".to_string(),
                defaults: BTreeMap::from([("speed".to_string(), 200.0)]),
                spawnflags: SpawnFlagOps::default(),
            },
        )]);
        (hlil, repo)
    }

    #[test]
    fn test_combined_document_shape() {
        let (hlil, repo) = sample_manifests();
        let writer = ManifestWriter::new();
        let document = writer.combined_document(&hlil, &repo);

        let entry = &document["hlil"]["widget"];
        assert_eq!(entry["function"], "sub_10001000");
        assert_eq!(entry["defaults"]["speed"][0]["offset"], 0x11c);
        assert_eq!(entry["defaults"]["speed"][0]["value"], 200.0);
        assert_eq!(entry["spawnflags"]["sets"], json!([1]));
        // the classname is the key, never repeated inside the entry
        assert!(entry.get("classname").is_none());

        assert_eq!(document["repo"]["widget"]["function"], "SP_widget");
    }

    #[test]
    fn test_pretty_is_formatting_only() {
        let (hlil, repo) = sample_manifests();
        let compact = ManifestWriter::new();
        let pretty = ManifestWriter::new().with_pretty(true);
        let document = compact.combined_document(&hlil, &repo);

        let compact_text = compact.render(&document);
        let pretty_text = pretty.render(&document);
        assert_ne!(compact_text, pretty_text);
        let a: Value = serde_json::from_str(&compact_text).unwrap();
        let b: Value = serde_json::from_str(&pretty_text).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_to_file_round_trips() {
        let (hlil, repo) = sample_manifests();
        let writer = ManifestWriter::new().with_pretty(true);
        let document = writer.combined_document(&hlil, &repo);

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("manifest.json");
        writer.write_to_file(&document, &path).unwrap();
        let read_back: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read_back, document);
    }
}
