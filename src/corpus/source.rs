// Mon Aug 3 2026 - Alex

use crate::corpus::CorpusError;
use std::fs;
use std::path::{Path, PathBuf};

/// One corpus fragment: the primary dump or a file from the `split/`
/// tree. Split fragments get weaker pairing rules during extraction.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub lines: Vec<String>,
    pub is_split: bool,
}

/// Load the primary dump plus every `.txt` fragment under its sibling
/// `split/` directory (recursively, so `split/types/` is included),
/// ordered by path. The primary dump is required; fragments that fail to
/// read are skipped.
pub fn discover_sources(primary: &Path) -> Result<Vec<SourceFile>, CorpusError> {
    let mut sources = Vec::new();

    let lines = read_lines_lossy(primary).map_err(|source| CorpusError::PrimaryUnreadable {
        path: primary.to_path_buf(),
        source,
    })?;
    sources.push(SourceFile {
        path: primary.to_path_buf(),
        lines,
        is_split: false,
    });

    let split_root = primary
        .parent()
        .map(|dir| dir.join("split"))
        .unwrap_or_else(|| PathBuf::from("split"));
    if split_root.is_dir() {
        let mut fragment_paths = Vec::new();
        collect_fragments(&split_root, &mut fragment_paths);
        fragment_paths.sort();
        for path in fragment_paths {
            match read_lines_lossy(&path) {
                Ok(lines) => sources.push(SourceFile {
                    path,
                    lines,
                    is_split: true,
                }),
                Err(e) => log::warn!("skipping unreadable fragment {}: {}", path.display(), e),
            }
        }
    }

    Ok(sources)
}

fn collect_fragments(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot list fragment directory {}: {}", dir.display(), e);
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fragments(&path, out);
        } else if path.extension().map_or(false, |ext| ext == "txt") {
            out.push(path);
        }
    }
}

fn read_lines_lossy(path: &Path) -> std::io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.lines().map(|line| line.to_string()).collect())
}
