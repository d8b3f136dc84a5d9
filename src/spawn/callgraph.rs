// Tue Aug 4 2026 - Alex

use crate::corpus::{normalize_classname, patterns};
use indexmap::IndexMap;

/// Last-resort pass for classnames reachable only through indirection:
/// in every routine that calls one of the known dispatcher routines,
/// every quoted literal after the call site that carries a recognized
/// classname prefix is attributed to the containing routine.
pub fn callgraph_entries(
    blocks: &IndexMap<String, Vec<String>>,
    dispatchers: &[String],
    prefixes: &[String],
) -> IndexMap<String, String> {
    let mut entries = IndexMap::new();

    for (func_name, block) in blocks {
        let call_index = match locate_call_start(block, dispatchers) {
            Some(idx) => idx,
            None => continue,
        };
        for line in &block[call_index..] {
            for caps in patterns::QUOTED_LITERAL.captures_iter(line) {
                let normalized = normalize_classname(&caps[1]);
                if !looks_like_classname(&normalized, prefixes) {
                    continue;
                }
                if !entries.contains_key(&normalized) {
                    entries.insert(normalized, func_name.clone());
                }
            }
        }
    }

    entries
}

fn locate_call_start(block: &[String], dispatchers: &[String]) -> Option<usize> {
    block.iter().position(|line| {
        dispatchers
            .iter()
            .any(|dispatcher| line.contains(dispatcher.as_str()))
    })
}

pub fn looks_like_classname(literal: &str, prefixes: &[String]) -> bool {
    if literal.is_empty() || !literal.contains('_') {
        return false;
    }
    let lowered = literal.to_lowercase();
    prefixes.iter().any(|prefix| lowered.starts_with(prefix.as_str()))
}
