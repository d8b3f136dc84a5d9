// Tue Aug 4 2026 - Alex

use crate::corpus::{normalize_classname, patterns};
use crate::spawn::chains;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;

/// Classname -> constructor pairs read directly out of
/// `{ literal-or-address, sub_X }` rows spelled out in the text.
pub fn table_entries(
    block: &[String],
    literal_map: &HashMap<String, String>,
) -> IndexMap<String, String> {
    let mut results = IndexMap::new();
    if block.is_empty() {
        return results;
    }
    let block_text = block.join("\n");
    for caps in patterns::TABLE_ENTRY.captures_iter(&block_text) {
        let raw = caps[1].trim().to_string();
        let function = caps[2].to_string();
        let classname = match resolve_classname_from_literal(&raw, literal_map) {
            Some(name) => name,
            None => continue,
        };
        let normalized = normalize_classname(&classname);
        if !results.contains_key(&normalized) {
            results.insert(normalized, function);
        }
    }
    results
}

/// Classname -> constructor pairs from `switch` dispatch: each case range
/// is scanned for classname string-compares and chased (within the range,
/// or through goto chains) for the constructor it returns.
pub fn switch_entries(block: &[String], strcmp_call: &Regex) -> IndexMap<String, String> {
    let mut results = IndexMap::new();
    if !block.iter().any(|line| line.contains("switch (")) {
        return results;
    }

    let labels = chains::label_indices(block);

    let mut case_indices: Vec<usize> = block
        .iter()
        .enumerate()
        .filter(|(_, line)| patterns::CASE_LINE.is_match(line))
        .map(|(idx, _)| idx)
        .collect();
    if case_indices.is_empty() {
        return results;
    }
    case_indices.push(block.len());

    for window in case_indices.windows(2) {
        let (start, end) = (window[0], window[1]);
        for idx in start..end {
            for caps in strcmp_call.captures_iter(&block[idx]) {
                let classname = normalize_classname(&caps[1]);
                if results.contains_key(&classname) {
                    continue;
                }
                if let Some(target) = chains::resolve_chain(block, idx + 1, end, &labels) {
                    results.insert(classname, target);
                }
            }
        }
    }
    results
}

/// Resolve a table row's first column: a quoted literal is taken as-is,
/// a `data_X` label or raw address goes through the literal map.
pub fn resolve_classname_from_literal(
    raw: &str,
    literal_map: &HashMap<String, String>,
) -> Option<String> {
    let mut token = raw.trim();
    if token.starts_with('"') && token.ends_with('"') && token.len() >= 2 {
        return Some(token[1..token.len() - 1].to_string());
    }
    if let Some(stripped) = token.strip_prefix('&') {
        token = stripped.trim();
    }
    if let Some(name) = literal_map.get(&token.to_lowercase()) {
        return Some(name.clone());
    }
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        let as_int = u64::from_str_radix(hex, 16).ok()?;
        if let Some(name) = literal_map.get(&format!("data_{:08x}", as_int)) {
            return Some(name.clone());
        }
    }
    None
}
