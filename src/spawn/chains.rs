// Tue Aug 4 2026 - Alex

use crate::corpus::{normalize_classname, patterns};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};

/// Label name -> line index within a block.
pub fn label_indices(block: &[String]) -> HashMap<String, usize> {
    let mut indices = HashMap::new();
    for (idx, line) in block.iter().enumerate() {
        if let Some(caps) = patterns::LABEL_DEF.captures(line) {
            indices.insert(caps[1].to_string(), idx);
        }
    }
    indices
}

/// Follow a statement run for the first reachable `return sub_X`,
/// chasing `goto` targets breadth-first. The visited set bounds the walk
/// so cyclic label chains terminate with no match. The initial segment
/// is bounded by `search_limit`; segments entered through a label run to
/// the end of the block.
pub fn resolve_chain(
    block: &[String],
    start_index: usize,
    search_limit: usize,
    labels: &HashMap<String, usize>,
) -> Option<String> {
    if block.is_empty() {
        return None;
    }

    let mut queue: VecDeque<usize> = VecDeque::new();
    queue.push_back(start_index);
    let mut visited: HashSet<usize> = HashSet::new();

    while let Some(current) = queue.pop_front() {
        if visited.contains(&current) || current >= block.len() {
            continue;
        }
        visited.insert(current);

        let end = if current == start_index {
            search_limit.min(block.len())
        } else {
            block.len()
        };

        for line in block.iter().take(end).skip(current) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(caps) = patterns::RETURN_SUB.captures(line) {
                return Some(caps[1].to_string());
            }
            for caps in patterns::GOTO.captures_iter(line) {
                if let Some(&target) = labels.get(&caps[1]) {
                    if !visited.contains(&target) {
                        queue.push_back(target);
                    }
                }
            }
        }
    }

    None
}

/// Classname -> constructor pairs recovered from string-compare dispatch:
/// every literal bound to a local opens a window (bounded by the next
/// literal binding) that is chased for a direct return or a goto chain.
pub fn strcmp_entries(block: &[String]) -> IndexMap<String, String> {
    let labels = label_indices(block);

    let mut literal_positions: Vec<(usize, String)> = Vec::new();
    for (idx, line) in block.iter().enumerate() {
        if let Some(caps) = patterns::LITERAL_ASSIGN.captures(line) {
            literal_positions.push((idx, caps[1].to_string()));
        }
    }

    let mut results = IndexMap::new();
    for (pos, (line_idx, classname)) in literal_positions.iter().enumerate() {
        let search_limit = literal_positions
            .get(pos + 1)
            .map(|&(next_idx, _)| next_idx)
            .unwrap_or(block.len());
        let classname = normalize_classname(classname);
        if let Some(target) = resolve_chain(block, line_idx + 1, search_limit, &labels) {
            results.insert(classname, target);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_direct_return_resolution() {
        let block = lines(&[
            "char* name = \"monster_tank\"",
            "if (sub_10038b20(*(arg1 + 0x118), name) == 0)",
            "return sub_10001ac0(arg1)",
        ]);
        let entries = strcmp_entries(&block);
        assert_eq!(entries["monster_tank"], "sub_10001ac0");
    }

    #[test]
    fn test_goto_chain_resolution() {
        let block = lines(&[
            "char* name = \"func_door\"",
            "goto label_10006b00",
            "char* other = \"func_plat\"",
            "return sub_10009999(arg1)",
            "label_10006b00:",
            "return sub_10006b20(arg1)",
        ]);
        let entries = strcmp_entries(&block);
        assert_eq!(entries["func_door"], "sub_10006b20");
        assert_eq!(entries["func_plat"], "sub_10009999");
    }

    #[test]
    fn test_window_is_bounded_by_next_literal() {
        let block = lines(&[
            "char* name = \"func_door\"",
            "int32_t unused = 0",
            "char* other = \"func_plat\"",
            "return sub_10006df0(arg1)",
        ]);
        let entries = strcmp_entries(&block);
        // func_door's window ends before func_plat's return
        assert!(!entries.contains_key("func_door"));
        assert_eq!(entries["func_plat"], "sub_10006df0");
    }

    #[test]
    fn test_cyclic_gotos_terminate_without_match() {
        let block = lines(&[
            "char* name = \"func_loop\"",
            "goto label_a1",
            "label_a1:",
            "goto label_b2",
            "label_b2:",
            "goto label_a1",
        ]);
        let labels = label_indices(&block);
        assert_eq!(resolve_chain(&block, 1, block.len(), &labels), None);
        assert!(strcmp_entries(&block).is_empty());
    }

    #[test]
    fn test_dangling_label_is_no_match() {
        let block = lines(&["char* name = \"func_gone\"", "goto label_ffff"]);
        assert!(strcmp_entries(&block).is_empty());
    }
}
