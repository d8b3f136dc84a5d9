// Tue Aug 4 2026 - Alex

pub mod binary;
pub mod callgraph;
pub mod chains;
pub mod tables;

pub use binary::{itemlist_entries, scan_spawn_table};
pub use callgraph::callgraph_entries;
pub use chains::{label_indices, resolve_chain, strcmp_entries};
pub use tables::{switch_entries, table_entries};

use indexmap::IndexMap;

/// Fold a strategy's partial map into the accumulated spawn map. Earlier
/// strategies win; later ones only fill gaps.
pub fn merge_absent(entries: &mut IndexMap<String, String>, partial: IndexMap<String, String>) {
    for (classname, function) in partial {
        if !entries.contains_key(&classname) {
            entries.insert(classname, function);
        } else {
            log::debug!("classname {} already claimed, keeping earlier entry", classname);
        }
    }
}
