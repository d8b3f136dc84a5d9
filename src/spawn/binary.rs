// Tue Aug 4 2026 - Alex

use crate::corpus::normalize_classname;
use crate::image::BinaryImage;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Walk fixed-size records at a table base address directly in the
/// image. Each record leads with a name pointer and a constructor
/// pointer; names resolve through the literal map or a C-string read,
/// constructors must land in executable code. Scanning stops after a run
/// of consecutive invalid records once at least one valid record was
/// seen, so trailing padding does not drag the scan across the image.
pub fn scan_spawn_table(
    image: &BinaryImage,
    literal_map: &HashMap<String, String>,
    address: u64,
    entry_size: usize,
    invalid_streak_limit: usize,
) -> IndexMap<String, String> {
    let mut entries = IndexMap::new();
    let mut offset = match image.address_to_offset(address) {
        Some(offset) => offset as usize,
        None => return entries,
    };

    let mut seen_valid = 0usize;
    let mut invalid_streak = 0usize;
    while offset + entry_size <= image.size() {
        let name_ptr = match image.read_u32_at(offset) {
            Some(value) => value,
            None => break,
        };
        let func_ptr = match image.read_u32_at(offset + 4) {
            Some(value) => value,
            None => break,
        };

        let classname = resolve_classname_from_pointer(name_ptr, literal_map)
            .or_else(|| image.read_c_string(name_ptr as u64));
        let valid = classname.as_deref().map_or(false, |name| !name.is_empty())
            && image.is_executable_address(func_ptr as u64);
        if !valid {
            if seen_valid > 0 {
                invalid_streak += 1;
                if invalid_streak >= invalid_streak_limit {
                    break;
                }
            }
            offset += entry_size;
            continue;
        }

        invalid_streak = 0;
        seen_valid += 1;
        let normalized = normalize_classname(&classname.unwrap_or_default());
        if !entries.contains_key(&normalized) {
            entries.insert(normalized, format!("sub_{:08x}", func_ptr));
        }
        offset += entry_size;
    }

    entries
}

/// Read the item descriptor table: classname (via the record's leading
/// name pointer) -> the record's raw words. An all-zero record past the
/// first slot terminates the table.
pub fn itemlist_entries(
    image: &BinaryImage,
    address: u64,
    entry_size: usize,
) -> IndexMap<String, Vec<u32>> {
    let mut entries = IndexMap::new();
    let offset = match image.address_to_offset(address) {
        Some(offset) => offset as usize,
        None => return entries,
    };

    let words = entry_size / 4;
    let mut idx = 0usize;
    while offset + (idx + 1) * entry_size <= image.size() {
        let start = offset + idx * entry_size;
        let values: Vec<u32> = (0..words)
            .map(|w| image.read_u32_at(start + w * 4).unwrap_or(0))
            .collect();
        if values.iter().all(|&v| v == 0) {
            if idx != 0 {
                break;
            }
            idx += 1;
            continue;
        }
        if let Some(classname) = image.read_c_string(values[0] as u64) {
            if !classname.is_empty() {
                entries.insert(normalize_classname(&classname), values);
            }
        }
        idx += 1;
    }

    entries
}

fn resolve_classname_from_pointer(
    pointer: u32,
    literal_map: &HashMap<String, String>,
) -> Option<String> {
    for key in [format!("data_{:08x}", pointer), format!("0x{:08x}", pointer)] {
        if let Some(name) = literal_map.get(&key) {
            return Some(name.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::pe::build_test_image;

    /// .text at rva 0x1000, .data at rva 0x2000 holding names and the
    /// table itself at rva 0x2100.
    fn table_image(records: &[(u32, u32)], entry_size: usize) -> BinaryImage {
        let mut table = Vec::new();
        for &(name_ptr, func_ptr) in records {
            let mut record = vec![0u8; entry_size];
            record[0..4].copy_from_slice(&name_ptr.to_le_bytes());
            record[4..8].copy_from_slice(&func_ptr.to_le_bytes());
            table.extend_from_slice(&record);
        }
        let data = build_test_image(
            0x10000000,
            &[
                (".text", 0x1000, 0x1000, 0x200, 0x1000),
                (".data", 0x2000, 0x1000, 0x1200, 0x1000),
            ],
            &[
                (0x2000, b"ammo_bullets\0".to_vec()),
                (0x2010, b"func_button\0".to_vec()),
                (0x2100, table),
            ],
        );
        BinaryImage::parse(data).unwrap()
    }

    #[test]
    fn test_scan_resolves_names_and_validates_functions() {
        let image = table_image(
            &[
                (0x10002000, 0x10001040), // ammo_bullets via C-string
                (0x10002010, 0x10001080), // func_button
                (0x10002010, 0x10002000), // function pointer not executable
                (0, 0),
            ],
            8,
        );
        let entries = scan_spawn_table(&image, &HashMap::new(), 0x10002100, 8, 64);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["ammo_bullets"], "sub_10001040");
        assert_eq!(entries["func_button"], "sub_10001080");
    }

    #[test]
    fn test_scan_prefers_literal_map_names() {
        let image = table_image(&[(0x10002000, 0x10001040)], 8);
        let mut literal_map = HashMap::new();
        literal_map.insert("data_10002000".to_string(), "item_armor".to_string());
        let entries = scan_spawn_table(&image, &literal_map, 0x10002100, 8, 64);
        assert_eq!(entries["item_armor"], "sub_10001040");
    }

    #[test]
    fn test_scan_stops_on_invalid_streak() {
        // one valid record, then zeros for the rest of the section
        let image = table_image(&[(0x10002000, 0x10001040)], 8);
        let entries = scan_spawn_table(&image, &HashMap::new(), 0x10002100, 8, 4);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_scan_unmapped_base_is_empty() {
        let image = table_image(&[(0x10002000, 0x10001040)], 8);
        assert!(scan_spawn_table(&image, &HashMap::new(), 0x10090000, 8, 64).is_empty());
    }

    #[test]
    fn test_itemlist_reads_until_zero_record() {
        let image = table_image(
            &[
                (0x10002000, 0x100), // ammo_bullets record
                (0x10002010, 0x200), // func_button record
                (0, 0),              // terminator
                (0x10002000, 0x300), // past the end, must not be read
            ],
            16,
        );
        let entries = itemlist_entries(&image, 0x10002100, 16);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["ammo_bullets"], vec![0x10002000, 0x100, 0, 0]);
        assert_eq!(entries["func_button"], vec![0x10002010, 0x200, 0, 0]);
    }
}
