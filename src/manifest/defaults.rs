// Tue Aug 4 2026 - Alex

use crate::corpus::patterns;
use crate::layout::{FieldInfo, FLOAT_TYPE_ID};
use crate::manifest::{DefaultOccurrence, FieldValue};
use std::collections::BTreeMap;

/// Recover literal field writes from a constructor block. Offsets below
/// the low threshold are layout-unknown and keyed `offset_0x<N>`; offsets
/// with a recovered descriptor take the field's name, and the raw bits
/// are reinterpreted as a float when the descriptor is float-typed.
pub fn extract_defaults(
    block: &[String],
    fields: &BTreeMap<u32, FieldInfo>,
    low_offset_threshold: u32,
) -> BTreeMap<String, Vec<DefaultOccurrence>> {
    let mut results: BTreeMap<String, Vec<DefaultOccurrence>> = BTreeMap::new();

    for line in block {
        for caps in patterns::DEFAULT_ASSIGN.captures_iter(line) {
            let offset = match u32::from_str_radix(&caps[1], 16) {
                Ok(offset) => offset,
                Err(_) => continue,
            };
            let raw = &caps[2];
            let value = match parse_int_literal(raw) {
                Some(value) => value,
                None => continue,
            };

            let field = fields.get(&offset);
            let (name, value) = match field {
                Some(info) if offset >= low_offset_threshold => {
                    let value = if info.type_id == FLOAT_TYPE_ID {
                        FieldValue::Float(f32::from_bits(value as u32) as f64)
                    } else {
                        FieldValue::Int(value)
                    };
                    (info.name.clone(), value)
                }
                _ => (format!("offset_0x{:x}", offset), FieldValue::Int(value)),
            };

            results
                .entry(name)
                .or_default()
                .push(DefaultOccurrence { offset, value });
        }
    }

    results
}

fn parse_int_literal(raw: &str) -> Option<i64> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else {
        raw.parse::<i64>().ok()
    }
}
