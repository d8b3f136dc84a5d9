// Tue Aug 4 2026 - Alex

use crate::manifest::SpawnFlagOps;
use regex::Regex;
use std::collections::HashSet;

/// Recovers flag-bit operations scoped to one known flag-storage offset
/// from the entity base. Direct `|=`/`&=`/assignment forms contribute
/// immediately; locals first seen assigned from the storage location are
/// tracked as aliases and their later operations folded in. A clear mask
/// is the complement of the AND operand, kept only when it lands strictly
/// between zero and all-ones.
pub struct FlagExtractor {
    needle: String,
    alias_decl: Regex,
    direct_check: Regex,
    direct_assign: Regex,
    direct_clear: Regex,
    direct_or: Regex,
    direct_and: Regex,
    alias_op: Regex,
    alias_check: Regex,
}

impl FlagExtractor {
    pub fn new(flags_offset: u32) -> Self {
        let off = format!("{:#x}", flags_offset);
        Self {
            needle: off.clone(),
            alias_decl: Regex::new(&format!(
                r"(?i)([A-Za-z_][\w.:]*)\s*=\s*(?:\(\*[^)]*{off}[^)]*\)(?:\.\w+)?|\*[^;]*{off}[^;]*)"
            ))
            .expect("alias pattern"),
            direct_check: Regex::new(&format!(
                r"(?i)\([^)]*{off}[^)]*\)\s*&\s*(0x[0-9a-f]+|\d+)"
            ))
            .expect("check pattern"),
            direct_assign: Regex::new(&format!(
                r"(?i)\*\([^)]*{off}[^)]*\)\s*=\s*(0x[0-9a-f]+|\d+)"
            ))
            .expect("assign pattern"),
            direct_clear: Regex::new(&format!(
                r"(?i)\*\([^)]*{off}[^)]*\)\s*=\s*\*\([^)]*{off}[^)]*\)\s*&\s*(0x[0-9a-f]+|\d+)"
            ))
            .expect("clear pattern"),
            direct_or: Regex::new(r"(?i)\|=\s*(0x[0-9a-f]+|\d+)").expect("or pattern"),
            direct_and: Regex::new(r"(?i)&=\s*(0x[0-9a-f]+|\d+)").expect("and pattern"),
            alias_op: Regex::new(r"(?i)([A-Za-z_][\w.:]*)\s*(\|=|&=)\s*(0x[0-9a-f]+|\d+)")
                .expect("alias op pattern"),
            alias_check: Regex::new(r"(?i)([A-Za-z_][\w.:]*)\s*&\s*(0x[0-9a-f]+|\d+)")
                .expect("alias check pattern"),
        }
    }

    pub fn extract(&self, block: &[String]) -> SpawnFlagOps {
        let mut ops = SpawnFlagOps::default();
        let mut aliases: HashSet<String> = HashSet::new();

        // direct operations against the storage offset
        for line in block {
            if !line.contains(&self.needle) {
                continue;
            }
            for caps in self.alias_decl.captures_iter(line) {
                aliases.insert(caps[1].to_string());
            }
            if let Some(caps) = self.direct_assign.captures(line) {
                if let Some(value) = parse_flag_value(&caps[1]) {
                    ops.assignments.insert(value);
                }
            }
            for caps in self.direct_or.captures_iter(line) {
                if let Some(value) = parse_flag_value(&caps[1]) {
                    ops.sets.insert(value);
                }
            }
            for caps in self.direct_and.captures_iter(line) {
                if let Some(cleared) = clear_mask(&caps[1]) {
                    ops.clears.insert(cleared);
                }
            }
            if let Some(caps) = self.direct_clear.captures(line) {
                if let Some(cleared) = clear_mask(&caps[1]) {
                    ops.clears.insert(cleared);
                }
            }
            for caps in self.direct_check.captures_iter(line) {
                if let Some(value) = parse_flag_value(&caps[1]) {
                    ops.checks.insert(value);
                }
            }
        }

        // operations routed through tracked aliases
        for line in block {
            for caps in self.alias_op.captures_iter(line) {
                if !aliases.contains(&caps[1]) {
                    continue;
                }
                let value = match parse_flag_value(&caps[3]) {
                    Some(value) => value,
                    None => continue,
                };
                if &caps[2] == "|=" {
                    ops.sets.insert(value);
                } else if let Some(cleared) = complement_mask(value) {
                    ops.clears.insert(cleared);
                }
            }
            for caps in self.alias_check.captures_iter(line) {
                if !aliases.contains(&caps[1]) {
                    continue;
                }
                if let Some(value) = parse_flag_value(&caps[2]) {
                    ops.checks.insert(value);
                }
            }
        }

        ops
    }
}

fn parse_flag_value(raw: &str) -> Option<u32> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        raw.parse::<u32>().ok()
    }
}

fn clear_mask(raw: &str) -> Option<u32> {
    complement_mask(parse_flag_value(raw)?)
}

fn complement_mask(mask: u32) -> Option<u32> {
    let cleared = !mask;
    if cleared > 0 && cleared < u32::MAX {
        Some(cleared)
    } else {
        None
    }
}
