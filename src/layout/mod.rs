// Mon Aug 3 2026 - Alex

use crate::corpus::{patterns, Corpus};
use std::collections::BTreeMap;

/// Type id marking a float-typed field in the layout metadata.
pub const FLOAT_TYPE_ID: u32 = 1;

/// Minimum decodable bytes for a layout row: offset, type id, flags.
const MIN_RECORD_BYTES: usize = 12;

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    pub offset: u32,
    pub type_id: u32,
    pub flags: u32,
}

/// Recover the entity structure's field table from the corpus: a named
/// pointer declaration immediately followed (skipping blanks) by an
/// inline hex byte row whose first three little-endian words are the
/// field's offset, type id and flags. The earliest declaration per
/// offset is authoritative; later duplicates are ignored.
pub fn recover_fields(corpus: &Corpus) -> BTreeMap<u32, FieldInfo> {
    let mut entries: BTreeMap<u32, FieldInfo> = BTreeMap::new();

    for source in corpus.sources() {
        for (idx, raw_line) in source.lines.iter().enumerate() {
            let caps = match patterns::NAME_PTR_DECL.captures(raw_line) {
                Some(caps) => caps,
                None => continue,
            };
            let next_line = match source.lines[idx + 1..]
                .iter()
                .find(|candidate| !candidate.trim().is_empty())
            {
                Some(line) => line,
                None => continue,
            };
            if !patterns::HEX_ROW.is_match(next_line) {
                continue;
            }
            let bytes = parse_hex_bytes(next_line);
            if bytes.len() < MIN_RECORD_BYTES {
                log::debug!(
                    "short layout row after {} ({} bytes), skipping",
                    &caps[1],
                    bytes.len()
                );
                continue;
            }
            let offset = le_u32(&bytes[0..4]);
            if entries.contains_key(&offset) {
                continue;
            }
            let type_id = le_u32(&bytes[4..8]);
            let flags = le_u32(&bytes[8..12]);
            entries.insert(
                offset,
                FieldInfo {
                    name: caps[3].to_string(),
                    offset,
                    type_id,
                    flags,
                },
            );
        }
    }

    entries
}

/// Byte values parsed from a line of hex dump text.
pub fn parse_hex_bytes(line: &str) -> Vec<u8> {
    patterns::HEX_BYTE
        .find_iter(line)
        .filter_map(|m| u8::from_str_radix(m.as_str(), 16).ok())
        .collect()
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn corpus_from(content: &str) -> Corpus {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game_hlil.txt");
        fs::write(&path, content).unwrap();
        // the corpus owns copies of every line, the tempdir may go away
        Corpus::load(&path).unwrap()
    }

    #[test]
    fn test_field_record_decode() {
        let corpus = corpus_from(concat!(
            "10010000  char (* data_10010000)[0x6] = data_10020000 {\"speed\"}\n",
            "\n",
            "10010010              1c 01 00 00  01 00 00 00  02 00 00 00\n",
        ));
        let fields = recover_fields(&corpus);
        let info = &fields[&0x11c];
        assert_eq!(info.name, "speed");
        assert_eq!(info.type_id, FLOAT_TYPE_ID);
        assert_eq!(info.flags, 2);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let corpus = corpus_from(concat!(
            "10010000  char (* data_10010000)[0x6] = data_10020000 {\"speed\"}\n",
            "10010010              1c 01 00 00  01 00\n",
        ));
        assert!(recover_fields(&corpus).is_empty());
    }

    #[test]
    fn test_first_offset_wins() {
        let corpus = corpus_from(concat!(
            "10010000  char (* data_10010000)[0x6] = data_10020000 {\"speed\"}\n",
            "10010010              00 02 00 00  01 00 00 00  00 00 00 00\n",
            "10010020  char (* data_10010020)[0x7] = data_10020020 {\"height\"}\n",
            "10010030              00 02 00 00  00 00 00 00  00 00 00 00\n",
        ));
        let fields = recover_fields(&corpus);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[&0x200].name, "speed");
    }

    #[test]
    fn test_parse_hex_bytes() {
        assert_eq!(parse_hex_bytes("  00 01 ff  zz 1"), vec![0x00, 0x01, 0xff]);
    }
}
