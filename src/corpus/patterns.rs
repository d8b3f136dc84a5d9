// Mon Aug 3 2026 - Alex

use once_cell::sync::Lazy;
use regex::Regex;

// Statement lines carry an optional "N:" tag then a hex address column in
// the image's 0x100xxxxx range.

/// `char (* data_X)[N] = data_Y {"name"}`: a pointer to a named string.
pub static NAME_PTR_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:\d+:)?\s*100[0-9a-f]+\s+char \(\* (data_[0-9a-f]+)\)\[[^\]]+\] = (data_[0-9a-f]+) \{"([^"]+)"\}"#,
    )
    .unwrap()
});

/// `void* data_X = sub_Y`: a pointer to a routine.
pub static FUNC_PTR_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+:)?\s*100[0-9a-f]+\s+void\* (data_[0-9a-f]+) = (sub_[0-9a-f]+)").unwrap()
});

/// Start of a routine body: address column, a declaration prefix, then the
/// routine identifier with its parameter list. Lines that merely reference
/// the identifier (returns, assignments) are rejected by the caller via
/// the prefix capture.
pub static BLOCK_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+:)?\s*100[0-9a-f]+\s+(\S.*?)\b(sub_[0-9a-f]+)\(").unwrap()
});

/// Any routine-identifier call or declaration further down a fragment.
pub static SUB_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(sub_[0-9a-f]+)\s*\(").unwrap());

/// Quick sniff for an inline hex byte row.
pub static HEX_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[0-9a-f]{2}\s+[0-9a-f]{2}\s+[0-9a-f]{2}").unwrap());

pub static HEX_BYTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[0-9a-f]{2}\b").unwrap());

pub static GOTO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)goto\s+(label_[0-9a-f]+)").unwrap());

pub static RETURN_SUB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)return\s+(sub_[0-9a-f]+)").unwrap());

pub static LABEL_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(label_[0-9a-f]+):").unwrap());

/// `char* local = "literal"`: a classname literal bound to a local.
pub static LITERAL_ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:const\s+)?char(?:\s+const)?\s*\*\s+[^=]+\s*=\s*"([^"]+)""#).unwrap()
});

/// `{ literal-or-address, sub_X }`: one row of a dispatch table spelled
/// out in the text.
pub static TABLE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\{\s*((?:&\s*)?data_[0-9a-f]+|0x[0-9a-f]+|"[^"]+")\s*,\s*(sub_[0-9a-f]+)\s*\}"#)
        .unwrap()
});

pub static CASE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:case|default)\b").unwrap());

pub static QUOTED_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([a-z0-9_]+)""#).unwrap());

/// `*(base + 0xNN) = literal`: a flat field write off the entity base.
pub static DEFAULT_ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\*\((?:[a-z0-9_]+ \+ )?0x([0-9a-f]+)\) = (0x[0-9a-f]+|-?\d+)").unwrap()
});
