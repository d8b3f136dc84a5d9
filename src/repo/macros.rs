// Wed Aug 5 2026 - Alex

use crate::repo::expr::{self, Num};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

static DEFINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#\s*define\s+(\w+)\s+(.+)$").unwrap());

/// Resolves named constants to integers by recursively evaluating their
/// `#define` bodies over an immutable definition table. Results are
/// memoized; unresolvable and cyclic references fail closed with no
/// value instead of looping.
pub struct MacroResolver {
    definitions: HashMap<String, String>,
    cache: RefCell<HashMap<String, Option<i64>>>,
    visiting: RefCell<HashSet<String>>,
}

impl MacroResolver {
    /// Collect `#define NAME EXPR` lines across the source files. CLI
    /// overrides are seeded first and therefore win; within the files the
    /// first definition of a name wins.
    pub fn new(source_files: &[PathBuf], overrides: &[(String, String)]) -> Self {
        let mut definitions: HashMap<String, String> = HashMap::new();
        for (name, value) in overrides {
            definitions.insert(name.clone(), value.clone());
        }
        for path in source_files {
            let text = match fs::read(path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    log::warn!("cannot read {}: {}", path.display(), e);
                    continue;
                }
            };
            for line in text.lines() {
                if let Some(caps) = DEFINE.captures(line) {
                    definitions
                        .entry(caps[1].to_string())
                        .or_insert_with(|| caps[2].trim().to_string());
                }
            }
        }
        Self {
            definitions,
            cache: RefCell::new(HashMap::new()),
            visiting: RefCell::new(HashSet::new()),
        }
    }

    pub fn has_definition(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn evaluate(&self, name: &str) -> Option<i64> {
        if let Some(&cached) = self.cache.borrow().get(name) {
            return cached;
        }
        if !self.visiting.borrow_mut().insert(name.to_string()) {
            // cyclic reference: fail closed
            return None;
        }
        let result = self
            .definitions
            .get(name)
            .and_then(|expr| self.eval_expr(expr))
            .map(|num| num.as_i64());
        self.visiting.borrow_mut().remove(name);
        self.cache.borrow_mut().insert(name.to_string(), result);
        result
    }

    /// Evaluate an arbitrary expression with names resolved through this
    /// table.
    pub fn eval_expr(&self, expression: &str) -> Option<Num> {
        expr::evaluate(expression, &|name| self.evaluate(name).map(Num::Int))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn resolver_from(content: &str, overrides: &[(String, String)]) -> MacroResolver {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let path = file.path().to_path_buf();
        let resolver = MacroResolver::new(std::slice::from_ref(&path), overrides);
        // keep the tempfile alive until the definitions are read
        drop(file);
        resolver
    }

    #[test]
    fn test_simple_and_recursive_definitions() {
        let resolver = resolver_from(
            concat!(
                "#define SPAWNFLAG_BASE 0x10\n",
                "#define SPAWNFLAG_NEXT (SPAWNFLAG_BASE << 1)\n",
                "#define SPEED_DEFAULT 100\n",
            ),
            &[],
        );
        assert_eq!(resolver.evaluate("SPAWNFLAG_BASE"), Some(0x10));
        assert_eq!(resolver.evaluate("SPAWNFLAG_NEXT"), Some(0x20));
        assert_eq!(resolver.evaluate("SPEED_DEFAULT"), Some(100));
    }

    #[test]
    fn test_cycles_fail_closed() {
        let resolver = resolver_from(
            concat!("#define AA BB\n", "#define BB AA\n", "#define SELF SELF\n"),
            &[],
        );
        assert_eq!(resolver.evaluate("AA"), None);
        assert_eq!(resolver.evaluate("BB"), None);
        assert_eq!(resolver.evaluate("SELF"), None);
        // a failed resolution is memoized, not retried
        assert_eq!(resolver.evaluate("AA"), None);
    }

    #[test]
    fn test_unknown_names_fail_closed() {
        let resolver = resolver_from("#define KNOWN 1\n", &[]);
        assert_eq!(resolver.evaluate("MISSING"), None);
        assert_eq!(resolver.eval_expr("KNOWN + MISSING"), None);
    }

    #[test]
    fn test_overrides_win() {
        let resolver = resolver_from(
            "#define OBLIVION_ENABLE_ROTATE_TRAIN 1\n",
            &[("OBLIVION_ENABLE_ROTATE_TRAIN".to_string(), "0".to_string())],
        );
        assert_eq!(resolver.evaluate("OBLIVION_ENABLE_ROTATE_TRAIN"), Some(0));
    }

    #[test]
    fn test_first_file_definition_wins() {
        let resolver = resolver_from(
            concat!("#define DUP 1\n", "#define DUP 2\n"),
            &[],
        );
        assert_eq!(resolver.evaluate("DUP"), Some(1));
    }
}
