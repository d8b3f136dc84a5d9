// Wed Aug 5 2026 - Alex

pub mod expr;
pub mod macros;

pub use macros::MacroResolver;

use crate::manifest::{RepoSpawnInfo, SpawnFlagOps};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Build-flag variant gate: when the rotate-train feature constant
// resolves to 0, its classname is compiled out of the dispatch table.
const ROTATE_TRAIN_MACRO: &str = "OBLIVION_ENABLE_ROTATE_TRAIN";
const ROTATE_TRAIN_CLASSNAME: &str = "func_rotate_train";

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("dispatch table {path} unreadable: {source}")]
    DispatchTableUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `{"classname", SP_constructor}` rows of the dispatch table.
static SPAWN_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\s*"([^"]+)",\s*(SP_[^}]+)\}"#).unwrap());

/// `SP_*` constructor definitions at the start of a line.
static SP_FUNC_DEF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w[\w\s*]*\b(SP_[a-zA-Z0-9_]+)\s*\(([^)]*)\)").unwrap());

/// `entity->field = expression` assignments.
static FIELD_ASSIGN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([a-zA-Z_][a-zA-Z0-9_]*)->([a-zA-Z0-9_.]+)\s*=\s*([^;]+)").unwrap()
});

static ITEMLIST_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"gitem_t\s+itemlist\s*\[\]\s*=").unwrap());

static ITEM_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\{\s*"([^"]+)"\s*,"#).unwrap());

static CAST_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\s*(?:const\s+)?(?:struct\s+)?[a-zA-Z_][\w\s*]*\)").unwrap());

static FLOAT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.\d+)[fF]\b").unwrap());

static INT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^0-9a-fA-FxX])(\d+)[fF]\b").unwrap());

static FLAG_CHECK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"spawnflags\s*&\s*([^&|)]+)").unwrap());

/// Parses the project's own constructor sources: the dispatch table, the
/// item descriptor table, and every `SP_*` constructor body, with named
/// constants resolved through the macro table.
pub struct RepoParser {
    game_dir: PathBuf,
    resolver: MacroResolver,
    spawn_map: BTreeMap<String, String>,
    functions: BTreeMap<String, Vec<String>>,
}

impl RepoParser {
    pub fn new(root: &Path, defines: &[(String, String)]) -> Result<Self, RepoError> {
        let game_dir = root.join("src").join("game");
        let source_files = collect_source_files(&game_dir);
        let resolver = MacroResolver::new(&source_files, defines);

        let mut spawn_map = parse_spawn_map(&game_dir)?;
        for classname in parse_itemlist_classnames(&game_dir) {
            spawn_map
                .entry(classname)
                .or_insert_with(|| "SpawnItemFromItemlist".to_string());
        }
        if resolver.evaluate(ROTATE_TRAIN_MACRO) == Some(0) {
            spawn_map.remove(ROTATE_TRAIN_CLASSNAME);
        }

        let functions = parse_functions(&source_files);

        Ok(Self {
            game_dir,
            resolver,
            spawn_map,
            functions,
        })
    }

    pub fn spawn_map(&self) -> &BTreeMap<String, String> {
        &self.spawn_map
    }

    pub fn functions(&self) -> &BTreeMap<String, Vec<String>> {
        &self.functions
    }

    pub fn resolver(&self) -> &MacroResolver {
        &self.resolver
    }

    pub fn build_manifest(&self) -> BTreeMap<String, RepoSpawnInfo> {
        let mut manifest = BTreeMap::new();
        for (classname, function) in &self.spawn_map {
            let mut info = RepoSpawnInfo {
                classname: classname.clone(),
                function: function.clone(),
                defaults: BTreeMap::new(),
                spawnflags: SpawnFlagOps::default(),
            };
            if let Some(lines) = self.functions.get(function) {
                info.defaults = self.extract_defaults(lines);
                info.spawnflags = self.extract_spawnflags(lines);
            }
            manifest.insert(classname.clone(), info);
        }
        manifest
    }

    /// `entity->field = expr` assignments with a numerically resolvable
    /// right-hand side; one normalized value per field, the last
    /// assignment winning.
    fn extract_defaults(&self, lines: &[String]) -> BTreeMap<String, f64> {
        let mut defaults = BTreeMap::new();
        for line in lines {
            for caps in FIELD_ASSIGN.captures_iter(line) {
                let field = caps[2].to_string();
                let expr_text = caps[3].trim();
                if let Some(value) = self.evaluate_default_expr(expr_text) {
                    defaults.insert(field, value);
                }
            }
        }
        defaults
    }

    fn evaluate_default_expr(&self, raw: &str) -> Option<f64> {
        let normalized = normalize_c_numeric_expr(raw);
        if normalized.is_empty() {
            return None;
        }
        self.resolver
            .eval_expr(&normalized)
            .map(|value| value.as_f64())
    }

    fn extract_spawnflags(&self, lines: &[String]) -> SpawnFlagOps {
        let mut ops = SpawnFlagOps::default();

        for line in lines {
            if !line.contains("spawnflags") {
                continue;
            }
            if line.contains("|=") {
                if let Some(value) = self.resolve_flag_token(after_operator(line, "|=")) {
                    ops.sets.insert(value);
                }
            }
            if line.contains("&=") {
                if let Some(value) = self.resolve_flag_token(after_operator(line, "&=")) {
                    let cleared = !value;
                    if cleared > 0 && cleared < u32::MAX {
                        ops.clears.insert(cleared);
                    }
                }
            }
            if let Some(rest) = line.split_once("spawnflags =").map(|(_, rest)| rest) {
                let token = rest.split(';').next().unwrap_or("");
                if let Some(value) = self.resolve_flag_token(token) {
                    ops.assignments.insert(value);
                }
            }
            for caps in FLAG_CHECK.captures_iter(line) {
                if let Some(value) = self.resolve_flag_token(&caps[1]) {
                    ops.checks.insert(value);
                }
            }
        }

        ops
    }

    fn resolve_flag_token(&self, token: &str) -> Option<u32> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let value = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            i64::from_str_radix(hex, 16).ok()?
        } else if token.chars().all(|c| c.is_ascii_digit()) {
            token.parse::<i64>().ok()?
        } else {
            self.resolver.eval_expr(token)?.as_i64()
        };
        u32::try_from(value).ok()
    }
}

/// The operand text after the last occurrence of an operator, cut at the
/// statement terminator.
fn after_operator<'a>(line: &'a str, op: &str) -> &'a str {
    let rest = line.rsplit(op).next().unwrap_or("");
    rest.split(';').next().unwrap_or("")
}

fn collect_source_files(game_dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_sources_recursive(game_dir, &mut files);
    files.sort();
    files
}

fn collect_sources_recursive(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_sources_recursive(&path, out);
        } else if path
            .extension()
            .map_or(false, |ext| ext == "c" || ext == "h")
        {
            out.push(path);
        }
    }
}

fn parse_spawn_map(game_dir: &Path) -> Result<BTreeMap<String, String>, RepoError> {
    let path = game_dir.join("g_spawn.c");
    let text = fs::read(&path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|source| RepoError::DispatchTableUnreadable {
            path: path.clone(),
            source,
        })?;
    let mut spawn_map = BTreeMap::new();
    for caps in SPAWN_ROW.captures_iter(&text) {
        spawn_map.insert(caps[1].to_string(), caps[2].trim().to_string());
    }
    Ok(spawn_map)
}

/// Classnames listed in the `gitem_t itemlist[]` initializer, located by
/// brace matching from the table anchor. A missing or malformed item
/// table yields no classnames rather than failing the run.
fn parse_itemlist_classnames(game_dir: &Path) -> BTreeSet<String> {
    let path = game_dir.join("g_items.c");
    let text = match fs::read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            log::warn!("item table {} unreadable: {}", path.display(), e);
            return BTreeSet::new();
        }
    };
    let anchor = match ITEMLIST_ANCHOR.find(&text) {
        Some(m) => m.end(),
        None => return BTreeSet::new(),
    };
    let brace_start = match text[anchor..].find('{') {
        Some(rel) => anchor + rel,
        None => return BTreeSet::new(),
    };
    let mut depth = 0usize;
    let mut brace_end = None;
    for (idx, ch) in text[brace_start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    brace_end = Some(brace_start + idx);
                    break;
                }
            }
            _ => {}
        }
    }
    let brace_end = match brace_end {
        Some(end) => end,
        None => return BTreeSet::new(),
    };
    ITEM_ROW
        .captures_iter(&text[brace_start..brace_end])
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Constructor bodies keyed by `SP_*` name, recovered with brace
/// counting across every source file.
fn parse_functions(source_files: &[PathBuf]) -> BTreeMap<String, Vec<String>> {
    let mut functions = BTreeMap::new();

    for path in source_files {
        let text = match fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => continue,
        };
        let mut current_name: Option<String> = None;
        let mut current_lines: Vec<String> = Vec::new();
        let mut depth = 0usize;

        for line in text.lines() {
            match current_name.as_ref() {
                None => {
                    if let Some(caps) = SP_FUNC_DEF.captures(line) {
                        current_name = Some(caps[1].to_string());
                        depth = line.matches('{').count();
                        current_lines = vec![line.to_string()];
                    }
                }
                Some(_) => {
                    current_lines.push(line.to_string());
                    depth += line.matches('{').count();
                    depth = depth.saturating_sub(line.matches('}').count());
                    if depth == 0 && line.trim().ends_with('}') {
                        let name = current_name.take().unwrap();
                        // later definitions replace earlier prototype noise
                        functions.insert(name, std::mem::take(&mut current_lines));
                    }
                }
            }
        }
    }

    functions
}

/// Strip the C-isms the evaluator does not speak: trailing semicolons,
/// leading casts, float literal suffixes.
fn normalize_c_numeric_expr(raw: &str) -> String {
    let mut expr = raw.trim_end_matches(';').trim().to_string();
    loop {
        let stripped = match CAST_PREFIX.find(&expr) {
            Some(m) => expr[m.end()..].trim_start().to_string(),
            None => break,
        };
        expr = stripped;
    }
    let expr = FLOAT_SUFFIX.replace_all(&expr, "$1").into_owned();
    INT_SUFFIX.replace_all(&expr, "${1}${2}").into_owned()
}
