// Mon Aug 3 2026 - Alex

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Suffix stripped from the HLIL dump filename to locate the binary it
/// was decompiled from.
pub const HLIL_SUFFIX: &str = "_hlil.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub hlil_path: PathBuf,
    pub repo_root: PathBuf,
    pub binary_path: Option<PathBuf>,
    pub defines: Vec<(String, String)>,
    pub flags_offset: u32,
    pub low_offset_threshold: u32,
    pub strcmp_helper: String,
    pub item_table_address: u64,
    pub spawn_table_address: u64,
    pub table_entry_size: usize,
    pub invalid_streak_limit: usize,
    pub generic_item_function: String,
    pub dispatcher_routines: Vec<String>,
    pub classname_prefixes: Vec<String>,
    pub max_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hlil_path: PathBuf::from("references/HLIL/oblivion/gamex86.dll_hlil.txt"),
            repo_root: PathBuf::from("."),
            binary_path: None,
            defines: Vec::new(),
            flags_offset: 0x11c,
            low_offset_threshold: 0x100,
            strcmp_helper: "sub_10038b20".to_string(),
            item_table_address: 0x10046928,
            spawn_table_address: 0x1004A5C0,
            table_entry_size: 0x48,
            invalid_streak_limit: 64,
            generic_item_function: "SpawnItemFromItemlist".to_string(),
            dispatcher_routines: vec![
                "sub_1001ad80".to_string(),
                "sub_100166e7".to_string(),
            ],
            classname_prefixes: vec![
                "target_".to_string(),
                "trigger_".to_string(),
                "func_".to_string(),
                "misc_".to_string(),
                "monster_".to_string(),
                "path_".to_string(),
                "info_".to_string(),
                "weapon_".to_string(),
                "item_".to_string(),
                "ammo_".to_string(),
                "key_".to_string(),
                "turret_".to_string(),
                "point_".to_string(),
                "bodyque_".to_string(),
                "light_".to_string(),
                "script_".to_string(),
                "model_".to_string(),
            ],
            max_threads: num_cpus::get(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hlil_path(mut self, path: PathBuf) -> Self {
        self.hlil_path = path;
        self
    }

    pub fn with_repo_root(mut self, root: PathBuf) -> Self {
        self.repo_root = root;
        self
    }

    pub fn with_binary_path(mut self, path: PathBuf) -> Self {
        self.binary_path = Some(path);
        self
    }

    pub fn with_define(mut self, name: &str, value: &str) -> Self {
        self.defines.push((name.to_string(), value.to_string()));
        self
    }

    /// The binary image to read: an explicit override, or the dump path
    /// with the HLIL suffix stripped from its filename.
    pub fn resolved_binary_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.binary_path {
            return Some(path.clone());
        }
        let name = self.hlil_path.file_name()?.to_str()?;
        let binary_name = name.strip_suffix(HLIL_SUFFIX)?;
        Some(self.hlil_path.with_file_name(binary_name))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.hlil_path.as_os_str().is_empty() {
            return Err("hlil_path must be set".to_string());
        }
        if self.repo_root.as_os_str().is_empty() {
            return Err("repo_root must be set".to_string());
        }
        if self.table_entry_size < 8 {
            return Err("table_entry_size must be at least 8 bytes".to_string());
        }
        if self.invalid_streak_limit == 0 {
            return Err("invalid_streak_limit must be greater than 0".to_string());
        }
        if self.max_threads == 0 {
            return Err("max_threads must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_path_derivation() {
        let config = Config::new()
            .with_hlil_path(PathBuf::from("refs/gamex86.dll_hlil.txt"));
        assert_eq!(
            config.resolved_binary_path(),
            Some(PathBuf::from("refs/gamex86.dll"))
        );
    }

    #[test]
    fn test_binary_path_override_wins() {
        let config = Config::new()
            .with_hlil_path(PathBuf::from("refs/gamex86.dll_hlil.txt"))
            .with_binary_path(PathBuf::from("elsewhere/game.dll"));
        assert_eq!(
            config.resolved_binary_path(),
            Some(PathBuf::from("elsewhere/game.dll"))
        );
    }

    #[test]
    fn test_no_derivation_without_suffix() {
        let config = Config::new().with_hlil_path(PathBuf::from("refs/dump.txt"));
        assert_eq!(config.resolved_binary_path(), None);
    }

    #[test]
    fn test_validate_rejects_small_entries() {
        let mut config = Config::new();
        config.table_entry_size = 4;
        assert!(config.validate().is_err());
    }
}
