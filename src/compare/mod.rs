// Wed Aug 5 2026 - Alex

use crate::manifest::{DefaultOccurrence, HlilSpawnInfo, RepoSpawnInfo};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;

/// The IR-recovered value was reconstructed from raw bytes and the
/// source value from a constant expression, so equality is judged with
/// slack rather than bit-exactness.
pub const REL_TOLERANCE: f64 = 1e-4;
pub const ABS_TOLERANCE: f64 = 1e-4;

const FLAG_KEYS: [&str; 4] = ["checks", "sets", "clears", "assignments"];

/// Per-key flag sets that differ: (IR side, source side).
pub type FlagMismatch = (Vec<u32>, Vec<u32>);

/// IR occurrences vs. the source's resolved value; `None` when the field
/// has no source-side counterpart at all.
pub type DefaultMismatch = (Vec<DefaultOccurrence>, Option<f64>);

#[derive(Debug, Default, Serialize)]
pub struct ComparisonReport {
    pub missing_in_repo: Vec<String>,
    pub missing_in_hlil: Vec<String>,
    pub spawnflag_mismatches: BTreeMap<String, BTreeMap<String, FlagMismatch>>,
    pub default_mismatches: BTreeMap<String, BTreeMap<String, DefaultMismatch>>,
}

/// Diff the two manifests: set-difference the classname universes, then
/// for shared classnames compare flag sets per key and defaults per
/// field. Only the first observed IR occurrence of a field is compared
/// against the source value; later occurrences ride along in the report
/// payload.
pub fn compare_manifests(
    hlil: &BTreeMap<String, HlilSpawnInfo>,
    repo: &BTreeMap<String, RepoSpawnInfo>,
) -> ComparisonReport {
    let mut report = ComparisonReport {
        missing_in_repo: hlil
            .keys()
            .filter(|classname| !repo.contains_key(*classname))
            .cloned()
            .collect(),
        missing_in_hlil: repo
            .keys()
            .filter(|classname| !hlil.contains_key(*classname))
            .cloned()
            .collect(),
        ..ComparisonReport::default()
    };

    let shared = hlil
        .keys()
        .filter(|classname| repo.contains_key(*classname))
        .sorted();
    for classname in shared {
        let hl = &hlil[classname];
        let rp = &repo[classname];

        let mut flag_diff: BTreeMap<String, FlagMismatch> = BTreeMap::new();
        for key in FLAG_KEYS {
            let hl_values = flag_set(&hl.spawnflags, key);
            let rp_values = flag_set(&rp.spawnflags, key);
            if hl_values != rp_values {
                flag_diff.insert(key.to_string(), (hl_values, rp_values));
            }
        }
        if !flag_diff.is_empty() {
            report.spawnflag_mismatches.insert(classname.clone(), flag_diff);
        }

        let mut default_diff: BTreeMap<String, DefaultMismatch> = BTreeMap::new();
        for (field_name, occurrences) in &hl.defaults {
            match rp.defaults.get(field_name) {
                None => {
                    default_diff
                        .insert(field_name.clone(), (occurrences.clone(), None));
                }
                Some(&repo_value) => {
                    let first = match occurrences.first() {
                        Some(first) => first.value.as_f64(),
                        None => continue,
                    };
                    if !values_close(first, repo_value) {
                        default_diff.insert(
                            field_name.clone(),
                            (occurrences.clone(), Some(repo_value)),
                        );
                    }
                }
            }
        }
        if !default_diff.is_empty() {
            report.default_mismatches.insert(classname.clone(), default_diff);
        }
    }

    report
}

fn flag_set(ops: &crate::manifest::SpawnFlagOps, key: &str) -> Vec<u32> {
    let set = match key {
        "checks" => &ops.checks,
        "sets" => &ops.sets,
        "clears" => &ops.clears,
        _ => &ops.assignments,
    };
    set.iter().copied().collect()
}

/// Relative+absolute closeness, the way floating point reconstructions
/// are usually compared.
pub fn values_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= f64::max(REL_TOLERANCE * f64::max(a.abs(), b.abs()), ABS_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{FieldValue, SpawnFlagOps};

    fn hlil_info(
        classname: &str,
        function: &str,
        defaults: &[(&str, f64, bool)],
        sets: &[u32],
    ) -> HlilSpawnInfo {
        let mut map = BTreeMap::new();
        for &(name, value, float) in defaults {
            map.insert(
                name.to_string(),
                vec![DefaultOccurrence {
                    offset: 0x11c,
                    value: if float {
                        FieldValue::Float(value)
                    } else {
                        FieldValue::Int(value as i64)
                    },
                }],
            );
        }
        HlilSpawnInfo {
            classname: classname.to_string(),
            function: function.to_string(),
            defaults: map,
            spawnflags: SpawnFlagOps {
                sets: sets.iter().copied().collect(),
                ..SpawnFlagOps::default()
            },
        }
    }

    fn repo_info(classname: &str, function: &str, defaults: &[(&str, f64)], sets: &[u32]) -> RepoSpawnInfo {
        RepoSpawnInfo {
            classname: classname.to_string(),
            function: function.to_string(),
            defaults: defaults
                .iter()
                .map(|&(name, value)| (name.to_string(), value))
                .collect(),
            spawnflags: SpawnFlagOps {
                sets: sets.iter().copied().collect(),
                ..SpawnFlagOps::default()
            },
        }
    }

    #[test]
    fn test_missing_lists_are_sorted_differences() {
        let hlil = BTreeMap::from([
            ("widget".to_string(), hlil_info("widget", "sub_1000", &[], &[])),
            ("zed".to_string(), hlil_info("zed", "sub_2000", &[], &[])),
        ]);
        let repo = BTreeMap::from([
            ("widget".to_string(), repo_info("widget", "SP_widget", &[], &[])),
            ("alpha".to_string(), repo_info("alpha", "SP_alpha", &[], &[])),
        ]);
        let report = compare_manifests(&hlil, &repo);
        assert_eq!(report.missing_in_repo, vec!["zed"]);
        assert_eq!(report.missing_in_hlil, vec!["alpha"]);
    }

    #[test]
    fn test_close_defaults_do_not_mismatch() {
        let hlil = BTreeMap::from([(
            "widget".to_string(),
            hlil_info("widget", "sub_1000", &[("speed", 200.0, true)], &[]),
        )]);
        let repo = BTreeMap::from([(
            "widget".to_string(),
            repo_info("widget", "SP_widget", &[("speed", 200.0)], &[]),
        )]);
        let report = compare_manifests(&hlil, &repo);
        assert!(report.default_mismatches.is_empty());
    }

    #[test]
    fn test_diverging_defaults_mismatch() {
        let hlil = BTreeMap::from([(
            "widget".to_string(),
            hlil_info("widget", "sub_1000", &[("speed", 200.0, true)], &[]),
        )]);
        let repo = BTreeMap::from([(
            "widget".to_string(),
            repo_info("widget", "SP_widget", &[("speed", 180.0)], &[]),
        )]);
        let report = compare_manifests(&hlil, &repo);
        let (occurrences, repo_value) =
            &report.default_mismatches["widget"]["speed"];
        assert_eq!(occurrences[0].value, FieldValue::Float(200.0));
        assert_eq!(*repo_value, Some(180.0));
    }

    #[test]
    fn test_field_missing_in_repo_is_reported_not_compared() {
        let hlil = BTreeMap::from([(
            "widget".to_string(),
            hlil_info("widget", "sub_1000", &[("height", 8.0, false)], &[]),
        )]);
        let repo = BTreeMap::from([(
            "widget".to_string(),
            repo_info("widget", "SP_widget", &[], &[]),
        )]);
        let report = compare_manifests(&hlil, &repo);
        let (_, repo_value) = &report.default_mismatches["widget"]["height"];
        assert_eq!(*repo_value, None);
    }

    #[test]
    fn test_flag_set_inequality_per_key() {
        let hlil = BTreeMap::from([(
            "widget".to_string(),
            hlil_info("widget", "sub_1000", &[], &[1, 4]),
        )]);
        let repo = BTreeMap::from([(
            "widget".to_string(),
            repo_info("widget", "SP_widget", &[], &[1]),
        )]);
        let report = compare_manifests(&hlil, &repo);
        let diff = &report.spawnflag_mismatches["widget"];
        assert_eq!(diff["sets"], (vec![1, 4], vec![1]));
        assert!(!diff.contains_key("checks"));
    }

    #[test]
    fn test_tolerance_boundaries() {
        assert!(values_close(200.0, 200.0 + 200.0 * 0.5e-4));
        assert!(!values_close(200.0, 200.5));
        assert!(values_close(0.0, 0.00009));
    }
}
