//! Grouping files by the tokens of their names.
//!
//! A DRS file name is a sequence of `_`-separated fields ending with the
//! time range and extension. Dropping the last field gives the base name
//! shared by all segments of one run.
//!
//! With lineage merging enabled, a scenario group also takes in the files
//! of its baseline run: the files whose base name equals the scenario's
//! with the scenario field replaced by the baseline (`rcp45` ->
//! `historical`). Fields are compared exactly, so one base name being a
//! prefix of another does not merge their groups.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which field holds the scenario and which baseline each scenario continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageConfig {
    /// Zero-based index of the scenario field in a file name
    pub scenario_field: usize,
    /// Scenario identifier -> baseline identifier
    pub mappings: BTreeMap<String, String>,
}

impl Default for LineageConfig {
    fn default() -> Self {
        let mappings = ["rcp26", "rcp45", "rcp60", "rcp85"]
            .into_iter()
            .map(|scenario| (scenario.to_string(), "historical".to_string()))
            .collect();
        Self {
            scenario_field: 3,
            mappings,
        }
    }
}

impl LineageConfig {
    pub fn baseline_for(&self, scenario: &str) -> Option<&str> {
        self.mappings.get(scenario).map(String::as_str)
    }

    pub fn is_baseline(&self, token: &str) -> bool {
        self.mappings.values().any(|baseline| baseline == token)
    }
}

/// Base name of a file: every `_`-separated field of the file name except
/// the last. A name without `_` is its own base name, minus the extension.
pub fn base_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match file_name.rsplit_once('_') {
        Some((base, _)) => base.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name),
    }
}

/// Group files by base name, optionally merging baseline runs into the
/// scenario groups that continue them.
///
/// Every input ends up in at least one group. Under merging, a baseline
/// file is placed in each scenario group that continues it, or in a group
/// of its own when no scenario does.
pub fn group_by_filename(
    files: &[PathBuf],
    merge_historical: bool,
    config: &LineageConfig,
) -> BTreeMap<String, BTreeSet<PathBuf>> {
    let mut by_base: BTreeMap<String, BTreeSet<PathBuf>> = BTreeMap::new();
    for file in files {
        by_base
            .entry(base_name(file))
            .or_default()
            .insert(file.clone());
    }

    if !merge_historical {
        return by_base;
    }

    let (baselines, scenarios): (BTreeMap<_, _>, BTreeMap<_, _>) = by_base
        .into_iter()
        .partition(|(base, _)| scenario_token(base, config).map_or(false, |t| config.is_baseline(t)));

    let mut absorbed = BTreeSet::new();
    let mut groups = BTreeMap::new();

    for (base, mut members) in scenarios {
        if let Some(baseline_base) = baseline_name(&base, config) {
            if let Some(baseline_files) = baselines.get(&baseline_base) {
                debug!(group = %base, baseline = %baseline_base, "Merging baseline run");
                members.extend(baseline_files.iter().cloned());
                absorbed.insert(baseline_base);
            }
        }
        groups.insert(base, members);
    }

    for (base, members) in baselines {
        if !absorbed.contains(&base) {
            groups.insert(base, members);
        }
    }

    groups
}

fn scenario_token<'a>(base: &'a str, config: &LineageConfig) -> Option<&'a str> {
    base.split('_').nth(config.scenario_field)
}

/// Base name of the baseline run a scenario base name continues.
fn baseline_name(base: &str, config: &LineageConfig) -> Option<String> {
    let mut fields: Vec<&str> = base.split('_').collect();
    let baseline = config.baseline_for(fields.get(config.scenario_field)?)?;
    fields[config.scenario_field] = baseline;
    Some(fields.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/data").join(n)).collect()
    }

    fn set(names: &[&str]) -> BTreeSet<PathBuf> {
        paths(names).into_iter().collect()
    }

    const RCP45_A: &str = "tas_EUR-11_MOHC_rcp45_r1i1p1_RCA4_v1_day_20060101-20101231.nc";
    const RCP45_B: &str = "tas_EUR-11_MOHC_rcp45_r1i1p1_RCA4_v1_day_20110101-20151231.nc";
    const HIST: &str = "tas_EUR-11_MOHC_historical_r1i1p1_RCA4_v1_day_19700101-20051231.nc";
    const RCP85: &str = "tas_EUR-11_MOHC_rcp85_r1i1p1_RCA4_v1_day_20060101-20101231.nc";

    #[test]
    fn test_base_name() {
        assert_eq!(base_name(Path::new(RCP45_A)), "tas_EUR-11_MOHC_rcp45_r1i1p1_RCA4_v1_day");
        assert_eq!(base_name(Path::new("/x/tas.nc")), "tas");
        assert_eq!(base_name(Path::new("/x/a_b.nc")), "a");
    }

    #[test]
    fn test_group_without_merging() {
        let groups = group_by_filename(&paths(&[RCP45_A, HIST, RCP45_B]), false, &LineageConfig::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups["tas_EUR-11_MOHC_rcp45_r1i1p1_RCA4_v1_day"],
            set(&[RCP45_A, RCP45_B])
        );
        assert_eq!(
            groups["tas_EUR-11_MOHC_historical_r1i1p1_RCA4_v1_day"],
            set(&[HIST])
        );
    }

    #[test]
    fn test_merge_historical_into_scenarios() {
        let groups = group_by_filename(&paths(&[RCP45_A, HIST, RCP85]), true, &LineageConfig::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups["tas_EUR-11_MOHC_rcp45_r1i1p1_RCA4_v1_day"],
            set(&[RCP45_A, HIST])
        );
        assert_eq!(
            groups["tas_EUR-11_MOHC_rcp85_r1i1p1_RCA4_v1_day"],
            set(&[RCP85, HIST])
        );
    }

    #[test]
    fn test_orphan_baseline_keeps_own_group() {
        let other_model = "tas_EUR-11_CNRM_historical_r1i1p1_RCA4_v1_day_19700101-20051231.nc";
        let groups = group_by_filename(&paths(&[RCP45_A, other_model]), true, &LineageConfig::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups["tas_EUR-11_CNRM_historical_r1i1p1_RCA4_v1_day"],
            set(&[other_model])
        );
    }

    #[test]
    fn test_single_file_single_group() {
        for merge in [false, true] {
            let groups = group_by_filename(&paths(&[HIST]), merge, &LineageConfig::default());
            assert_eq!(groups.len(), 1);
            assert_eq!(groups.values().next().unwrap(), &set(&[HIST]));
        }
    }

    #[test]
    fn test_prefix_names_do_not_merge() {
        let short = "tas_EUR-11_MOHC_rcp45_r1i1p1_20060101-20101231.nc";
        let long = "tas_EUR-11_MOHC_rcp45_r1i1p1_RCA4_20060101-20101231.nc";
        let groups = group_by_filename(&paths(&[short, long]), false, &LineageConfig::default());
        assert_eq!(groups["tas_EUR-11_MOHC_rcp45_r1i1p1"], set(&[short]));
        assert_eq!(groups["tas_EUR-11_MOHC_rcp45_r1i1p1_RCA4"], set(&[long]));
    }

    #[test]
    fn test_custom_mappings() {
        let config = LineageConfig {
            scenario_field: 2,
            mappings: [("ssp245".to_string(), "historical".to_string())].into_iter().collect(),
        };
        let scenario = "tas_MPI-ESM1-2-LR_ssp245_r1i1p1f1_20150101-20391231.nc";
        let baseline = "tas_MPI-ESM1-2-LR_historical_r1i1p1f1_19700101-20141231.nc";
        let groups = group_by_filename(&paths(&[scenario, baseline]), true, &config);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups["tas_MPI-ESM1-2-LR_ssp245_r1i1p1f1"],
            set(&[scenario, baseline])
        );
    }

    #[test]
    fn test_config_from_yaml_uses_defaults() {
        let config: LineageConfig = serde_yaml::from_str("scenario_field: 2\n").unwrap();
        assert_eq!(config.scenario_field, 2);
        assert_eq!(config.baseline_for("rcp60"), Some("historical"));
        assert!(config.is_baseline("historical"));
        assert!(!config.is_baseline("rcp45"));
    }
}
