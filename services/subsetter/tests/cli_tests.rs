//! Runs the subsetter binary against CDL fixtures.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use test_utils::{year_span, DatasetFixture};

fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let path = dir.join("subsetter.yaml");
    fs::write(&path, format!("reader: cdl\n{}", extra)).unwrap();
    path
}

fn run(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_subsetter"))
        .arg("--config")
        .arg(config)
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_grouping_command() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");

    let output = run(&config, &["grouping", "DJF"]);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), serde_json::json!([[12, 1, 2], "unique"]));

    let output = run(&config, &["grouping"]);
    assert_eq!(stdout_json(&output), serde_json::json!(["year"]));

    assert!(!run(&config, &["grouping", "bogus"]).status.success());
}

#[test]
fn test_aggregate_directory() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    let series = DatasetFixture::cordex("tas", "rcp45");
    series.clone().with_times(year_span(2011, 2015)).write(&data, "b.nc");
    series.with_times(year_span(2006, 2010)).write(&data, "a.nc");
    DatasetFixture::cordex("pr", "rcp45")
        .with_attribute("project_id", "unknown")
        .write(&data, "c.nc");
    let config = write_config(dir.path(), "");

    let output = run(&config, &["aggregate", data.to_str().unwrap()]);
    assert!(output.status.success());

    let json = stdout_json(&output);
    let aggregation = &json["aggregations"]["tas_EUR-11_MOHC-HadGEM2-ES_rcp45_r1i1p1_SMHI-RCA4_v1_day"];
    assert_eq!(aggregation["start_year"], 2006);
    assert_eq!(aggregation["end_year"], 2015);
    assert_eq!(aggregation["files"][0], data.join("a.nc").to_str().unwrap());
    assert_eq!(json["skipped"].as_array().unwrap().len(), 1);
}

#[test]
fn test_aggregate_variable_filter() {
    let dir = tempfile::tempdir().unwrap();
    DatasetFixture::cordex("tas", "rcp45").write(dir.path(), "tas.nc");
    DatasetFixture::cordex("pr", "rcp45").write(dir.path(), "pr.nc");
    let config = write_config(dir.path(), "");

    let output = run(&config, &["aggregate", "--variable", "pr", dir.path().to_str().unwrap()]);
    let json = stdout_json(&output);
    let keys: Vec<&String> = json["aggregations"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["pr_EUR-11_MOHC-HadGEM2-ES_rcp45_r1i1p1_SMHI-RCA4_v1_day"]);
}

#[test]
fn test_rename_twice() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    DatasetFixture::cmip5("pr", "MPI-ESM-LR", "rcp85")
        .with_times(year_span(2006, 2010))
        .write(&data, "raw.nc");
    let config = write_config(dir.path(), "");

    let first = stdout_json(&run(&config, &["rename", data.to_str().unwrap()]));
    let second = stdout_json(&run(&config, &["rename", data.to_str().unwrap()]));

    let expected = data.join("pr_MPI-ESM-LR_rcp85_r1i1p1_20060101-20101231.nc");
    assert_eq!(first["files"][0], expected.to_str().unwrap());
    assert_eq!(first["files"], second["files"]);
    assert!(expected.exists());
}

#[test]
fn test_group_merge_historical() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "");
    let rcp = dir.path().join("tas_EUR-11_MOHC_rcp45_r1i1p1_2006-2035.nc");
    let hist = dir.path().join("tas_EUR-11_MOHC_historical_r1i1p1_1970-2005.nc");
    fs::write(&rcp, "").unwrap();
    fs::write(&hist, "").unwrap();

    let output = run(
        &config,
        &["group", "--merge-historical", rcp.to_str().unwrap(), hist.to_str().unwrap()],
    );
    let json = stdout_json(&output);
    let group = json["tas_EUR-11_MOHC_rcp45_r1i1p1"].as_array().unwrap();
    assert_eq!(group.len(), 2);
}

#[cfg(unix)]
#[test]
fn test_subset_with_copying_clipper() {
    let dir = tempfile::tempdir().unwrap();
    let input = DatasetFixture::cordex("tas", "rcp45").write(dir.path(), "tas.nc");
    let out = dir.path().join("out");
    let config = write_config(
        dir.path(),
        "clipper:\n  program: cp\n  args: [\"{input}\", \"{output}\"]\n",
    );

    let output = run(
        &config,
        &[
            "subset",
            "--region",
            "fra,deu",
            "--output-dir",
            out.to_str().unwrap(),
            "--package",
            input.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["outputs"].as_array().unwrap().len(), 2);
    assert!(out.join("tas_FRA.nc").exists());
    assert!(out.join("tas_DEU.nc").exists());
    assert!(out.join("subsets.tar").exists());
}

#[test]
fn test_subset_requires_clipper() {
    let dir = tempfile::tempdir().unwrap();
    let input = DatasetFixture::cordex("tas", "rcp45").write(dir.path(), "tas.nc");
    let config = write_config(dir.path(), "");

    let output = run(&config, &["subset", input.to_str().unwrap()]);
    assert!(!output.status.success());
}
