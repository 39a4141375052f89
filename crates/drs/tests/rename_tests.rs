//! Renaming against fixture files on disk.

use std::fs;
use std::path::PathBuf;

use drs::{rename_to_canonical, CollectingReporter, MetadataExtractor, NameOptions};
use netcdf_parser::CdlFileOpener;
use test_utils::{year_span, DatasetFixture};

const CANONICAL: &str = "tas_EUR-11_MOHC-HadGEM2-ES_rcp45_r1i1p1_SMHI-RCA4_v1_day_20060101-20101231.nc";

fn extractor() -> MetadataExtractor {
    MetadataExtractor::new(CdlFileOpener)
}

fn cordex_fixture() -> DatasetFixture {
    DatasetFixture::cordex("tas", "rcp45").with_times(year_span(2006, 2010))
}

#[test]
fn test_rename_to_canonical_name() {
    let dir = test_utils::temp_test_dir();
    let original = cordex_fixture().write(dir.path(), "download_0001.nc");
    let reporter = CollectingReporter::new();

    let renamed = rename_to_canonical(&extractor(), &[original.clone()], &reporter);

    assert_eq!(renamed, vec![dir.path().join(CANONICAL)]);
    assert!(renamed[0].exists());
    assert!(!original.exists());
    assert!(reporter.is_empty());
}

#[test]
fn test_rename_is_idempotent() {
    let dir = test_utils::temp_test_dir();
    let files = vec![
        cordex_fixture().write(dir.path(), "a.nc"),
        DatasetFixture::cmip5("pr", "MPI-ESM-LR", "historical")
            .with_times(year_span(1970, 2005))
            .write(dir.path(), "b.nc"),
    ];
    let reporter = CollectingReporter::new();

    let first = rename_to_canonical(&extractor(), &files, &reporter);
    let second = rename_to_canonical(&extractor(), &first, &reporter);

    assert_eq!(first, second);
    assert_eq!(
        second[1].file_name().unwrap(),
        "pr_MPI-ESM-LR_historical_r1i1p1_19700101-20051231.nc"
    );
    assert!(reporter.is_empty());
}

#[test]
fn test_identifier_survives_rename() {
    let dir = test_utils::temp_test_dir();
    let extractor = extractor();
    let original = cordex_fixture().write(dir.path(), "raw.nc");
    let before = drs::derive_identifier(&extractor.extract(&original).unwrap(), NameOptions::FILENAME);

    let renamed = rename_to_canonical(&extractor, &[original], &CollectingReporter::new());
    let after = drs::derive_identifier(&extractor.extract(&renamed[0]).unwrap(), NameOptions::FILENAME);

    assert_eq!(before, after);
    assert_eq!(renamed[0].file_name().unwrap().to_str(), Some(after.as_str()));
}

#[test]
fn test_unclassifiable_file_keeps_its_path() {
    let dir = test_utils::temp_test_dir();
    let good = cordex_fixture().write(dir.path(), "good.nc");
    let bad = DatasetFixture::cordex("tas", "rcp45")
        .with_attribute("project_id", "OBS4MIPS")
        .write(dir.path(), "bad.nc");
    let reporter = CollectingReporter::new();

    let renamed = rename_to_canonical(&extractor(), &[bad.clone(), good], &reporter);

    assert_eq!(renamed[0], bad);
    assert!(bad.exists());
    assert_eq!(renamed[1], dir.path().join(CANONICAL));

    let entries = reporter.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, bad);
    assert!(entries[0].reason.contains("OBS4MIPS"));
}

#[test]
fn test_occupied_target_is_a_conflict() {
    let dir = test_utils::temp_test_dir();
    let occupant = dir.path().join(CANONICAL);
    fs::write(&occupant, "not a dataset").unwrap();
    let original = cordex_fixture().write(dir.path(), "dup.nc");
    let reporter = CollectingReporter::new();

    let renamed = rename_to_canonical(&extractor(), &[original.clone()], &reporter);

    assert_eq!(renamed, vec![original.clone()]);
    assert!(original.exists());
    assert_eq!(fs::read_to_string(&occupant).unwrap(), "not a dataset");
    assert!(reporter.entries()[0].reason.contains("target exists"));
}

#[test]
fn test_missing_file_is_reported() {
    let reporter = CollectingReporter::new();
    let missing = PathBuf::from("/nonexistent/input.nc");

    let renamed = rename_to_canonical(&extractor(), &[missing.clone()], &reporter);

    assert_eq!(renamed, vec![missing]);
    assert_eq!(reporter.entries().len(), 1);
}
