//! End-to-end aggregation over fixture files.

use std::path::PathBuf;

use aggregation::{aggregate, group_by_filename, LineageConfig};
use drs::{CollectingReporter, DrsError, MetadataExtractor};
use netcdf_parser::{CdlFileOpener, ModelDateTime};
use test_utils::{year_span, DatasetFixture};

fn extractor() -> MetadataExtractor {
    MetadataExtractor::new(CdlFileOpener)
}

#[test]
fn test_cmip5_series_with_unknown_project() {
    let dir = test_utils::temp_test_dir();
    let series = DatasetFixture::cmip5("tas", "MPI-ESM-LR", "rcp45");
    let p2016 = series
        .clone()
        .with_times(year_span(2016, 2020))
        .write(dir.path(), "part3.nc");
    let p2006 = series
        .clone()
        .with_times(year_span(2006, 2010))
        .write(dir.path(), "part1.nc");
    let p2011 = series
        .with_times(year_span(2011, 2015))
        .write(dir.path(), "part2.nc");
    let unknown = DatasetFixture::cmip5("tas", "MPI-ESM-LR", "rcp45")
        .with_attribute("project_id", "CMIP6")
        .write(dir.path(), "other.nc");
    let reporter = CollectingReporter::new();

    let set = aggregate(
        &extractor(),
        &[p2016.clone(), unknown.clone(), p2006.clone(), p2011.clone()],
        &reporter,
    );

    assert_eq!(set.len(), 1);
    let aggregation = set.get("tas_MPI-ESM-LR_rcp45_r1i1p1").unwrap();
    assert_eq!(aggregation.files, vec![p2006, p2011, p2016]);
    assert_eq!(aggregation.from_timestamp, ModelDateTime::new(2006, 1, 1));
    assert_eq!(aggregation.to_timestamp, ModelDateTime::new(2020, 12, 31));
    assert_eq!((aggregation.start_year, aggregation.end_year), (2006, 2020));
    assert_eq!(
        aggregation.output_filename,
        "tas_MPI-ESM-LR_rcp45_r1i1p1_20060101-20201231.nc"
    );

    assert_eq!(set.skipped.len(), 1);
    assert_eq!(set.skipped[0].path, unknown);
    assert!(matches!(
        &set.skipped[0].error,
        DrsError::UnknownProject { value } if value == "CMIP6"
    ));
    assert_eq!(reporter.entries().len(), 1);
}

#[test]
fn test_cordex_segments_form_one_ordered_group() {
    let dir = test_utils::temp_test_dir();
    let spans = [(2031, 2035), (2006, 2010), (2021, 2025), (2011, 2015), (2016, 2020)];
    let files: Vec<_> = spans
        .iter()
        .enumerate()
        .map(|(i, (first, last))| {
            DatasetFixture::cordex("pr", "rcp85")
                .with_times(year_span(*first, *last))
                .write(dir.path(), &format!("segment{}.nc", i))
        })
        .collect();

    let extractor = extractor();
    let set = aggregate(&extractor, &files, &CollectingReporter::new());

    assert_eq!(set.len(), 1);
    let aggregation = set.aggregations.values().next().unwrap();
    assert_eq!(aggregation.files.len(), spans.len());

    let starts: Vec<_> = aggregation
        .files
        .iter()
        .map(|f| extractor.extract(f).unwrap().from_timestamp)
        .collect();
    assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(aggregation.variable, "pr");
}

#[test]
fn test_experiments_and_models_are_separate_groups() {
    let dir = test_utils::temp_test_dir();
    let files = vec![
        DatasetFixture::cordex("tas", "rcp45").write(dir.path(), "a.nc"),
        DatasetFixture::cordex("tas", "rcp85").write(dir.path(), "b.nc"),
        DatasetFixture::cordex("tas", "rcp85")
            .with_attribute("model_id", "KNMI-RACMO22E")
            .write(dir.path(), "c.nc"),
    ];

    let set = aggregate(&extractor(), &files, &CollectingReporter::new());

    assert_eq!(set.len(), 3);
    assert!(set.aggregations.values().all(|a| a.files.len() == 1));
}

#[test]
fn test_lineage_merge_example() {
    let files: Vec<PathBuf> = vec![
        "tas_EUR-11_MOHC_rcp45_r1i1p1_RCA4_2006-2035.nc".into(),
        "tas_EUR-11_MOHC_historical_r1i1p1_RCA4_1970-2005.nc".into(),
    ];

    let groups = group_by_filename(&files, true, &LineageConfig::default());

    assert_eq!(groups.len(), 1);
    let members = &groups["tas_EUR-11_MOHC_rcp45_r1i1p1_RCA4"];
    assert_eq!(members.len(), 2);
    assert!(files.iter().all(|f| members.contains(f)));
}
