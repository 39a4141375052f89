//! Subcommand implementations. Results are printed to stdout as JSON.

use std::path::PathBuf;

use aggregation::{aggregate, group_by_filename, resolve_grouping};
use anyhow::{Context, Result};
use clipping::{package_outputs, ClippingPipeline, CommandClipper, Region};
use drs::{rename_to_canonical, CollectingReporter, MetadataExtractor};
use netcdf_parser::{CdlFileOpener, DatasetOpener, NcdumpOpener};
use serde_json::json;
use tracing::{info, warn};

use crate::config::{validate_clipper, ReaderKind, SubsetterConfig};
use crate::inputs::{expand_inputs, filter_by_variable};

/// Build the dataset opener selected in the configuration.
pub fn build_opener(config: &SubsetterConfig) -> Result<Box<dyn DatasetOpener>> {
    match config.reader {
        ReaderKind::Ncdump => Ok(Box::new(NcdumpOpener::new(&config.ncdump_path))),
        ReaderKind::Cdl => Ok(Box::new(CdlFileOpener)),
        #[cfg(feature = "native")]
        ReaderKind::Native => Ok(Box::new(netcdf_parser::native::NativeOpener)),
        #[cfg(not(feature = "native"))]
        ReaderKind::Native => anyhow::bail!("reader 'native' requires building with the `native` feature"),
    }
}

fn build_extractor(config: &SubsetterConfig) -> Result<MetadataExtractor> {
    MetadataExtractor::from_boxed(build_opener(config)?)
        .with_legacy_units(&config.time.legacy_units)
        .context("Invalid legacy time units")
}

/// Expand inputs and apply the optional variable filter.
fn resolve_files(config: &SubsetterConfig, inputs: &[String], variable: Option<&str>) -> Result<Vec<PathBuf>> {
    let files = expand_inputs(inputs)?;
    match variable {
        Some(variable) => {
            let opener = build_opener(config)?;
            Ok(filter_by_variable(opener.as_ref(), files, variable))
        }
        None => Ok(files),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn log_reports(reporter: &CollectingReporter) -> Vec<serde_json::Value> {
    reporter
        .entries()
        .into_iter()
        .map(|entry| {
            warn!(file = %entry.path.display(), error = %entry.reason, "Skipped file");
            json!({ "path": entry.path.display().to_string(), "error": entry.reason })
        })
        .collect()
}

pub fn run_aggregate(config: &SubsetterConfig, inputs: &[String], variable: Option<&str>) -> Result<()> {
    let files = resolve_files(config, inputs, variable)?;
    let extractor = build_extractor(config)?;
    let reporter = CollectingReporter::new();

    let set = aggregate(&extractor, &files, &reporter);
    let skipped = log_reports(&reporter);

    print_json(&json!({
        "aggregations": serde_json::to_value(&set.aggregations)?,
        "skipped": skipped,
    }))
}

pub fn run_group(config: &SubsetterConfig, inputs: &[String], merge_historical: bool) -> Result<()> {
    let files = expand_inputs(inputs)?;
    let groups = group_by_filename(&files, merge_historical, &config.lineage);
    info!(groups = groups.len(), merge_historical, "Grouped files by name");
    print_json(&serde_json::to_value(groups)?)
}

pub fn run_rename(config: &SubsetterConfig, inputs: &[String]) -> Result<()> {
    let files = expand_inputs(inputs)?;
    let extractor = build_extractor(config)?;
    let reporter = CollectingReporter::new();

    let renamed = rename_to_canonical(&extractor, &files, &reporter);
    let skipped = log_reports(&reporter);

    print_json(&json!({
        "files": serde_json::to_value(&renamed)?,
        "skipped": skipped,
    }))
}

pub struct SubsetOptions<'a> {
    pub inputs: &'a [String],
    pub variable: Option<&'a str>,
    pub regions: Option<&'a str>,
    pub mosaic: bool,
    pub output_dir: Option<PathBuf>,
    pub package: bool,
}

pub fn run_subset(config: &SubsetterConfig, options: SubsetOptions<'_>) -> Result<()> {
    validate_clipper(&config.clipper)?;

    let regions = match options.regions {
        Some(list) => Region::parse_list(list)?,
        None => vec![config.default_region.clone()],
    };
    let output_dir = options
        .output_dir
        .unwrap_or_else(|| config.output_dir.clone());
    let files = resolve_files(config, options.inputs, options.variable)?;

    let clipper = CommandClipper::new(config.clipper.clone());
    let report = ClippingPipeline::new(&clipper, &output_dir).run(&files, &regions, options.mosaic)?;

    let archive = if options.package && !report.outputs.is_empty() {
        Some(package_outputs(
            &report.outputs,
            &output_dir,
            &output_dir.join(&config.archive_name),
        )?)
    } else {
        None
    };

    let failures: Vec<_> = report
        .failures
        .iter()
        .map(|failure| json!({ "error": failure.to_string() }))
        .collect();
    print_json(&json!({
        "outputs": serde_json::to_value(&report.outputs)?,
        "archive": serde_json::to_value(&archive)?,
        "failures": failures,
    }))?;

    anyhow::ensure!(
        report.is_complete(),
        "{} of {} clip jobs failed",
        report.failures.len(),
        report.failures.len() + report.outputs.len()
    );
    Ok(())
}

pub fn run_grouping(keyword: Option<&str>) -> Result<()> {
    let grouping = resolve_grouping(keyword)?;
    print_json(&grouping.to_json())
}
