//! Grouping files into time-ordered aggregations.
//!
//! Metadata is extracted for all files in parallel; grouping and sorting
//! happen afterwards in input order so the result does not depend on
//! scheduling.

use std::collections::BTreeMap;
use std::path::PathBuf;

use drs::{time_range, FileMetadata, MetadataExtractor, Reporter, SkippedFile, NETCDF_EXTENSION};
use netcdf_parser::ModelDateTime;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

/// One logical time series assembled from several files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub key: String,
    /// Member files, ascending by first timestamp
    pub files: Vec<PathBuf>,
    pub from_timestamp: ModelDateTime,
    pub to_timestamp: ModelDateTime,
    pub start_year: i32,
    pub end_year: i32,
    pub variable: String,
    pub output_filename: String,
}

/// Result of [`aggregate`]: the groups plus the files left out of them.
#[derive(Debug, Default)]
pub struct AggregationSet {
    pub aggregations: BTreeMap<String, Aggregation>,
    pub skipped: Vec<SkippedFile>,
}

impl AggregationSet {
    pub fn get(&self, key: &str) -> Option<&Aggregation> {
        self.aggregations.get(key)
    }

    pub fn len(&self) -> usize {
        self.aggregations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregations.is_empty()
    }
}

/// Group `files` by aggregation key and sort each group along time.
///
/// Files that cannot be classified are reported and listed in
/// [`AggregationSet::skipped`]; the rest of the batch is still grouped.
pub fn aggregate(extractor: &MetadataExtractor, files: &[PathBuf], reporter: &dyn Reporter) -> AggregationSet {
    let extracted: Vec<_> = files
        .par_iter()
        .map(|path| (path, extractor.extract(path)))
        .collect();

    let mut groups: BTreeMap<String, Vec<(PathBuf, FileMetadata)>> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (path, result) in extracted {
        match result {
            Ok(metadata) => {
                let key = metadata.aggregation_key();
                debug!(file = %path.display(), key = %key, "Classified file");
                groups
                    .entry(key)
                    .or_default()
                    .push((path.clone(), metadata));
            }
            Err(error) => {
                reporter.file_skipped(path, &error);
                skipped.push(SkippedFile {
                    path: path.clone(),
                    error,
                });
            }
        }
    }

    let aggregations: BTreeMap<String, Aggregation> = groups
        .into_iter()
        .filter_map(|(key, members)| build_aggregation(key, members))
        .map(|aggregation| (aggregation.key.clone(), aggregation))
        .collect();

    info!(
        files = files.len(),
        aggregations = aggregations.len(),
        skipped = skipped.len(),
        "Aggregated files"
    );

    AggregationSet {
        aggregations,
        skipped,
    }
}

fn build_aggregation(key: String, mut members: Vec<(PathBuf, FileMetadata)>) -> Option<Aggregation> {
    // Stable: equal start times keep input order
    members.sort_by_key(|(_, metadata)| metadata.from_timestamp);

    let (_, first) = members.first()?;
    let (_, last) = members.last()?;
    let from_timestamp = first.from_timestamp;
    let to_timestamp = last.to_timestamp;
    let variable = first.variable.clone();
    let output_filename = format!(
        "{}_{}{}",
        key,
        time_range(&from_timestamp, &to_timestamp),
        NETCDF_EXTENSION
    );

    Some(Aggregation {
        files: members.into_iter().map(|(path, _)| path).collect(),
        start_year: from_timestamp.year,
        end_year: to_timestamp.year,
        from_timestamp,
        to_timestamp,
        variable,
        output_filename,
        key,
    })
}
