//! Resolution of command-line inputs to NetCDF file paths.

use std::path::PathBuf;

use anyhow::{Context, Result};
use drs::{has_variable, resource_path};
use netcdf_parser::DatasetOpener;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Resolve paths, `file://` URLs and directories to a list of files.
///
/// Directories are searched recursively for `.nc` files, sorted by path.
/// Explicit files are kept in the order given.
pub fn expand_inputs(identifiers: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for identifier in identifiers {
        let path = resource_path(identifier)?;
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(&path)
                .into_iter()
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Failed to read directory {:?}", path))?
                .into_iter()
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| p.extension().map_or(false, |ext| ext == "nc"))
                .collect();
            found.sort();
            debug!(dir = %path.display(), count = found.len(), "Expanded directory");
            files.extend(found);
        } else {
            files.push(path);
        }
    }

    Ok(files)
}

/// Keep only files whose data variable is `variable`.
pub fn filter_by_variable(opener: &dyn DatasetOpener, files: Vec<PathBuf>, variable: &str) -> Vec<PathBuf> {
    let total = files.len();
    let kept: Vec<PathBuf> = files
        .into_iter()
        .filter(|path| has_variable(opener, path, variable))
        .collect();
    info!(variable = %variable, kept = kept.len(), total, "Filtered inputs by variable");
    kept
}
