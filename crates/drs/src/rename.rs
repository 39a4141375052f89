//! Renaming files to their canonical DRS name.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{DrsError, DrsResult};
use crate::metadata::MetadataExtractor;
use crate::report::Reporter;

/// Rename each file in place to its canonical name.
///
/// Returns one path per input, in input order. Files that cannot be
/// classified or renamed keep their path and are passed to `reporter`.
/// A file that already has its canonical name is left alone, so the
/// operation can be repeated safely.
pub fn rename_to_canonical(
    extractor: &MetadataExtractor,
    files: &[PathBuf],
    reporter: &dyn Reporter,
) -> Vec<PathBuf> {
    files
        .iter()
        .map(|path| match rename_one(extractor, path) {
            Ok(renamed) => renamed,
            Err(e) => {
                reporter.file_skipped(path, &e);
                path.clone()
            }
        })
        .collect()
}

fn rename_one(extractor: &MetadataExtractor, path: &Path) -> DrsResult<PathBuf> {
    let canonical = extractor.extract(path)?.canonical_filename();

    if path.file_name().and_then(|n| n.to_str()) == Some(canonical.as_str()) {
        debug!(file = %path.display(), "Already canonical");
        return Ok(path.to_path_buf());
    }

    let target = path.with_file_name(&canonical);
    if target.exists() {
        return Err(DrsError::RenameConflict {
            from: path.to_path_buf(),
            to: target,
        });
    }

    fs::rename(path, &target)?;
    info!(from = %path.display(), to = %target.display(), "Renamed file");
    Ok(target)
}
