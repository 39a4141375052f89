//! Packaging clip outputs into a tar archive.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ClipError, ClipResult};

/// Write `outputs` into a tar archive at `archive`.
///
/// Entries are named relative to `base_dir`; files outside it are stored
/// under their file name. The archive is assembled in a temporary file
/// next to its destination and moved into place when complete.
pub fn package_outputs(outputs: &[PathBuf], base_dir: &Path, archive: &Path) -> ClipResult<PathBuf> {
    build_archive(outputs, base_dir, archive).map_err(|source| ClipError::PackagingFailure {
        archive: archive.to_path_buf(),
        source,
    })?;

    info!(archive = %archive.display(), files = outputs.len(), "Packaged outputs");
    Ok(archive.to_path_buf())
}

fn build_archive(outputs: &[PathBuf], base_dir: &Path, archive: &Path) -> io::Result<()> {
    let parent = match archive.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let temp = tempfile::Builder::new()
        .prefix(".archive-")
        .tempfile_in(&parent)?;

    let mut builder = tar::Builder::new(temp.reopen()?);
    for output in outputs {
        let name = entry_name(output, base_dir)?;
        let mut file = File::open(output)?;
        builder.append_file(name, &mut file)?;
    }
    builder.into_inner()?.flush()?;

    temp.persist(archive).map_err(|e| e.error)?;
    Ok(())
}

fn entry_name(output: &Path, base_dir: &Path) -> io::Result<PathBuf> {
    if let Ok(relative) = output.strip_prefix(base_dir) {
        return Ok(relative.to_path_buf());
    }
    output
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("no file name in {}", output.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;

    fn entries(archive: &Path) -> BTreeSet<String> {
        let mut reader = tar::Archive::new(File::open(archive).unwrap());
        reader
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_package_relative_paths() {
        let dir = test_utils::temp_test_dir();
        let out = dir.path().join("out");
        fs::create_dir_all(out.join("nested")).unwrap();
        let a = out.join("tas_FRA.nc");
        let b = out.join("nested").join("tas_DEU.nc");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let archive = out.join("subsets.tar");
        let written = package_outputs(&[a, b], &out, &archive).unwrap();

        assert_eq!(written, archive);
        let names = entries(&archive);
        assert!(names.contains("tas_FRA.nc"));
        assert!(names.contains("nested/tas_DEU.nc"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_outside_files_use_file_name() {
        let dir = test_utils::temp_test_dir();
        let elsewhere = dir.path().join("elsewhere.nc");
        fs::write(&elsewhere, "x").unwrap();
        let archive = dir.path().join("out").join("a.tar");

        package_outputs(&[elsewhere], &dir.path().join("out"), &archive).unwrap();
        assert_eq!(entries(&archive), BTreeSet::from(["elsewhere.nc".to_string()]));
    }

    #[test]
    fn test_missing_output_is_packaging_failure() {
        let dir = test_utils::temp_test_dir();
        let archive = dir.path().join("a.tar");
        let result = package_outputs(&[dir.path().join("missing.nc")], dir.path(), &archive);

        match result {
            Err(ClipError::PackagingFailure { archive: reported, .. }) => assert_eq!(reported, archive),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!archive.exists());
        // The temporary archive is removed as well
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
