//! Openers that read CDL text: from the `ncdump` tool or from files on disk.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::cdl::CdlDocument;
use crate::dataset::{Dataset, DatasetOpener};
use crate::error::{NetCdfError, NetCdfResult};

/// Opens NetCDF files by running `ncdump` and parsing its CDL output.
///
/// Requires the netCDF command-line utilities on `PATH` (or an explicit
/// program path). The header is read first; the time coordinate's values
/// are then dumped with `-v`.
#[derive(Debug, Clone)]
pub struct NcdumpOpener {
    program: PathBuf,
}

impl Default for NcdumpOpener {
    fn default() -> Self {
        Self::new("ncdump")
    }
}

impl NcdumpOpener {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, args: &[&str], path: &Path) -> NetCdfResult<String> {
        let output = Command::new(&self.program)
            .args(args)
            .arg(path)
            .output()
            .map_err(|e| {
                NetCdfError::CommandError(format!(
                    "Failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(NetCdfError::CommandError(format!(
                "ncdump failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl DatasetOpener for NcdumpOpener {
    fn open(&self, path: &Path) -> NetCdfResult<Box<dyn Dataset>> {
        let header = CdlDocument::parse(&self.run(&["-h"], path)?)?;

        let time_name = header.time_axis_name().map(str::to_string);
        let document = match time_name {
            Some(name) => {
                debug!(file = %path.display(), variable = %name, "Dumping time coordinate");
                CdlDocument::parse(&self.run(&["-v", &name], path)?)?
            }
            None => header,
        };

        Ok(Box::new(document))
    }
}

/// Opens CDL text files (the saved output of `ncdump`).
#[derive(Debug, Clone, Copy, Default)]
pub struct CdlFileOpener;

impl DatasetOpener for CdlFileOpener {
    fn open(&self, path: &Path) -> NetCdfResult<Box<dyn Dataset>> {
        let text = std::fs::read_to_string(path)?;
        Ok(Box::new(CdlDocument::parse(&text)?))
    }
}
