//! The region clipper boundary.
//!
//! The geometric work is done outside this crate. A [`RegionClipper`]
//! receives one input file, the regions to cut out and the path to write,
//! and either writes that file or fails.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClipperError;
use crate::region::Region;

/// One call to a clipper.
#[derive(Debug, Clone, Copy)]
pub struct ClipRequest<'a> {
    pub input: &'a Path,
    /// One region, or several merged into a single output when `mosaic` is set
    pub regions: &'a [Region],
    pub mosaic: bool,
    pub output: &'a Path,
}

/// Clips a NetCDF file to one or more region polygons.
pub trait RegionClipper: Send + Sync {
    /// Write the clipped subset of `request.input` to `request.output`.
    fn clip(&self, request: &ClipRequest<'_>) -> Result<(), ClipperError>;
}

/// Configuration for [`CommandClipper`].
///
/// `args` are passed without a shell. These placeholders are substituted
/// in each argument:
///
/// | Placeholder | Value |
/// |---|---|
/// | `{input}` | input file |
/// | `{output}` | file to write |
/// | `{region}` | first region |
/// | `{regions}` | all regions, comma separated |
/// | `{mosaic}` | `true` or `false` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandClipperConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CommandClipperConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: ["--regions", "{regions}", "--mosaic", "{mosaic}", "{input}", "{output}"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Runs an external program for each clip.
#[derive(Debug, Clone)]
pub struct CommandClipper {
    config: CommandClipperConfig,
}

impl CommandClipper {
    pub fn new(config: CommandClipperConfig) -> Self {
        Self { config }
    }

    /// Arguments for one request with placeholders substituted.
    pub fn render_args(&self, request: &ClipRequest<'_>) -> Vec<String> {
        let input = request.input.to_string_lossy();
        let output = request.output.to_string_lossy();
        let region = request.regions.first().map(Region::as_str).unwrap_or_default();
        let regions = request.regions.join(",");
        let mosaic = request.mosaic.to_string();

        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output}", &output)
                    .replace("{regions}", &regions)
                    .replace("{region}", region)
                    .replace("{mosaic}", &mosaic)
            })
            .collect()
    }
}

impl RegionClipper for CommandClipper {
    fn clip(&self, request: &ClipRequest<'_>) -> Result<(), ClipperError> {
        let args = self.render_args(request);
        debug!(program = %self.config.program, args = ?args, "Running clipper");

        let output = Command::new(&self.config.program)
            .args(&args)
            .output()
            .map_err(|source| ClipperError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ClipperError::Command {
                program: self.config.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !request.output.exists() {
            return Err(ClipperError::MissingOutput(PathBuf::from(request.output)));
        }
        Ok(())
    }
}
