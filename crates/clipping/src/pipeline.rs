//! Clipping orchestration: which inputs against which regions, and where
//! the results go.
//!
//! Each output is first written inside a fresh temporary directory in the
//! output directory and only moved to its final name once the clipper has
//! succeeded, so a failed clip never leaves a partial file behind.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::clipper::{ClipRequest, RegionClipper};
use crate::error::{ClipError, ClipResult, ClipperError};
use crate::region::Region;

/// One planned clipper call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipJob {
    pub input: PathBuf,
    pub regions: Vec<Region>,
    pub mosaic: bool,
    pub output: PathBuf,
}

/// Outcome of a pipeline run.
#[derive(Debug, Default)]
pub struct ClipReport {
    /// Written files, in job order
    pub outputs: Vec<PathBuf>,
    /// One entry per failed job
    pub failures: Vec<ClipError>,
}

impl ClipReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Plan the jobs for `inputs` x `regions`.
///
/// Without mosaic there is one job per input and region, named
/// `<stem>_<REGION>.nc`. With mosaic there is one job per input covering
/// all regions, named `<stem>_<R1>-<R2>.nc`. A name already taken by an
/// earlier job gets a `_<n>` suffix.
pub fn plan_jobs(inputs: &[PathBuf], regions: &[Region], mosaic: bool, output_dir: &Path) -> Vec<ClipJob> {
    let mut used = HashSet::new();
    let mut jobs = Vec::new();

    for input in inputs {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());

        let region_sets: Vec<Vec<Region>> = if mosaic {
            vec![regions.to_vec()]
        } else {
            regions.iter().map(|r| vec![r.clone()]).collect()
        };

        for set in region_sets {
            let base = format!("{}_{}", stem, set.join("-"));
            let mut name = format!("{}.nc", base);
            let mut n = 1;
            while !used.insert(name.clone()) {
                name = format!("{}_{}.nc", base, n);
                n += 1;
            }
            jobs.push(ClipJob {
                input: input.clone(),
                regions: set,
                mosaic,
                output: output_dir.join(name),
            });
        }
    }

    jobs
}

/// Runs clip jobs through a [`RegionClipper`].
pub struct ClippingPipeline<'a> {
    clipper: &'a dyn RegionClipper,
    output_dir: PathBuf,
}

impl<'a> ClippingPipeline<'a> {
    pub fn new(clipper: &'a dyn RegionClipper, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            clipper,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Clip every input against `regions`.
    ///
    /// Fails up front only when no region is given or the output directory
    /// cannot be created. Failures of single jobs are collected in the
    /// report and do not stop the remaining jobs.
    pub fn run(&self, inputs: &[PathBuf], regions: &[Region], mosaic: bool) -> ClipResult<ClipReport> {
        if regions.is_empty() {
            return Err(ClipError::NoRegions);
        }
        fs::create_dir_all(&self.output_dir)?;

        let jobs = plan_jobs(inputs, regions, mosaic, &self.output_dir);
        let mut report = ClipReport::default();

        for job in &jobs {
            match self.run_job(job) {
                Ok(()) => {
                    info!(
                        input = %job.input.display(),
                        output = %job.output.display(),
                        regions = %job.regions.join(","),
                        "Clipped"
                    );
                    report.outputs.push(job.output.clone());
                }
                Err(source) => {
                    warn!(input = %job.input.display(), error = %source, "Clipping failed");
                    report.failures.push(ClipError::ClippingFailure {
                        resource: job.input.clone(),
                        regions: job.regions.clone(),
                        source,
                    });
                }
            }
        }

        info!(
            jobs = jobs.len(),
            outputs = report.outputs.len(),
            failures = report.failures.len(),
            "Clipping finished"
        );
        Ok(report)
    }

    fn run_job(&self, job: &ClipJob) -> Result<(), ClipperError> {
        let staging = tempfile::Builder::new()
            .prefix(".clip-")
            .tempdir_in(&self.output_dir)?;
        let file_name = job.output.file_name().unwrap_or_default();
        let temp_output = staging.path().join(file_name);

        self.clipper.clip(&ClipRequest {
            input: &job.input,
            regions: &job.regions,
            mosaic: job.mosaic,
            output: &temp_output,
        })?;

        if !temp_output.exists() {
            return Err(ClipperError::MissingOutput(temp_output));
        }
        debug!(from = %temp_output.display(), to = %job.output.display(), "Moving clip into place");
        fs::rename(&temp_output, &job.output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(jobs: &[ClipJob]) -> Vec<String> {
        jobs.iter()
            .map(|j| j.output.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_plan_per_region() {
        let regions = Region::parse_list("FRA,DEU").unwrap();
        let inputs = vec![PathBuf::from("/in/tas.nc"), PathBuf::from("/in/pr.nc")];
        let jobs = plan_jobs(&inputs, &regions, false, Path::new("/out"));
        assert_eq!(
            names(&jobs),
            vec!["tas_FRA.nc", "tas_DEU.nc", "pr_FRA.nc", "pr_DEU.nc"]
        );
        assert!(jobs.iter().all(|j| j.regions.len() == 1 && !j.mosaic));
        assert_eq!(jobs[0].output, PathBuf::from("/out/tas_FRA.nc"));
    }

    #[test]
    fn test_plan_mosaic() {
        let regions = Region::parse_list("FRA,DEU,BEL").unwrap();
        let jobs = plan_jobs(&[PathBuf::from("/in/tas.nc")], &regions, true, Path::new("/out"));
        assert_eq!(names(&jobs), vec!["tas_FRA-DEU-BEL.nc"]);
        assert_eq!(jobs[0].regions, regions);
        assert!(jobs[0].mosaic);
    }

    #[test]
    fn test_plan_collisions_are_suffixed() {
        let regions = Region::parse_list("FRA").unwrap();
        let inputs = vec![
            PathBuf::from("/a/tas.nc"),
            PathBuf::from("/b/tas.nc"),
            PathBuf::from("/c/tas.nc"),
        ];
        let jobs = plan_jobs(&inputs, &regions, false, Path::new("/out"));
        assert_eq!(names(&jobs), vec!["tas_FRA.nc", "tas_FRA_1.nc", "tas_FRA_2.nc"]);
    }
}
