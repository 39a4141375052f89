//! Metadata extraction from CORDEX and CMIP5 files.
//!
//! The `project_id` global attribute selects the attribute schema. Every
//! attribute that ends up in a file name is required; nothing is filled in
//! with a default.

use std::path::{Path, PathBuf};

use netcdf_parser::{Dataset, DatasetOpener, ModelDateTime, TimeUnits, LEGACY_TIME_UNITS};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{DrsError, DrsResult};

/// Project-specific part of a file's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "project")]
pub enum Project {
    #[serde(rename = "CORDEX")]
    Cordex {
        domain: String,
        driving_model: String,
        model: String,
        version: String,
        frequency: String,
    },
    #[serde(rename = "CMIP5")]
    Cmip5 {
        model: String,
        /// CMIP5 names do not use the frequency, so it may be absent
        frequency: Option<String>,
    },
}

impl Project {
    /// Value of `project_id` for this project.
    pub fn id(&self) -> &'static str {
        match self {
            Project::Cordex { .. } => "CORDEX",
            Project::Cmip5 { .. } => "CMIP5",
        }
    }

    /// Model that produced the data (the RCM for CORDEX).
    pub fn model(&self) -> &str {
        match self {
            Project::Cordex { model, .. } | Project::Cmip5 { model, .. } => model,
        }
    }
}

/// Classification of one file.
///
/// `from_timestamp <= to_timestamp` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    pub project: Project,
    pub variable: String,
    pub experiment: String,
    pub ensemble: String,
    pub from_timestamp: ModelDateTime,
    pub to_timestamp: ModelDateTime,
}

impl FileMetadata {
    pub fn start_year(&self) -> i32 {
        self.from_timestamp.year
    }

    pub fn end_year(&self) -> i32 {
        self.to_timestamp.year
    }
}

/// Reads [`FileMetadata`] from files through a [`DatasetOpener`].
pub struct MetadataExtractor {
    opener: Box<dyn DatasetOpener>,
    legacy_units: String,
}

impl MetadataExtractor {
    pub fn new(opener: impl DatasetOpener + 'static) -> Self {
        Self::from_boxed(Box::new(opener))
    }

    pub fn from_boxed(opener: Box<dyn DatasetOpener>) -> Self {
        Self {
            opener,
            legacy_units: LEGACY_TIME_UNITS.to_string(),
        }
    }

    /// Units assumed for time coordinates without a `units` attribute.
    pub fn with_legacy_units(mut self, units: &str) -> DrsResult<Self> {
        TimeUnits::parse(units)?;
        self.legacy_units = units.to_string();
        Ok(self)
    }

    pub fn opener(&self) -> &dyn DatasetOpener {
        self.opener.as_ref()
    }

    /// Classify one file.
    pub fn extract(&self, path: &Path) -> DrsResult<FileMetadata> {
        let dataset = self.opener.open(path)?;

        let project_id = required(dataset.as_ref(), "project_id")?;
        let (project, experiment, ensemble) = match project_id.as_str() {
            "CORDEX" => (
                Project::Cordex {
                    domain: required(dataset.as_ref(), "CORDEX_domain")?,
                    driving_model: required(dataset.as_ref(), "driving_model_id")?,
                    model: required(dataset.as_ref(), "model_id")?,
                    version: required(dataset.as_ref(), "rcm_version_id")?,
                    frequency: required(dataset.as_ref(), "frequency")?,
                },
                required(dataset.as_ref(), "experiment_id")?,
                required(dataset.as_ref(), "driving_model_ensemble_member")?,
            ),
            "CMIP5" => (
                Project::Cmip5 {
                    model: required(dataset.as_ref(), "model_id")?,
                    frequency: optional(dataset.as_ref(), "frequency"),
                },
                optional(dataset.as_ref(), "experiment_id")
                    .or_else(|| optional(dataset.as_ref(), "experiment"))
                    .ok_or_else(|| DrsError::incomplete("experiment_id"))?,
                required(dataset.as_ref(), "parent_experiment_rip")?,
            ),
            _ => return Err(DrsError::UnknownProject { value: project_id }),
        };

        let variable = dataset.data_variable()?;
        let (from_timestamp, to_timestamp) = self.time_bounds(dataset.as_ref(), path)?;

        debug!(
            file = %path.display(),
            project = project.id(),
            variable = %variable,
            from = %from_timestamp,
            to = %to_timestamp,
            "Extracted metadata"
        );

        Ok(FileMetadata {
            project,
            variable,
            experiment,
            ensemble,
            from_timestamp,
            to_timestamp,
        })
    }

    fn time_bounds(&self, dataset: &dyn Dataset, path: &Path) -> DrsResult<(ModelDateTime, ModelDateTime)> {
        let mut axis = dataset.time_axis()?;
        if axis.values.iter().any(|v| !v.is_finite()) {
            return Err(DrsError::InvalidTimeAxis(
                "time values contain fill or non-finite entries".to_string(),
            ));
        }
        if axis.units.is_none() {
            warn!(
                file = %path.display(),
                units = %self.legacy_units,
                "Time variable has no units attribute, assuming legacy units"
            );
            axis.units = Some(self.legacy_units.clone());
        }

        let (from, to) = axis
            .endpoints()
            .map_err(|e| DrsError::InvalidTimeAxis(e.to_string()))?;
        if from > to {
            return Err(DrsError::InvalidTimeAxis(format!(
                "time axis runs backwards ({} > {})",
                from, to
            )));
        }
        Ok((from, to))
    }
}

fn optional(dataset: &dyn Dataset, name: &str) -> Option<String> {
    dataset
        .global_attribute(name)
        .map(|value| value.to_text().trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(dataset: &dyn Dataset, name: &str) -> DrsResult<String> {
    optional(dataset, name).ok_or_else(|| DrsError::incomplete(name))
}

/// Convert a resource identifier to a local path.
///
/// Accepts plain paths and `file://` URLs. Remote schemes are rejected.
pub fn resource_path(identifier: &str) -> DrsResult<PathBuf> {
    if let Some(path) = identifier.strip_prefix("file://") {
        // file://localhost/path is the same as file:///path
        let path = path.strip_prefix("localhost").unwrap_or(path);
        if path.is_empty() {
            return Err(DrsError::UnsupportedResource(identifier.to_string()));
        }
        return Ok(PathBuf::from(path));
    }
    if identifier.contains("://") || identifier.is_empty() {
        return Err(DrsError::UnsupportedResource(identifier.to_string()));
    }
    Ok(PathBuf::from(identifier))
}

/// Whether the data variable of `path` is `variable`.
///
/// Unreadable files count as not having it.
pub fn has_variable(opener: &dyn DatasetOpener, path: &Path, variable: &str) -> bool {
    match opener.open(path).and_then(|dataset| dataset.data_variable()) {
        Ok(name) => name == variable,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Cannot resolve data variable");
            false
        }
    }
}
