//! DRS identifiers and file names.
//!
//! ```text
//! CORDEX: variable_domain_drivingModel_experiment_ensemble_model_version_frequency
//! CMIP5:  variable_model_experiment_ensemble
//! ```
//!
//! Tokens are used verbatim from [`FileMetadata`].

use netcdf_parser::ModelDateTime;

use crate::metadata::{FileMetadata, Project};

/// Extension of NetCDF output files.
pub const NETCDF_EXTENSION: &str = ".nc";

/// Which optional parts to append to an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NameOptions {
    /// Append `_{fromYYYYMMDD}-{toYYYYMMDD}`
    pub include_timestamp: bool,
    /// Append `.nc`
    pub include_extension: bool,
}

impl NameOptions {
    /// Aggregation key: no time range, no extension.
    pub const KEY: NameOptions = NameOptions {
        include_timestamp: false,
        include_extension: false,
    };

    /// Canonical file name.
    pub const FILENAME: NameOptions = NameOptions {
        include_timestamp: true,
        include_extension: true,
    };
}

/// Build the DRS identifier of a file.
pub fn derive_identifier(metadata: &FileMetadata, options: NameOptions) -> String {
    let mut name = match &metadata.project {
        Project::Cordex {
            domain,
            driving_model,
            model,
            version,
            frequency,
        } => [
            metadata.variable.as_str(),
            domain.as_str(),
            driving_model.as_str(),
            metadata.experiment.as_str(),
            metadata.ensemble.as_str(),
            model.as_str(),
            version.as_str(),
            frequency.as_str(),
        ]
        .join("_"),
        Project::Cmip5 { model, .. } => [
            metadata.variable.as_str(),
            model.as_str(),
            metadata.experiment.as_str(),
            metadata.ensemble.as_str(),
        ]
        .join("_"),
    };

    if options.include_timestamp {
        name.push('_');
        name.push_str(&time_range(&metadata.from_timestamp, &metadata.to_timestamp));
    }
    if options.include_extension {
        name.push_str(NETCDF_EXTENSION);
    }
    name
}

/// `{fromYYYYMMDD}-{toYYYYMMDD}`
pub fn time_range(from: &ModelDateTime, to: &ModelDateTime) -> String {
    format!("{}-{}", from.compact_date(), to.compact_date())
}

impl FileMetadata {
    /// Identifier shared by every segment of the same time series.
    pub fn aggregation_key(&self) -> String {
        derive_identifier(self, NameOptions::KEY)
    }

    pub fn canonical_filename(&self) -> String {
        derive_identifier(self, NameOptions::FILENAME)
    }
}
