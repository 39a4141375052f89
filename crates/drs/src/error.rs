//! Error types for metadata extraction and renaming.

use std::path::PathBuf;

use netcdf_parser::NetCdfError;
use thiserror::Error;

/// Errors that can occur while classifying or renaming a file.
#[derive(Error, Debug)]
pub enum DrsError {
    /// `project_id` is present but is neither CORDEX nor CMIP5
    #[error("Unknown project_id '{value}'")]
    UnknownProject { value: String },

    /// A required attribute is missing or empty
    #[error("Missing required metadata: {field}")]
    IncompleteMetadata { field: String },

    #[error("Invalid time axis: {0}")]
    InvalidTimeAxis(String),

    #[error("Failed to read dataset: {0}")]
    Dataset(#[from] NetCdfError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The canonical name is already taken by another file
    #[error("Cannot rename {} to {}: target exists", .from.display(), .to.display())]
    RenameConflict { from: PathBuf, to: PathBuf },

    #[error("Unsupported resource '{0}': only local paths and file:// URLs are accepted")]
    UnsupportedResource(String),
}

impl DrsError {
    pub(crate) fn incomplete(field: &str) -> Self {
        DrsError::IncompleteMetadata {
            field: field.to_string(),
        }
    }
}

/// Result type for DRS operations.
pub type DrsResult<T> = std::result::Result<T, DrsError>;
