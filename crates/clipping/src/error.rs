//! Error types for clipping and packaging.

use std::path::PathBuf;

use thiserror::Error;

use crate::region::Region;

/// Failure reported by a [`RegionClipper`](crate::RegionClipper).
#[derive(Error, Debug)]
pub enum ClipperError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Clipper reported success but wrote no output at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the clipping pipeline.
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("Invalid region identifier '{0}'")]
    InvalidRegion(String),

    #[error("No regions selected")]
    NoRegions,

    /// One input could not be clipped; retrying it alone is safe
    #[error("Clipping {} to {} failed: {source}", .resource.display(), .regions.join("-"))]
    ClippingFailure {
        resource: PathBuf,
        regions: Vec<Region>,
        #[source]
        source: ClipperError,
    },

    #[error("Failed to package {}: {source}", .archive.display())]
    PackagingFailure {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for clipping operations.
pub type ClipResult<T> = std::result::Result<T, ClipError>;
