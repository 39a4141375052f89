//! Clipping NetCDF files to region polygons.
//!
//! This crate owns the orchestration around an external clipper: which
//! inputs are clipped against which regions, how the results are named,
//! and how they are packaged. The polygon intersection itself sits behind
//! the [`RegionClipper`] trait; [`CommandClipper`] runs a configured
//! program for it.
//!
//! # Example
//!
//! ```ignore
//! use clipping::{ClippingPipeline, CommandClipper, CommandClipperConfig, Region};
//!
//! let clipper = CommandClipper::new(config);
//! let pipeline = ClippingPipeline::new(&clipper, "/data/out");
//! let report = pipeline.run(&inputs, &[Region::default()], false)?;
//! ```

pub mod clipper;
pub mod error;
pub mod package;
pub mod pipeline;
pub mod region;

pub use clipper::{ClipRequest, CommandClipper, CommandClipperConfig, RegionClipper};
pub use error::{ClipError, ClipResult, ClipperError};
pub use package::package_outputs;
pub use pipeline::{plan_jobs, ClipJob, ClipReport, ClippingPipeline};
pub use region::{Region, DEFAULT_REGION};
