//! Data Reference Syntax (DRS) handling for climate model output.
//!
//! Classifies NetCDF files from their global attributes and time
//! coordinate, derives CORDEX and CMIP5 identifiers, and renames files to
//! their canonical names.
//!
//! # Example
//!
//! ```ignore
//! use drs::{MetadataExtractor, NameOptions, derive_identifier};
//! use netcdf_parser::NcdumpOpener;
//!
//! let extractor = MetadataExtractor::new(NcdumpOpener::default());
//! let meta = extractor.extract(path)?;
//! let key = derive_identifier(&meta, NameOptions::KEY);
//! ```

pub mod error;
pub mod metadata;
pub mod naming;
pub mod rename;
pub mod report;

pub use error::{DrsError, DrsResult};
pub use metadata::{has_variable, resource_path, FileMetadata, MetadataExtractor, Project};
pub use naming::{derive_identifier, time_range, NameOptions, NETCDF_EXTENSION};
pub use rename::rename_to_canonical;
pub use report::{CollectingReporter, ReportEntry, Reporter, SkippedFile, TracingReporter};
