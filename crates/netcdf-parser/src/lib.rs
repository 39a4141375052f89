//! NetCDF metadata primitives for climate model output.
//!
//! This crate reads just enough of a NetCDF file to classify it: global
//! attributes, the name of the data variable and the time coordinate.
//!
//! # Implementation Notes
//!
//! The default reader runs the `ncdump` command-line tool and parses its
//! CDL output ([`NcdumpOpener`]). Saved CDL dumps can be read directly
//! with [`CdlFileOpener`]. With the `native` feature (requires
//! libhdf5-dev and libnetcdf-dev), [`native::NativeOpener`] reads files
//! through the `netcdf` crate instead.
//!
//! # Time Coordinates
//!
//! Time values are offsets from the reference date in the variable's CF
//! `units` attribute, interpreted in its `calendar`. Files without a
//! `units` attribute fall back to [`LEGACY_TIME_UNITS`].

pub mod cdl;
pub mod dataset;
pub mod error;
pub mod ncdump;
pub mod time;

#[cfg(feature = "native")]
pub mod native;

pub use cdl::{AttrValue, CdlDocument, Dimension, VariableDecl};
pub use dataset::{resolve_data_variable, Dataset, DatasetOpener, VariableInfo};
pub use error::{NetCdfError, NetCdfResult};
pub use ncdump::{CdlFileOpener, NcdumpOpener};
pub use time::{Calendar, ModelDateTime, TimeAxis, TimeUnit, TimeUnits, LEGACY_TIME_UNITS};
