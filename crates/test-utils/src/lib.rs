//! Shared test utilities for the climate-subset workspace.
//!
//! This crate provides common testing infrastructure including:
//! - CDL fixtures describing CORDEX and CMIP5 model output
//! - Time axis generators in model-time offsets
//! - Temporary directory and external program helpers
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then build fixtures in your tests:
//!
//! ```ignore
//! use test_utils::{DatasetFixture, days_since_legacy_epoch};
//!
//! let dir = test_utils::temp_test_dir();
//! let path = DatasetFixture::cordex("tas", "rcp85")
//!     .with_times(vec![days_since_legacy_epoch(2006, 1, 1)])
//!     .write(dir.path(), "a.nc");
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if an external program is not installed.
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_program;
///
/// #[test]
/// fn test_real_ncdump() {
///     let ncdump = require_program!("ncdump");
///     // Test code using the program path...
/// }
/// ```
///
/// If the program is not on `PATH`, the test prints a skip message and
/// returns early.
#[macro_export]
macro_rules! require_program {
    ($name:expr) => {{
        match $crate::find_program($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: Program '{}' not found on PATH.", $name);
                return;
            }
        }
    }};
}
