//! Reporting of per-file failures in batch operations.
//!
//! Batch operations keep going when a single file fails. The failure is
//! handed to a [`Reporter`] passed in by the caller instead of a global
//! logger, so tests and the CLI can collect it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use tracing::warn;

use crate::error::DrsError;

/// Receives files that a batch operation had to leave untouched.
pub trait Reporter: Send + Sync {
    fn file_skipped(&self, path: &Path, reason: &DrsError);
}

/// Logs skipped files as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn file_skipped(&self, path: &Path, reason: &DrsError) {
        warn!(file = %path.display(), error = %reason, "Skipping file");
    }
}

/// A skipped file together with the error that caused it.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: DrsError,
}

/// A reported file with its rendered reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Keeps every report in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    entries: Mutex<Vec<ReportEntry>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ReportEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_empty()
    }
}

impl Reporter for CollectingReporter {
    fn file_skipped(&self, path: &Path, reason: &DrsError) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ReportEntry {
                path: path.to_path_buf(),
                reason: reason.to_string(),
            });
    }
}
