//! Grouping of climate model output files.
//!
//! - [`aggregate`] groups files by DRS aggregation key and orders each
//!   group along time
//! - [`group_by_filename`] groups by file name tokens, optionally merging
//!   scenario runs with their historical baseline
//! - [`resolve_grouping`] maps calendar keywords to calc groupings

pub mod aggregator;
pub mod grouping;
pub mod lineage;

pub use aggregator::{aggregate, Aggregation, AggregationSet};
pub use grouping::{resolve_grouping, CalcGrouping, DatePart, GroupingError, GROUPING_KEYWORDS};
pub use lineage::{base_name, group_by_filename, LineageConfig};
