//! Dataset abstraction over the different ways of reading a NetCDF file.

use std::collections::BTreeSet;
use std::path::Path;

use crate::cdl::{AttrValue, CdlDocument};
use crate::error::{NetCdfError, NetCdfResult};
use crate::time::TimeAxis;

/// Read access to the metadata of one opened NetCDF file.
pub trait Dataset {
    /// Global attribute by name.
    fn global_attribute(&self, name: &str) -> Option<AttrValue>;

    /// Name of the data variable (see [`resolve_data_variable`]).
    fn data_variable(&self) -> NetCdfResult<String>;

    /// Values and CF attributes of the time coordinate.
    fn time_axis(&self) -> NetCdfResult<TimeAxis>;
}

/// Opens files as [`Dataset`]s.
pub trait DatasetOpener: Send + Sync {
    fn open(&self, path: &Path) -> NetCdfResult<Box<dyn Dataset>>;
}

/// Minimal variable description used for data-variable resolution.
#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub name: String,
    pub dimensions: Vec<String>,
    /// Value of the variable's `bounds` attribute, if any
    pub bounds: Option<String>,
}

/// Trailing dimension names used by cell-bounds variables.
const BOUNDS_DIMENSIONS: &[&str] = &["bnds", "bounds", "nv", "nb2", "axis_nbounds", "vertices"];

/// Pick the single data variable of a file.
///
/// A data variable spans the time dimension plus at least one other
/// dimension, is not a coordinate variable, and is not the bounds variable
/// of another variable.
pub fn resolve_data_variable(variables: &[VariableInfo], time_dimension: &str) -> NetCdfResult<String> {
    let bounds: BTreeSet<&str> = variables
        .iter()
        .filter_map(|v| v.bounds.as_deref())
        .collect();

    let candidates: Vec<&VariableInfo> = variables
        .iter()
        .filter(|v| v.dimensions.len() >= 2)
        .filter(|v| v.dimensions.iter().any(|d| d == time_dimension))
        .filter(|v| !v.dimensions.iter().any(|d| *d == v.name))
        .filter(|v| !bounds.contains(v.name.as_str()))
        .filter(|v| {
            v.dimensions
                .last()
                .map_or(true, |d| !BOUNDS_DIMENSIONS.contains(&d.as_str()))
        })
        .collect();

    match candidates.as_slice() {
        [] => Err(NetCdfError::MissingData(format!(
            "data variable over dimension '{}'",
            time_dimension
        ))),
        [only] => Ok(only.name.clone()),
        many => Err(NetCdfError::AmbiguousVariable(
            many.iter().map(|v| v.name.clone()).collect(),
        )),
    }
}

/// Locate the time coordinate: a variable named `time`, else one whose
/// `axis` is `T` or whose `standard_name` is `time`.
pub fn find_time_variable<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>, Option<&'a str>)>,
{
    let mut fallback = None;
    for (name, axis, standard_name) in candidates {
        if name == "time" {
            return Some(name);
        }
        if fallback.is_none() && (axis == Some("T") || standard_name == Some("time")) {
            fallback = Some(name);
        }
    }
    fallback
}

impl CdlDocument {
    pub(crate) fn time_axis_name(&self) -> Option<&str> {
        find_time_variable(self.variables.iter().map(|v| {
            (
                v.name.as_str(),
                v.attributes.get("axis").and_then(AttrValue::as_text),
                v.attributes.get("standard_name").and_then(AttrValue::as_text),
            )
        }))
    }

    fn variable_infos(&self) -> Vec<VariableInfo> {
        self.variables
            .iter()
            .map(|v| VariableInfo {
                name: v.name.clone(),
                dimensions: v.dimensions.clone(),
                bounds: v
                    .attributes
                    .get("bounds")
                    .and_then(AttrValue::as_text)
                    .map(str::to_string),
            })
            .collect()
    }
}

impl Dataset for CdlDocument {
    fn global_attribute(&self, name: &str) -> Option<AttrValue> {
        self.global_attributes.get(name).cloned()
    }

    fn data_variable(&self) -> NetCdfResult<String> {
        let time_dimension = self
            .time_axis_name()
            .and_then(|name| self.variable(name))
            .and_then(|v| v.dimensions.first().cloned())
            .unwrap_or_else(|| "time".to_string());
        resolve_data_variable(&self.variable_infos(), &time_dimension)
    }

    fn time_axis(&self) -> NetCdfResult<TimeAxis> {
        let name = self
            .time_axis_name()
            .ok_or_else(|| NetCdfError::MissingData("time variable".to_string()))?;
        let variable = self
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable {}", name)))?;
        let values = self
            .data
            .get(name)
            .cloned()
            .ok_or_else(|| NetCdfError::MissingData(format!("{} values", name)))?;

        let text_attr = |attr: &str| {
            variable
                .attributes
                .get(attr)
                .and_then(AttrValue::as_text)
                .map(str::to_string)
        };

        Ok(TimeAxis {
            values,
            units: text_attr("units"),
            calendar: text_attr("calendar"),
        })
    }
}
