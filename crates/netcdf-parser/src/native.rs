//! Native NetCDF reading using the netcdf library.
//!
//! Faster than spawning `ncdump`, but links against libnetcdf/HDF5, so it
//! is only built with the `native` feature.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Once;

use tracing::debug;

use crate::cdl::AttrValue;
use crate::dataset::{find_time_variable, resolve_data_variable, Dataset, DatasetOpener, VariableInfo};
use crate::error::{NetCdfError, NetCdfResult};
use crate::time::TimeAxis;

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose diagnostics even when the Rust side
/// handles the error (for example when probing optional attributes).
/// Safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Opens files with libnetcdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOpener;

impl DatasetOpener for NativeOpener {
    fn open(&self, path: &Path) -> NetCdfResult<Box<dyn Dataset>> {
        silence_hdf5_errors();

        let file = netcdf::open(path)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

        let global_attributes = file
            .attributes()
            .filter_map(|attr| {
                let value = attr.value().ok().and_then(convert_attr)?;
                Some((attr.name().to_string(), value))
            })
            .collect();

        let mut variables = Vec::new();
        let mut time_candidates = Vec::new();
        for var in file.variables() {
            let name = var.name();
            time_candidates.push((
                name.clone(),
                get_text_attr(&var, "axis"),
                get_text_attr(&var, "standard_name"),
            ));
            variables.push(VariableInfo {
                dimensions: var.dimensions().iter().map(|d| d.name()).collect(),
                bounds: get_text_attr(&var, "bounds"),
                name,
            });
        }

        let time_name = find_time_variable(
            time_candidates
                .iter()
                .map(|(n, a, s)| (n.as_str(), a.as_deref(), s.as_deref())),
        )
        .map(str::to_string);

        let time = match time_name.as_deref().and_then(|n| file.variable(n)) {
            Some(var) => {
                let values: Vec<f64> = var
                    .get_values(..)
                    .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to read time: {}", e)))?;
                debug!(file = %path.display(), count = values.len(), "Read time coordinate");
                Some(TimeAxis {
                    values,
                    units: get_text_attr(&var, "units"),
                    calendar: get_text_attr(&var, "calendar"),
                })
            }
            None => None,
        };

        let time_dimension = time_name
            .as_deref()
            .and_then(|n| variables.iter().find(|v| v.name == n))
            .and_then(|v| v.dimensions.first().cloned())
            .unwrap_or_else(|| "time".to_string());

        Ok(Box::new(NativeDataset {
            global_attributes,
            variables,
            time_dimension,
            time,
        }))
    }
}

/// Metadata read eagerly from a file so the handle can be closed.
struct NativeDataset {
    global_attributes: BTreeMap<String, AttrValue>,
    variables: Vec<VariableInfo>,
    time_dimension: String,
    time: Option<TimeAxis>,
}

impl Dataset for NativeDataset {
    fn global_attribute(&self, name: &str) -> Option<AttrValue> {
        self.global_attributes.get(name).cloned()
    }

    fn data_variable(&self) -> NetCdfResult<String> {
        resolve_data_variable(&self.variables, &self.time_dimension)
    }

    fn time_axis(&self) -> NetCdfResult<TimeAxis> {
        self.time
            .clone()
            .ok_or_else(|| NetCdfError::MissingData("time variable".to_string()))
    }
}

fn convert_attr(value: netcdf::AttributeValue) -> Option<AttrValue> {
    match value {
        netcdf::AttributeValue::Str(s) => Some(AttrValue::Text(s)),
        netcdf::AttributeValue::Strs(parts) => Some(AttrValue::Text(parts.concat())),
        other => f64::try_from(other)
            .ok()
            .map(|v| AttrValue::Numbers(vec![v])),
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_text_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        netcdf::AttributeValue::Strs(parts) => Some(parts.concat()),
        _ => None,
    }
}
