//! CDL fixtures describing climate model output files.
//!
//! Fixtures render the same text `ncdump` prints, so tests can write them
//! next to real file names and read them back with `CdlFileOpener`.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Reference units used by most CORDEX and CMIP5 output.
pub const LEGACY_UNITS: &str = "days since 1949-12-01 00:00:00";

/// A single-variable model output file.
#[derive(Debug, Clone)]
pub struct DatasetFixture {
    pub variable: String,
    pub global_attributes: Vec<(String, String)>,
    /// `None` leaves the time variable without a `units` attribute
    pub time_units: Option<String>,
    pub calendar: Option<String>,
    pub times: Vec<f64>,
    /// Extra variables sharing the time dimension
    pub extra_variables: Vec<String>,
}

impl DatasetFixture {
    fn base(variable: &str) -> Self {
        Self {
            variable: variable.to_string(),
            global_attributes: Vec::new(),
            time_units: Some(LEGACY_UNITS.to_string()),
            calendar: None,
            times: vec![crate::days_since_legacy_epoch(2006, 1, 1)],
            extra_variables: Vec::new(),
        }
    }

    /// A daily CORDEX EUR-11 file driven by MOHC-HadGEM2-ES and run with SMHI-RCA4.
    pub fn cordex(variable: &str, experiment: &str) -> Self {
        Self::base(variable)
            .with_attribute("project_id", "CORDEX")
            .with_attribute("CORDEX_domain", "EUR-11")
            .with_attribute("driving_model_id", "MOHC-HadGEM2-ES")
            .with_attribute("experiment_id", experiment)
            .with_attribute("driving_model_ensemble_member", "r1i1p1")
            .with_attribute("model_id", "SMHI-RCA4")
            .with_attribute("rcm_version_id", "v1")
            .with_attribute("frequency", "day")
    }

    /// A daily CMIP5 file.
    pub fn cmip5(variable: &str, model: &str, experiment: &str) -> Self {
        Self::base(variable)
            .with_attribute("project_id", "CMIP5")
            .with_attribute("model_id", model)
            .with_attribute("experiment_id", experiment)
            .with_attribute("parent_experiment_rip", "r1i1p1")
            .with_attribute("frequency", "day")
    }

    /// Set a global attribute, replacing any previous value.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.global_attributes.retain(|(n, _)| n != name);
        self.global_attributes
            .push((name.to_string(), value.to_string()));
        self
    }

    pub fn without_attribute(mut self, name: &str) -> Self {
        self.global_attributes.retain(|(n, _)| n != name);
        self
    }

    pub fn with_times(mut self, times: Vec<f64>) -> Self {
        self.times = times;
        self
    }

    pub fn with_time_units(mut self, units: Option<&str>) -> Self {
        self.time_units = units.map(str::to_string);
        self
    }

    pub fn with_calendar(mut self, calendar: &str) -> Self {
        self.calendar = Some(calendar.to_string());
        self
    }

    pub fn with_extra_variable(mut self, name: &str) -> Self {
        self.extra_variables.push(name.to_string());
        self
    }

    /// Render the fixture as `ncdump` output.
    pub fn to_cdl(&self, name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "netcdf {} {{", name);
        out.push_str("dimensions:\n");
        let _ = writeln!(out, "\ttime = UNLIMITED ; // ({} currently)", self.times.len());
        out.push_str("\tlat = 2 ;\n\tlon = 2 ;\n\tbnds = 2 ;\n");

        out.push_str("variables:\n");
        out.push_str("\tdouble time(time) ;\n");
        out.push_str("\t\ttime:standard_name = \"time\" ;\n");
        out.push_str("\t\ttime:bounds = \"time_bnds\" ;\n");
        if let Some(units) = &self.time_units {
            let _ = writeln!(out, "\t\ttime:units = \"{}\" ;", units);
        }
        if let Some(calendar) = &self.calendar {
            let _ = writeln!(out, "\t\ttime:calendar = \"{}\" ;", calendar);
        }
        out.push_str("\tdouble time_bnds(time, bnds) ;\n");
        out.push_str("\tdouble lat(lat) ;\n\tdouble lon(lon) ;\n");
        for variable in std::iter::once(&self.variable).chain(&self.extra_variables) {
            let _ = writeln!(out, "\tfloat {}(time, lat, lon) ;", variable);
            let _ = writeln!(out, "\t\t{}:_FillValue = 1.e+20f ;", variable);
        }

        out.push_str("\n// global attributes:\n");
        for (key, value) in &self.global_attributes {
            let _ = writeln!(out, "\t\t:{} = \"{}\" ;", key, value.replace('"', "\\\""));
        }

        out.push_str("data:\n\n");
        let values: Vec<String> = self.times.iter().map(|t| t.to_string()).collect();
        let _ = writeln!(out, " time = {} ;", values.join(", "));
        out.push_str("}\n");
        out
    }

    /// Write the fixture into `dir` under `file_name` and return the path.
    pub fn write(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        let stem = file_name.split('.').next().unwrap_or(file_name);
        fs::write(&path, self.to_cdl(stem)).expect("Failed to write CDL fixture");
        path
    }
}
