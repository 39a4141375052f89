//! Configuration loader for the subsetter.
//!
//! Reads a YAML file with environment variable substitution using
//! `${VAR}` and `${VAR:-default}` syntax. Every key is optional:
//!
//! ```yaml
//! reader: ncdump            # ncdump | cdl | native
//! ncdump_path: ncdump
//! time:
//!   legacy_units: "days since 1949-12-01 00:00:00"
//! lineage:
//!   scenario_field: 3
//!   mappings: { rcp26: historical, rcp45: historical }
//! clipper:
//!   program: ${CLIP_PROGRAM}
//!   args: ["--regions", "{regions}", "{input}", "{output}"]
//! output_dir: ${OUTPUT_DIR:-output}
//! archive_name: subsets.tar
//! default_region: FRA
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use aggregation::LineageConfig;
use anyhow::{Context, Result};
use clipping::{CommandClipperConfig, Region};
use netcdf_parser::{TimeUnits, LEGACY_TIME_UNITS};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Configuration Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsetterConfig {
    pub reader: ReaderKind,
    pub ncdump_path: String,
    pub time: TimeConfig,
    pub lineage: LineageConfig,
    pub clipper: CommandClipperConfig,
    pub output_dir: PathBuf,
    pub archive_name: String,
    pub default_region: Region,
}

impl Default for SubsetterConfig {
    fn default() -> Self {
        Self {
            reader: ReaderKind::default(),
            ncdump_path: "ncdump".to_string(),
            time: TimeConfig::default(),
            lineage: LineageConfig::default(),
            clipper: CommandClipperConfig::default(),
            output_dir: PathBuf::from("output"),
            archive_name: "subsets.tar".to_string(),
            default_region: Region::default(),
        }
    }
}

/// How NetCDF metadata is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderKind {
    /// Run `ncdump` on each file
    #[default]
    Ncdump,
    /// Inputs are CDL text dumps
    Cdl,
    /// libnetcdf (requires the `native` feature)
    Native,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Units assumed when a time variable has no `units` attribute
    pub legacy_units: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            legacy_units: LEGACY_TIME_UNITS.to_string(),
        }
    }
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Load the configuration file, or the defaults if it does not exist.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SubsetterConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "No configuration file, using defaults");
        let config = SubsetterConfig::default();
        validate_config(&config)?;
        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;
    parse_config(&content).with_context(|| format!("Invalid config in {:?}", path))
}

/// Parse and validate configuration YAML.
pub fn parse_config(content: &str) -> Result<SubsetterConfig> {
    let expanded = expand_env_vars(content)?;

    // An empty document deserializes to null rather than an empty map
    let config: SubsetterConfig = if expanded.trim().is_empty() {
        SubsetterConfig::default()
    } else {
        serde_yaml::from_str(&expanded).context("Failed to parse config YAML")?
    };

    validate_config(&config)?;
    Ok(config)
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content.
/// Supports ${VAR} and ${VAR:-default} syntax.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve a variable expression (`VAR` or `VAR:-default`).
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_config(config: &SubsetterConfig) -> Result<()> {
    anyhow::ensure!(
        !config.ncdump_path.trim().is_empty(),
        "ncdump_path cannot be empty"
    );

    TimeUnits::parse(&config.time.legacy_units)
        .with_context(|| format!("Invalid time.legacy_units: {}", config.time.legacy_units))?;

    anyhow::ensure!(
        !config.lineage.mappings.is_empty(),
        "lineage.mappings must name at least one scenario"
    );
    for (scenario, baseline) in &config.lineage.mappings {
        anyhow::ensure!(
            !scenario.is_empty() && !baseline.is_empty() && !scenario.contains('_') && !baseline.contains('_'),
            "Invalid lineage mapping {} -> {}: identifiers must be single non-empty name fields",
            scenario,
            baseline
        );
    }

    anyhow::ensure!(
        !config.archive_name.is_empty() && !config.archive_name.contains(['/', '\\']),
        "archive_name must be a plain file name, got {:?}",
        config.archive_name
    );

    Ok(())
}

/// Checks that a clipper is configured. Only needed by `subset`.
pub fn validate_clipper(clipper: &CommandClipperConfig) -> Result<()> {
    anyhow::ensure!(
        !clipper.program.trim().is_empty(),
        "clipper.program must be set to run subsets"
    );
    for placeholder in ["{input}", "{output}"] {
        anyhow::ensure!(
            clipper.args.iter().any(|arg| arg.contains(placeholder)),
            "clipper.args must contain the {} placeholder",
            placeholder
        );
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
