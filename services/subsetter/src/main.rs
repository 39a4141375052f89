//! Climate model output subsetter.
//!
//! Groups CORDEX and CMIP5 NetCDF files into time series, renames them to
//! their DRS names, and clips them to country regions through an external
//! clipper.

mod commands;
mod config;
mod inputs;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use commands::SubsetOptions;

#[derive(Parser, Debug)]
#[command(name = "subsetter")]
#[command(about = "Aggregate, rename and clip climate model NetCDF files")]
struct Args {
    /// Configuration file path (defaults are used if it does not exist)
    #[arg(short, long, env = "SUBSETTER_CONFIG", default_value = "subsetter.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Group files into time-ordered aggregations by DRS identifier
    Aggregate {
        /// Files, directories or file:// URLs
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Only use files whose data variable has this name
        #[arg(long)]
        variable: Option<String>,
    },

    /// Group files by the fields of their names
    Group {
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Merge historical runs into the scenario groups that continue them
        #[arg(long)]
        merge_historical: bool,
    },

    /// Rename files in place to their canonical DRS names
    Rename {
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Clip files to regions
    Subset {
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Comma separated region identifiers (default: configured default region)
        #[arg(short, long)]
        region: Option<String>,

        /// Merge all regions of one input into a single output
        #[arg(long)]
        mosaic: bool,

        /// Output directory (default: configured output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Only use files whose data variable has this name
        #[arg(long)]
        variable: Option<String>,

        /// Package the outputs into a tar archive
        #[arg(long)]
        package: bool,
    },

    /// Show the calculation grouping for a calendar keyword
    Grouping {
        /// yr, sem, ONDJFM, AMJJAS, DJF, MAM, JJA, SON, mon, year or month
        keyword: Option<String>,
    },
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries command results
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_format)?;

    let config = config::load_config(&args.config)?;
    debug!(config = ?config, "Loaded configuration");

    match args.command {
        Command::Aggregate { inputs, variable } => {
            info!(inputs = inputs.len(), "Aggregating");
            commands::run_aggregate(&config, &inputs, variable.as_deref())
        }
        Command::Group {
            inputs,
            merge_historical,
        } => commands::run_group(&config, &inputs, merge_historical),
        Command::Rename { inputs } => {
            info!(inputs = inputs.len(), "Renaming");
            commands::run_rename(&config, &inputs)
        }
        Command::Subset {
            inputs,
            region,
            mosaic,
            output_dir,
            variable,
            package,
        } => {
            info!(inputs = inputs.len(), mosaic, "Subsetting");
            commands::run_subset(
                &config,
                SubsetOptions {
                    inputs: &inputs,
                    variable: variable.as_deref(),
                    regions: region.as_deref(),
                    mosaic,
                    output_dir,
                    package,
                },
            )
        }
        Command::Grouping { keyword } => commands::run_grouping(keyword.as_deref()),
    }
}
