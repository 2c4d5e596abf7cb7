//! CLI definition using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nearby::{LogFormat, RawSearchParams};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "nearby")]
#[command(version)]
#[command(about = "Find the vehicles closest to a point, nearest first")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the persisted dataset (defaults to NEARBY_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace, off). Defaults to LOG_LEVEL, else warn.
    #[arg(long, global = true)]
    pub log_level: Option<LevelFilter>,

    /// Log format (text, json). Defaults to LOG_FORMAT, else text.
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the persisted dataset from a seed CSV of "<lat> <lng>" lines
    Seed {
        /// Path to the seed CSV
        csv: PathBuf,
    },

    /// Find vehicles near a point and print the JSON response
    Find {
        #[command(flatten)]
        query: QueryArgs,

        /// Pretty-print the JSON response
        #[arg(long)]
        pretty: bool,
    },

    /// Show how many vehicles are stored and where they came from
    Stats,
}

/// Raw query parameters, passed through unvalidated.
#[derive(clap::Args)]
pub struct QueryArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub longitude: Option<String>,

    /// Search radius in meters
    #[arg(long, allow_hyphen_values = true)]
    pub radius: Option<String>,

    /// Maximum number of vehicles returned
    #[arg(long, allow_hyphen_values = true)]
    pub limit: Option<String>,
}

impl From<QueryArgs> for RawSearchParams {
    fn from(args: QueryArgs) -> Self {
        Self {
            latitude: args.latitude,
            longitude: args.longitude,
            radius: args.radius,
            limit: args.limit,
        }
    }
}
