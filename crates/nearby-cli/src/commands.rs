//! Command handlers

use std::path::Path;

use anyhow::{Context, Result};
use nearby::{
    FindLocationsResponse, FinderConfig, FinderConfigBuilder, LOG_LEVEL_ENV, ProximityStore,
    RawSearchParams, VehicleFinder, init_logging_with_format,
};
use tracing::{info, level_filters::LevelFilter};

use crate::cli::{Cli, Commands};

/// Run the selected command. `Ok(false)` means the command ran but failed
/// (a find that returned an error envelope).
pub fn execute(cli: Cli) -> Result<bool> {
    let config = resolve_config(&cli)?;
    init_logging_with_format(config.log_level, config.log_format)?;

    match cli.command {
        Commands::Seed { csv } => seed(&csv, &config),
        Commands::Find { query, pretty } => find(query.into(), pretty, &config),
        Commands::Stats => stats(&config),
    }
}

fn resolve_config(cli: &Cli) -> Result<FinderConfig> {
    let mut builder = FinderConfigBuilder::from_env()?;
    // Keep stdout clean for JSON unless asked otherwise.
    if std::env::var_os(LOG_LEVEL_ENV).is_none() {
        builder = builder.log_level(LevelFilter::WARN);
    }
    if let Some(data_dir) = &cli.data_dir {
        builder = builder.data_dir(data_dir);
    }
    if let Some(level) = cli.log_level {
        builder = builder.log_level(level);
    }
    if let Some(format) = cli.log_format {
        builder = builder.log_format(format);
    }
    Ok(builder.build())
}

fn seed(csv: &Path, config: &FinderConfig) -> Result<bool> {
    let finder = VehicleFinder::seed(csv, config)
        .with_context(|| format!("Failed to seed from {}", csv.display()))?;
    let rows = finder.store().len()?;
    info!(rows, "Seed complete");
    println!(
        "Stored {rows} vehicles in {}",
        finder.store().data().path().display()
    );
    Ok(true)
}

fn find(params: RawSearchParams, pretty: bool, config: &FinderConfig) -> Result<bool> {
    let finder = VehicleFinder::open(config).context("No dataset found, run `nearby seed` first")?;
    let response = FindLocationsResponse::from(finder.find(&params));
    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");
    Ok(response.success)
}

fn stats(config: &FinderConfig) -> Result<bool> {
    let finder = VehicleFinder::open(config).context("No dataset found, run `nearby seed` first")?;
    let data = finder.store().data();
    println!("dataset:  {}", data.path().display());
    println!("vehicles: {}", finder.store().len()?);
    match data.metadata() {
        Ok(metadata) => {
            println!("source:   {}", metadata.source);
            println!("built at: {}", metadata.generated_at.to_rfc3339());
        }
        Err(e) => println!("metadata: unavailable ({e})"),
    }
    Ok(true)
}
