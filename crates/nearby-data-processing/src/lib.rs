//! Data pipeline for the Nearby proximity finder.
//!
//! Turns a seed CSV of vehicle positions into the persisted Parquet dataset the
//! proximity store reads from, and resolves where that dataset lives on disk.
use std::path::PathBuf;

pub mod processed;
pub mod raw;
pub mod test_data;

mod error {
    use std::path::PathBuf;

    use polars::prelude::PolarsError;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum DataError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
        #[error("Polars error: {0}")]
        Polars(#[from] PolarsError),
        #[error("Serialization error: {0}")]
        Serde(#[from] serde_json::Error),
        #[error("malformed seed line {line}: expected \"<latitude> <longitude>\" within range")]
        MalformedSeedLine { line: usize },
        #[error("vehicle location dataset not found at {}", .0.display())]
        DatasetNotFound(PathBuf),
        #[error("missing required column '{0}'")]
        MissingColumn(&'static str),
    }

    pub type Result<T> = std::result::Result<T, DataError>;
}

pub use error::{DataError, Result};

pub use processed::{DatasetMetadata, LATITUDE, LONGITUDE, VEHICLE_ID, VehicleLocationData};
pub use raw::{check_seed_locations, load_seed_locations};
pub use test_data::{FIXTURE_NEAREST_IDS, FIXTURE_ORIGIN, TestDataConfig, create_test_data};

/// Environment variable consulted for the data directory.
pub const DATA_DIR_ENV: &str = "NEARBY_DATA_DIR";
pub const DATA_DIR_DEFAULT: &str = "./nearby_data";

/// Data directory used when none is configured explicitly.
///
/// With the `system-dirs` feature this is the platform data directory
/// (e.g. `~/.local/share/nearby`), otherwise [`DATA_DIR_DEFAULT`].
pub fn default_data_dir() -> PathBuf {
    #[cfg(feature = "system-dirs")]
    {
        if let Some(dirs) = directories::ProjectDirs::from("", "", "nearby") {
            return dirs.data_dir().to_path_buf();
        }
    }
    PathBuf::from(DATA_DIR_DEFAULT)
}
