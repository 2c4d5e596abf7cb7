use std::{fmt, path::PathBuf, str::FromStr};

use nearby_data_processing::{DATA_DIR_ENV, default_data_dir};
use tracing::level_filters::LevelFilter;

use crate::{error::NearbyError, store::DEFAULT_BBOX_PADDING};

/// Environment variable holding the default log level (`error`..`trace`, `off`).
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
/// Environment variable selecting `text` or `json` log output.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Output format of the log subscriber installed by [`init_logging_with_format`](crate::init_logging_with_format).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = NearbyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(NearbyError::ConfigError(format!(
                "Unknown log format '{other}', expected 'text' or 'json'"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

/// Settings for opening a [`VehicleFinder`](crate::VehicleFinder) and its logging.
#[derive(Debug, Clone, PartialEq)]
pub struct FinderConfig {
    /// Directory holding `processed/vehicle_locations.parquet`
    pub data_dir: PathBuf,
    /// Multiplier (>= 1) applied to the radius when pruning with a bounding box
    pub bbox_padding: f64,
    pub log_level: LevelFilter,
    pub log_format: LogFormat,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bbox_padding: DEFAULT_BBOX_PADDING,
            log_level: LevelFilter::INFO,
            log_format: LogFormat::Text,
        }
    }
}

impl FinderConfig {
    pub fn builder() -> FinderConfigBuilder {
        FinderConfigBuilder::new()
    }
}

/// Builder for [`FinderConfig`]
#[derive(Debug, Clone, Default)]
pub struct FinderConfigBuilder {
    config: FinderConfig,
}

impl FinderConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FinderConfig::default(),
        }
    }

    /// Start from the defaults, overridden by `NEARBY_DATA_DIR`, `LOG_LEVEL` and `LOG_FORMAT`.
    pub fn from_env() -> Result<Self, NearbyError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading variables through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NearbyError> {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut builder = Self::new();

        if let Some(data_dir) = lookup(DATA_DIR_ENV) {
            builder = builder.data_dir(data_dir);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            let level = level.trim().parse::<LevelFilter>().map_err(|e| {
                NearbyError::ConfigError(format!("Invalid {LOG_LEVEL_ENV} '{level}': {e}"))
            })?;
            builder = builder.log_level(level);
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            builder = builder.log_format(format.parse()?);
        }
        Ok(builder)
    }

    /// Directory the persisted dataset is read from and written to
    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = data_dir.into();
        self
    }

    /// Grow the pruning box beyond the search radius (must be finite and at least 1.0)
    pub fn bbox_padding(mut self, padding: f64) -> Result<Self, NearbyError> {
        if !padding.is_finite() || padding < 1.0 {
            return Err(NearbyError::ConfigError(format!(
                "Bounding box padding must be a finite value of at least 1.0, got {padding}"
            )));
        }
        self.config.bbox_padding = padding;
        Ok(self)
    }

    pub fn log_level(mut self, level: impl Into<LevelFilter>) -> Self {
        self.config.log_level = level.into();
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.log_format = format;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> FinderConfig {
        self.config
    }
}
