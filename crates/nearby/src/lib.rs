//! Nearby - find the vehicles closest to a point
//!
//! Nearby answers one kind of question: which vehicles lie within a radius of a
//! point, nearest first, capped at a number of results. Distances are WGS84
//! geodesics, the same model used to decide what is in range and to report how
//! far away it is.
//!
//! # Quick Start
//!
//! ```rust
//! use nearby::{FinderConfig, RawSearchParams, VehicleFinder, data_processing};
//!
//! // Build the persisted dataset from a seed CSV ("<lat> <lng>" per line).
//! let seed = data_processing::create_test_data(&data_processing::TestDataConfig::minimal())?;
//! let dir = tempfile::tempdir()?;
//! let config = FinderConfig::builder().data_dir(dir.path()).build();
//! let finder = VehicleFinder::seed(seed.path(), &config)?;
//!
//! // Raw parameters as they arrive from a query string.
//! let params = RawSearchParams::new("1.305649", "103.926768", "1000", "2");
//! for vehicle in finder.find(&params)? {
//!     println!("{vehicle}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Pieces
//!
//! - [`validate()`] turns the four raw parameters into a [`SearchRequest`], or
//!   names the first bad one in a [`ValidationError`].
//! - A [`ProximityStore`] answers a [`SearchRequest`]. [`PolarsProximityStore`]
//!   reads the persisted Parquet dataset; [`InMemoryProximityStore`] keeps
//!   points in a latitude-sorted vector.
//! - [`VehicleFinder`] runs both and reports failures as a [`FindError`], a
//!   client fault (`"400"`) or a storage fault (`"500"`).
//! - [`FindLocationsResponse`] is the `{data, success, error}` envelope served
//!   to clients (serializable with the `serde` feature).
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
mod core;
pub mod error;
mod model;
mod response;
mod store;
mod validate;

pub use core::{FindResult, VehicleFinder};

pub use config::{FinderConfig, FinderConfigBuilder, LOG_FORMAT_ENV, LOG_LEVEL_ENV, LogFormat};
pub use error::{ErrorKind, FIND_LOCATIONS_OPERATION, FindError, NearbyError};
pub use model::{GeoPoint, SearchRequest, VehicleLocation};
pub use nearby_data_processing as data_processing;
pub use nearby_data_processing::VehicleLocationData;
pub use polars;
pub use response::{ErrorResponse, FindLocationsResponse};
pub use store::{
    BoundingBox, DEFAULT_BBOX_PADDING, InMemoryProximityStore, LongitudeSpan,
    PolarsProximityStore, ProximityStore, StoreError, geodesic_distance,
};
pub use validate::{Field, RawSearchParams, ValidationError, validate};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize human readable logging for the Nearby library.
///
/// `RUST_LOG` takes precedence over `level` when set. Only the first call in a
/// process installs a subscriber; later calls are no-ops.
///
/// ```rust
/// use nearby::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), nearby::NearbyError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), NearbyError> {
    init_logging_with_format(level, LogFormat::Text)
}

/// Initialize logging with an explicit output format.
pub fn init_logging_with_format(
    level: impl Into<LevelFilter>,
    format: LogFormat,
) -> Result<&'static (), NearbyError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("polars=warn".parse()?);

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE);
        let installed = match format {
            LogFormat::Text => subscriber.try_init(),
            LogFormat::Json => subscriber.json().try_init(),
        };
        installed.map_err(|e| anyhow::anyhow!("Failed to install the log subscriber: {e}"))?;
        Ok(())
    })
}
