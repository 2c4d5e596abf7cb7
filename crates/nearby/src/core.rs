//! The finder: validation followed by a proximity store query.
//!
//! [`VehicleFinder`] is the entry point for answering "which vehicles are
//! within R meters of this point, nearest first, at most N of them". It
//! validates the raw parameters, queries its [`ProximityStore`] and turns
//! failures into a [`FindError`] that says whose fault they were.
//!
//! ```rust
//! use nearby::{GeoPoint, InMemoryProximityStore, RawSearchParams, VehicleFinder};
//!
//! let store = InMemoryProximityStore::new([
//!     (2, GeoPoint::new(1.306002, 103.927337)?),
//!     (6, GeoPoint::new(1.311528, 103.947878)?),
//! ]);
//! let finder = VehicleFinder::new(store);
//!
//! let params = RawSearchParams::new("1.305649", "103.926768", "1000", "10");
//! let found = finder.find(&params)?;
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].vehicle_id, 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

use nearby_data_processing::VehicleLocationData;
use rayon::prelude::*;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::FinderConfig,
    error::{FindError, NearbyError},
    model::{SearchRequest, VehicleLocation},
    store::{PolarsProximityStore, ProximityStore},
    validate::{RawSearchParams, validate},
};

pub type FindResult = Result<Vec<VehicleLocation>, FindError>;

/// Answers proximity queries against a [`ProximityStore`].
///
/// Holds no per-query state, so one finder can serve any number of threads.
#[derive(Debug, Clone)]
pub struct VehicleFinder<S = PolarsProximityStore> {
    store: S,
}

impl VehicleFinder<PolarsProximityStore> {
    /// Open the dataset already persisted under `config.data_dir`.
    ///
    /// Fails with [`DataError::DatasetNotFound`](nearby_data_processing::DataError::DatasetNotFound)
    /// if nothing has been seeded there yet.
    #[instrument(name = "Open VehicleFinder", level = "info", skip_all, fields(data_dir = ?config.data_dir))]
    pub fn open(config: &FinderConfig) -> Result<Self, NearbyError> {
        let data = VehicleLocationData::open(&config.data_dir)?;
        info!(path = ?data.path(), "Opened persisted vehicle locations");
        Ok(Self::from_data(data, config))
    }

    /// Build the dataset under `config.data_dir` from a seed CSV, then open it.
    #[instrument(name = "Seed VehicleFinder", level = "info", skip_all, fields(seed = ?seed_path.as_ref()))]
    pub fn seed(seed_path: impl AsRef<Path>, config: &FinderConfig) -> Result<Self, NearbyError> {
        let t_seed = std::time::Instant::now();
        let data = VehicleLocationData::from_seed(seed_path, &config.data_dir)?;
        info!(elapsed = ?t_seed.elapsed(), "Seeded vehicle locations");
        Ok(Self::from_data(data, config))
    }

    fn from_data(data: VehicleLocationData, config: &FinderConfig) -> Self {
        Self::new(PolarsProximityStore::new(data).with_bbox_padding(config.bbox_padding))
    }
}

impl<S: ProximityStore> VehicleFinder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate `params` and return the vehicles they select, nearest first.
    ///
    /// Validation failures come back unchanged as [`FindError::Validation`];
    /// store failures are wrapped in [`FindError::Store`].
    #[instrument(name = "Find vehicles", level = "debug", skip_all)]
    pub fn find(&self, params: &RawSearchParams) -> FindResult {
        let request = validate(params).map_err(|e| {
            warn!(field = %e.field(), error = %e, "Rejected search parameters");
            FindError::from(e)
        })?;
        self.find_request(&request)
    }

    /// Query the store with an already validated request.
    #[instrument(name = "Find vehicles for request", level = "debug", skip_all)]
    pub fn find_request(&self, request: &SearchRequest) -> FindResult {
        debug!(
            origin = %request.origin(),
            radius_meters = request.radius_meters(),
            limit = request.limit(),
            "Searching for nearby vehicles"
        );
        let found = self.store.find_within(request).map_err(|e| {
            error!(
                origin = %request.origin(),
                radius_meters = request.radius_meters(),
                limit = request.limit(),
                error = %e,
                "Proximity store query failed"
            );
            FindError::store(e)
        })?;
        debug!(found = found.len(), "Search complete");
        Ok(found)
    }

    /// Run independent finds in parallel, one result per input, in input order.
    #[instrument(name = "Find vehicles in bulk", level = "info", skip_all, fields(queries = all_params.len()))]
    pub fn find_bulk(&self, all_params: &[RawSearchParams]) -> Vec<FindResult> {
        let t_bulk = std::time::Instant::now();
        let results = all_params
            .par_iter()
            .map(|params| self.find(params))
            .collect::<Vec<_>>();
        info!(
            elapsed = ?t_bulk.elapsed(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "Bulk find complete"
        );
        results
    }
}
