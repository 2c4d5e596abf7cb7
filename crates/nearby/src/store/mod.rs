//! Proximity stores: persisted vehicle positions queried by distance.
//!
//! Every store follows the same two-step shape. A cheap [`BoundingBox`] test
//! prunes the stored points to a candidate set, then [`rank_candidates`]
//! computes exact geodesic distances, drops anything beyond the radius, sorts
//! nearest first (ties by `vehicle_id`) and truncates to the limit.

use std::sync::Arc;

use itertools::Itertools;

pub use error::StoreError;
use error::Result;
pub use geodesy::{BoundingBox, LongitudeSpan, geodesic_distance};
pub use memory::InMemoryProximityStore;
pub use parquet::PolarsProximityStore;

use crate::model::{GeoPoint, SearchRequest, VehicleLocation};

mod geodesy;
mod memory;
mod parquet;

/// Bounding boxes cover exactly the requested radius unless configured otherwise.
pub const DEFAULT_BBOX_PADDING: f64 = 1.0;

/// A source of vehicle positions that can answer radius queries.
///
/// Implementations must return results that are within the radius, sorted by
/// ascending distance, unique by `vehicle_id` and at most `limit` long, or an
/// error and no results at all.
pub trait ProximityStore: Send + Sync {
    /// Vehicles within `request.radius_meters()` of `request.origin()`, nearest first.
    fn find_within(&self, request: &SearchRequest) -> Result<Vec<VehicleLocation>>;

    /// Number of vehicles held by the store.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<T: ProximityStore + ?Sized> ProximityStore for Arc<T> {
    fn find_within(&self, request: &SearchRequest) -> Result<Vec<VehicleLocation>> {
        (**self).find_within(request)
    }

    fn len(&self) -> Result<usize> {
        (**self).len()
    }
}

/// Turn pruned candidates into the final ordered result set.
pub(crate) fn rank_candidates(
    request: &SearchRequest,
    candidates: impl IntoIterator<Item = (i64, GeoPoint)>,
) -> Vec<VehicleLocation> {
    let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
    if limit == 0 {
        return Vec::new();
    }
    let origin = request.origin();
    let radius = f64::from(request.radius_meters());

    candidates
        .into_iter()
        .map(|(vehicle_id, position)| VehicleLocation {
            vehicle_id,
            position,
            distance_meters: geodesic_distance(origin, position),
        })
        .filter(|location| location.distance_meters <= radius)
        .sorted_by(|a, b| {
            a.distance_meters
                .total_cmp(&b.distance_meters)
                .then(a.vehicle_id.cmp(&b.vehicle_id))
        })
        .unique_by(|location| location.vehicle_id)
        .take(limit)
        .collect()
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum StoreError {
        #[error("DataFrame error: {0}")]
        DataFrame(#[from] polars::prelude::PolarsError),
        #[error("Data processing error: {0}")]
        Data(#[from] nearby_data_processing::DataError),
        #[error("Malformed stored row {row}: {reason}")]
        MalformedRow { row: usize, reason: String },
        #[error(transparent)]
        Other(#[from] anyhow::Error),
    }
    pub type Result<T> = std::result::Result<T, StoreError>;
}
