use std::collections::BTreeMap;

use nearby_data_processing::VehicleLocationData;
use tracing::{debug, instrument};

use super::{
    BoundingBox, DEFAULT_BBOX_PADDING, ProximityStore, Result, parquet::decode_points,
    rank_candidates,
};
use crate::model::{GeoPoint, SearchRequest, VehicleLocation};

/// A proximity store holding every position in memory.
///
/// Points are kept sorted by latitude, so a query only walks the latitude band
/// of its bounding box (found by binary search) and checks longitude on that
/// band.
///
/// ```rust
/// use nearby::{GeoPoint, InMemoryProximityStore, ProximityStore, RawSearchParams};
///
/// let store = InMemoryProximityStore::new([
///     (1, GeoPoint::new(1.306002, 103.927337)?),
///     (2, GeoPoint::new(1.352083, 103.819839)?),
/// ]);
/// let request = RawSearchParams::new("1.305649", "103.926768", "1000", "10").validate()?;
/// let found = store.find_within(&request)?;
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].vehicle_id, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryProximityStore {
    points: Vec<(i64, GeoPoint)>,
    bbox_padding: f64,
}

impl InMemoryProximityStore {
    /// Build a store from `(vehicle_id, position)` pairs. A repeated id keeps its last position.
    pub fn new(vehicles: impl IntoIterator<Item = (i64, GeoPoint)>) -> Self {
        let by_id: BTreeMap<i64, GeoPoint> = vehicles.into_iter().collect();
        let mut points: Vec<_> = by_id.into_iter().collect();
        points.sort_by(|(a_id, a), (b_id, b)| {
            a.latitude()
                .total_cmp(&b.latitude())
                .then(a_id.cmp(b_id))
        });
        Self {
            points,
            bbox_padding: DEFAULT_BBOX_PADDING,
        }
    }

    /// Copy a persisted dataset into memory.
    #[instrument(name = "Load in-memory store", skip_all, level = "info")]
    pub fn from_data(data: &VehicleLocationData) -> Result<Self> {
        let df = data.lazy_frame()?.clone().collect()?;
        let points = decode_points(&df)?;
        debug!(rows = points.len(), "Decoded stored vehicle locations");
        Ok(Self::new(points))
    }

    pub fn with_bbox_padding(mut self, bbox_padding: f64) -> Self {
        self.bbox_padding = bbox_padding;
        self
    }

    fn candidates(&self, bbox: BoundingBox) -> impl Iterator<Item = (i64, GeoPoint)> + '_ {
        let start = self
            .points
            .partition_point(|(_, p)| p.latitude() < bbox.lat_min());
        let end = self
            .points
            .partition_point(|(_, p)| p.latitude() <= bbox.lat_max());
        self.points[start..end.max(start)]
            .iter()
            .copied()
            .filter(move |(_, p)| bbox.contains(*p))
    }
}

impl ProximityStore for InMemoryProximityStore {
    fn find_within(&self, request: &SearchRequest) -> Result<Vec<VehicleLocation>> {
        let bbox = BoundingBox::around(
            request.origin(),
            request.radius_meters(),
            self.bbox_padding,
        );
        Ok(rank_candidates(request, self.candidates(bbox)))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.points.len())
    }
}
