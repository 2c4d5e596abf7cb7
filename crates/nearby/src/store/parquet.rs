use itertools::izip;
use nearby_data_processing::{LATITUDE, LONGITUDE, VEHICLE_ID, VehicleLocationData};
use polars::prelude::*;
use tracing::{debug, instrument};

use super::{
    BoundingBox, DEFAULT_BBOX_PADDING, LongitudeSpan, ProximityStore, Result, StoreError,
    rank_candidates,
};
use crate::model::{GeoPoint, SearchRequest, VehicleLocation};

const ROW_INDEX: &str = "_row";

/// A proximity store backed by the persisted Parquet dataset.
///
/// The dataset is read into memory on the first query; each query then
/// filters that frame with its bounding box before ranking the survivors.
#[derive(Debug, Clone)]
pub struct PolarsProximityStore {
    data: VehicleLocationData,
    bbox_padding: f64,
}

impl PolarsProximityStore {
    pub fn new(data: VehicleLocationData) -> Self {
        Self {
            data,
            bbox_padding: DEFAULT_BBOX_PADDING,
        }
    }

    pub fn with_bbox_padding(mut self, bbox_padding: f64) -> Self {
        self.bbox_padding = bbox_padding;
        self
    }

    pub fn data(&self) -> &VehicleLocationData {
        &self.data
    }

    #[instrument(name = "Query candidates", level = "debug", skip_all)]
    fn candidates(&self, bbox: &BoundingBox) -> Result<Vec<(i64, GeoPoint)>> {
        let df = self
            .data
            .lazy_frame()?
            .clone()
            .with_row_index(ROW_INDEX, None)
            .filter(bbox_predicate(bbox).or(malformed_predicate()))
            .select([col(ROW_INDEX), col(VEHICLE_ID), col(LATITUDE), col(LONGITUDE)])
            .collect()?;
        debug!(candidates = df.height(), "Pruned with bounding box");
        decode_points(&df)
    }
}

impl ProximityStore for PolarsProximityStore {
    fn find_within(&self, request: &SearchRequest) -> Result<Vec<VehicleLocation>> {
        let bbox = BoundingBox::around(
            request.origin(),
            request.radius_meters(),
            self.bbox_padding,
        );
        let candidates = self.candidates(&bbox)?;
        Ok(rank_candidates(request, candidates))
    }

    fn len(&self) -> Result<usize> {
        let df = self
            .data
            .lazy_frame()?
            .clone()
            .select([col(VEHICLE_ID)])
            .collect()?;
        Ok(df.height())
    }
}

/// Rows inside the box.
pub(crate) fn bbox_predicate(bbox: &BoundingBox) -> Expr {
    let latitude = col(LATITUDE)
        .gt_eq(lit(bbox.lat_min()))
        .and(col(LATITUDE).lt_eq(lit(bbox.lat_max())));
    match bbox.longitude() {
        LongitudeSpan::Any => latitude,
        LongitudeSpan::Between { min, max } => latitude.and(
            col(LONGITUDE)
                .gt_eq(lit(min))
                .and(col(LONGITUDE).lt_eq(lit(max))),
        ),
        LongitudeSpan::Wrapped { from, to } => latitude.and(
            col(LONGITUDE)
                .gt_eq(lit(from))
                .or(col(LONGITUDE).lt_eq(lit(to))),
        ),
    }
}

// Kept by every query so bad stored data fails loudly instead of being pruned.
// NaN sorts above every number in Polars comparisons, so it fails the upper bound.
fn malformed_predicate() -> Expr {
    let (lat_min, lat_max) = GeoPoint::LATITUDE_RANGE;
    let (lon_min, lon_max) = GeoPoint::LONGITUDE_RANGE;
    col(VEHICLE_ID)
        .is_null()
        .or(col(LATITUDE).is_null())
        .or(col(LONGITUDE).is_null())
        .or(col(LATITUDE).lt(lit(lat_min)))
        .or(col(LATITUDE).gt(lit(lat_max)))
        .or(col(LONGITUDE).lt(lit(lon_min)))
        .or(col(LONGITUDE).gt(lit(lon_max)))
}

/// Read `(vehicle_id, position)` pairs out of a frame of stored rows.
///
/// Row numbers in errors come from the `_row` column when present, otherwise
/// from the position in `df`.
pub(crate) fn decode_points(df: &DataFrame) -> Result<Vec<(i64, GeoPoint)>> {
    let rows: Vec<usize> = match df.column(ROW_INDEX) {
        Ok(column) => column
            .cast(&DataType::UInt64)?
            .u64()?
            .into_no_null_iter()
            .map(|row| row as usize)
            .collect(),
        Err(_) => (0..df.height()).collect(),
    };
    let ids = df.column(VEHICLE_ID)?.cast(&DataType::Int64)?;
    let latitudes = df.column(LATITUDE)?.cast(&DataType::Float64)?;
    let longitudes = df.column(LONGITUDE)?.cast(&DataType::Float64)?;

    izip!(rows, ids.i64()?, latitudes.f64()?, longitudes.f64()?)
        .map(|(row, id, latitude, longitude)| match (id, latitude, longitude) {
            (Some(id), Some(latitude), Some(longitude)) => GeoPoint::new(latitude, longitude)
                .map(|position| (id, position))
                .map_err(|e| StoreError::MalformedRow {
                    row,
                    reason: e.to_string(),
                }),
            _ => Err(StoreError::MalformedRow {
                row,
                reason: "null vehicle_id or coordinate".to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use nearby_data_processing::{FIXTURE_NEAREST_IDS, TestDataConfig, create_test_data};

    use super::*;
    use crate::store::geodesic_distance;
    use crate::validate::RawSearchParams;

    fn seeded(config: &TestDataConfig) -> (tempfile::TempDir, PolarsProximityStore) {
        let seed = create_test_data(config).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let data = VehicleLocationData::from_seed(seed.path(), dir.path()).unwrap();
        (dir, PolarsProximityStore::new(data))
    }

    fn request(radius: &str, limit: &str) -> SearchRequest {
        RawSearchParams::new("1.305649", "103.926768", radius, limit)
            .validate()
            .unwrap()
    }

    fn ids(locations: &[VehicleLocation]) -> Vec<i64> {
        locations.iter().map(|l| l.vehicle_id).collect()
    }

    #[test]
    fn test_singapore_scenario() {
        let (_dir, store) = seeded(&TestDataConfig::sample());
        assert_eq!(ids(&store.find_within(&request("1000", "2")).unwrap()), vec![2, 3]);
        assert!(store.find_within(&request("1", "20")).unwrap().is_empty());
        assert_eq!(
            ids(&store.find_within(&request("3000", "100")).unwrap()),
            FIXTURE_NEAREST_IDS.to_vec()
        );
    }

    #[test]
    fn test_len() {
        let (_dir, store) = seeded(&TestDataConfig::sample());
        assert_eq!(store.len().unwrap(), 107);
        assert!(!store.is_empty().unwrap());
    }

    #[test]
    fn test_reported_distance_matches_geodesic() {
        let (_dir, store) = seeded(&TestDataConfig::minimal());
        let request = request("3000", "100");
        for location in store.find_within(&request).unwrap() {
            let expected = geodesic_distance(request.origin(), location.position);
            assert_eq!(location.distance_meters, expected);
            assert!(location.distance_meters <= 3000.0);
        }
    }

    #[test]
    fn test_bbox_predicate_matches_contains() {
        let (_dir, store) = seeded(&TestDataConfig::sample());
        let origin = GeoPoint::new(1.305649, 103.926768).unwrap();
        let bbox = BoundingBox::around(origin, 3_000, 1.0);

        let df = store
            .data()
            .lazy_frame()
            .unwrap()
            .clone()
            .filter(bbox_predicate(&bbox))
            .collect()
            .unwrap();
        let mut filtered: Vec<i64> = decode_points(&df)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        filtered.sort_unstable();

        let all = store.data().lazy_frame().unwrap().clone().collect().unwrap();
        let mut contained: Vec<i64> = decode_points(&all)
            .unwrap()
            .into_iter()
            .filter(|(_, p)| bbox.contains(*p))
            .map(|(id, _)| id)
            .collect();
        contained.sort_unstable();

        assert_eq!(filtered, contained);
        assert_eq!(filtered, FIXTURE_NEAREST_IDS.to_vec());
    }

    #[test]
    fn test_out_of_range_row_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let df = df!(
            VEHICLE_ID => [1i64, 2],
            LATITUDE => [1.306002f64, 95.0],
            LONGITUDE => [103.927337f64, 0.0],
        )
        .unwrap();
        let data = VehicleLocationData::from_frame(df.lazy(), dir.path(), "inline").unwrap();
        let store = PolarsProximityStore::new(data);

        let err = store.find_within(&request("1000", "5")).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow { row: 1, .. }), "{err}");
    }

    #[test]
    fn test_null_coordinate_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let df = df!(
            VEHICLE_ID => [1i64, 2],
            LATITUDE => [Some(1.306002f64), None],
            LONGITUDE => [Some(103.927337f64), Some(103.9)],
        )
        .unwrap();
        let data = VehicleLocationData::from_frame(df.lazy(), dir.path(), "inline").unwrap();
        let store = PolarsProximityStore::new(data);

        let err = store.find_within(&request("1000", "5")).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow { .. }), "{err}");
    }

    #[test]
    fn test_missing_dataset_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let df = df!(
            VEHICLE_ID => [1i64],
            LATITUDE => [1.306002f64],
            LONGITUDE => [103.927337f64],
        )
        .unwrap();
        let data = VehicleLocationData::from_frame(df.lazy(), dir.path(), "inline").unwrap();
        std::fs::remove_file(data.path()).unwrap();

        let store = PolarsProximityStore::new(data);
        assert!(matches!(
            store.find_within(&request("1000", "5")),
            Err(StoreError::Data(_))
        ));
    }
}
