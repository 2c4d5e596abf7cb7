use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, instrument};

use crate::raw::{check_seed_locations, load_seed_locations};
use crate::{DataError, Result};

pub const VEHICLE_ID: &str = "vehicle_id";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";

const PROCESSED_DIR: &str = "processed";
const VEHICLE_LOCATIONS_PARQUET: &str = "vehicle_locations.parquet";
const VEHICLE_LOCATIONS_METADATA: &str = "vehicle_locations.json";

/// Provenance of a persisted dataset, written next to the Parquet file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Where the rows came from (seed file path or a free-form label)
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
}

/// The persisted vehicle position dataset.
///
/// One row per vehicle (`vehicle_id` is unique), sorted by latitude then
/// `vehicle_id`. The Parquet file is read into memory the first time
/// [`lazy_frame`](Self::lazy_frame) is called and reused afterwards.
#[derive(Clone)]
pub struct VehicleLocationData {
    path: PathBuf,
    metadata_path: PathBuf,
    frame: OnceCell<LazyFrame>,
}

impl std::fmt::Debug for VehicleLocationData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleLocationData")
            .field("path", &self.path)
            .field("loaded", &self.frame.get().is_some())
            .finish()
    }
}

impl VehicleLocationData {
    /// Directory holding the processed dataset inside `data_dir`.
    pub fn processed_dir(data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join(PROCESSED_DIR)
    }

    /// Build the dataset from a seed CSV, replacing any dataset already in `data_dir`.
    #[instrument(name = "Build dataset from seed", skip_all, level = "info")]
    pub fn from_seed(seed_path: impl AsRef<Path>, data_dir: impl AsRef<Path>) -> Result<Self> {
        let seed_path = seed_path.as_ref();
        let df = {
            let _span = info_span!("Parse seed").entered();
            load_seed_locations(seed_path)?.collect()?
        };
        check_seed_locations(&df)?;
        Self::from_frame(df.lazy(), data_dir, &seed_path.display().to_string())
    }

    /// Persist an arbitrary frame of vehicle positions.
    ///
    /// The frame must carry `vehicle_id`, `latitude` and `longitude`; other
    /// columns are dropped. Rows with a null id are dropped and duplicate ids keep
    /// their first occurrence.
    pub fn from_frame(lf: LazyFrame, data_dir: impl AsRef<Path>, source: &str) -> Result<Self> {
        let processed_dir = Self::processed_dir(data_dir);
        std::fs::create_dir_all(&processed_dir)?;
        let path = processed_dir.join(VEHICLE_LOCATIONS_PARQUET);
        let metadata_path = processed_dir.join(VEHICLE_LOCATIONS_METADATA);

        let sink_time = std::time::Instant::now();
        let df = lf
            .select([
                col(VEHICLE_ID).cast(DataType::Int64),
                col(LATITUDE).cast(DataType::Float64),
                col(LONGITUDE).cast(DataType::Float64),
            ])
            .drop_nulls(Some(vec![VEHICLE_ID.into()]))
            .collect()?;
        let mut df = df
            .unique_stable(
                Some(&[VEHICLE_ID.to_string()]),
                UniqueKeepStrategy::First,
                None,
            )?
            .lazy()
            .sort([LATITUDE, VEHICLE_ID], SortMultipleOptions::default())
            .collect()?;

        let mut file = std::fs::File::create(&path)?;
        ParquetWriter::new(&mut file).finish(&mut df)?;

        let metadata = DatasetMetadata {
            source: source.to_string(),
            generated_at: Utc::now(),
            rows: df.height(),
        };
        std::fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)?;

        info!(
            path = ?path,
            rows = metadata.rows,
            sink_time = ?sink_time.elapsed(),
            "Saved vehicle locations to parquet file"
        );

        Ok(Self::from_paths(path, metadata_path))
    }

    /// Open the dataset in `data_dir` if it has been built.
    pub fn load_existing(data_dir: impl AsRef<Path>) -> Result<Option<Self>> {
        let processed_dir = Self::processed_dir(data_dir);
        let path = processed_dir.join(VEHICLE_LOCATIONS_PARQUET);
        if !path.exists() {
            info!(path = ?path, "No persisted vehicle locations found");
            return Ok(None);
        }
        Ok(Some(Self::from_paths(
            path,
            processed_dir.join(VEHICLE_LOCATIONS_METADATA),
        )))
    }

    /// Open the dataset in `data_dir`, failing if it has not been built.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        Self::load_existing(data_dir)?.ok_or_else(|| {
            DataError::DatasetNotFound(Self::processed_dir(data_dir).join(VEHICLE_LOCATIONS_PARQUET))
        })
    }

    fn from_paths(path: PathBuf, metadata_path: PathBuf) -> Self {
        Self {
            path,
            metadata_path,
            frame: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The dataset as an in-memory lazy frame, loaded on first use.
    pub fn lazy_frame(&self) -> Result<&LazyFrame> {
        self.frame.get_or_try_init(|| Self::get_data(&self.path))
    }

    fn get_data(path: &Path) -> Result<LazyFrame> {
        if !path.exists() {
            return Err(DataError::DatasetNotFound(path.to_path_buf()));
        }
        info!(
            path = ?path.file_stem(),
            "Loading and collecting into memory for the first time..."
        );
        let t_load = std::time::Instant::now();
        let df = LazyFrame::scan_parquet(path, Default::default())?.collect()?;
        for column in [VEHICLE_ID, LATITUDE, LONGITUDE] {
            if df.column(column).is_err() {
                return Err(DataError::MissingColumn(column));
            }
        }
        info!(
            time_collected = ?t_load.elapsed(),
            rows = df.height(),
            "Collected into memory"
        );
        Ok(df.lazy())
    }

    /// Provenance recorded when the dataset was built.
    pub fn metadata(&self) -> Result<DatasetMetadata> {
        let raw = std::fs::read_to_string(&self.metadata_path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{TestDataConfig, create_test_data};
    use crate::tests_utils::*;

    #[test]
    fn test_from_seed_writes_sorted_parquet() {
        let seed = create_test_data(&TestDataConfig::minimal()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let data = VehicleLocationData::from_seed(seed.path(), dir.path()).unwrap();
        assert!(data.path().exists());
        assert_eq!(
            data.path().file_name().and_then(|n| n.to_str()),
            Some(VEHICLE_LOCATIONS_PARQUET)
        );

        let df = data.lazy_frame().unwrap().clone().collect().unwrap();
        assert_eq!(df.height(), 7);
        assert_column_type(&df, VEHICLE_ID, &DataType::Int64);

        let latitudes: Vec<f64> = df
            .column(LATITUDE)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert!(latitudes.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_metadata_round_trip() {
        let seed = create_test_data(&TestDataConfig::minimal()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let data = VehicleLocationData::from_seed(seed.path(), dir.path()).unwrap();
        let metadata = data.metadata().unwrap();
        assert_eq!(metadata.rows, 7);
        assert_eq!(metadata.source, seed.path().display().to_string());
    }

    #[test]
    fn test_from_frame_dedupes_vehicle_ids() {
        let dir = tempfile::tempdir().unwrap();
        let df = df!(
            VEHICLE_ID => [7i64, 7, 8],
            LATITUDE => [1.0f64, 2.0, 3.0],
            LONGITUDE => [103.0f64, 103.5, 104.0],
        )
        .unwrap();

        let data = VehicleLocationData::from_frame(df.lazy(), dir.path(), "inline").unwrap();
        let stored = data.lazy_frame().unwrap().clone().collect().unwrap();

        assert_eq!(i64_values(&stored, VEHICLE_ID), vec![7, 8]);
        let first_lat = stored.column(LATITUDE).unwrap().f64().unwrap().get(0);
        assert_eq!(first_lat, Some(1.0));
    }

    #[test]
    fn test_load_existing_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        assert!(VehicleLocationData::load_existing(dir.path()).unwrap().is_none());
        assert!(matches!(
            VehicleLocationData::open(dir.path()),
            Err(DataError::DatasetNotFound(_))
        ));
    }

    #[test]
    fn test_load_existing_after_build() {
        let seed = create_test_data(&TestDataConfig::minimal()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        VehicleLocationData::from_seed(seed.path(), dir.path()).unwrap();

        let reopened = VehicleLocationData::open(dir.path()).unwrap();
        let df = reopened.lazy_frame().unwrap().clone().collect().unwrap();
        assert_eq!(df.height(), 7);
    }

    #[test]
    fn test_malformed_seed_is_rejected() {
        use std::io::Write;
        let mut seed = tempfile::NamedTempFile::new().unwrap();
        writeln!(seed, "1.306002 103.927337").unwrap();
        writeln!(seed, "1.306254").unwrap();
        seed.flush().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let result = VehicleLocationData::from_seed(seed.path(), dir.path());
        assert!(matches!(result, Err(DataError::MalformedSeedLine { line: 2 })));
        assert!(VehicleLocationData::load_existing(dir.path()).unwrap().is_none());
    }
}
