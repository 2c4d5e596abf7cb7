use std::path::Path;

use polars::prelude::*;
use tracing::{info, instrument};

use crate::processed::{LATITUDE, LONGITUDE, VEHICLE_ID};
use crate::{DataError, Result};

const COORDINATES: &str = "coordinates";
const PARTS: &str = "_parts";

const SEED_SCHEMA: [(PlSmallStr, DataType); 1] =
    [(PlSmallStr::from_static(COORDINATES), DataType::String)];

/// Parse a seed CSV of vehicle positions.
///
/// Each record's first field holds `"<latitude> <longitude>"` separated by a single
/// space; any further fields are ignored. The zero-based record index becomes the
/// `vehicle_id`. The returned frame has `vehicle_id` (Int64), `latitude` and
/// `longitude` (Float64); unparsable coordinates come out as nulls, see
/// [`check_seed_locations`].
#[instrument(name = "Load seed locations", skip_all, level = "info")]
pub fn load_seed_locations(path: impl AsRef<Path>) -> Result<LazyFrame> {
    info!(path = ?path.as_ref(), "Reading seed file");
    Ok(LazyCsvReader::new(path)
        .with_has_header(false)
        .with_truncate_ragged_lines(true)
        .with_schema(Some(Schema::from_iter(SEED_SCHEMA).into()))
        .finish()?
        .with_row_index(VEHICLE_ID, None)
        .with_column(col(COORDINATES).str().split(lit(" ")).alias(PARTS))
        .with_columns(vec![
            col(VEHICLE_ID).cast(DataType::Int64),
            when(col(PARTS).list().len().eq(lit(2)))
                .then(col(PARTS).list().first().cast(DataType::Float64))
                .otherwise(lit(NULL).cast(DataType::Float64))
                .alias(LATITUDE),
            when(col(PARTS).list().len().eq(lit(2)))
                .then(col(PARTS).list().last().cast(DataType::Float64))
                .otherwise(lit(NULL).cast(DataType::Float64))
                .alias(LONGITUDE),
        ])
        .select([col(VEHICLE_ID), col(LATITUDE), col(LONGITUDE)]))
}

/// Fail on the first seed record whose coordinates are missing or out of range.
pub fn check_seed_locations(df: &DataFrame) -> Result<()> {
    let offending = df
        .clone()
        .lazy()
        .filter(
            col(LATITUDE)
                .is_null()
                .or(col(LONGITUDE).is_null())
                .or(col(LATITUDE).lt(lit(-90.0)))
                .or(col(LATITUDE).gt(lit(90.0)))
                .or(col(LONGITUDE).lt(lit(-180.0)))
                .or(col(LONGITUDE).gt(lit(180.0))),
        )
        .select([col(VEHICLE_ID)])
        .limit(1)
        .collect()?;

    if offending.height() == 0 {
        return Ok(());
    }
    match offending.column(VEHICLE_ID)?.i64()?.get(0) {
        Some(row) => Err(DataError::MalformedSeedLine {
            line: row as usize + 1,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{TestDataConfig, create_test_data};
    use crate::tests_utils::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn seed_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_seed_locations_actual_parsing() {
        let file = create_test_data(&TestDataConfig::minimal()).unwrap();
        let df = load_seed_locations(file.path()).unwrap().collect().unwrap();

        assert_eq!(df.height(), 7);
        assert_has_columns(&df, &[VEHICLE_ID, LATITUDE, LONGITUDE]);
        assert_column_type(&df, VEHICLE_ID, &DataType::Int64);
        assert_column_type(&df, LATITUDE, &DataType::Float64);
        assert_column_type(&df, LONGITUDE, &DataType::Float64);
        assert_no_nulls_in_column(&df, LATITUDE);
        assert_no_nulls_in_column(&df, LONGITUDE);

        assert_eq!(i64_values(&df, VEHICLE_ID), vec![0, 1, 2, 3, 4, 5, 6]);

        let lat = df.column(LATITUDE).unwrap().f64().unwrap().get(2).unwrap();
        let lng = df.column(LONGITUDE).unwrap().f64().unwrap().get(2).unwrap();
        assert!((lat - 1.306002).abs() < 1e-9);
        assert!((lng - 103.927337).abs() < 1e-9);

        check_seed_locations(&df).unwrap();
    }

    #[test]
    fn test_valid_seed_passes_check() {
        let file = create_test_data(&TestDataConfig::sample()).unwrap();
        let df = load_seed_locations(file.path()).unwrap().collect().unwrap();

        assert!(df.height() > 100);
        assert!(check_seed_locations(&df).is_ok());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let file = seed_file(&["1.306002 103.927337,scooter", "1.306254 103.927858,bike"]);
        let df = load_seed_locations(file.path()).unwrap().collect().unwrap();

        assert_eq!(df.height(), 2);
        check_seed_locations(&df).unwrap();
    }

    #[test]
    fn test_unparsable_line_is_reported() {
        let file = seed_file(&["1.306002 103.927337", "not-a-point", "1.306254 103.927858"]);
        let df = load_seed_locations(file.path()).unwrap().collect().unwrap();

        match check_seed_locations(&df) {
            Err(DataError::MalformedSeedLine { line }) => assert_eq!(line, 2),
            other => panic!("expected malformed seed line, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_line_is_reported() {
        let file = seed_file(&["1.306002 103.927337", "1.306254 103.927858", "95.0 10.0"]);
        let df = load_seed_locations(file.path()).unwrap().collect().unwrap();

        match check_seed_locations(&df) {
            Err(DataError::MalformedSeedLine { line }) => assert_eq!(line, 3),
            other => panic!("expected malformed seed line, got {other:?}"),
        }
    }

    #[test]
    fn test_three_part_line_is_malformed() {
        let file = seed_file(&["1.306002 103.927337 12"]);
        let df = load_seed_locations(file.path()).unwrap().collect().unwrap();

        assert!(check_seed_locations(&df).is_err());
    }
}
