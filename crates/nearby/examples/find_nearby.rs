//! Seed a dataset and query it
//!
//! This example demonstrates the end to end flow:
//! - Building the persisted dataset from a seed CSV
//! - Running single and bulk finds
//! - Turning results into the response envelope

use nearby::{
    FindLocationsResponse, FinderConfig, RawSearchParams, VehicleFinder,
    data_processing::{TestDataConfig, create_test_data},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    nearby::init_logging(tracing::Level::WARN)?;

    // A seed CSV with a handful of vehicles in east Singapore
    let seed = create_test_data(&TestDataConfig::sample())?;
    let dir = tempfile::tempdir()?;
    let config = FinderConfig::builder().data_dir(dir.path()).build();
    let finder = VehicleFinder::seed(seed.path(), &config)?;

    println!("Two nearest vehicles within 1 km:");
    let params = RawSearchParams::new("1.305649", "103.926768", "1000", "2");
    for vehicle in finder.find(&params)? {
        println!("  {vehicle}");
    }

    println!("\nSeveral queries at once:");
    let queries = vec![
        RawSearchParams::new("1.305649", "103.926768", "3000", "100"),
        RawSearchParams::new("1.305649", "103.926768", "1", "20"),
        RawSearchParams::new("95", "103.926768", "1000", "2"),
    ];
    for (query, result) in queries.iter().zip(finder.find_bulk(&queries)) {
        let response = FindLocationsResponse::from(result);
        println!(
            "  radius={} -> status {}, {} vehicles, error: '{}'",
            query.radius.as_deref().unwrap_or("-"),
            response.http_status(),
            response.data.as_ref().map_or(0, Vec::len),
            response.error.message
        );
    }

    Ok(())
}
