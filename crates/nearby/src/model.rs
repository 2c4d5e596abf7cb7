//! Value types shared by the validator, the proximity stores and the finder.

use std::fmt;

use crate::validate::{Field, ValidationError};

/// A position on the WGS84 ellipsoid, in decimal degrees.
///
/// Latitude is always within `[-90, 90]` and longitude within `[-180, 180]`;
/// the only way to build one is the checked [`GeoPoint::new`].
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
    pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

    /// Create a point, rejecting out-of-range or NaN coordinates.
    ///
    /// ```rust
    /// use nearby::GeoPoint;
    ///
    /// let origin = GeoPoint::new(1.305649, 103.926768)?;
    /// assert_eq!(origin.latitude(), 1.305649);
    /// assert!(GeoPoint::new(95.0, 0.0).is_err());
    /// # Ok::<(), nearby::ValidationError>(())
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        check_range(Field::Latitude, latitude, Self::LATITUDE_RANGE)?;
        check_range(Field::Longitude, longitude, Self::LONGITUDE_RANGE)?;
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

pub(crate) fn check_range(
    field: Field,
    value: f64,
    (min, max): (f64, f64),
) -> Result<f64, ValidationError> {
    // NaN fails the containment check too.
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// A validated proximity query: everything within `radius_meters` of `origin`,
/// nearest first, at most `limit` results.
///
/// Only [`validate`](crate::validate()) produces these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRequest {
    origin: GeoPoint,
    radius_meters: u32,
    limit: u32,
}

impl SearchRequest {
    pub(crate) const fn new(origin: GeoPoint, radius_meters: u32, limit: u32) -> Self {
        Self {
            origin,
            radius_meters,
            limit,
        }
    }

    pub const fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub const fn radius_meters(&self) -> u32 {
        self.radius_meters
    }

    pub const fn limit(&self) -> u32 {
        self.limit
    }
}

/// A vehicle found by a query, with its distance from that query's origin.
///
/// Serializes as `{vehicle_id, latitude, longitude, distance}`.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleLocation {
    pub vehicle_id: i64,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub position: GeoPoint,
    /// Geodesic distance from the query origin, in meters
    #[cfg_attr(feature = "serde", serde(rename = "distance"))]
    pub distance_meters: f64,
}

impl VehicleLocation {
    pub const fn latitude(&self) -> f64 {
        self.position.latitude()
    }

    pub const fn longitude(&self) -> f64 {
        self.position.longitude()
    }
}

impl fmt::Display for VehicleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vehicle {} at {} ({:.1} m)",
            self.vehicle_id, self.position, self.distance_meters
        )
    }
}
