//! Distance model and candidate pruning region.
//!
//! Distances are geodesics on the WGS84 ellipsoid (Karney's algorithm via the
//! `geo` crate). The same value decides whether a vehicle is within the radius
//! and is the distance reported back.

use std::f64::consts::FRAC_PI_2;

use geo::{Distance, Geodesic, Point};

use crate::model::GeoPoint;

/// Smallest radius of curvature on WGS84 (the meridional radius at the equator,
/// `a(1 - e²)` = 6 335 439.327 m), rounded down. A sphere of this radius never
/// overstates a geodesic length, so angles derived from it bound the angular
/// extent of a search radius.
const MIN_RADIUS_OF_CURVATURE_METERS: f64 = 6_335_439.0;

/// Geodesic distance in meters between two points.
pub fn geodesic_distance(from: GeoPoint, to: GeoPoint) -> f64 {
    Geodesic.distance(
        Point::new(from.longitude(), from.latitude()),
        Point::new(to.longitude(), to.latitude()),
    )
}

/// Longitude part of a [`BoundingBox`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LongitudeSpan {
    /// Every longitude qualifies (the box touches a pole or spans the globe).
    Any,
    /// `min <= longitude <= max`
    Between { min: f64, max: f64 },
    /// The box crosses the antimeridian: `longitude >= from || longitude <= to`.
    Wrapped { from: f64, to: f64 },
}

/// A latitude/longitude box containing every point within a radius of an origin.
///
/// Always at least as large as the disc it stands for; exact filtering happens
/// afterwards with [`geodesic_distance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    lat_min: f64,
    lat_max: f64,
    longitude: LongitudeSpan,
}

impl BoundingBox {
    /// Box around `origin` covering `radius_meters * padding`.
    pub fn around(origin: GeoPoint, radius_meters: u32, padding: f64) -> Self {
        let angular = f64::from(radius_meters) * padding.max(1.0) / MIN_RADIUS_OF_CURVATURE_METERS;
        if angular >= FRAC_PI_2 {
            return Self::everything();
        }

        let angular_degrees = angular.to_degrees();
        let lat_min = origin.latitude() - angular_degrees;
        let lat_max = origin.latitude() + angular_degrees;
        if lat_min <= -90.0 || lat_max >= 90.0 {
            return Self {
                lat_min: lat_min.max(-90.0),
                lat_max: lat_max.min(90.0),
                longitude: LongitudeSpan::Any,
            };
        }

        let delta = (angular.sin() / origin.latitude().to_radians().cos())
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees();
        let lon_min = origin.longitude() - delta;
        let lon_max = origin.longitude() + delta;
        let longitude = if delta >= 180.0 {
            LongitudeSpan::Any
        } else if lon_min <= -180.0 {
            LongitudeSpan::Wrapped {
                from: lon_min + 360.0,
                to: lon_max,
            }
        } else if lon_max >= 180.0 {
            LongitudeSpan::Wrapped {
                from: lon_min,
                to: lon_max - 360.0,
            }
        } else {
            LongitudeSpan::Between {
                min: lon_min,
                max: lon_max,
            }
        };

        Self {
            lat_min,
            lat_max,
            longitude,
        }
    }

    const fn everything() -> Self {
        Self {
            lat_min: -90.0,
            lat_max: 90.0,
            longitude: LongitudeSpan::Any,
        }
    }

    pub const fn lat_min(&self) -> f64 {
        self.lat_min
    }

    pub const fn lat_max(&self) -> f64 {
        self.lat_max
    }

    pub const fn longitude(&self) -> LongitudeSpan {
        self.longitude
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        let lat = point.latitude();
        let lon = point.longitude();
        if lat < self.lat_min || lat > self.lat_max {
            return false;
        }
        match self.longitude {
            LongitudeSpan::Any => true,
            LongitudeSpan::Between { min, max } => (min..=max).contains(&lon),
            LongitudeSpan::Wrapped { from, to } => lon >= from || lon <= to,
        }
    }
}
