//! Parsing and bounds-checking of raw query parameters.
//!
//! The four parameters are checked in a fixed order (latitude, longitude,
//! radius, limit) and the first failure is returned, so every
//! [`ValidationError`] names exactly one field.

use std::fmt;

use thiserror::Error;

use crate::model::{GeoPoint, SearchRequest, check_range};

/// One of the four query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Latitude,
    Longitude,
    Radius,
    Limit,
}

impl Field {
    pub const ALL: [Self; 4] = [Self::Latitude, Self::Longitude, Self::Radius, Self::Limit];

    /// Parameter name as it appears on the query surface.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::Radius => "radius",
            Self::Limit => "limit",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is a required param")]
    Missing { field: Field },
    #[error("failed to parse the {field} value: {raw}")]
    Unparsable { field: Field, raw: String },
    #[error("invalid {field}: {value}; {field} must be between {min} and {max}")]
    OutOfRange {
        field: Field,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("invalid {field}: {value}; {field} must be a non-negative integer")]
    Negative { field: Field, value: i32 },
}

impl ValidationError {
    /// The parameter that failed.
    pub const fn field(&self) -> Field {
        match self {
            Self::Missing { field }
            | Self::Unparsable { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::Negative { field, .. } => *field,
        }
    }
}

/// The four query parameters exactly as received, each possibly absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSearchParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub radius: Option<String>,
    pub limit: Option<String>,
}

impl RawSearchParams {
    /// All four parameters present.
    pub fn new(
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        radius: impl Into<String>,
        limit: impl Into<String>,
    ) -> Self {
        Self {
            latitude: Some(latitude.into()),
            longitude: Some(longitude.into()),
            radius: Some(radius.into()),
            limit: Some(limit.into()),
        }
    }

    /// Collect parameters from decoded `(name, value)` pairs, such as a query string.
    ///
    /// Unknown names are ignored; a repeated name keeps the last value.
    ///
    /// ```rust
    /// use nearby::RawSearchParams;
    ///
    /// let params = RawSearchParams::from_pairs([
    ///     ("latitude", "1.305649"),
    ///     ("longitude", "103.926768"),
    ///     ("radius", "1000"),
    ///     ("limit", "2"),
    ///     ("callback", "ignored"),
    /// ]);
    /// assert_eq!(params.radius.as_deref(), Some("1000"));
    /// assert!(params.validate().is_ok());
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (name, value) in pairs {
            if let Some(field) = Field::from_name(name.as_ref()) {
                *params.slot_mut(field) = Some(value.into());
            }
        }
        params
    }

    /// Set a single parameter.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        *self.slot_mut(field) = Some(value.into());
        self
    }

    /// Clear a single parameter.
    pub fn without(mut self, field: Field) -> Self {
        *self.slot_mut(field) = None;
        self
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Latitude => self.latitude.as_deref(),
            Field::Longitude => self.longitude.as_deref(),
            Field::Radius => self.radius.as_deref(),
            Field::Limit => self.limit.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Latitude => &mut self.latitude,
            Field::Longitude => &mut self.longitude,
            Field::Radius => &mut self.radius,
            Field::Limit => &mut self.limit,
        }
    }

    pub fn validate(&self) -> Result<SearchRequest, ValidationError> {
        validate(self)
    }
}

/// Turn raw parameters into a [`SearchRequest`], or report the first bad field.
pub fn validate(params: &RawSearchParams) -> Result<SearchRequest, ValidationError> {
    let latitude = parse_coordinate(params, Field::Latitude, GeoPoint::LATITUDE_RANGE)?;
    let longitude = parse_coordinate(params, Field::Longitude, GeoPoint::LONGITUDE_RANGE)?;
    let radius = parse_count(params, Field::Radius)?;
    let limit = parse_count(params, Field::Limit)?;

    let origin = GeoPoint::new(latitude, longitude)?;
    Ok(SearchRequest::new(origin, radius, limit))
}

fn required(params: &RawSearchParams, field: Field) -> Result<&str, ValidationError> {
    match params.get(field) {
        Some(raw) if !raw.is_empty() => Ok(raw),
        _ => Err(ValidationError::Missing { field }),
    }
}

fn parse_coordinate(
    params: &RawSearchParams,
    field: Field,
    range: (f64, f64),
) -> Result<f64, ValidationError> {
    let raw = required(params, field)?;
    let value = raw
        .parse::<f64>()
        .map_err(|_| ValidationError::Unparsable {
            field,
            raw: raw.to_string(),
        })?;
    check_range(field, value, range)
}

// Parsed as i32 so values beyond the signed 32-bit range are parse failures.
fn parse_count(params: &RawSearchParams, field: Field) -> Result<u32, ValidationError> {
    let raw = required(params, field)?;
    let value = raw
        .parse::<i32>()
        .map_err(|_| ValidationError::Unparsable {
            field,
            raw: raw.to_string(),
        })?;
    u32::try_from(value).map_err(|_| ValidationError::Negative { field, value })
}
