use crate::{core::FindResult, error::FindError, model::VehicleLocation};

/// `code` and `message` of a failed find; both empty on success.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// The envelope a service returns for a find.
///
/// ```json
/// { "data": [{"vehicle_id": 2, "latitude": 1.306002, "longitude": 103.927337, "distance": 74.1}],
///   "success": true,
///   "error": {"code": "", "message": ""} }
/// ```
///
/// `data` is `null` when the find failed.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FindLocationsResponse {
    pub data: Option<Vec<VehicleLocation>>,
    pub success: bool,
    pub error: ErrorResponse,
}

impl FindLocationsResponse {
    pub fn success(data: Vec<VehicleLocation>) -> Self {
        Self {
            data: Some(data),
            success: true,
            error: ErrorResponse::default(),
        }
    }

    pub fn failure(error: &FindError) -> Self {
        Self {
            data: None,
            success: false,
            error: ErrorResponse {
                code: error.code().to_string(),
                message: error.to_string(),
            },
        }
    }

    pub fn from_result(result: &FindResult) -> Self {
        match result {
            Ok(data) => Self::success(data.clone()),
            Err(e) => Self::failure(e),
        }
    }

    /// HTTP status matching the envelope.
    pub fn http_status(&self) -> u16 {
        match self.error.code.as_str() {
            "400" => 400,
            "500" => 500,
            _ => 200,
        }
    }
}

impl From<FindResult> for FindLocationsResponse {
    fn from(result: FindResult) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(e) => Self::failure(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::GeoPoint,
        store::StoreError,
        validate::{Field, ValidationError},
    };

    fn location() -> VehicleLocation {
        VehicleLocation {
            vehicle_id: 2,
            position: GeoPoint::new(1.306002, 103.927337).unwrap(),
            distance_meters: 74.1,
        }
    }

    #[test]
    fn test_success_envelope() {
        let response = FindLocationsResponse::from(Ok(vec![location()]));
        assert!(response.success);
        assert_eq!(response.data, Some(vec![location()]));
        assert_eq!(response.error, ErrorResponse::default());
        assert_eq!(response.http_status(), 200);
    }

    #[test]
    fn test_validation_failure_envelope() {
        let result: FindResult = Err(ValidationError::Missing {
            field: Field::Latitude,
        }
        .into());
        let response = FindLocationsResponse::from_result(&result);
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.code, "400");
        assert_eq!(response.error.message, "latitude is a required param");
        assert_eq!(response.http_status(), 400);
    }

    #[test]
    fn test_store_failure_envelope() {
        let error = FindError::store(StoreError::Other(anyhow::anyhow!("disk gone")));
        let response = FindLocationsResponse::failure(&error);
        assert_eq!(response.error.code, "500");
        assert_eq!(
            response.error.message,
            "failed to find the locations within the range: disk gone"
        );
        assert_eq!(response.http_status(), 500);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_envelope_json_shape() {
        let json = serde_json::to_value(FindLocationsResponse::success(vec![location()])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": [{
                    "vehicle_id": 2,
                    "latitude": 1.306002,
                    "longitude": 103.927337,
                    "distance": 74.1
                }],
                "success": true,
                "error": {"code": "", "message": ""}
            })
        );

        let error = FindError::from(ValidationError::Missing {
            field: Field::Limit,
        });
        let json = serde_json::to_value(FindLocationsResponse::failure(&error)).unwrap();
        assert_eq!(json["data"], serde_json::Value::Null);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "400");
    }
}
