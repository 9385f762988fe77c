//! Core data models for the AQI predictor

use crate::classifier::{AqiCategory, SeverityColor};
use crate::error::{AqiError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of input features expected by every model artifact
pub const NUM_FEATURES: usize = 4;

/// Column names used at training time, in the order the model expects them
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "CO AQI Value",
    "Ozone AQI Value",
    "NO2 AQI Value",
    "PM2.5 AQI Value",
];

/// Request field names, index-aligned with `FEATURE_NAMES`
pub const FIELD_NAMES: [&str; NUM_FEATURES] = ["co_aqi", "ozone_aqi", "no2_aqi", "pm25_aqi"];

/// Form values as submitted, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPredictionInput {
    pub co_aqi: Option<f64>,
    pub ozone_aqi: Option<f64>,
    pub no2_aqi: Option<f64>,
    pub pm25_aqi: Option<f64>,
}

impl RawPredictionInput {
    pub fn new(co_aqi: f64, ozone_aqi: f64, no2_aqi: f64, pm25_aqi: f64) -> Self {
        Self {
            co_aqi: Some(co_aqi),
            ozone_aqi: Some(ozone_aqi),
            no2_aqi: Some(no2_aqi),
            pm25_aqi: Some(pm25_aqi),
        }
    }

    /// Extract the four fields from an arbitrary JSON object.
    ///
    /// A field that is present but not a number is reported by name here,
    /// rather than surfacing as an opaque deserialization failure.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| AqiError::invalid_input("body", "expected a JSON object"))?;

        let mut fields = [None; NUM_FEATURES];
        for (slot, name) in fields.iter_mut().zip(FIELD_NAMES) {
            *slot = match object.get(name) {
                None | Some(Value::Null) => None,
                Some(Value::Number(n)) => n.as_f64(),
                Some(other) => {
                    return Err(AqiError::invalid_input(
                        name,
                        format!("expected a number, got {}", other),
                    ))
                }
            };
        }

        Ok(Self {
            co_aqi: fields[0],
            ozone_aqi: fields[1],
            no2_aqi: fields[2],
            pm25_aqi: fields[3],
        })
    }

    fn values(&self) -> [Option<f64>; NUM_FEATURES] {
        [self.co_aqi, self.ozone_aqi, self.no2_aqi, self.pm25_aqi]
    }

    /// Validate every field and freeze the values in model feature order
    pub fn validate(&self) -> Result<PredictionInput> {
        let mut features = [0.0; NUM_FEATURES];
        for ((slot, value), name) in features.iter_mut().zip(self.values()).zip(FIELD_NAMES) {
            let value = value.ok_or_else(|| AqiError::invalid_input(name, "value is required"))?;
            if !value.is_finite() {
                return Err(AqiError::invalid_input(name, "value must be a finite number"));
            }
            if value < 0.0 {
                return Err(AqiError::invalid_input(
                    name,
                    format!("value must be >= 0, got {}", value),
                ));
            }
            *slot = value;
        }
        Ok(PredictionInput { features })
    }
}

/// Validated sub-index values. Only constructed through `RawPredictionInput::validate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionInput {
    features: [f64; NUM_FEATURES],
}

impl PredictionInput {
    pub fn co_aqi(&self) -> f64 {
        self.features[0]
    }

    pub fn ozone_aqi(&self) -> f64 {
        self.features[1]
    }

    pub fn no2_aqi(&self) -> f64 {
        self.features[2]
    }

    pub fn pm25_aqi(&self) -> f64 {
        self.features[3]
    }

    /// Features in training column order
    pub fn as_features(&self) -> &[f64; NUM_FEATURES] {
        &self.features
    }
}

/// Outcome of one successful pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Model output truncated toward zero
    pub aqi_value: i64,
    /// Untruncated model output, the value that was classified
    pub raw_score: f64,
    pub category: AqiCategory,
    pub severity_rank: u8,
    pub severity_color: SeverityColor,
    pub elapsed_seconds: f64,
    pub model_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_preserves_feature_order() {
        let input = RawPredictionInput::new(10.0, 20.0, 15.0, 30.0).validate().unwrap();
        assert_eq!(input.as_features(), &[10.0, 20.0, 15.0, 30.0]);
        assert_eq!(input.pm25_aqi(), 30.0);
    }

    #[test]
    fn test_validate_rejects_missing_field() {
        let raw = RawPredictionInput {
            ozone_aqi: None,
            ..RawPredictionInput::new(1.0, 1.0, 1.0, 1.0)
        };
        match raw.validate() {
            Err(AqiError::InvalidInput { field, .. }) => assert_eq!(field, "ozone_aqi"),
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_negative_and_nan() {
        let negative = RawPredictionInput::new(1.0, 1.0, -0.5, 1.0);
        assert!(matches!(
            negative.validate(),
            Err(AqiError::InvalidInput { ref field, .. }) if field == "no2_aqi"
        ));

        let nan = RawPredictionInput::new(f64::NAN, 1.0, 1.0, 1.0);
        assert!(matches!(
            nan.validate(),
            Err(AqiError::InvalidInput { ref field, .. }) if field == "co_aqi"
        ));
    }

    #[test]
    fn test_zero_is_accepted() {
        assert!(RawPredictionInput::new(0.0, 0.0, 0.0, 0.0).validate().is_ok());
    }

    #[test]
    fn test_from_json_names_non_numeric_field() {
        let body = json!({"co_aqi": 1, "ozone_aqi": "high", "no2_aqi": 2, "pm25_aqi": 3});
        match RawPredictionInput::from_json(&body) {
            Err(AqiError::InvalidInput { field, .. }) => assert_eq!(field, "ozone_aqi"),
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json_leaves_absent_fields_empty() {
        let body = json!({"co_aqi": 1.5, "pm25_aqi": null});
        let raw = RawPredictionInput::from_json(&body).unwrap();
        assert_eq!(raw.co_aqi, Some(1.5));
        assert!(raw.ozone_aqi.is_none());
        assert!(raw.pm25_aqi.is_none());
    }
}
