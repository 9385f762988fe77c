//! Linear regression artifacts stored as JSON
//!
//! `{"intercept": 1.5, "coefficients": [0.1, 0.4, 0.2, 0.9]}`, with the
//! coefficients in training column order.

use super::AqiModel;
use crate::error::Result;
use crate::models::NUM_FEATURES;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: [f64; NUM_FEATURES],
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: [f64; NUM_FEATURES]) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    /// A model that ignores its inputs and always returns `value`
    pub fn constant(value: f64) -> Self {
        Self::new(value, [0.0; NUM_FEATURES])
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

impl AqiModel for LinearModel {
    fn score(&self, features: &[f64; NUM_FEATURES]) -> Result<f64> {
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_product_plus_intercept() {
        let model = LinearModel::new(1.0, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(model.score(&[1.0, 1.0, 1.0, 1.0]).unwrap(), 11.0);
    }

    #[test]
    fn test_wrong_coefficient_count_rejected() {
        let bytes = br#"{"intercept": 0.0, "coefficients": [1.0, 2.0, 3.0]}"#;
        assert!(LinearModel::from_bytes(bytes).is_err());
    }

    #[test]
    fn test_constant_model() {
        let model = LinearModel::constant(75.0);
        assert_eq!(model.score(&[10.0, 20.0, 15.0, 30.0]).unwrap(), 75.0);
    }
}
