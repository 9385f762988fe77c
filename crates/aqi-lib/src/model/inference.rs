//! ONNX inference using tract
//!
//! Runs a regression graph exported from the training pipeline. The graph
//! takes one `[1, 4]` f32 row in training column order and returns one value
//! per row.

use super::AqiModel;
use crate::error::{AqiError, Result};
use crate::models::NUM_FEATURES;
use anyhow::Context;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Inference latency above which a warning is logged
const SLOW_INFERENCE_MS: u128 = 50;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX regression model
pub struct OnnxModel {
    plan: TractModel,
}

impl OnnxModel {
    /// Parse, type and optimize an ONNX graph from bytes
    pub fn from_bytes(model_bytes: &[u8]) -> anyhow::Result<Self> {
        let plan = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self { plan })
    }

    fn features_to_tensor(features: &[f64; NUM_FEATURES]) -> Result<Tensor> {
        let data: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let array = tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), data)
            .map_err(AqiError::scoring)?;
        Ok(array.into())
    }
}

impl AqiModel for OnnxModel {
    fn score(&self, features: &[f64; NUM_FEATURES]) -> Result<f64> {
        let start = Instant::now();
        let input = Self::features_to_tensor(features)?;

        let outputs = self.plan.run(tvec!(input.into())).map_err(AqiError::scoring)?;
        let output = outputs
            .first()
            .ok_or_else(|| AqiError::scoring("model produced no outputs"))?;

        // Some exporters emit f64 outputs; normalize before reading
        let output = output.cast_to::<f32>().map_err(AqiError::scoring)?;
        let view = output.to_array_view::<f32>().map_err(AqiError::scoring)?;
        let value = view
            .iter()
            .next()
            .copied()
            .ok_or_else(|| AqiError::scoring("model output is empty"))?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > SLOW_INFERENCE_MS {
            warn!(elapsed_ms = elapsed.as_millis(), "Inference exceeded {}ms", SLOW_INFERENCE_MS);
        } else {
            debug!(elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok(value as f64)
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // y = 5 + co + 0.5 * ozone + 0 * no2 + 2 * pm25
    const LINEAR_FIXTURE: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/linear_aqi.onnx"
    ));

    #[test]
    fn test_scores_linear_graph() {
        let model = OnnxModel::from_bytes(LINEAR_FIXTURE).unwrap();
        assert_eq!(model.kind(), "onnx");
        assert_eq!(model.score(&[10.0, 20.0, 15.0, 30.0]).unwrap(), 85.0);
        assert_eq!(model.score(&[0.0, 0.0, 0.0, 0.0]).unwrap(), 5.0);
    }

    #[test]
    fn test_each_column_feeds_its_own_weight() {
        let model = OnnxModel::from_bytes(LINEAR_FIXTURE).unwrap();
        assert_eq!(model.score(&[1.0, 0.0, 0.0, 0.0]).unwrap(), 6.0);
        assert_eq!(model.score(&[0.0, 4.0, 0.0, 0.0]).unwrap(), 7.0);
        assert_eq!(model.score(&[0.0, 0.0, 100.0, 0.0]).unwrap(), 5.0);
        assert_eq!(model.score(&[0.0, 0.0, 0.0, 3.0]).unwrap(), 11.0);
    }

    #[test]
    fn test_fractional_inputs_survive_f32_cast() {
        let model = OnnxModel::from_bytes(LINEAR_FIXTURE).unwrap();
        let score = model.score(&[1.25, 0.5, 0.0, 0.125]).unwrap();
        assert!((score - 6.75).abs() < 1e-6);
    }

    #[test]
    fn test_handle_loads_onnx_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, LINEAR_FIXTURE).unwrap();

        let handle = crate::model::ModelHandle::load(&path).unwrap();
        assert_eq!(handle.info().kind, "onnx");
        let input = crate::models::RawPredictionInput::new(10.0, 20.0, 15.0, 30.0)
            .validate()
            .unwrap();
        assert_eq!(handle.score(&input).unwrap(), 85.0);
    }

    #[test]
    fn test_rejects_garbage_bytes() {
        assert!(OnnxModel::from_bytes(&[0xde, 0xad, 0xbe, 0xef]).is_err());
    }

    #[test]
    fn test_features_keep_column_order() {
        let tensor = OnnxModel::features_to_tensor(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(tensor.shape(), &[1, NUM_FEATURES]);
        let values: Vec<f32> = tensor.to_array_view::<f32>().unwrap().iter().copied().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
