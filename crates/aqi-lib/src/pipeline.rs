//! Prediction request pipeline
//!
//! validate → score (timed) → truncate → classify → result. A pipeline is
//! bound to one `ModelHandle` for its whole life; to pick up a reloaded
//! model, build a new pipeline from `ModelRegistry::current`.

use crate::classifier::AqiClassifier;
use crate::error::{AqiError, Result};
use crate::model::ModelHandle;
use crate::models::{PredictionResult, RawPredictionInput};
use crate::observability::{AqiMetrics, StructuredLogger};
use std::sync::Arc;
use std::time::Instant;

pub struct PredictionPipeline {
    model: Arc<ModelHandle>,
    classifier: AqiClassifier,
    metrics: Option<AqiMetrics>,
    logger: Option<StructuredLogger>,
}

impl PredictionPipeline {
    pub fn new(model: Arc<ModelHandle>) -> Self {
        Self::with_classifier(model, AqiClassifier::new())
    }

    /// Pipeline over a specific classifier. The classifier's range table was
    /// checked when it was built, so building a pipeline cannot fail.
    pub fn with_classifier(model: Arc<ModelHandle>, classifier: AqiClassifier) -> Self {
        Self {
            model,
            classifier,
            metrics: None,
            logger: None,
        }
    }

    pub fn with_metrics(mut self, metrics: AqiMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Run one prediction. No result is produced unless every step succeeds.
    pub fn predict(&self, raw: &RawPredictionInput) -> Result<PredictionResult> {
        let outcome = self.run(raw);

        if let Err(e) = &outcome {
            if let Some(metrics) = &self.metrics {
                metrics.inc_prediction_errors(e.kind());
            }
            if let Some(logger) = &self.logger {
                logger.log_prediction_failed(e.kind(), &e.to_string());
            }
        }

        outcome
    }

    fn run(&self, raw: &RawPredictionInput) -> Result<PredictionResult> {
        let input = raw.validate()?;

        if let Some(logger) = &self.logger {
            logger.log_prediction_start(
                input.co_aqi(),
                input.ozone_aqi(),
                input.no2_aqi(),
                input.pm25_aqi(),
            );
        }

        let start = Instant::now();
        let score = self.model.score(&input)?;
        // Clamped at zero if the clock steps backwards
        let elapsed = Instant::now().saturating_duration_since(start);

        if !score.is_finite() {
            return Err(AqiError::scoring(format!("model returned {}", score)));
        }

        // Classified on the raw score; truncation is for display only
        let classification = self.classifier.classify(score)?;
        if let Some(logger) = &self.logger {
            logger.log_category(score, classification.category);
        }

        let result = PredictionResult {
            aqi_value: score.trunc() as i64,
            raw_score: score,
            category: classification.category,
            severity_rank: classification.severity_rank,
            severity_color: classification.color,
            elapsed_seconds: elapsed.as_secs_f64(),
            model_version: self.model.version().to_string(),
        };

        if let Some(metrics) = &self.metrics {
            metrics.observe_prediction_latency(result.elapsed_seconds);
            metrics.inc_predictions(result.category);
        }
        if let Some(logger) = &self.logger {
            logger.log_prediction_complete(&result);
        }

        Ok(result)
    }
}
