//! Observability infrastructure for the AQI predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, category counts, errors, sessions, model version)
//! - Structured JSON logging with tracing

use crate::classifier::AqiCategory;
use crate::models::PredictionResult;
use crate::session::SessionView;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter_vec, register_int_gauge,
    GaugeVec, Histogram, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for model scoring latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AqiMetricsInner> = OnceLock::new();

struct AqiMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    prediction_errors_total: IntCounterVec,
    active_sessions: IntGauge,
    session_transitions_total: IntCounterVec,
    model_version_info: GaugeVec,
    model_reloads_total: IntCounterVec,
}

impl AqiMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "aqi_prediction_latency_seconds",
                "Time spent in the model scoring call",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "aqi_predictions_total",
                "Successful predictions by AQI category",
                &["category"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "aqi_prediction_errors_total",
                "Failed predictions by error kind",
                &["kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            active_sessions: register_int_gauge!(
                "aqi_active_sessions",
                "Number of open user sessions"
            )
            .expect("Failed to register active_sessions"),

            session_transitions_total: register_int_counter_vec!(
                "aqi_session_transitions_total",
                "Session view transitions by target view",
                &["to"]
            )
            .expect("Failed to register session_transitions_total"),

            model_version_info: register_gauge_vec!(
                "aqi_model_version_info",
                "Information about the currently loaded model",
                &["version", "kind"]
            )
            .expect("Failed to register model_version_info"),

            model_reloads_total: register_int_counter_vec!(
                "aqi_model_reloads_total",
                "Model reload attempts by outcome",
                &["outcome"]
            )
            .expect("Failed to register model_reloads_total"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct AqiMetrics {
    _private: (),
}

impl Default for AqiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AqiMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AqiMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AqiMetricsInner {
        GLOBAL_METRICS.get_or_init(AqiMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, category: AqiCategory) {
        self.inner()
            .predictions_total
            .with_label_values(&[category.label()])
            .inc();
    }

    pub fn inc_prediction_errors(&self, kind: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn set_active_sessions(&self, count: i64) {
        self.inner().active_sessions.set(count);
    }

    pub fn active_sessions(&self) -> i64 {
        self.inner().active_sessions.get()
    }

    pub fn inc_session_transitions(&self, to: SessionView) {
        self.inner()
            .session_transitions_total
            .with_label_values(&[to.as_str()])
            .inc();
    }

    pub fn set_model_version(&self, version: &str, kind: &str) {
        self.inner().model_version_info.reset();
        self.inner()
            .model_version_info
            .with_label_values(&[version, kind])
            .set(1.0);
    }

    pub fn inc_model_reloads(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.inner()
            .model_reloads_total
            .with_label_values(&[outcome])
            .inc();
    }
}

/// Structured logger for predictor events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_model_loaded(&self, path: &str, version: &str, kind: &str) {
        info!(
            event = "model_loaded",
            instance = %self.instance,
            path = %path,
            model_version = %version,
            kind = %kind,
            "Regression model loaded"
        );
    }

    pub fn log_model_reload(&self, old_version: &str, new_version: &str, success: bool) {
        if success {
            info!(
                event = "model_reloaded",
                instance = %self.instance,
                old_version = %old_version,
                new_version = %new_version,
                "Model artifact reloaded"
            );
        } else {
            warn!(
                event = "model_reload_failed",
                instance = %self.instance,
                old_version = %old_version,
                "Model reload failed, keeping previous version"
            );
        }
    }

    pub fn log_prediction_start(&self, co: f64, ozone: f64, no2: f64, pm25: f64) {
        info!(
            event = "prediction_started",
            instance = %self.instance,
            co_aqi = co,
            ozone_aqi = ozone,
            no2_aqi = no2,
            pm25_aqi = pm25,
            "Running AQI prediction"
        );
    }

    pub fn log_prediction_complete(&self, result: &PredictionResult) {
        info!(
            event = "prediction_completed",
            instance = %self.instance,
            aqi_value = result.aqi_value,
            raw_score = result.raw_score,
            elapsed_seconds = result.elapsed_seconds,
            model_version = %result.model_version,
            "AQI prediction completed"
        );
    }

    pub fn log_category(&self, score: f64, category: AqiCategory) {
        info!(
            event = "category_determined",
            instance = %self.instance,
            raw_score = score,
            category = %category,
            severity_rank = category.severity_rank(),
            "AQI category determined"
        );
    }

    pub fn log_prediction_failed(&self, kind: &str, message: &str) {
        warn!(
            event = "prediction_failed",
            instance = %self.instance,
            kind = %kind,
            message = %message,
            "AQI prediction failed"
        );
    }

    pub fn log_session_transition(&self, session_id: &str, from: SessionView, to: SessionView) {
        info!(
            event = "session_transition",
            instance = %self.instance,
            session_id = %session_id,
            from = %from,
            to = %to,
            "Session view changed"
        );
    }

    pub fn log_sessions_expired(&self, expired: usize, remaining: usize) {
        info!(
            event = "sessions_expired",
            instance = %self.instance,
            expired = expired,
            remaining = remaining,
            "Idle sessions reclaimed"
        );
    }

    pub fn log_startup(&self, version: &str, model_version: &str) {
        info!(
            event = "server_started",
            instance = %self.instance,
            server_version = %version,
            model_version = %model_version,
            "AQI predictor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            instance = %self.instance,
            reason = %reason,
            "AQI predictor shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_can_be_recorded() {
        let metrics = AqiMetrics::new();
        metrics.observe_prediction_latency(0.0002);
        metrics.inc_predictions(AqiCategory::Moderate);
        metrics.inc_prediction_errors("invalid_input");
        metrics.set_active_sessions(3);
        metrics.inc_session_transitions(SessionView::PredictAqi);
        metrics.set_model_version("sha256:abc", "linear");
        metrics.inc_model_reloads(true);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "aqi_predictions_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
