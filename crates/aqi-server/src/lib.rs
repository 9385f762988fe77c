//! AQI predictor server
//!
//! Serves the session-gated prediction API over HTTP, together with
//! health, readiness and Prometheus endpoints.

pub mod api;
pub mod config;
