//! Core library for the AQI predictor
//!
//! This crate provides:
//! - Model artifact loading, hot reload and scoring
//! - AQI severity classification over an ordered range table
//! - The prediction request pipeline
//! - Per-session navigation state
//! - Health checks and observability

pub mod classifier;
pub mod description;
pub mod error;
pub mod health;
pub mod model;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod session;

pub use classifier::{classify, AqiCategory, AqiClassifier, Classification, SeverityColor};
pub use error::{AqiError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use model::{AqiModel, ModelHandle, ModelRegistry};
pub use models::*;
pub use observability::{AqiMetrics, StructuredLogger};
pub use pipeline::PredictionPipeline;
pub use session::{SessionStateMachine, SessionStore, SessionView};
