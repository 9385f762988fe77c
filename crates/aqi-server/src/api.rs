//! HTTP API: session navigation, prediction, description, health and metrics

use aqi_lib::{
    description::description_stream,
    health::{ComponentStatus, HealthRegistry},
    session::{Credentials, Transition, DEFAULT_IDLE_TIMEOUT},
    AqiClassifier, AqiError, AqiMetrics, ModelRegistry, PredictionPipeline, PredictionResult,
    RawPredictionInput, SessionStore, SessionView, StructuredLogger,
};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tracing::{debug, info};
use uuid::Uuid;

/// Longest pause between idle-session sweeps
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: AqiMetrics,
    pub logger: StructuredLogger,
    pub models: Arc<ModelRegistry>,
    pub classifier: AqiClassifier,
    pub sessions: SessionStore,
    pub description_delay: Duration,
    pub session_idle: Duration,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: AqiMetrics,
        logger: StructuredLogger,
        models: Arc<ModelRegistry>,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            logger,
            models,
            classifier: AqiClassifier::new(),
            sessions: SessionStore::new(),
            description_delay: aqi_lib::description::DEFAULT_WORD_DELAY,
            session_idle: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Use a classifier whose range table was checked at startup
    pub fn with_classifier(mut self, classifier: AqiClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_description_delay(mut self, delay: Duration) -> Self {
        self.description_delay = delay;
        self
    }

    pub fn with_session_idle(mut self, idle: Duration) -> Self {
        self.session_idle = idle;
        self
    }

    /// Drop abandoned sessions and refresh the active-sessions gauge
    pub fn evict_idle_sessions(&self) -> usize {
        let expired = self.sessions.evict_idle(self.session_idle);
        let remaining = self.sessions.len();
        self.metrics.set_active_sessions(remaining as i64);
        if expired > 0 {
            self.logger.log_sessions_expired(expired, remaining);
        }
        expired
    }

    fn record_transition(&self, id: &Uuid, transition: Transition) {
        self.metrics.inc_session_transitions(transition.to);
        self.logger
            .log_session_transition(&id.to_string(), transition.from, transition.to);
    }
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Translates core errors into HTTP responses
pub struct ApiError(AqiError);

impl From<AqiError> for ApiError {
    fn from(e: AqiError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AqiError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AqiError::IllegalTransition { from, .. } if !from.is_authenticated() => {
                StatusCode::UNAUTHORIZED
            }
            AqiError::IllegalTransition { .. } => StatusCode::CONFLICT,
            AqiError::CredentialsRejected(_) => StatusCode::UNAUTHORIZED,
            AqiError::UnknownSession(_) => StatusCode::NOT_FOUND,
            AqiError::Initialization { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AqiError::Scoring(_) | AqiError::CategoryTable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Unwrap a JSON body, reporting a malformed one as invalid input
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AqiError::invalid_input("body", rejection.body_text()).into())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub view: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let id = state.sessions.create();
    state.metrics.set_active_sessions(state.sessions.len() as i64);
    (
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id: id,
            view: SessionView::LoggedOut,
            user: None,
        }),
    )
}

fn session_response(state: &AppState, id: Uuid) -> ApiResult<Json<SessionResponse>> {
    Ok(Json(SessionResponse {
        session_id: id,
        view: state.sessions.view(&id)?,
        user: state.sessions.user(&id)?,
    }))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    session_response(&state, id)
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.sessions.remove(&id) {
        return Err(AqiError::UnknownSession(id.to_string()).into());
    }
    state.metrics.set_active_sessions(state.sessions.len() as i64);
    Ok(StatusCode::NO_CONTENT)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let credentials = json_body(body)?;
    let transition = state.sessions.login(&id, &credentials)?;
    state.record_transition(&id, transition);
    session_response(&state, id)
}

async fn navigate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<SessionResponse>> {
    let body = json_body(body)?;
    let view = body
        .get("view")
        .ok_or_else(|| AqiError::invalid_input("view", "field is required"))?;
    let view = SessionView::deserialize(view).map_err(|_| {
        AqiError::invalid_input(
            "view",
            format!("unknown view {}, expected predict_aqi or description", view),
        )
    })?;
    let transition = state.sessions.navigate(&id, view)?;
    state.record_transition(&id, transition);
    session_response(&state, id)
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let transition = state.sessions.logout(&id)?;
    state.record_transition(&id, transition);
    session_response(&state, id)
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<PredictionResult>> {
    state.sessions.require_authenticated(&id, "predict")?;

    let raw = RawPredictionInput::from_json(&json_body(body)?)?;
    let pipeline =
        PredictionPipeline::with_classifier(state.models.current(), state.classifier.clone())
            .with_metrics(state.metrics.clone())
            .with_logger(state.logger.clone());

    // Model inference is CPU-bound; run it on the blocking pool
    let result = tokio::task::spawn_blocking(move || pipeline.predict(&raw))
        .await
        .map_err(AqiError::scoring)??;

    Ok(Json(result))
}

async fn description(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    state
        .sessions
        .require_authenticated(&id, "view the description")?;

    let words = description_stream(state.description_delay).map(Ok::<_, Infallible>);
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(words),
    )
        .into_response())
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(end_session))
        .route("/sessions/:id/login", post(login))
        .route("/sessions/:id/navigate", post(navigate))
        .route("/sessions/:id/logout", post(logout))
        .route("/sessions/:id/predict", post(predict))
        .route("/sessions/:id/description", get(description))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Periodically reclaim sessions idle for longer than `state.session_idle`
pub fn spawn_session_sweeper(state: Arc<AppState>) -> JoinHandle<()> {
    let period = state
        .session_idle
        .min(SESSION_SWEEP_INTERVAL)
        .max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let expired = state.evict_idle_sessions();
            debug!(expired, remaining = state.sessions.len(), "Session sweep finished");
        }
    })
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
