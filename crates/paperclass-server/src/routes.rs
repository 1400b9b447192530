//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use paperclass_core::{ClassificationRequest, ClassificationResponse, ErrorBody, ServiceInfo};
use serde_json::json;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, Instrument};

use crate::state::{AppState, NotReady, ServiceState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health/ready", get(readiness))
        .route("/metrics", get(metrics))
        .route("/predict", post(predict))
        .fallback(fallback)
        // Abstracts of any size are accepted; the tokenizer truncates them
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::running())
}

async fn readiness(State(state): State<AppState>) -> Response {
    if state.readiness.is_ready() {
        return Json(json!({ "status": "ready" })).into_response();
    }
    let current = state.readiness.current();
    let detail = match &current {
        ServiceState::Failed(reason) => NotReady::Failed(reason.clone()),
        _ => NotReady::NotLoaded,
    };
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "status": current.name(), "detail": detail.to_string() })),
    )
        .into_response()
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<ClassificationRequest>, JsonRejection>,
) -> Result<Json<ClassificationResponse>, AppError> {
    metrics::counter!("paperclass_requests_total").increment(1);
    let Json(request) = payload?;
    let classifier = state.readiness.classifier()?;

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("predict", %request_id, chars = request.text.len());

    async move {
        let start = Instant::now();
        let prediction =
            tokio::task::spawn_blocking(move || classifier.classify(&request.text))
                .await
                .map_err(|e| AppError::Internal(format!("Inference task failed: {}", e)))??;

        let elapsed = start.elapsed();
        metrics::histogram!("paperclass_inference_latency_us").record(elapsed.as_micros() as f64);
        metrics::counter!("paperclass_predictions_total", "label" => prediction.label.clone())
            .increment(1);

        info!(
            label = %prediction.label,
            confidence = prediction.confidence,
            tokens = prediction.token_count,
            "Classified in {:.1}ms",
            elapsed.as_secs_f64() * 1000.0
        );

        Ok::<_, AppError>(Json(ClassificationResponse::from(prediction)))
    }
    .instrument(span)
    .await
}

async fn fallback() -> AppError {
    AppError::NotFound
}

/// Errors surfaced to HTTP clients as `{"detail": ...}`
#[derive(Debug)]
pub enum AppError {
    InvalidRequest(StatusCode, String),
    NotReady(NotReady),
    Inference(String),
    Internal(String),
    NotFound,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.status(), rejection.body_text())
    }
}

impl From<NotReady> for AppError {
    fn from(reason: NotReady) -> Self {
        AppError::NotReady(reason)
    }
}

impl From<paperclass_core::Error> for AppError {
    fn from(err: paperclass_core::Error) -> Self {
        match err {
            paperclass_core::Error::Inference(msg) | paperclass_core::Error::Tokenizer(msg) => {
                AppError::Inference(msg)
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::InvalidRequest(status, msg) => {
                debug!("Rejected request body: {}", msg);
                (status, msg)
            }
            AppError::NotReady(reason) => (StatusCode::SERVICE_UNAVAILABLE, reason.to_string()),
            AppError::Inference(msg) => {
                error!("Inference failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Inference failed: {}", msg))
            }
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
        };

        let outcome = if status.is_server_error() { "error" } else { "rejected" };
        metrics::counter!("paperclass_request_errors_total", "outcome" => outcome).increment(1);

        (status, Json(ErrorBody::new(detail))).into_response()
    }
}
