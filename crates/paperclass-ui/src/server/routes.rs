use crate::render::{render, RenderedOutcome};
use crate::server::app::UiState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

pub async fn health(State(state): State<UiState>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "api_url": state.client.api_url() }))
}

#[derive(Debug, Deserialize)]
pub struct ClassifyForm {
    #[serde(default)]
    pub text: String,
}

/// Submit the form text to the inference service and render the outcome
pub async fn classify(
    State(state): State<UiState>,
    Json(form): Json<ClassifyForm>,
) -> Json<RenderedOutcome> {
    let outcome = state.client.submit(&form.text).await;
    Json(render(&outcome))
}
