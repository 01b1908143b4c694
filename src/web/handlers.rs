use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::AppState;
use crate::{
    core::AgentSession,
    credentials::Credentials,
    error::AgentError,
    hooks::RecordingHooks,
    trip::TripRequest,
    workflow::{self, WorkflowReport},
};

const INDEX_HTML: &str = include_str!("static/index.html");

pub(super) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(super) async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let configured = state.credentials.read().await.is_some();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "credentials": configured,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct CredentialsForm {
    #[serde(default)]
    orchestration_key: String,
    #[serde(default)]
    model_key: String,
    #[serde(default)]
    search_key: Option<String>,
}

pub(super) async fn save_credentials(
    State(state): State<Arc<AppState>>,
    Json(form): Json<CredentialsForm>,
) -> (StatusCode, Json<Value>) {
    let credentials = Credentials::new(form.orchestration_key, form.model_key, form.search_key);
    if let Err(err) = credentials.validate() {
        return (StatusCode::BAD_REQUEST, Json(err.to_error_payload()));
    }

    let search_enabled = credentials.search_key().is_some();
    *state.credentials.write().await = Some(credentials);
    info!(target: "agenta::web", search_enabled, "Credentials saved");

    (
        StatusCode::OK,
        Json(json!({"status": "saved", "search_enabled": search_enabled})),
    )
}

pub(super) async fn submit_trip(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TripRequest>,
) -> (StatusCode, Json<Value>) {
    let Some(credentials) = state.credentials.read().await.clone() else {
        let err = AgentError::Config("Please provide both orchestration and model API keys.".to_string());
        return (StatusCode::UNAUTHORIZED, Json(err.to_error_payload()));
    };

    let report = workflow::submit(&request, || {
        AgentSession::configure(
            &state.config,
            &credentials,
            Arc::new(RecordingHooks::new()),
        )
    })
    .await;

    (status_for(&report), Json(report_body(&report)))
}

fn status_for(report: &WorkflowReport) -> StatusCode {
    match &report.error {
        None => StatusCode::OK,
        Some(AgentError::MissingFields(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(AgentError::Config(_)) => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::BAD_GATEWAY,
    }
}

fn report_body(report: &WorkflowReport) -> Value {
    json!({
        "state": report.state(),
        "transitions": report.transitions,
        "plan_text": report.plan_text,
        "plan_run_id": report.run.as_ref().map(|run| run.id.to_string()),
        "run_state": report.run.as_ref().map(|run| run.state),
        "summary": report.summary,
        "error": report.error_payload().map(|payload| payload["error"].clone()),
        "clarifications": report.clarifications,
    })
}
