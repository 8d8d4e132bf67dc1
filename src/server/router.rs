use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use super::state::ServeState;

/// Trigger body. `url` is accepted as an alias of `payload`.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookRequest {
    #[serde(default, alias = "url")]
    pub payload: Option<String>,
}

pub fn build_router(state: ServeState) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn webhook_handler(
    State(state): State<ServeState>,
    body: Option<Json<WebhookRequest>>,
) -> impl IntoResponse {
    let payload = body
        .and_then(|Json(request)| request.payload)
        .map(|payload| payload.trim().to_string())
        .filter(|payload| !payload.is_empty());

    let Some(payload) = payload else {
        warn!("webhook called without a payload");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "payload is required" })),
        );
    };

    let run_id = state.trigger(payload);
    info!(%run_id, "run queued from webhook");
    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "queued", "runId": run_id })),
    )
}

async fn status_handler(State(state): State<ServeState>) -> impl IntoResponse {
    let status = state.status();
    let label = if status.active_run.is_some() {
        "running"
    } else {
        "idle"
    };
    Json(json!({
        "status": label,
        "activeRun": status.active_run,
        "queued": status.queued,
        "lastReport": status.last_report,
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
