use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use medallion_dashboard::{render, DashboardError};
use medallion_processing::{InvocationResult, ProcessingError, Stage};
use serde::Deserialize;
use serde_json::Value;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/bronze-to-silver", post(bronze_to_silver))
        .route("/silver-to-gold", post(silver_to_gold))
        .route("/dashboard", get(dashboard))
        .with_state(state)
}

type RouteError = (StatusCode, String);

async fn bronze_to_silver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<InvocationResult>, RouteError> {
    invoke(&state.bronze_to_silver, &payload).await
}

async fn silver_to_gold(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<InvocationResult>, RouteError> {
    invoke(&state.silver_to_gold, &payload).await
}

async fn invoke(stage: &dyn Stage, payload: &Value) -> Result<Json<InvocationResult>, RouteError> {
    stage
        .handle(payload)
        .await
        .map(|outcome| Json(InvocationResult::from(&outcome)))
        .map_err(|err| {
            let status = match err {
                ProcessingError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, err.to_string())
        })
}

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    key: Option<String>,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<String, RouteError> {
    let view = state
        .dashboard
        .view(query.key.as_deref())
        .await
        .map_err(|err| {
            if matches!(err, DashboardError::UnknownKey(_)) {
                return (StatusCode::NOT_FOUND, err.to_string());
            }
            tracing::error!("dashboard failed: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })?;
    Ok(render(&view))
}
