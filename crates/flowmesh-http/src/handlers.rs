//! Request handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use flowmesh_core::{TopicStatus, TopologySnapshot};
use serde::Deserialize;
use tracing::info;

use crate::{error::ApiError, router::AppState};

/// Query of `/upload`
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    /// Label for the uploaded graph
    pub name: Option<String>,
}

/// Query of `/publish`
#[derive(Debug, Default, Deserialize)]
pub struct PublishParams {
    pub topic: Option<String>,
    pub message: Option<String>,
}

/// POST /upload - Replace the running graph with the configuration in the body
pub async fn upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: String,
) -> Result<Json<TopologySnapshot>, ApiError> {
    let name = params
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "upload".to_string());

    let agents = state.engine.install(&name, &body).await?;
    info!(graph = %name, agents, "Installed uploaded graph");

    state.engine.snapshot().await.map(Json).ok_or(ApiError::NoGraph)
}

/// GET|POST /publish?topic=&message= - Publish a value, then list topics
pub async fn publish(
    State(state): State<AppState>,
    Query(params): Query<PublishParams>,
) -> Result<Json<Vec<TopicStatus>>, ApiError> {
    let topic = required(params.topic, "topic")?;
    let message = required(params.message, "message")?;

    state.engine.publish(&topic, message).await?;
    Ok(Json(state.engine.topics().await))
}

/// GET /graph-data - Topology of the running graph
pub async fn graph_data(State(state): State<AppState>) -> Result<Json<TopologySnapshot>, ApiError> {
    state.engine.snapshot().await.map(Json).ok_or(ApiError::NoGraph)
}

/// GET /topics - Every topic with its last value
pub async fn topics(State(state): State<AppState>) -> Json<Vec<TopicStatus>> {
    Json(state.engine.topics().await)
}

/// GET /health - Liveness with graph summary
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let graph = state.engine.graph_info().await;
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "flowmesh-http",
            "timestamp": chrono::Utc::now(),
            "version": env!("CARGO_PKG_VERSION"),
            "graph": graph,
            "topics": state.engine.registry().len(),
        })),
    )
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing or empty '{field}' parameter")))
}
