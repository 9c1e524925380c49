//! HTTP router configuration

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use flowmesh_core::FlowEngine;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    config::HttpServerConfig,
    handlers::{graph_data, health, publish, topics, upload},
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FlowEngine>,
}

/// Create the Axum router with all endpoints and middleware
pub fn router(engine: Arc<FlowEngine>, config: &HttpServerConfig) -> Router {
    let mut router = Router::new()
        .route("/upload", post(upload))
        .route("/publish", get(publish).post(publish))
        .route("/graph-data", get(graph_data))
        .route("/topics", get(topics))
        .route("/health", get(health))
        .with_state(AppState { engine })
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}
