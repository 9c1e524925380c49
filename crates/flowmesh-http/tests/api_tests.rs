//! In-process tests of the HTTP adapter

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use flowmesh_agents::builtin_factory;
use flowmesh_core::{FlowEngine, GraphSettings, TopologySnapshot};
use flowmesh_http::{ErrorResponse, HttpServerConfig, router};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use tower::ServiceExt; // for `oneshot` method

fn create_test_app() -> (axum::Router, Arc<FlowEngine>) {
    let engine = Arc::new(FlowEngine::new(builtin_factory(), GraphSettings::default()));
    let app = router(Arc::clone(&engine), &HttpServerConfig::default());
    (app, engine)
}

async fn json_body<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _engine) = create_test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["graph"].is_null());
}

#[tokio::test]
async fn test_graph_data_is_404_before_upload() {
    let (app, _engine) = create_test_app();
    let response = app.oneshot(get("/graph-data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: ErrorResponse = json_body(response).await;
    assert_eq!(body.error, "graph_not_found");
}

#[tokio::test]
async fn test_upload_returns_topology() {
    let (app, engine) = create_test_app();

    let response = app
        .clone()
        .oneshot(post("/upload?name=sum", "PlusAgent\nA,B\nSUM\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let snapshot: TopologySnapshot = json_body(response).await;
    assert_eq!(snapshot.nodes.len(), 4);
    assert_eq!(snapshot.edges.len(), 3);
    assert!(!snapshot.has_cycles);

    let response = app.oneshot(get("/graph-data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_bad_upload_is_400() {
    let (app, _engine) = create_test_app();

    for body in ["PlusAgent\nA\nSUM\n", "NopeAgent\nA\nB\n", "PlusAgent\nA,B\n"] {
        let response = app.clone().oneshot(post("/upload", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body:?}");

        let error: ErrorResponse = json_body(response).await;
        assert_eq!(error.error, "invalid_configuration");
        assert!(!error.message.is_empty());
    }
}

#[tokio::test]
async fn test_publish_requires_parameters() {
    let (app, _engine) = create_test_app();

    for uri in ["/publish", "/publish?topic=A", "/publish?topic=%20&message=1"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");
    }
}

#[tokio::test]
async fn test_publish_flows_through_graph() {
    let (app, engine) = create_test_app();
    app.clone()
        .oneshot(post("/upload", "PlusAgent\nA,B\nSUM\n"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/publish?topic=A&message=%203%20"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post("/publish?topic=B&message=4", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sum = engine.registry().get_or_create("SUM");
    tokio::time::timeout(Duration::from_secs(2), async {
        while sum.last_text().await.as_deref() != Some("7") {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("SUM should become 7");

    let response = app.oneshot(get("/topics")).await.unwrap();
    let topics: serde_json::Value = json_body(response).await;
    assert!(
        topics
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t["name"] == "A" && t["value"] == "3")
    );

    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_body_limit() {
    let engine = Arc::new(FlowEngine::new(builtin_factory(), GraphSettings::default()));
    let config = HttpServerConfig {
        max_body_size: 16,
        ..HttpServerConfig::default()
    };
    let app = router(engine, &config);

    let response = app
        .oneshot(post("/upload", &"IncAgent\nA\nB\n".repeat(10)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
