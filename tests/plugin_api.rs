// Plugin endpoint tests - drive the router directly, no socket.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use common::CannedSwarm;
use swarm_flavor::{create_router, AppState, SwarmFlavor, ASSOCIATION_TAG};

fn router(swarm: CannedSwarm) -> axum::Router {
    create_router(Arc::new(AppState {
        flavor: Arc::new(SwarmFlavor::new(Arc::new(swarm))),
    }))
}

async fn call(app: axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn implements_reports_flavor_interface() {
    let (status, body) = call(router(CannedSwarm::new()), "/Plugin.Implements", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Interfaces"][0]["Name"], "Flavor");
}

#[tokio::test]
async fn validate_returns_type_and_allocation() {
    let (status, body) = call(
        router(CannedSwarm::new()),
        "/Flavor.Validate",
        json!({"Properties": {"type": "worker", "Size": 5}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"Type": "worker", "AllocationMethod": {"Size": 5}}));
}

#[tokio::test]
async fn validate_rejects_unknown_type_with_bad_request() {
    let (status, body) = call(
        router(CannedSwarm::new()),
        "/Flavor.Validate",
        json!({"Properties": {"type": "other"}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("other"));
}

#[tokio::test]
async fn validate_rejects_array_properties() {
    let (status, _) = call(
        router(CannedSwarm::new()),
        "/Flavor.Validate",
        json!({"Properties": ["worker", 5]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn prepare_manager_with_no_peers_is_a_conflict() {
    let (status, body) = call(
        router(CannedSwarm::new()),
        "/Flavor.Prepare",
        json!({"Properties": {"type": "manager", "Size": 3}, "Spec": {}}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("peer"));
}

#[tokio::test]
async fn prepare_returns_enriched_spec() {
    let (status, body) = call(
        router(CannedSwarm::new()),
        "/Flavor.Prepare",
        json!({
            "Properties": {"type": "worker"},
            "Spec": {"Tags": {"a": "b"}, "Properties": {"instance_type": "m5.large"}}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let spec = &body["Spec"];
    assert_eq!(spec["Tags"]["a"], "b");
    assert_eq!(spec["Properties"]["instance_type"], "m5.large");
    let association_id = spec["Tags"][ASSOCIATION_TAG].as_str().unwrap();
    let init = spec["Init"].as_str().unwrap();
    assert!(init.contains(association_id));
    assert!(init.contains("WorkerToken"));
    assert!(init.contains("1.2.3.4"));
}

#[tokio::test]
async fn prepare_without_manager_is_a_conflict() {
    let mut swarm = CannedSwarm::new();
    swarm.managers.clear();
    let (status, _) = call(
        router(swarm),
        "/Flavor.Prepare",
        json!({"Properties": {"type": "worker"}, "Spec": {}}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn healthy_reports_roster_membership() {
    let label = format!("{}=abc", ASSOCIATION_TAG);
    let (status, body) = call(
        router(CannedSwarm::new().with_node_labelled(&label)),
        "/Flavor.Healthy",
        json!({"Instance": {"ID": "i-1", "Tags": {ASSOCIATION_TAG: "abc"}}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"Healthy": true}));

    let (_, body) = call(
        router(CannedSwarm::new()),
        "/Flavor.Healthy",
        json!({"Instance": {"ID": "i-2", "Tags": {}}}),
    )
    .await;
    assert_eq!(body, json!({"Healthy": false}));
}

#[tokio::test]
async fn healthy_roster_failure_is_bad_gateway() {
    let swarm = CannedSwarm {
        fail_node_list: true,
        ..CannedSwarm::new()
    };
    let (status, body) = call(
        router(swarm),
        "/Flavor.Healthy",
        json!({"Instance": {"Tags": {ASSOCIATION_TAG: "abc"}}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("node-list"));
}
