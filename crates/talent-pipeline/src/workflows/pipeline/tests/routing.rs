use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::pipeline::router::{move_handler, MoveRequest};
use crate::workflows::pipeline::service::{PipelineService, PipelineSettings};
use crate::workflows::pipeline::{pipeline_router, Priority};

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn stages_route_lists_active_columns() {
    let harness = harness();
    let response = pipeline_router(harness.service.clone())
        .oneshot(get("/api/v1/pipeline/stages"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let ids: Vec<&str> = payload
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|stage| stage.get("id").and_then(Value::as_str))
        .collect();
    assert_eq!(ids, vec!["applied", "phone-screen", "hired"]);
}

#[tokio::test]
async fn candidates_route_applies_query_filters() {
    let harness = harness();
    let response = pipeline_router(harness.service.clone())
        .oneshot(get("/api/v1/pipeline/candidates?job_id=job-eng&priority=high"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let ids: Vec<&str> = payload
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|candidate| candidate.get("id").and_then(Value::as_str))
        .collect();
    assert_eq!(ids, vec!["c1", "c3"]);
}

#[tokio::test]
async fn candidates_route_rejects_unknown_priority() {
    let harness = harness();
    let response = pipeline_router(harness.service.clone())
        .oneshot(get("/api/v1/pipeline/candidates?priority=urgent"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn move_route_returns_updated_candidate() {
    let harness = harness();
    let response = pipeline_router(harness.service.clone())
        .oneshot(post_json(
            "/api/v1/pipeline/candidates/c1/stage",
            json!({ "stage_id": "phone-screen" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("stage_id"), Some(&json!("phone-screen")));
    assert_eq!(payload.get("version"), Some(&json!(1)));
}

#[tokio::test]
async fn move_handler_returns_not_found_for_missing_candidate() {
    let harness = harness();
    let before = snapshot(&harness);

    let response = move_handler(
        State(harness.service.clone()),
        Path("nonexistent-id".to_string()),
        axum::Json(MoveRequest {
            stage_id: stage("hired"),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload.get("candidate_id"), Some(&json!("nonexistent-id")));
    assert_eq!(snapshot(&harness), before);
}

#[tokio::test]
async fn move_route_maps_terminal_lock_to_conflict() {
    let harness = harness_with(
        scenario_registry(),
        roster(),
        PipelineSettings {
            lock_terminal_stages: true,
        },
    );
    let response = pipeline_router(harness.service.clone())
        .oneshot(post_json(
            "/api/v1/pipeline/candidates/c5/stage",
            json!({ "stage_id": "applied" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn priority_route_updates_candidate() {
    let harness = harness();
    let response = pipeline_router(harness.service.clone())
        .oneshot(post_json(
            "/api/v1/pipeline/candidates/c2/priority",
            json!({ "priority": "high" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let stored = harness
        .service
        .get_candidate(&cid("c2"))
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.priority, Priority::High);
}

#[tokio::test]
async fn history_route_lists_transitions() {
    let harness = harness();
    harness
        .service
        .move_candidate_to_stage(&cid("c1"), &stage("phone-screen"))
        .expect("move");

    let response = pipeline_router(harness.service.clone())
        .oneshot(get("/api/v1/pipeline/candidates/c1/history"))
        .await
        .expect("route executes");

    let payload = read_json_body(response).await;
    let entries = payload.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].get("to_stage"), Some(&json!("phone-screen")));
}

#[tokio::test]
async fn analytics_and_board_routes_render_snapshots() {
    let harness = harness();
    let router = pipeline_router(harness.service.clone());

    let analytics = router
        .clone()
        .oneshot(get("/api/v1/pipeline/analytics"))
        .await
        .expect("route executes");
    assert_eq!(analytics.status(), StatusCode::OK);
    let payload = read_json_body(analytics).await;
    assert_eq!(payload.get("total_candidates"), Some(&json!(5)));

    let board = router
        .oneshot(get("/api/v1/pipeline/board?job_id=job-data"))
        .await
        .expect("route executes");
    let payload = read_json_body(board).await;
    let counts: Vec<usize> = payload
        .as_array()
        .expect("array")
        .iter()
        .map(|group| {
            group
                .get("candidates")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or_default()
        })
        .collect();
    assert_eq!(counts, vec![1, 0, 1]);
}

#[tokio::test]
async fn repository_outage_maps_to_internal_error() {
    let service = Arc::new(PipelineService::new(
        scenario_registry(),
        Arc::new(UnavailableRepository),
    ));
    let response = pipeline_router(service)
        .oneshot(get("/api/v1/pipeline/candidates"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
