//! Integration tests for the experiment API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, over the in-memory storage backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use lifelab_core::runner::RunnerSettings;
use lifelab_observer::router::build_router;
use lifelab_observer::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    build_router(AppState::in_memory(RunnerSettings::default()))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post_experiment(app: &Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::post("/run_experiment")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

/// Poll `/status/{id}` until the experiment leaves `RUNNING`.
async fn wait_for_terminal(app: &Router, id: i64) -> Value {
    for _ in 0..200 {
        let (status, json) = get(app, &format!("/status/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        if json["status"] != "RUNNING" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("experiment {id} never finished");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn index_returns_banner() {
    let (status, json) = get(&app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "Service Running");
    assert_eq!(json["project"], "Lifelab");
}

#[tokio::test]
async fn run_experiment_then_poll_status() {
    let app = app();
    let (status, json) = post_experiment(
        &app,
        json!({
            "name": "tub",
            "board_size": 3,
            "num_steps": 1,
            "initial_config": "010101010"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Experiment started in background");
    let id = json["experiment_id"].as_i64().unwrap();

    let done = wait_for_terminal(&app, id).await;
    assert_eq!(done["status"], "COMPLETED");
    assert_eq!(done["total_steps"], 1);
    assert!(done["duration_seconds"].is_string());
    assert!(done["end_time"].is_string());

    let (status, traces) = get(&app, &format!("/api/experiments/{id}/traces")).await;
    assert_eq!(status, StatusCode::OK);
    let traces = traces.as_array().unwrap();
    assert_eq!(traces.len(), 2);
    assert_eq!(traces[0]["generation_num"], 0);
    assert_eq!(traces[0]["board_state"], "010101010");
    assert_eq!(traces[0]["live_cells_count"], 4);
    assert_eq!(traces[1]["board_state"], "010101010");
}

#[tokio::test]
async fn defaults_apply_to_empty_body() {
    let app = app();
    let (status, json) = post_experiment(&app, json!({ "num_steps": 2 })).await;
    assert_eq!(status, StatusCode::OK);
    let id = json["experiment_id"].as_i64().unwrap();

    wait_for_terminal(&app, id).await;
    let (_, list) = get(&app, "/api/experiments").await;
    let first = &list.as_array().unwrap()[0];
    assert_eq!(first["name"], "Game of Life (B3/S23)");
    assert_eq!(first["board_size"], 20);
    assert_eq!(first["rules_notation"], "B3/S23");
    assert_eq!(first["initial_config"], "random:density=0.5;seed=0");
}

#[tokio::test]
async fn invalid_parameters_are_rejected_without_a_row() {
    let app = app();
    for body in [
        json!({ "board_size": 0 }),
        json!({ "num_steps": -1 }),
        json!({ "rules_notation": "B3S23" }),
        json!({ "board_size": 3, "initial_config": "0101" }),
        json!({ "initial_density": 2.0 }),
    ] {
        let (status, json) = post_experiment(&app, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json["status"], 400);
        assert!(json["error"].is_string());
    }

    let (_, list) = get(&app, "/api/experiments").await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_experiment_is_404() {
    let app = app();
    let (status, json) = get(&app, "/status/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);

    let (status, _) = get(&app, "/api/experiments/999/traces").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_respects_limit_and_order() {
    let app = app();
    let mut ids = Vec::new();
    for name in ["first", "second", "third"] {
        let (_, json) = post_experiment(
            &app,
            json!({ "name": name, "board_size": 4, "num_steps": 0 }),
        )
        .await;
        ids.push(json["experiment_id"].as_i64().unwrap());
    }
    for id in &ids {
        wait_for_terminal(&app, *id).await;
    }

    let (status, list) = get(&app, "/api/experiments?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["third", "second"]);
}

#[tokio::test]
async fn unknown_body_fields_are_rejected_as_json() {
    let app = app();
    let (status, json) = post_experiment(
        &app,
        json!({ "survival_rules": [2], "rules_notation": "B3/S23" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap().contains("survival_rules"));

    let (_, list) = get(&app, "/api/experiments").await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_json_error() {
    let response = app()
        .oneshot(
            Request::post("/run_experiment")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn malformed_path_and_query_are_json_errors() {
    let app = app();
    for uri in ["/status/abc", "/api/experiments/abc/traces", "/api/experiments?limit=many"] {
        let (status, json) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["status"], 400, "{uri}");
        assert!(json["error"].is_string(), "{uri}");
    }
}
