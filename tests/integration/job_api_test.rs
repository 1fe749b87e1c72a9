// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{fast_config, product_page, scraper_for, PageScript, ScriptedDriver};
use axum::http::StatusCode;
use axum_test::TestServer;
use mkprocessor::application::usecases::job_service::JobService;
use mkprocessor::domain::services::progress_reporter::ProgressReporter;
use mkprocessor::infrastructure::progress_hub::ProgressHub;
use mkprocessor::infrastructure::repositories::memory_job_repo::InMemoryJobRepository;
use mkprocessor::presentation::routes;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

struct TestApp {
    server: TestServer,
    service: Arc<JobService>,
}

fn create_test_app(item_delay: Duration) -> TestApp {
    let driver = Arc::new(ScriptedDriver::new().with_page(
        "https://www.katom.com/7FT-ABC123.html",
        PageScript::page("Mixer", product_page("Mixer", "$99.95")),
    ));
    let hub = Arc::new(ProgressHub::new(16));
    let reporter: Arc<dyn ProgressReporter> = hub.clone();

    let service = Arc::new(JobService::new(
        Arc::new(InMemoryJobRepository::new()),
        scraper_for(driver, fast_config(0)),
        reporter,
        item_delay,
    ));

    let app = routes::routes(service.clone(), hub);
    let server = TestServer::new(app).unwrap();
    TestApp { server, service }
}

/// 轮询直到任务进入终止状态
async fn wait_for_terminal(server: &TestServer, id: &str) -> Value {
    for _ in 0..500 {
        let job = server.get(&format!("/api/jobs/{}", id)).await.json::<Value>();
        let status = job["status"].as_str().unwrap_or_default().to_string();
        if matches!(status.as_str(), "completed" | "failed" | "cancelled") {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not finish", id);
}

#[tokio::test]
async fn test_health_and_index() {
    let app = create_test_app(Duration::ZERO);

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["status"], "running");
    assert!(body["timestamp"].is_string());

    let index = app.server.get("/").await.json::<Value>();
    assert_eq!(index["endpoints"]["jobs"], "/api/jobs");
}

#[tokio::test]
async fn test_submit_job_runs_to_completion() {
    let app = create_test_app(Duration::ZERO);

    let response = app
        .server
        .post("/api/jobs")
        .json(&json!({
            "name": "Mixers",
            "models": ["ABC-123", "XYZ999HC"],
            "prefix": "7FT"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created = response.json::<Value>();
    assert_eq!(created["name"], "Mixers");
    assert_eq!(created["total_models"], 2);

    let id = created["id"].as_str().unwrap().to_string();
    let job = wait_for_terminal(&app.server, &id).await;

    assert_eq!(job["status"], "completed");
    assert_eq!(job["progress"], 100.0);
    assert!(job["started_at"].is_string());
    assert!(job["completed_at"].is_string());

    let results = &job["results"];
    assert_eq!(results["total"], 2);
    assert_eq!(results["successful"][0]["model"], "ABC123");
    assert_eq!(results["successful"][0]["price"], "99.95");
    assert_eq!(results["failed"][0]["model"], "XYZ999");
    assert_eq!(results["failed"][0]["error"], "Product not found");
}

#[tokio::test]
async fn test_submit_defaults_name() {
    let app = create_test_app(Duration::ZERO);

    let created = app
        .server
        .post("/api/jobs")
        .json(&json!({ "models": ["ABC123"] }))
        .await
        .json::<Value>();

    assert!(!created["name"].as_str().unwrap().is_empty());
    assert_eq!(created["prefix"], "");
}

#[tokio::test]
async fn test_submit_rejects_invalid_requests() {
    let app = create_test_app(Duration::ZERO);

    let empty = app
        .server
        .post("/api/jobs")
        .json(&json!({ "models": [] }))
        .await;
    empty.assert_status(StatusCode::BAD_REQUEST);
    assert!(empty.json::<Value>()["error"].is_string());

    let blank = app
        .server
        .post("/api/jobs")
        .json(&json!({ "models": ["ABC123", "   "] }))
        .await;
    blank.assert_status(StatusCode::BAD_REQUEST);

    let jobs = app.server.get("/api/jobs").await.json::<Vec<Value>>();
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let app = create_test_app(Duration::ZERO);
    let id = uuid::Uuid::new_v4();

    let response = app.server.get(&format!("/api/jobs/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "Job not found");

    app.server
        .post(&format!("/api/jobs/{}/cancel", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let app = create_test_app(Duration::ZERO);

    for name in ["first", "second"] {
        app.server
            .post("/api/jobs")
            .json(&json!({ "name": name, "models": ["ABC123"] }))
            .await
            .assert_status(StatusCode::CREATED);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let jobs = app.server.get("/api/jobs").await.json::<Vec<Value>>();
    let names: Vec<&str> = jobs.iter().filter_map(|j| j["name"].as_str()).collect();
    assert_eq!(names, vec!["second", "first"]);
}

#[tokio::test]
async fn test_cancel_running_job_then_conflict() {
    // A long pacing delay keeps the job alive until it is cancelled
    let app = create_test_app(Duration::from_secs(60));

    let created = app
        .server
        .post("/api/jobs")
        .json(&json!({ "models": ["ABC123", "M2", "M3"], "prefix": "7FT" }))
        .await
        .json::<Value>();
    let id = created["id"].as_str().unwrap().to_string();

    app.server
        .post(&format!("/api/jobs/{}/cancel", id))
        .await
        .assert_status(StatusCode::ACCEPTED);

    let job = wait_for_terminal(&app.server, &id).await;
    assert_eq!(job["status"], "cancelled");
    assert_eq!(job["results"]["cancelled"], true);
    assert!(job["current_model"].is_null());

    app.server
        .post(&format!("/api/jobs/{}/cancel", id))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_stats_reflect_finished_jobs() {
    let app = create_test_app(Duration::ZERO);

    let created = app
        .server
        .post("/api/jobs")
        .json(&json!({ "models": ["ABC123"], "prefix": "7FT" }))
        .await
        .json::<Value>();
    let id = created["id"].as_str().unwrap().to_string();
    wait_for_terminal(&app.server, &id).await;

    let stats = app.server.get("/api/stats").await.json::<Value>();
    assert_eq!(stats["total_jobs"], 1);
    assert_eq!(stats["running_jobs"], 0);
    assert_eq!(stats["completed_jobs"], 1);
    assert_eq!(stats["total_results"], 1);
    assert_eq!(stats["active_connections"], 0);
}

#[tokio::test]
async fn test_shutdown_cancels_active_jobs() {
    let app = create_test_app(Duration::from_secs(60));

    let created = app
        .server
        .post("/api/jobs")
        .json(&json!({ "models": ["ABC123", "M2"], "prefix": "7FT" }))
        .await
        .json::<Value>();
    let id = created["id"].as_str().unwrap().to_string();

    app.service.shutdown();

    let job = wait_for_terminal(&app.server, &id).await;
    assert_eq!(job["status"], "cancelled");
}
