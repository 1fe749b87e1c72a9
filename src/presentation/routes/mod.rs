// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::usecases::job_service::JobService;
use crate::infrastructure::progress_hub::ProgressHub;
use crate::presentation::handlers::{job_handler, ws_handler};
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// # 参数
///
/// * `service` - 任务用例
/// * `hub` - 进度广播中心
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(service: Arc<JobService>, hub: Arc<ProgressHub>) -> Router {
    let public_routes = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check));

    let api_routes = Router::new()
        .route(
            "/api/jobs",
            post(job_handler::create_job).get(job_handler::list_jobs),
        )
        .route("/api/jobs/{id}", get(job_handler::get_job))
        .route("/api/jobs/{id}/cancel", post(job_handler::cancel_job))
        .route("/api/stats", get(job_handler::stats))
        .route("/ws", get(ws_handler::ws_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(Extension(service))
        .layer(Extension(hub))
        .layer(TraceLayer::new_for_http())
}

/// 服务说明
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "MK Processor API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "jobs": "/api/jobs",
            "stats": "/api/stats",
            "websocket": "/ws"
        }
    }))
}

/// 健康检查端点
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "running",
        "timestamp": Utc::now().to_rfc3339()
    }))
}
