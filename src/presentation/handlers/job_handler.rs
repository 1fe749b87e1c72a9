// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{
        dto::job_request::{CreateJobRequest, JobStats},
        usecases::job_service::JobService,
    },
    domain::models::job::Job,
    infrastructure::progress_hub::ProgressHub,
    presentation::errors::AppError,
};

/// 提交抓取任务
pub async fn create_job(
    Extension(service): Extension<Arc<JobService>>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let job = service.submit(payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// 任务列表，最新的在前
pub async fn list_jobs(
    Extension(service): Extension<Arc<JobService>>,
) -> Result<Json<Vec<Job>>, AppError> {
    Ok(Json(service.list().await?))
}

pub async fn get_job(
    Extension(service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(service.get(id).await?))
}

/// 取消任务，返回 202 和取消请求时的任务快照
pub async fn cancel_job(
    Extension(service): Extension<Arc<JobService>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let job = service.cancel(id).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

pub async fn stats(
    Extension(service): Extension<Arc<JobService>>,
    Extension(hub): Extension<Arc<ProgressHub>>,
) -> Result<Json<JobStats>, AppError> {
    let mut stats = service.stats().await?;
    stats.active_connections = hub.active_connections();
    Ok(Json(stats))
}
