// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::application::dto::job_request::{CreateJobRequest, JobStats};
use crate::domain::models::job::{Job, JobStatus};
use crate::domain::repositories::job_repository::JobRepository;
use crate::domain::services::progress_reporter::ProgressReporter;
use crate::utils::errors::{DomainError, RepositoryError};
use crate::workers::item_scraper::ItemScraper;
use crate::workers::job_worker::JobWorker;
use crate::workers::worker::Worker;

// === Section: Use Case Definition ===

/// 任务用例
///
/// 提交、查询、取消任务。每个任务在独立的 tokio 任务中执行，
/// 持有自己的取消标记，所有标记都是服务关闭标记的子标记。
pub struct JobService {
    repository: Arc<dyn JobRepository>,
    scraper: Arc<dyn ItemScraper>,
    reporter: Arc<dyn ProgressReporter>,
    item_delay: Duration,
    tokens: Arc<DashMap<Uuid, CancellationToken>>,
    shutdown: CancellationToken,
}

// === Section: Implementation ===

impl JobService {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        scraper: Arc<dyn ItemScraper>,
        reporter: Arc<dyn ProgressReporter>,
        item_delay: Duration,
    ) -> Self {
        Self {
            repository,
            scraper,
            reporter,
            item_delay,
            tokens: Arc::new(DashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// 提交任务并在后台开始执行
    pub async fn submit(&self, request: CreateJobRequest) -> Result<Job> {
        request
            .validate()
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        let job = Job::new(
            request.name_or_default(),
            request.models,
            request.prefix.unwrap_or_default(),
        );
        let job = self.repository.create(&job).await?;
        self.reporter.job_changed(job.id, job.status);

        let token = self.shutdown.child_token();
        self.tokens.insert(job.id, token.clone());

        let worker = JobWorker::new(
            job.id,
            self.repository.clone(),
            self.scraper.clone(),
            self.reporter.clone(),
            self.item_delay,
            token,
        );
        let tokens = self.tokens.clone();
        let job_id = job.id;

        tokio::spawn(async move {
            if let Err(e) = worker.run().await {
                error!("{} failed for job {}: {}", worker.name(), job_id, e);
                if let Err(e) = worker.mark_failed(&e).await {
                    error!("Failed to record job failure for {}: {}", job_id, e);
                }
            }
            tokens.remove(&job_id);
        });

        info!(job_id = %job.id, models = job.total_models, "Job submitted");
        Ok(job)
    }

    /// 所有任务，最新的在前
    pub async fn list(&self) -> Result<Vec<Job>> {
        Ok(self.repository.list().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Job> {
        Ok(self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)?)
    }

    /// 请求取消任务
    ///
    /// 正在抓取的型号会执行完，之后任务以 `cancelled` 结束。
    /// 已经结束的任务返回 `InvalidState`。
    pub async fn cancel(&self, id: Uuid) -> Result<Job> {
        let job = self.get(id).await?;
        if job.status.is_terminal() {
            return Err(RepositoryError::InvalidState(format!(
                "Job {} is already {}",
                id, job.status
            ))
            .into());
        }

        match self.tokens.get(&id) {
            Some(token) => {
                token.cancel();
                info!(job_id = %id, "Cancellation requested");
            }
            None => warn!(job_id = %id, "No running worker found for job"),
        }
        Ok(job)
    }

    pub async fn stats(&self) -> Result<JobStats> {
        let jobs = self.repository.list().await?;
        let total_results = jobs
            .iter()
            .filter_map(|j| j.results.as_ref())
            .map(|r| r.successful.len())
            .sum();

        Ok(JobStats {
            total_jobs: jobs.len(),
            running_jobs: self.repository.count_by_status(JobStatus::Running).await?,
            completed_jobs: self.repository.count_by_status(JobStatus::Completed).await?,
            total_results,
            active_connections: 0,
        })
    }

    /// 取消所有正在执行的任务
    pub fn shutdown(&self) {
        info!("Cancelling {} active jobs", self.tokens.len());
        self.shutdown.cancel();
    }
}
