// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::JobStatus;
use crate::domain::models::progress::ProgressEvent;
use crate::domain::repositories::job_repository::JobRepository;
use crate::domain::services::progress_reporter::{CompositeReporter, ProgressReporter};
use crate::utils::errors::{RepositoryError, WorkerError};
use crate::workers::batch_executor::BatchExecutor;
use crate::workers::item_scraper::ItemScraper;
use crate::workers::worker::Worker;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 把最新进度写进 watch 通道
struct LatestProgress(watch::Sender<Option<ProgressEvent>>);

impl ProgressReporter for LatestProgress {
    fn report(&self, event: &ProgressEvent) {
        self.0.send_replace(Some(event.clone()));
    }
}

/// 任务工作器
///
/// 执行一个已创建的任务：标记运行、跑完整批型号、写回结果。
/// 执行期间的进度通过 watch 通道异步写入仓库，只保留最新的一条。
pub struct JobWorker {
    job_id: Uuid,
    repository: Arc<dyn JobRepository>,
    scraper: Arc<dyn ItemScraper>,
    reporter: Arc<dyn ProgressReporter>,
    item_delay: Duration,
    cancel: CancellationToken,
}

impl JobWorker {
    pub fn new(
        job_id: Uuid,
        repository: Arc<dyn JobRepository>,
        scraper: Arc<dyn ItemScraper>,
        reporter: Arc<dyn ProgressReporter>,
        item_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            job_id,
            repository,
            scraper,
            reporter,
            item_delay,
            cancel,
        }
    }

    /// 任务执行失败时记录错误
    pub async fn mark_failed(&self, error: &WorkerError) -> Result<(), RepositoryError> {
        if let Some(mut job) = self.repository.find_by_id(self.job_id).await? {
            if job.status.is_terminal() {
                return Ok(());
            }
            job.fail(error.to_string());
            self.repository.update(&job).await?;
            self.reporter.job_changed(job.id, job.status);
        }
        Ok(())
    }
}

#[async_trait]
impl Worker for JobWorker {
    #[instrument(skip(self), fields(job_id = %self.job_id))]
    async fn run(&self) -> Result<(), WorkerError> {
        let mut job = self
            .repository
            .find_by_id(self.job_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        if job.status != JobStatus::Pending {
            return Err(RepositoryError::InvalidState(format!(
                "job {} is {}, expected pending",
                job.id, job.status
            ))
            .into());
        }

        job.start();
        self.repository.update(&job).await?;
        self.reporter.job_changed(job.id, job.status);
        info!("Job started with {} models", job.total_models);

        let (tx, mut rx) = watch::channel(None);
        let repository = self.repository.clone();
        let job_id = job.id;
        let progress_sync = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let latest: Option<ProgressEvent> = rx.borrow_and_update().clone();
                if let Some(event) = latest {
                    if let Err(e) = repository
                        .update_progress(job_id, event.percentage, event.model)
                        .await
                    {
                        warn!("Failed to record progress: {}", e);
                    }
                }
            }
        });

        let observers: Vec<Arc<dyn ProgressReporter>> =
            vec![self.reporter.clone(), Arc::new(LatestProgress(tx))];
        let reporter = CompositeReporter::new(observers);
        let executor = BatchExecutor::new(self.scraper.clone(), Arc::new(reporter), self.item_delay)
            .for_job(job.id);

        let results = executor.run(&job.models, &job.prefix, &self.cancel).await;

        // Closing the channel ends the progress task before the final write
        drop(executor);
        if let Err(e) = progress_sync.await {
            warn!("Progress task ended abnormally: {}", e);
        }

        job.finish(results);
        self.repository.update(&job).await?;
        self.reporter.job_changed(job.id, job.status);
        info!(status = %job.status, "Job finished");

        Ok(())
    }

    fn name(&self) -> &str {
        "job-worker"
    }
}
