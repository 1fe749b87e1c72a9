// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobStatus};
use crate::domain::repositories::job_repository::JobRepository;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// 内存任务仓库
///
/// 基于 `DashMap` 的进程内任务表，进程退出后数据丢失
#[derive(Clone, Default)]
pub struct InMemoryJobRepository {
    jobs: Arc<DashMap<Uuid, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 任务总数
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        if self.jobs.contains_key(&job.id) {
            return Err(RepositoryError::InvalidState(format!(
                "job {} already exists",
                job.id
            )));
        }
        self.jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, job: &Job) -> Result<Job, RepositoryError> {
        let mut entry = self.jobs.get_mut(&job.id).ok_or(RepositoryError::NotFound)?;
        *entry = job.clone();
        Ok(job.clone())
    }

    async fn update_progress(
        &self,
        id: Uuid,
        progress: f64,
        current_model: Option<String>,
    ) -> Result<(), RepositoryError> {
        let mut entry = self.jobs.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        // A finished job keeps its final numbers
        if entry.status.is_terminal() {
            return Ok(());
        }
        entry.progress = progress;
        entry.current_model = current_model;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Job>, RepositoryError> {
        let mut jobs: Vec<Job> = self.jobs.iter().map(|entry| entry.value().clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn count_by_status(&self, status: JobStatus) -> Result<usize, RepositoryError> {
        Ok(self
            .jobs
            .iter()
            .filter(|entry| entry.value().status == status)
            .count())
    }
}
