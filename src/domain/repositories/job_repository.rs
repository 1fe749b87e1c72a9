// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobStatus};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

/// 任务仓库特质
///
/// 进程内唯一的任务表，按任务 ID 索引。
/// 创建后只有任务执行器会写入，其余调用方只读。
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建新任务
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError>;
    /// 整体替换任务记录
    async fn update(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 更新进度和当前型号
    async fn update_progress(
        &self,
        id: Uuid,
        progress: f64,
        current_model: Option<String>,
    ) -> Result<(), RepositoryError>;
    /// 所有任务，按创建时间倒序
    async fn list(&self) -> Result<Vec<Job>, RepositoryError>;
    /// 指定状态的任务数量
    async fn count_by_status(&self, status: JobStatus) -> Result<usize, RepositoryError>;
}
