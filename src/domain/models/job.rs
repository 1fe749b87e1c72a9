// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::batch_result::BatchResult;
use super::progress::percentage;

/// 抓取任务实体
///
/// 一次提交的一批型号。任务创建后只由执行器更新，
/// 其他地方只读。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 任务名称
    pub name: String,
    /// 原始型号列表
    pub models: Vec<String>,
    /// URL 前缀
    pub prefix: String,
    /// 任务状态
    pub status: JobStatus,
    /// 进度百分比
    pub progress: f64,
    /// 型号总数
    pub total_models: usize,
    /// 正在抓取的型号
    pub current_model: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 开始时间
    pub started_at: Option<DateTime<Utc>>,
    /// 结束时间
    pub completed_at: Option<DateTime<Utc>>,
    /// 批量结果，任务结束后填充
    pub results: Option<BatchResult>,
    /// 错误信息
    pub error: Option<String>,
}

impl Job {
    /// 创建一个待执行的任务
    pub fn new(name: impl Into<String>, models: Vec<String>, prefix: impl Into<String>) -> Self {
        let total_models = models.len();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            models,
            prefix: prefix.into(),
            status: JobStatus::Pending,
            progress: 0.0,
            total_models,
            current_model: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            results: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// 以批量结果结束任务，被取消的批次标记为 `Cancelled`
    pub fn finish(&mut self, results: BatchResult) {
        self.status = if results.cancelled {
            JobStatus::Cancelled
        } else {
            JobStatus::Completed
        };
        self.progress = if self.status == JobStatus::Completed {
            100.0
        } else {
            percentage(results.processed(), results.total)
        };
        self.current_model = None;
        self.completed_at = Some(Utc::now());
        self.results = Some(results);
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.current_model = None;
        self.completed_at = Some(Utc::now());
    }
}

/// 任务状态枚举
///
/// Pending → Running → Completed/Cancelled/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
