// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 进度事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 所属任务，未绑定任务时为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    /// 正在处理的型号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub current: usize,
    pub total: usize,
    pub message: String,
    /// 百分比，保留两位小数
    pub percentage: f64,
}

impl ProgressEvent {
    pub fn new(current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            job_id: None,
            model: None,
            current,
            total,
            message: message.into(),
            percentage: percentage(current, total),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_job(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self
    }
}

/// 计算百分比 `round(current / total * 100, 2)`，`total == 0` 时为 0
pub fn percentage(current: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = current as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}
