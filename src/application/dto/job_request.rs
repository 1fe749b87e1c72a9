// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 默认任务名称
pub const DEFAULT_JOB_NAME: &str = "MK Scraping Job";
/// 单个任务的最大型号数
pub const MAX_MODELS: usize = 500;
/// 单个型号的最大长度
pub const MAX_MODEL_LEN: usize = 64;

/// 创建任务请求DTO
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateJobRequest {
    /// 任务名称
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: Option<String>,

    /// 型号列表
    #[validate(
        length(min = 1, max = 500, message = "models must contain 1-500 entries"),
        custom(function = "validate_models")
    )]
    pub models: Vec<String>,

    /// URL 前缀
    #[validate(length(max = 32, message = "prefix must be at most 32 characters"))]
    pub prefix: Option<String>,
}

#[allow(clippy::ptr_arg)]
fn validate_models(models: &Vec<String>) -> Result<(), ValidationError> {
    if models.iter().any(|m| m.trim().is_empty()) {
        return Err(ValidationError::new("empty_model").with_message("models cannot be empty".into()));
    }
    if models.iter().any(|m| m.chars().count() > MAX_MODEL_LEN) {
        return Err(ValidationError::new("model_too_long")
            .with_message(format!("each model must be at most {} characters", MAX_MODEL_LEN).into()));
    }
    Ok(())
}

impl CreateJobRequest {
    pub fn name_or_default(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| DEFAULT_JOB_NAME.to_string())
    }
}

/// 任务统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub total_jobs: usize,
    pub running_jobs: usize,
    pub completed_jobs: usize,
    /// 所有任务成功抓取的型号数
    pub total_results: usize,
    pub active_connections: usize,
}
