// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use super::scrape_result::ScrapeResult;

/// 失败条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub model: String,
    pub error: String,
}

/// 批量抓取结果
///
/// 按输入顺序累积。`successful.len() + failed.len() <= total`，
/// 因取消而未处理的型号不出现在任何一个列表中。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub total: usize,
    pub successful: Vec<ScrapeResult>,
    pub failed: Vec<FailedItem>,
    /// 批次是否因取消而提前结束
    #[serde(default)]
    pub cancelled: bool,
}

impl BatchResult {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record_success(&mut self, result: ScrapeResult) {
        self.successful.push(result);
    }

    pub fn record_failure(&mut self, model: impl Into<String>, error: impl Into<String>) {
        self.failed.push(FailedItem {
            model: model.into(),
            error: error.into(),
        });
    }

    /// 已处理（成功或失败）的条目数
    pub fn processed(&self) -> usize {
        self.successful.len() + self.failed.len()
    }

    /// 所有条目都已处理
    pub fn is_complete(&self) -> bool {
        self.processed() == self.total
    }
}
