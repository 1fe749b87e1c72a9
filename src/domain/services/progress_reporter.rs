// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::JobStatus;
use crate::domain::models::progress::ProgressEvent;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 进度上报接口
///
/// 执行器在每个型号开始前以及整批结束后调用 `report`。
/// 实现不能阻塞也不能失败，投递失败只记录日志。
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);

    /// 任务状态变化通知，默认忽略
    fn job_changed(&self, _job_id: Uuid, _status: JobStatus) {}
}

/// 只写日志的上报器
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, event: &ProgressEvent) {
        info!(
            current = event.current,
            total = event.total,
            percentage = event.percentage,
            "{}",
            event.message
        );
    }

    fn job_changed(&self, job_id: Uuid, status: JobStatus) {
        info!(job_id = %job_id, "Job status changed to {}", status);
    }
}

/// 同时投递给多个上报器
#[derive(Default, Clone)]
pub struct CompositeReporter {
    reporters: Vec<Arc<dyn ProgressReporter>>,
}

impl CompositeReporter {
    pub fn new(reporters: Vec<Arc<dyn ProgressReporter>>) -> Self {
        Self { reporters }
    }

    pub fn with(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }
}

impl ProgressReporter for CompositeReporter {
    fn report(&self, event: &ProgressEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }

    fn job_changed(&self, job_id: Uuid, status: JobStatus) {
        for reporter in &self.reporters {
            reporter.job_changed(job_id, status);
        }
    }
}
