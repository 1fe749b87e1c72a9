// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::batch_result::BatchResult;
use crate::domain::models::model_identifier::ModelIdentifier;
use crate::domain::models::progress::ProgressEvent;
use crate::domain::models::scrape_result::ScrapeRequest;
use crate::domain::services::progress_reporter::ProgressReporter;
use crate::workers::item_scraper::{ItemScraper, ScrapeError, PRODUCT_NOT_FOUND};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// 批量执行器
///
/// 按输入顺序逐个抓取型号，累积 `BatchResult` 并推送进度。
///
/// - 每个型号开始前检查取消标记，正在抓取的型号会执行完
/// - 每个型号在独立的任务里执行，panic 只会让这个型号失败
/// - 只有 `found=true` 的结果进入 `successful`，其余进入 `failed`
pub struct BatchExecutor {
    scraper: Arc<dyn ItemScraper>,
    reporter: Arc<dyn ProgressReporter>,
    item_delay: Duration,
    job_id: Option<Uuid>,
}

impl BatchExecutor {
    pub fn new(
        scraper: Arc<dyn ItemScraper>,
        reporter: Arc<dyn ProgressReporter>,
        item_delay: Duration,
    ) -> Self {
        Self {
            scraper,
            reporter,
            item_delay,
            job_id: None,
        }
    }

    /// 进度事件附带任务 ID
    pub fn for_job(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// 执行一批型号
    ///
    /// # 参数
    ///
    /// * `models` - 原始型号列表，逐个规范化
    /// * `prefix` - URL 前缀
    /// * `cancel` - 取消标记
    #[instrument(skip_all, fields(job_id = ?self.job_id, total = models.len()))]
    pub async fn run(
        &self,
        models: &[String],
        prefix: &str,
        cancel: &CancellationToken,
    ) -> BatchResult {
        let total = models.len();
        let mut batch = BatchResult::new(total);

        for (index, raw) in models.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Batch cancelled after {} of {} models", index, total);
                batch.cancelled = true;
                break;
            }

            match ModelIdentifier::parse(raw) {
                Ok(model) => {
                    self.emit(
                        ProgressEvent::new(index, total, format!("Scraping {}", model))
                            .with_model(model.as_str()),
                    );
                    self.scrape_one(model, prefix, cancel, &mut batch).await;
                }
                Err(e) => {
                    self.emit(
                        ProgressEvent::new(index, total, format!("Scraping {}", raw))
                            .with_model(raw.as_str()),
                    );
                    batch.record_failure(raw.as_str(), ScrapeError::from(e).to_string());
                }
            }

            // Pacing between items, cut short by cancellation
            tokio::select! {
                _ = tokio::time::sleep(self.item_delay) => {}
                _ = cancel.cancelled() => {}
            }
        }

        if batch.cancelled {
            self.emit(ProgressEvent::new(batch.processed(), total, "Cancelled"));
        } else {
            self.emit(ProgressEvent::new(total, total, "Completed"));
        }

        info!(
            successful = batch.successful.len(),
            failed = batch.failed.len(),
            "Batch finished"
        );
        batch
    }

    async fn scrape_one(
        &self,
        model: ModelIdentifier,
        prefix: &str,
        cancel: &CancellationToken,
        batch: &mut BatchResult,
    ) {
        let request = ScrapeRequest::new(model.clone(), prefix);
        let scraper = self.scraper.clone();
        let token = cancel.clone();

        let handle = tokio::spawn(async move { scraper.scrape(&request, &token).await });

        match handle.await {
            Ok(result) if result.found => batch.record_success(result),
            Ok(result) => {
                let reason = result.error.unwrap_or_else(|| PRODUCT_NOT_FOUND.to_string());
                batch.record_failure(model.as_str(), reason);
            }
            Err(e) => {
                error!("Scrape task for {} aborted: {}", model, e);
                batch.record_failure(model.as_str(), format!("Unexpected error: {}", e));
            }
        }
    }

    fn emit(&self, event: ProgressEvent) {
        let event = match self.job_id {
            Some(id) => event.with_job(id),
            None => event,
        };
        self.reporter.report(&event);
    }
}
