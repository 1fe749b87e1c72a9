// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScraperConfig;
use crate::domain::models::scrape_result::{ScrapeRequest, ScrapeResult};
use crate::domain::services::extraction_service::FieldExtractor;
use crate::engines::traits::{BrowserDriver, BrowserSession, EngineError, SessionOptions};
use crate::engines::user_agents::random_user_agent;
use crate::utils::errors::DomainError;
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// 商品页不存在时的错误信息
pub const PRODUCT_NOT_FOUND: &str = "Product not found";
/// 页面打开了但没有标题
pub const TITLE_NOT_FOUND: &str = "Product title not found";

/// 单个型号抓取错误
#[derive(Error, Debug, Clone)]
pub enum ScrapeError {
    #[error("Invalid model identifier: {0}")]
    InvalidModel(#[from] DomainError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// 单个型号抓取能力
///
/// 实现内部处理重试，总是返回一个结果，不会返回错误
#[async_trait]
pub trait ItemScraper: Send + Sync {
    async fn scrape(&self, request: &ScrapeRequest, cancel: &CancellationToken) -> ScrapeResult;
}

/// 基于浏览器会话的单型号抓取器
///
/// 每次尝试都打开一个新会话，任何退出路径上都会关闭它。
/// 导航或提取失败时按重试策略重来，批次被取消后不再重试。
pub struct SingleItemScraper {
    driver: Arc<dyn BrowserDriver>,
    extractor: Arc<FieldExtractor>,
    config: ScraperConfig,
    retry: RetryPolicy,
    session: SessionOptions,
}

impl SingleItemScraper {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        extractor: Arc<FieldExtractor>,
        config: ScraperConfig,
        session: SessionOptions,
    ) -> Self {
        let retry = config.retry_policy();
        Self {
            driver,
            extractor,
            config,
            retry,
            session,
        }
    }

    /// 一次完整尝试：打开会话、抓取、关闭会话
    async fn attempt(&self, request: &ScrapeRequest, url: &str) -> Result<ScrapeResult, ScrapeError> {
        let options = SessionOptions {
            user_agent: random_user_agent(),
            ..self.session.clone()
        };

        let mut session = self.driver.open(&options).await?;
        let outcome = self.visit(session.as_mut(), request, url).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        outcome
    }

    async fn visit(
        &self,
        session: &mut dyn BrowserSession,
        request: &ScrapeRequest,
        url: &str,
    ) -> Result<ScrapeResult, ScrapeError> {
        session.navigate(url, self.config.page_load_timeout).await?;

        let title = session.title().await?;
        if is_not_found_title(&title) {
            info!("Page title `{}` indicates a missing product", title);
            return Ok(ScrapeResult::not_found(
                &request.model,
                url,
                Some(PRODUCT_NOT_FOUND.to_string()),
            ));
        }

        let ready = session
            .wait_for(self.extractor.ready_selector(), self.config.element_wait_timeout)
            .await?;
        if !ready {
            debug!(
                "Heading did not appear within {:?}, extracting anyway",
                self.config.element_wait_timeout
            );
        }

        let html = session.content().await?;
        match self.extractor.extract(&html, url, &request.model).await {
            Some(fields) => Ok(ScrapeResult::found(&request.model, url, fields)),
            None => Ok(ScrapeResult::not_found(
                &request.model,
                url,
                Some(TITLE_NOT_FOUND.to_string()),
            )),
        }
    }
}

#[async_trait]
impl ItemScraper for SingleItemScraper {
    #[instrument(skip(self, request, cancel), fields(model = %request.model))]
    async fn scrape(&self, request: &ScrapeRequest, cancel: &CancellationToken) -> ScrapeResult {
        let url = request.url(&self.config.base_url);
        let mut retries = 0;

        loop {
            let error = match self.attempt(request, &url).await {
                Ok(result) => {
                    info!(found = result.found, "Scrape finished");
                    return result;
                }
                Err(e) => e,
            };

            if cancel.is_cancelled() || !self.retry.should_retry(retries) {
                error!("Scrape failed after {} retries: {}", retries, error);
                return ScrapeResult::not_found(&request.model, url, Some(error.to_string()));
            }

            retries += 1;
            let delay = self.retry.calculate_backoff(retries);
            warn!(
                "Attempt failed: {}. Retrying in {:?} ({}/{})",
                error, delay, retries, self.retry.max_retries
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => {
                    warn!("Batch cancelled while waiting to retry");
                    return ScrapeResult::not_found(&request.model, url, Some(error.to_string()));
                }
            }
        }
    }
}

/// 标题中包含 "404" 或 "not found"（不区分大小写）视为商品不存在
pub fn is_not_found_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    lower.contains("404") || lower.contains("not found")
}
