// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod mock_browser;

use mkprocessor::config::settings::ScraperConfig;
use mkprocessor::domain::services::extraction_service::FieldExtractor;
use mkprocessor::domain::services::field_rules::FieldRules;
use mkprocessor::domain::services::progress_reporter::ProgressReporter;
use mkprocessor::domain::models::progress::ProgressEvent;
use mkprocessor::engines::traits::SessionOptions;
use mkprocessor::workers::item_scraper::SingleItemScraper;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub use mock_browser::{AcceptAllProbe, PageScript, ScriptedDriver};

/// 测试用抓取配置：不等待、重试间隔很短
pub fn fast_config(retries: u32) -> ScraperConfig {
    ScraperConfig {
        retries,
        retry_delay: Duration::from_millis(10),
        item_delay: Duration::ZERO,
        page_load_timeout: Duration::from_secs(1),
        element_wait_timeout: Duration::from_millis(10),
        ..ScraperConfig::default()
    }
}

/// 基于脚本化驱动的单型号抓取器
pub fn scraper_for(driver: Arc<ScriptedDriver>, config: ScraperConfig) -> Arc<SingleItemScraper> {
    let extractor = FieldExtractor::new(&FieldRules::default(), Arc::new(AcceptAllProbe), &config)
        .expect("default rules compile");
    Arc::new(SingleItemScraper::new(
        driver,
        Arc::new(extractor),
        config,
        SessionOptions::default(),
    ))
}

/// 记录所有进度事件
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: &ProgressEvent) {
        self.events.lock().push(event.clone());
    }
}

/// 一个最小但完整的商品页
pub fn product_page(title: &str, price: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="product-name mb-0">{title}</h1>
            <p class="product-price-text m-0">{price}</p>
            <div class="product-img"><img src="/images/main-product.jpg"></div>
            <div class="tab-content"><p>Commercial grade.</p></div>
            <table class="table table-condensed specs-table">
                <tr><td>Weight</td><td>20 lb</td></tr>
            </table>
        </body></html>"#
    )
}
